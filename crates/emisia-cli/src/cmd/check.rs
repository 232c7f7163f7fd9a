use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use emisia_engine::FactorStore;

use crate::args::Cli;
use crate::io::records::load_records;
use crate::output;

#[derive(Debug, Serialize)]
pub struct CheckOut {
    pub records: usize,
    pub activities: usize,
    pub per_activity: BTreeMap<String, usize>,
}

pub fn run(cli: &Cli) -> Result<()> {
    let records = load_records(Path::new(&cli.records))?;
    let store = FactorStore::load(records)?;

    let mut per_activity = BTreeMap::new();
    for key in store.activities() {
        per_activity.insert(key.to_string(), store.lookup_by_activity(key).len());
    }

    let out = CheckOut {
        records: store.len(),
        activities: per_activity.len(),
        per_activity,
    };

    output::status(
        true,
        &format!("{} records across {} activities", out.records, out.activities),
    );
    output::print(&out)
}
