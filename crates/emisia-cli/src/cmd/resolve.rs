use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use emisia_engine::{Engine, FactorStore, ResolveRequest};

use crate::args::Cli;
use crate::io::records::load_records;
use crate::output;

pub fn run(
    cli: &Cli,
    activity: &str,
    quantity: f64,
    unit: &str,
    region: Option<String>,
    context: &str,
) -> Result<()> {
    let records = load_records(Path::new(&cli.records))?;
    let store = FactorStore::load(records)?;
    let engine = Engine::new(Arc::new(store));

    let mut request = ResolveRequest::new(activity, quantity, unit).context(context);
    if let Some(region) = region {
        request = request.region(region);
    }

    let outcome = engine.resolve(&request);
    match &outcome {
        emisia_engine::ResolveOutcome::Resolved(r) => {
            output::status(
                true,
                &format!(
                    "{} {} {} => {:.3} kg CO2e (layer {}, confidence {:.2})",
                    quantity,
                    unit,
                    activity,
                    r.co2e_mass_kg,
                    r.layer.index(),
                    r.confidence
                ),
            );
        }
        emisia_engine::ResolveOutcome::Failed(f) => {
            output::status(false, &format!("{}: {}", f.error, f.message));
            output::status(false, &format!("suggestion: {}", f.suggestion));
        }
    }

    output::print(&outcome)
}
