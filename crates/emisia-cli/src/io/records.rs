//! Reference records file loading.
//!
//! The engine is agnostic to where records come from; this module is the
//! CLI's chosen source: a JSON file holding either a bare array of records
//! or a `{ "records": [...] }` wrapper.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use emisia_core::model::FactorRecord;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Bare(Vec<FactorRecord>),
    Wrapped { records: Vec<FactorRecord> },
}

pub fn load_records(path: &Path) -> Result<Vec<FactorRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read records file {}", path.display()))?;

    let parsed: RecordsFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse records file {}", path.display()))?;

    Ok(match parsed {
        RecordsFile::Bare(records) => records,
        RecordsFile::Wrapped { records } => records,
    })
}
