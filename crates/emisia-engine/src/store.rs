//! The EMISIA factor store.
//!
//! The store holds every reference factor record and answers identity /
//! region / unit queries in near-constant time.
//!
//! Requirements:
//! - stable ordering for lookups and iteration
//! - the whole load is rejected on the first malformed record
//! - no global mutable state and no mutation after construction
//!
//! Reload is expressed as "build a new store, swap the `Arc`" at the
//! composition root: readers either see the old index in full or the new one
//! in full, never a mix, and the read path needs no locks.

use std::collections::BTreeMap;

use emisia_core::model::FactorRecord;
use emisia_core::normalize::{fold_region, normalize_activity_key};
use emisia_core::units::parse_unit;
use emisia_core::{EmisiaError, EmisiaResult, GLOBAL_REGION};

/// Immutable, indexed collection of factor records.
pub struct FactorStore {
    /// Canonicalized records, in load order.
    records: Vec<FactorRecord>,

    /// Record indices per activity key, pre-sorted by the deterministic
    /// tie-break order (priority asc, vintage desc, source lexical).
    by_activity: BTreeMap<String, Vec<usize>>,

    /// Record indices per `(activity key, folded region)`, same ordering.
    by_activity_region: BTreeMap<(String, String), Vec<usize>>,
}

impl FactorStore {
    /// Build a store from reference records.
    ///
    /// Fails fast: the first record violating a load-time invariant rejects
    /// the whole load, naming the record's position. On success every stored
    /// record carries its canonical activity key, canonical unit spelling,
    /// and a non-empty region (empty regions fold to `"Global"`).
    pub fn load(records: Vec<FactorRecord>) -> EmisiaResult<Self> {
        let mut canonical = Vec::with_capacity(records.len());

        for (idx, mut record) in records.into_iter().enumerate() {
            record.validate().map_err(|e| {
                EmisiaError::malformed_record(format!("record {idx}: {e}"))
            })?;

            record.activity_key = normalize_activity_key(&record.activity_key);
            if record.region.trim().is_empty() {
                record.region = GLOBAL_REGION.to_string();
            }
            // validate() guarantees the unit parses
            if let Some(unit) = parse_unit(&record.unit) {
                record.unit = unit.canonical.to_string();
            }

            canonical.push(record);
        }

        let mut by_activity: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_activity_region: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();

        for (idx, record) in canonical.iter().enumerate() {
            by_activity
                .entry(record.activity_key.clone())
                .or_default()
                .push(idx);
            by_activity_region
                .entry((record.activity_key.clone(), fold_region(&record.region)))
                .or_default()
                .push(idx);
        }

        for indices in by_activity.values_mut() {
            sort_by_tie_break(indices, &canonical);
        }
        for indices in by_activity_region.values_mut() {
            sort_by_tie_break(indices, &canonical);
        }

        Ok(Self {
            records: canonical,
            by_activity,
            by_activity_region,
        })
    }

    /// Records matching activity, region, and canonical unit exactly,
    /// ordered by priority ascending then vintage year descending.
    pub fn lookup_exact(
        &self,
        activity_key: &str,
        region: &str,
        canonical_unit: &str,
    ) -> Vec<&FactorRecord> {
        let key = (
            normalize_activity_key(activity_key),
            fold_region(region),
        );
        match self.by_activity_region.get(&key) {
            Some(indices) => indices
                .iter()
                .map(|&i| &self.records[i])
                .filter(|r| r.unit == canonical_unit)
                .collect(),
            None => Vec::new(),
        }
    }

    /// All records for an activity across every region and unit, in
    /// deterministic tie-break order. Fuzzy and proxy layers rank these
    /// further by region-specificity.
    pub fn lookup_by_activity(&self, activity_key: &str) -> Vec<&FactorRecord> {
        match self.by_activity.get(&normalize_activity_key(activity_key)) {
            Some(indices) => indices.iter().map(|&i| &self.records[i]).collect(),
            None => Vec::new(),
        }
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Activity keys in deterministic order.
    pub fn activities(&self) -> impl Iterator<Item = &str> {
        self.by_activity.keys().map(|k| k.as_str())
    }

    /// All records, in load order.
    pub fn records(&self) -> &[FactorRecord] {
        &self.records
    }
}

/// Sort index vectors by (priority asc, vintage desc, source lexical).
/// Region-specificity is a per-query property and is ranked by the resolver.
fn sort_by_tie_break(indices: &mut [usize], records: &[FactorRecord]) {
    indices.sort_by(|&a, &b| {
        let ra = &records[a];
        let rb = &records[b];
        ra.priority
            .cmp(&rb.priority)
            .then(rb.vintage_year.cmp(&ra.vintage_year))
            .then(ra.source.cmp(&rb.source))
    });
}
