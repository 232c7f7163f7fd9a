//! EMISIA reference data model.
//!
//! A `FactorRecord` carries one reference emission factor: the activity it
//! applies to, the region and unit it is denominated in, the numeric factor
//! (kilograms of CO2e per unit of activity), provenance, and a tie-break
//! priority. Records are data-only: the store validates and indexes them,
//! the resolver chooses among them, and nothing mutates them after load.
//!
//! Invariants enforced at load time (never at query time):
//! - `value` is finite and non-negative
//! - `activity_key` folds to a non-empty key
//! - `unit` is a known unit spelling
//! - a gas breakdown, when present, sums to `value` within tolerance

use serde::{Deserialize, Serialize};

use crate::errors::{EmisiaError, EmisiaResult};
use crate::normalize::normalize_activity_key;
use crate::units::parse_unit;
use crate::GAS_SUM_REL_TOL;

/// Coarse provenance-based confidence label, ordered worst to best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Generic global default datasets.
    GenericGlobal,
    /// Industry framework publications (GHG Protocol tables and similar).
    IndustryFramework,
    /// National or regulatory authority datasets.
    Authoritative,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenericGlobal => "generic-global",
            Self::IndustryFramework => "industry-framework",
            Self::Authoritative => "authoritative-regulatory",
        }
    }
}

/// Decomposition of a factor into gas species, all already expressed in
/// CO2-equivalent terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasBreakdown {
    pub co2: f64,
    pub ch4: f64,
    pub n2o: f64,
}

impl GasBreakdown {
    pub fn total(&self) -> f64 {
        self.co2 + self.ch4 + self.n2o
    }

    /// Scale every species by the same multiplier (e.g. a resolved quantity).
    pub fn scaled(&self, by: f64) -> Self {
        Self {
            co2: self.co2 * by,
            ch4: self.ch4 * by,
            n2o: self.n2o * by,
        }
    }

    /// Whether the species sum matches `value` within relative tolerance.
    pub fn sums_to(&self, value: f64) -> bool {
        let total = self.total();
        let scale = value.abs().max(1.0);
        (total - value).abs() <= scale * GAS_SUM_REL_TOL
    }
}

/// One reference emission factor. Immutable once loaded into a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRecord {
    /// Activity identity; folded to its index form at load.
    pub activity_key: String,

    /// Geographic scope. `"Global"` is the universal fallback region; an
    /// empty region is folded to `"Global"` at load.
    #[serde(default)]
    pub region: String,

    /// Unit the factor is denominated per; canonicalized at load.
    pub unit: String,

    /// Kilograms of CO2e per one `unit` of activity. Non-negative.
    pub value: f64,

    /// Optional gas-species decomposition, in CO2e terms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_breakdown: Option<GasBreakdown>,

    /// Dataset or publication this factor came from. Used for tie-breaking
    /// and auditability, never for matching.
    pub source: String,

    /// Publication/reference year. Most recent wins among equal priority.
    pub vintage_year: i32,

    /// Tie-break rank; lower wins. Only a total order within one
    /// `(activity_key, region)` group.
    pub priority: i32,

    /// Provenance-based confidence label.
    pub quality_tier: QualityTier,
}

impl FactorRecord {
    /// Construct a record with neutral provenance defaults. Builder-style
    /// setters fill in the rest; tests and fixtures lean on this.
    pub fn new(
        activity_key: impl Into<String>,
        region: impl Into<String>,
        unit: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            activity_key: activity_key.into(),
            region: region.into(),
            unit: unit.into(),
            value,
            gas_breakdown: None,
            source: String::new(),
            vintage_year: 0,
            priority: 0,
            quality_tier: QualityTier::GenericGlobal,
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn vintage(mut self, year: i32) -> Self {
        self.vintage_year = year;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn tier(mut self, tier: QualityTier) -> Self {
        self.quality_tier = tier;
        self
    }

    pub fn gas(mut self, co2: f64, ch4: f64, n2o: f64) -> Self {
        self.gas_breakdown = Some(GasBreakdown { co2, ch4, n2o });
        self
    }

    /// Check the load-time invariants. The store rejects a whole load on the
    /// first violating record, so a bad record can never be chosen later.
    pub fn validate(&self) -> EmisiaResult<()> {
        if normalize_activity_key(&self.activity_key).is_empty() {
            return Err(EmisiaError::malformed_record(format!(
                "activity key {:?} folds to an empty key",
                self.activity_key
            )));
        }

        if self.unit.trim().is_empty() {
            return Err(EmisiaError::malformed_record(format!(
                "record for {:?} has an empty unit",
                self.activity_key
            )));
        }

        if parse_unit(&self.unit).is_none() {
            return Err(EmisiaError::malformed_record(format!(
                "record for {:?} has unknown unit {:?}",
                self.activity_key, self.unit
            )));
        }

        if !self.value.is_finite() || self.value < 0.0 {
            return Err(EmisiaError::malformed_record(format!(
                "record for {:?} has invalid value {}",
                self.activity_key, self.value
            )));
        }

        if let Some(gas) = &self.gas_breakdown {
            if !gas.sums_to(self.value) {
                return Err(EmisiaError::malformed_record(format!(
                    "record for {:?} has gas breakdown summing to {} but value {}",
                    self.activity_key,
                    gas.total(),
                    self.value
                )));
            }
        }

        Ok(())
    }
}
