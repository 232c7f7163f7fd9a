//! Result assembly for EMISIA resolutions.
//!
//! The assembler turns the resolver's winning candidate (or its exhaustion)
//! into the one result object callers see:
//! - the CO2e multiplication against the normalized quantity
//! - confidence from the fixed `(layer, tier)` mapping
//! - validation warnings (unit conversion applied, magnitude outliers)
//! - up to a fixed number of ranked runner-up alternatives
//!
//! Success and failure are a tagged union: exactly one of the two arms is
//! inhabited, never a half-populated struct with nulls.

use serde::Serialize;

use emisia_core::model::{FactorRecord, GasBreakdown, QualityTier};
use emisia_core::units::{parse_unit, same_dimension, UnitDef};

use crate::confidence::confidence_for;
use crate::estimate::EstimatedFactor;
use crate::resolve::{EngineConfig, Layer};
use crate::store::FactorStore;

/// A structured caveat attached to an otherwise successful resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
}

fn warning(code: impl Into<String>, message: impl Into<String>) -> ValidationWarning {
    ValidationWarning {
        code: code.into(),
        message: message.into(),
    }
}

/// A rejected runner-up, with enough detail for a caller to override the
/// automatic choice.
#[derive(Debug, Clone, Serialize)]
pub struct Alternative {
    pub factor: f64,
    pub factor_unit: String,
    pub source: String,
    pub region: String,
    pub vintage_year: i32,
    pub layer: Layer,
    pub confidence: f64,
    pub quality_tier: QualityTier,
}

/// A successful resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// Final computed emissions, kilograms of CO2e.
    pub co2e_mass_kg: f64,

    /// The chosen factor value (kg CO2e per `factor_unit`).
    pub factor_used: f64,
    pub factor_unit: String,
    pub source: String,

    /// Region of the matched record (requested region for estimates).
    pub region: String,

    /// Absent for estimated factors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vintage_year: Option<i32>,

    pub layer: Layer,
    pub confidence: f64,
    pub quality_tier: QualityTier,

    /// Ordered, human-auditable account of how the match was found.
    pub match_details: Vec<String>,

    /// Gas-species split of `co2e_mass_kg`, when the record declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_breakdown: Option<GasBreakdown>,

    pub alternatives: Vec<Alternative>,
    pub validation_warnings: Vec<ValidationWarning>,
}

/// An explicit failure: no factor at any layer.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionFailure {
    pub error: String,
    pub message: String,
    pub suggestion: String,
}

/// The caller-facing outcome. Exactly one arm is inhabited.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolveOutcome {
    Resolved(Resolution),
    Failed(ResolutionFailure),
}

impl ResolveOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::Resolved(r) => Some(r),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ResolutionFailure> {
        match self {
            Self::Resolved(_) => None,
            Self::Failed(f) => Some(f),
        }
    }

    pub fn into_result(self) -> Result<Resolution, ResolutionFailure> {
        match self {
            Self::Resolved(r) => Ok(r),
            Self::Failed(f) => Err(f),
        }
    }
}

pub(crate) fn fail(
    error: impl Into<String>,
    message: impl Into<String>,
    suggestion: impl Into<String>,
) -> ResolveOutcome {
    ResolveOutcome::Failed(ResolutionFailure {
        error: error.into(),
        message: message.into(),
        suggestion: suggestion.into(),
    })
}

/// Everything the resolver knows about its winning database candidate.
pub(crate) struct WinnerContext<'a> {
    pub record: &'a FactorRecord,
    pub layer: Layer,
    /// Caller quantity expressed in the record's unit.
    pub normalized_quantity: f64,
    /// `(from, to)` canonical spellings when a conversion was applied.
    pub conversion: Option<(String, String)>,
}

/// Assemble a resolution around a winning factor record.
pub(crate) fn assemble_record(
    store: &FactorStore,
    config: &EngineConfig,
    ctx: WinnerContext<'_>,
    mut details: Vec<String>,
    alternatives: Vec<Alternative>,
) -> Resolution {
    let record = ctx.record;
    let mut warnings = Vec::new();

    if let Some((from, to)) = &ctx.conversion {
        details.push(format!("quantity converted from {from:?} to {to:?}"));
        warnings.push(warning(
            "unit.converted",
            format!("caller unit {from:?} was converted to the factor's unit {to:?}"),
        ));
    }

    if let Some(w) = magnitude_outlier(store, record, config) {
        warnings.push(w);
    }

    let co2e_mass_kg = ctx.normalized_quantity * record.value;

    Resolution {
        co2e_mass_kg,
        factor_used: record.value,
        factor_unit: record.unit.clone(),
        source: record.source.clone(),
        region: record.region.clone(),
        vintage_year: Some(record.vintage_year),
        layer: ctx.layer,
        confidence: confidence_for(ctx.layer, record.quality_tier),
        quality_tier: record.quality_tier,
        match_details: details,
        gas_breakdown: record
            .gas_breakdown
            .map(|g| g.scaled(ctx.normalized_quantity)),
        alternatives,
        validation_warnings: warnings,
    }
}

/// Assemble a resolution from an external estimate. Returns `None` when the
/// estimate is unusable (non-positive value, unknown unit, wrong dimension):
/// an unusable estimate is identical to no estimate at all.
pub(crate) fn assemble_estimate(
    quantity: f64,
    caller_unit: &UnitDef,
    region: &str,
    estimate: EstimatedFactor,
    mut details: Vec<String>,
) -> Option<Resolution> {
    if !estimate.is_usable() {
        return None;
    }

    let estimate_unit = match &estimate.unit {
        Some(u) => parse_unit(u)?,
        None => *caller_unit,
    };
    if !same_dimension(&estimate_unit, caller_unit) {
        tracing::debug!(
            estimate_unit = estimate_unit.canonical,
            caller_unit = caller_unit.canonical,
            "estimate discarded: unit dimension does not match request"
        );
        return None;
    }

    let normalized_quantity = quantity * caller_unit.to_base / estimate_unit.to_base;

    details.push("no reference records matched; factor estimated from request context".to_string());
    if let Some(rationale) = &estimate.rationale {
        details.push(format!("estimator rationale: {rationale}"));
    }

    let mut warnings = vec![warning(
        "factor.estimated",
        "factor is an external estimate at the lowest confidence tier; confirm before reporting",
    )];
    if estimate_unit.canonical != caller_unit.canonical {
        warnings.push(warning(
            "unit.converted",
            format!(
                "caller unit {:?} was converted to the estimate's unit {:?}",
                caller_unit.canonical, estimate_unit.canonical
            ),
        ));
    }

    Some(Resolution {
        co2e_mass_kg: normalized_quantity * estimate.value,
        factor_used: estimate.value,
        factor_unit: estimate_unit.canonical.to_string(),
        source: estimate
            .source
            .unwrap_or_else(|| "ai-estimator".to_string()),
        region: region.to_string(),
        vintage_year: None,
        layer: Layer::Estimated,
        confidence: confidence_for(Layer::Estimated, QualityTier::GenericGlobal),
        quality_tier: QualityTier::GenericGlobal,
        match_details: details,
        gas_breakdown: None,
        alternatives: Vec::new(),
        validation_warnings: warnings,
    })
}

/// Flag a winning value implausibly far from the rest of its activity class.
///
/// Peers are the activity's other records in the same dimension, rescaled to
/// the winner's unit. The check needs a minimum number of peers and compares
/// against their median.
fn magnitude_outlier(
    store: &FactorStore,
    record: &FactorRecord,
    config: &EngineConfig,
) -> Option<ValidationWarning> {
    let unit = parse_unit(&record.unit)?;

    let mut peer_values: Vec<f64> = store
        .lookup_by_activity(&record.activity_key)
        .into_iter()
        .filter(|peer| !std::ptr::eq(*peer, record))
        .filter_map(|peer| {
            let peer_unit = parse_unit(&peer.unit)?;
            if !same_dimension(&peer_unit, &unit) {
                return None;
            }
            Some(peer.value * unit.to_base / peer_unit.to_base)
        })
        .collect();

    if peer_values.len() < config.min_outlier_peers {
        return None;
    }

    peer_values.sort_by(|a, b| a.total_cmp(b));
    let median = peer_values[peer_values.len() / 2];
    if median <= 0.0 {
        return None;
    }

    if record.value < median / config.outlier_ratio {
        return Some(warning(
            "value.outlier.low",
            format!(
                "factor {} {} is unusually low for {:?} (peer median {median})",
                record.value, record.unit, record.activity_key
            ),
        ));
    }
    if record.value > median * config.outlier_ratio {
        return Some(warning(
            "value.outlier.high",
            format!(
                "factor {} {} is unusually high for {:?} (peer median {median})",
                record.value, record.unit, record.activity_key
            ),
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(values: &[f64]) -> FactorStore {
        let records = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                FactorRecord::new("diesel", "Global", "litre", *v).source(format!("src-{i}"))
            })
            .collect();
        FactorStore::load(records).unwrap()
    }

    #[test]
    fn outlier_low_flagged_against_peer_median() {
        let store = store_with(&[0.01, 2.6, 2.7, 2.8]);
        let record = &store.records()[0];
        let w = magnitude_outlier(&store, record, &EngineConfig::default()).unwrap();
        assert_eq!(w.code, "value.outlier.low");
    }

    #[test]
    fn outlier_high_flagged_against_peer_median() {
        let store = store_with(&[900.0, 2.6, 2.7, 2.8]);
        let record = &store.records()[0];
        let w = magnitude_outlier(&store, record, &EngineConfig::default()).unwrap();
        assert_eq!(w.code, "value.outlier.high");
    }

    #[test]
    fn plausible_value_not_flagged() {
        let store = store_with(&[2.5, 2.6, 2.7, 2.8]);
        let record = &store.records()[0];
        assert!(magnitude_outlier(&store, record, &EngineConfig::default()).is_none());
    }

    #[test]
    fn too_few_peers_skips_the_check() {
        let store = store_with(&[0.01, 2.6]);
        let record = &store.records()[0];
        assert!(magnitude_outlier(&store, record, &EngineConfig::default()).is_none());
    }

    #[test]
    fn estimate_with_wrong_dimension_is_discarded() {
        let litre = parse_unit("litre").unwrap();
        let est = EstimatedFactor {
            value: 2.0,
            unit: Some("km".to_string()),
            source: None,
            rationale: None,
        };
        assert!(assemble_estimate(10.0, &litre, "India", est, Vec::new()).is_none());
    }

    #[test]
    fn estimate_defaults_to_caller_unit() {
        let litre = parse_unit("litre").unwrap();
        let est = EstimatedFactor {
            value: 2.0,
            unit: None,
            source: None,
            rationale: Some("similar fuel".to_string()),
        };
        let r = assemble_estimate(10.0, &litre, "India", est, Vec::new()).unwrap();
        assert_eq!(r.co2e_mass_kg, 20.0);
        assert_eq!(r.factor_unit, "litre");
        assert_eq!(r.source, "ai-estimator");
        assert!(r.vintage_year.is_none());
        assert!(r
            .validation_warnings
            .iter()
            .any(|w| w.code == "factor.estimated"));
        assert!(r
            .match_details
            .iter()
            .any(|d| d.contains("similar fuel")));
    }

    #[test]
    fn outcome_arms_are_mutually_exclusive() {
        let failed = fail("no_match", "nothing matched", "be more specific");
        assert!(!failed.is_resolved());
        assert!(failed.resolution().is_none());
        assert_eq!(failed.failure().unwrap().error, "no_match");
    }
}
