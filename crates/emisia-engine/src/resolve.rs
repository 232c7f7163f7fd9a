//! The layered resolver.
//!
//! Given `(activity, quantity, unit, region, context)`, walk an ordered chain
//! of matching strategies until one yields an eligible candidate:
//!
//! - Layer 0, exact: activity + region + unit all match; the caller's region
//!   is retried as `"Global"` before the layer is declared empty
//! - Layer 1, unit-normalized: any record for the activity whose unit shares
//!   the caller's dimension, converted and ranked
//! - Layer 2, category proxy: when the activity has no records at all, the
//!   declared category is retried through layers 0–1
//! - Layer 3, estimated: the external estimation adapter, lowest confidence
//!
//! Tie-break, total and reproducible at every layer: region-specificity
//! (exact region, then `"Global"`, then anything else), then priority
//! ascending, then vintage year descending, then source lexical order.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use emisia_core::model::FactorRecord;
use emisia_core::normalize::{fold_key, fold_region, is_global, normalize_activity_key};
use emisia_core::units::{parse_unit, UnitDef};

use crate::assemble::{self, Alternative, ResolveOutcome, WinnerContext};
use crate::categories::CategoryMap;
use crate::confidence::confidence_for;
use crate::estimate::{EstimateRequest, Estimator, NoEstimator};
use crate::store::FactorStore;

/// The tier of the fallback chain a result was obtained at. Lower is more
/// trustworthy. Serializes as its integer index (0–3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Exact,
    UnitNormalized,
    CategoryProxy,
    Estimated,
}

impl Layer {
    pub fn index(&self) -> u8 {
        match self {
            Self::Exact => 0,
            Self::UnitNormalized => 1,
            Self::CategoryProxy => 2,
            Self::Estimated => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::UnitNormalized => "unit-normalized",
            Self::CategoryProxy => "category-proxy",
            Self::Estimated => "estimated",
        }
    }
}

impl Serialize for Layer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index())
    }
}

/// One resolution request. Region defaults from `EngineConfig` when absent.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub activity_type: String,
    pub quantity: f64,
    pub unit: String,
    pub region: Option<String>,
    pub free_text_context: String,
}

impl ResolveRequest {
    pub fn new(
        activity_type: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            activity_type: activity_type.into(),
            quantity,
            unit: unit.into(),
            region: None,
            free_text_context: String::new(),
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.free_text_context = context.into();
        self
    }
}

/// Explicit engine configuration. The engine reads no environment variables;
/// callers override what they need and pass the rest through `Default`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Region assumed when a request carries none.
    pub default_region: String,

    /// Maximum runner-up alternatives attached to a resolution.
    pub alternatives_cap: usize,

    /// Ratio to the peer median beyond which a winning value is flagged.
    pub outlier_ratio: f64,

    /// Minimum peer count before the outlier check applies.
    pub min_outlier_peers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_region: "India".to_string(),
            alternatives_cap: 3,
            outlier_ratio: 10.0,
            min_outlier_peers: 2,
        }
    }
}

/// The resolution engine. Construct once, share freely: every call is
/// `&self` and the store is immutable behind its `Arc`. Reload by building a
/// new store and a new engine at the composition root.
pub struct Engine {
    store: Arc<FactorStore>,
    categories: CategoryMap,
    estimator: Box<dyn Estimator + Send + Sync>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<FactorStore>) -> Self {
        Self {
            store,
            categories: CategoryMap::with_defaults(),
            estimator: Box::new(NoEstimator),
            config: EngineConfig::default(),
        }
    }

    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_estimator(mut self, estimator: Box<dyn Estimator + Send + Sync>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<FactorStore> {
        &self.store
    }

    /// Resolve one activity measurement to a CO2e mass, or an explicit
    /// failure. Deterministic for a fixed store: identical requests yield
    /// identical results, alternatives order included.
    pub fn resolve(&self, request: &ResolveRequest) -> ResolveOutcome {
        if !request.quantity.is_finite() || request.quantity <= 0.0 {
            return assemble::fail(
                "invalid_quantity",
                format!("quantity must be a positive number, got {}", request.quantity),
                "provide a quantity greater than zero",
            );
        }

        let Some(caller_unit) = parse_unit(&request.unit) else {
            return assemble::fail(
                "unknown_unit",
                format!("unit {:?} is not recognized", request.unit),
                "use a supported unit such as kg, tonne, litre, kwh, km, tonne-km, or passenger-km",
            );
        };

        let activity = normalize_activity_key(&request.activity_type);
        if activity.is_empty() {
            return assemble::fail(
                "invalid_activity",
                format!("activity type {:?} folds to an empty key", request.activity_type),
                "provide a non-empty activity type",
            );
        }

        let region = request
            .region
            .clone()
            .unwrap_or_else(|| self.config.default_region.clone());

        tracing::debug!(
            activity = %activity,
            region = %region,
            unit = caller_unit.canonical,
            "resolving"
        );

        let mut details = Vec::new();
        if activity != fold_key(&request.activity_type) {
            details.push(format!(
                "activity {:?} folded to {:?}",
                request.activity_type, activity
            ));
        }
        if fold_key(&request.unit) != caller_unit.canonical {
            details.push(format!(
                "unit {:?} recognized as {:?}",
                request.unit, caller_unit.canonical
            ));
        }

        // Layers 0 and 1 against the activity itself.
        if let Some(outcome) =
            self.try_database(&activity, &region, request.quantity, &caller_unit, details.clone(), None)
        {
            return outcome;
        }

        // Layer 2 fires only when the activity has no records at all.
        if self.store.lookup_by_activity(&activity).is_empty() {
            if let Some(category) = self.categories.proxy_for(&activity) {
                let mut proxy_details = details.clone();
                proxy_details.push(format!(
                    "no records for {activity:?}; proxied to category {category:?}"
                ));
                if let Some(outcome) = self.try_database(
                    category,
                    &region,
                    request.quantity,
                    &caller_unit,
                    proxy_details,
                    Some(Layer::CategoryProxy),
                ) {
                    return outcome;
                }
            }
        }

        // Layer 3: the external estimator, never cached back into the store.
        tracing::debug!(activity = %activity, "database layers exhausted; consulting estimator");
        let estimate_request = EstimateRequest {
            activity_type: activity.clone(),
            quantity: request.quantity,
            unit: caller_unit.canonical.to_string(),
            region: region.clone(),
            free_text_context: request.free_text_context.clone(),
        };
        if let Some(estimate) = self.estimator.estimate(&estimate_request) {
            if let Some(resolution) = assemble::assemble_estimate(
                request.quantity,
                &caller_unit,
                &region,
                estimate,
                details,
            ) {
                return ResolveOutcome::Resolved(resolution);
            }
        }

        self.exhaustion_failure(&activity, &caller_unit)
    }

    /// Run layers 0 and 1 against one activity key. `force_layer` stamps the
    /// proxy layer onto matches found through a category.
    fn try_database(
        &self,
        activity_key: &str,
        region: &str,
        quantity: f64,
        caller_unit: &UnitDef,
        mut details: Vec<String>,
        force_layer: Option<Layer>,
    ) -> Option<ResolveOutcome> {
        let candidates = self.ranked_candidates(activity_key, region, caller_unit);
        let (winner_idx, natural_layer) = select_layer(&candidates)?;
        let winner = &candidates[winner_idx];
        let layer = force_layer.unwrap_or(natural_layer);

        match natural_layer {
            Layer::Exact => details.push(format!(
                "exact match for {:?} in region {:?}",
                activity_key, winner.record.region
            )),
            _ => details.push(format!(
                "matched {:?} record denominated in {:?} from region {:?}",
                activity_key, winner.record.unit, winner.record.region
            )),
        }

        tracing::debug!(
            layer = layer.as_str(),
            source = %winner.record.source,
            region = %winner.record.region,
            "candidate selected"
        );

        let normalized_quantity = quantity * caller_unit.to_base / winner.unit.to_base;
        let conversion = (caller_unit.canonical != winner.unit.canonical).then(|| {
            (
                caller_unit.canonical.to_string(),
                winner.unit.canonical.to_string(),
            )
        });

        let alternatives = self.alternatives_from(&candidates, winner_idx, layer);
        let ctx = WinnerContext {
            record: winner.record,
            layer,
            normalized_quantity,
            conversion,
        };

        Some(ResolveOutcome::Resolved(assemble::assemble_record(
            &self.store,
            &self.config,
            ctx,
            details,
            alternatives,
        )))
    }

    /// Every record for the activity in the caller's dimension, sorted by the
    /// universal tie-break order.
    fn ranked_candidates<'a>(
        &'a self,
        activity_key: &str,
        region: &str,
        caller_unit: &UnitDef,
    ) -> Vec<Candidate<'a>> {
        let region_folded = fold_region(region);

        let mut candidates: Vec<Candidate<'a>> = self
            .store
            .lookup_by_activity(activity_key)
            .into_iter()
            .filter_map(|record| {
                let unit = parse_unit(&record.unit)?;
                if unit.dimension != caller_unit.dimension {
                    return None;
                }
                let region_rank = if fold_region(&record.region) == region_folded {
                    0
                } else if is_global(&record.region) {
                    1
                } else {
                    2
                };
                Some(Candidate {
                    record,
                    unit,
                    region_rank,
                    unit_exact: unit.canonical == caller_unit.canonical,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.region_rank
                .cmp(&b.region_rank)
                .then(a.record.priority.cmp(&b.record.priority))
                .then(b.record.vintage_year.cmp(&a.record.vintage_year))
                .then(a.record.source.cmp(&b.record.source))
        });

        candidates
    }

    /// Ranked runner-ups, excluding the winner, capped.
    fn alternatives_from(
        &self,
        candidates: &[Candidate<'_>],
        winner_idx: usize,
        layer: Layer,
    ) -> Vec<Alternative> {
        candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != winner_idx)
            .map(|(_, c)| {
                let alt_layer = if layer == Layer::CategoryProxy {
                    Layer::CategoryProxy
                } else if c.unit_exact && c.region_rank <= 1 {
                    Layer::Exact
                } else {
                    Layer::UnitNormalized
                };
                Alternative {
                    factor: c.record.value,
                    factor_unit: c.record.unit.clone(),
                    source: c.record.source.clone(),
                    region: c.record.region.clone(),
                    vintage_year: c.record.vintage_year,
                    layer: alt_layer,
                    confidence: confidence_for(alt_layer, c.record.quality_tier),
                    quality_tier: c.record.quality_tier,
                }
            })
            .take(self.config.alternatives_cap)
            .collect()
    }

    /// Terminal failure: name the cause and suggest a way out.
    fn exhaustion_failure(&self, activity: &str, caller_unit: &UnitDef) -> ResolveOutcome {
        let existing = self.store.lookup_by_activity(activity);
        if !existing.is_empty() {
            let families: BTreeSet<String> = existing
                .iter()
                .filter_map(|r| parse_unit(&r.unit))
                .map(|u| format!("{} (e.g. {})", u.dimension.as_str(), u.canonical))
                .collect();
            let families = families.into_iter().collect::<Vec<_>>().join(", ");
            return assemble::fail(
                "unit_unconvertible",
                format!(
                    "no factor for {:?} is convertible from {:?} ({})",
                    activity,
                    caller_unit.canonical,
                    caller_unit.dimension.as_str()
                ),
                format!("provide the quantity in one of: {families}"),
            );
        }

        assemble::fail(
            "no_match",
            format!("no reference factor at any layer for activity {activity:?}"),
            "specify a more specific activity type or extend the reference dataset",
        )
    }
}

/// One eligible record, annotated for ranking.
struct Candidate<'a> {
    record: &'a FactorRecord,
    unit: UnitDef,
    /// 0 = caller's region, 1 = Global, 2 = some other region.
    region_rank: u8,
    unit_exact: bool,
}

/// Pick the winning candidate and the layer it was found at. Candidates are
/// already in tie-break order, so the first hit of each probe wins.
fn select_layer(candidates: &[Candidate<'_>]) -> Option<(usize, Layer)> {
    // Layer 0: unit-exact in the caller's region, then unit-exact in Global.
    if let Some(i) = candidates
        .iter()
        .position(|c| c.unit_exact && c.region_rank == 0)
    {
        return Some((i, Layer::Exact));
    }
    if let Some(i) = candidates
        .iter()
        .position(|c| c.unit_exact && c.region_rank == 1)
    {
        return Some((i, Layer::Exact));
    }

    // Layer 1: best remaining same-dimension candidate.
    if !candidates.is_empty() {
        return Some((0, Layer::UnitNormalized));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(records: Vec<FactorRecord>) -> Engine {
        Engine::new(Arc::new(FactorStore::load(records).unwrap()))
    }

    #[test]
    fn layer_indices_are_stable() {
        assert_eq!(Layer::Exact.index(), 0);
        assert_eq!(Layer::UnitNormalized.index(), 1);
        assert_eq!(Layer::CategoryProxy.index(), 2);
        assert_eq!(Layer::Estimated.index(), 3);
    }

    #[test]
    fn non_positive_quantity_fails_up_front() {
        let e = engine(vec![FactorRecord::new("diesel", "India", "litre", 2.64)]);
        let outcome = e.resolve(&ResolveRequest::new("diesel", 0.0, "litre"));
        assert_eq!(outcome.failure().unwrap().error, "invalid_quantity");

        let outcome = e.resolve(&ResolveRequest::new("diesel", f64::NAN, "litre"));
        assert_eq!(outcome.failure().unwrap().error, "invalid_quantity");
    }

    #[test]
    fn unknown_unit_fails_with_suggestion() {
        let e = engine(vec![FactorRecord::new("diesel", "India", "litre", 2.64)]);
        let outcome = e.resolve(&ResolveRequest::new("diesel", 10.0, "parsec"));
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.error, "unknown_unit");
        assert!(failure.suggestion.contains("litre"));
    }

    #[test]
    fn region_falls_back_to_global_within_layer_zero() {
        let e = engine(vec![FactorRecord::new("diesel", "Global", "litre", 2.67)
            .source("GenericDB")
            .priority(3)]);
        let outcome = e.resolve(&ResolveRequest::new("diesel", 10.0, "litre").region("India"));
        let r = outcome.resolution().unwrap();
        assert_eq!(r.layer, Layer::Exact);
        assert_eq!(r.region, "Global");
    }

    #[test]
    fn other_region_record_matches_at_unit_normalized_layer() {
        let e = engine(vec![FactorRecord::new("diesel", "Brazil", "litre", 2.60)
            .source("BR-DB")]);
        let outcome = e.resolve(&ResolveRequest::new("diesel", 10.0, "litre").region("India"));
        let r = outcome.resolution().unwrap();
        assert_eq!(r.layer, Layer::UnitNormalized);
        // spelled-equal units never trigger a conversion warning
        assert!(r.validation_warnings.is_empty());
    }

    #[test]
    fn default_region_comes_from_config() {
        let e = engine(vec![
            FactorRecord::new("electricity", "India", "kwh", 0.71).source("CEA"),
            FactorRecord::new("electricity", "Global", "kwh", 0.48).source("GenericDB"),
        ]);
        let outcome = e.resolve(&ResolveRequest::new("electricity", 100.0, "kwh"));
        let r = outcome.resolution().unwrap();
        assert_eq!(r.region, "India");
    }

    #[test]
    fn proxy_layer_is_skipped_when_activity_has_any_record() {
        // r134a has a (wrong-dimension) record, so the proxy must not fire
        // and resolution falls through to exhaustion.
        let e = engine(vec![
            FactorRecord::new("r134a", "Global", "kg", 1430.0).source("AR5"),
            FactorRecord::new("refrigerant_leak_generic", "Global", "kg", 2000.0).source("AR5"),
        ]);
        let outcome = e.resolve(&ResolveRequest::new("r134a", 10.0, "litre"));
        assert_eq!(outcome.failure().unwrap().error, "unit_unconvertible");
    }

    #[test]
    fn alternatives_respect_the_cap() {
        let records = (0..6)
            .map(|i| {
                FactorRecord::new("diesel", "Global", "litre", 2.6 + i as f64 * 0.01)
                    .source(format!("src-{i}"))
                    .priority(i)
            })
            .collect();
        let e = engine(records);
        let outcome = e.resolve(&ResolveRequest::new("diesel", 1.0, "litre"));
        assert_eq!(outcome.resolution().unwrap().alternatives.len(), 3);
    }
}
