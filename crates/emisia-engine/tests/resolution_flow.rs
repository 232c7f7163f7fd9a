//! resolution_flow.rs
//!
//! Cross-component resolution tests:
//! - the documented India/Global reference scenario
//! - determinism (same store, same request => byte-identical output)
//! - tie-break totality across vintage and source
//! - layer fallback, proxy, and estimation behavior
//! - explicit failure instead of fabricated zeros

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use emisia_core::model::{FactorRecord, QualityTier};
use emisia_engine::confidence::confidence_for;
use emisia_engine::estimate::{EstimateRequest, EstimatedFactor, Estimator};
use emisia_engine::{Engine, FactorStore, Layer, ResolveRequest};

fn engine(records: Vec<FactorRecord>) -> Engine {
    Engine::new(Arc::new(FactorStore::load(records).unwrap()))
}

/// Estimator stub with a canned answer and a consultation flag.
struct CannedEstimator {
    answer: Option<EstimatedFactor>,
    consulted: AtomicBool,
}

impl CannedEstimator {
    fn new(answer: Option<EstimatedFactor>) -> Self {
        Self {
            answer,
            consulted: AtomicBool::new(false),
        }
    }
}

impl Estimator for CannedEstimator {
    fn estimate(&self, _request: &EstimateRequest) -> Option<EstimatedFactor> {
        self.consulted.store(true, Ordering::SeqCst);
        self.answer.clone()
    }
}

fn diesel_india_and_global() -> Vec<FactorRecord> {
    vec![
        FactorRecord::new("diesel", "India", "litre", 2.64)
            .source("CEA")
            .vintage(2023)
            .priority(1)
            .tier(QualityTier::Authoritative),
        FactorRecord::new("diesel", "Global", "litre", 2.67)
            .source("GenericDB")
            .vintage(2022)
            .priority(3)
            .tier(QualityTier::GenericGlobal),
    ]
}

#[test]
fn india_record_beats_global_and_global_is_sole_alternative() {
    let e = engine(diesel_india_and_global());
    let outcome = e.resolve(&ResolveRequest::new("diesel", 100.0, "litre").region("India"));

    let r = outcome.resolution().expect("must resolve");
    assert!((r.co2e_mass_kg - 264.0).abs() < 1e-9);
    assert_eq!(r.layer, Layer::Exact);
    assert_eq!(r.source, "CEA");
    assert_eq!(r.alternatives.len(), 1);
    assert_eq!(r.alternatives[0].source, "GenericDB");
    assert!((r.alternatives[0].factor - 2.67).abs() < 1e-12);
}

#[test]
fn identical_requests_yield_byte_identical_results() {
    let e = engine(diesel_india_and_global());
    let request = ResolveRequest::new("diesel", 100.0, "litre").region("India");

    let first = serde_json::to_string(&e.resolve(&request)).unwrap();
    let second = serde_json::to_string(&e.resolve(&request)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn newer_vintage_wins_among_equal_priority() {
    let e = engine(vec![
        FactorRecord::new("electricity", "India", "kwh", 0.73)
            .source("CEA")
            .vintage(2021)
            .priority(1),
        FactorRecord::new("electricity", "India", "kwh", 0.71)
            .source("CEA")
            .vintage(2023)
            .priority(1),
    ]);

    let outcome = e.resolve(&ResolveRequest::new("electricity", 1.0, "kwh").region("India"));
    let r = outcome.resolution().unwrap();
    assert_eq!(r.vintage_year, Some(2023));
    assert!((r.factor_used - 0.71).abs() < 1e-12);
}

#[test]
fn source_lexical_order_breaks_remaining_ties() {
    let e = engine(vec![
        FactorRecord::new("electricity", "India", "kwh", 0.73)
            .source("zeta-db")
            .vintage(2023)
            .priority(1),
        FactorRecord::new("electricity", "India", "kwh", 0.71)
            .source("alpha-db")
            .vintage(2023)
            .priority(1),
    ]);

    let outcome = e.resolve(&ResolveRequest::new("electricity", 1.0, "kwh").region("India"));
    assert_eq!(outcome.resolution().unwrap().source, "alpha-db");
}

#[test]
fn unit_normalized_match_converts_and_warns() {
    let e = engine(vec![FactorRecord::new("coal", "Global", "kg", 2.42)
        .source("IPCC")
        .vintage(2019)]);

    let outcome = e.resolve(&ResolveRequest::new("coal", 2.0, "tonne").region("India"));
    let r = outcome.resolution().unwrap();

    assert_eq!(r.layer, Layer::UnitNormalized);
    assert!((r.co2e_mass_kg - 2.0 * 1000.0 * 2.42).abs() < 1e-6);
    assert!(r.validation_warnings.iter().any(|w| w.code == "unit.converted"));
    assert!(r
        .match_details
        .iter()
        .any(|d| d.contains("tonne") && d.contains("kg")));
}

#[test]
fn unknown_refrigerant_proxies_to_generic_category() {
    let e = engine(vec![FactorRecord::new(
        "refrigerant_leak_generic",
        "Global",
        "kg",
        1800.0,
    )
    .source("AR5")
    .vintage(2014)
    .tier(QualityTier::IndustryFramework)]);

    let outcome = e.resolve(&ResolveRequest::new("R407C", 2.0, "kg").region("India"));
    let r = outcome.resolution().unwrap();

    assert_eq!(r.layer, Layer::CategoryProxy);
    assert!((r.co2e_mass_kg - 3600.0).abs() < 1e-9);
    // proxy confidence sits below every exact/unit-normalized score
    assert!(r.confidence < confidence_for(Layer::UnitNormalized, QualityTier::GenericGlobal));
    assert!(r.match_details.iter().any(|d| d.contains("proxied")));
}

#[test]
fn no_silent_zero_when_estimator_is_silent() {
    let estimator = Box::new(CannedEstimator::new(None));
    let e = engine(vec![FactorRecord::new("diesel", "India", "litre", 2.64)])
        .with_estimator(estimator);

    let outcome = e.resolve(&ResolveRequest::new("unobtainium_smelting", 5.0, "kg"));
    assert!(outcome.resolution().is_none(), "must not fabricate a mass");

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.error, "no_match");
    assert!(!failure.suggestion.is_empty());
}

#[test]
fn cross_dimension_request_fails_at_unit_eligibility() {
    let e = engine(vec![FactorRecord::new("diesel", "Global", "kg", 3.17)
        .source("IPCC")]);

    let outcome = e.resolve(&ResolveRequest::new("diesel", 10.0, "litre"));
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.error, "unit_unconvertible");
    assert!(failure.suggestion.contains("mass"));
}

#[test]
fn estimator_is_not_consulted_when_database_matches() {
    let estimator = CannedEstimator::new(Some(EstimatedFactor {
        value: 99.0,
        unit: None,
        source: None,
        rationale: None,
    }));
    let consulted = Arc::new(estimator);

    struct Shared(Arc<CannedEstimator>);
    impl Estimator for Shared {
        fn estimate(&self, request: &EstimateRequest) -> Option<EstimatedFactor> {
            self.0.estimate(request)
        }
    }

    let e = engine(diesel_india_and_global())
        .with_estimator(Box::new(Shared(Arc::clone(&consulted))));

    let outcome = e.resolve(&ResolveRequest::new("diesel", 10.0, "litre").region("India"));
    assert_eq!(outcome.resolution().unwrap().layer, Layer::Exact);
    assert!(!consulted.consulted.load(Ordering::SeqCst));
}

#[test]
fn estimate_carries_lowest_tier_and_enters_no_store() {
    let estimator = Box::new(CannedEstimator::new(Some(EstimatedFactor {
        value: 4.5,
        unit: Some("kg".to_string()),
        source: Some("llm".to_string()),
        rationale: Some("closest analogous process".to_string()),
    })));
    let e = engine(Vec::new()).with_estimator(estimator);
    let records_before = e.store().len();

    let outcome = e.resolve(
        &ResolveRequest::new("unobtainium_smelting", 2.0, "kg")
            .region("India")
            .context("smelter stack, annual total"),
    );
    let r = outcome.resolution().unwrap();

    assert_eq!(r.layer, Layer::Estimated);
    assert_eq!(r.quality_tier, QualityTier::GenericGlobal);
    assert!((r.co2e_mass_kg - 9.0).abs() < 1e-12);
    assert_eq!(r.source, "llm");
    assert!(r.vintage_year.is_none());
    assert!(r
        .validation_warnings
        .iter()
        .any(|w| w.code == "factor.estimated"));

    // estimates are never cached into the reference data
    assert_eq!(e.store().len(), records_before);
    let again = e.resolve(&ResolveRequest::new("unobtainium_smelting", 2.0, "kg"));
    assert_eq!(again.resolution().unwrap().layer, Layer::Estimated);
}

#[test]
fn gas_breakdown_scales_with_quantity() {
    let e = engine(vec![FactorRecord::new("diesel", "India", "litre", 2.68)
        .source("CEA")
        .gas(2.60, 0.05, 0.03)]);

    let outcome = e.resolve(&ResolveRequest::new("diesel", 100.0, "litre").region("India"));
    let r = outcome.resolution().unwrap();
    let gas = r.gas_breakdown.unwrap();
    assert!((gas.co2 - 260.0).abs() < 1e-9);
    assert!((gas.total() - r.co2e_mass_kg).abs() < 1e-6);
}
