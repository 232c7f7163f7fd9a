//! emisia-engine
//!
//! The EMISIA resolution engine:
//! - `store`: immutable, indexed factor store built once from reference records
//! - `resolve`: the layered resolver (exact, unit-normalized, category proxy,
//!   estimated) with deterministic tie-breaking
//! - `confidence`: the fixed `(layer, quality tier)` confidence mapping
//! - `assemble`: result assembly: CO2e math, warnings, ranked alternatives
//! - `categories`: the declared activity-to-category proxy map
//! - `estimate`: the estimation adapter seam, with an HTTP implementation
//!   behind the `http-estimator` feature
//!
//! The engine is library-shaped: no listener, no on-disk state, no logs beyond
//! `tracing` instrumentation. After construction every call is `&self`; the
//! store sits behind an `Arc`, and reload is "build a new store, swap the
//! reference" at the composition root, so the read path needs no locks.

pub mod assemble;
pub mod categories;
pub mod confidence;
pub mod estimate;
pub mod resolve;
pub mod store;

pub use crate::assemble::{
    Alternative, Resolution, ResolutionFailure, ResolveOutcome, ValidationWarning,
};
pub use crate::resolve::{Engine, EngineConfig, Layer, ResolveRequest};
pub use crate::store::FactorStore;

/// Convenience re-exports.
pub mod prelude {
    pub use crate::assemble::{Resolution, ResolutionFailure, ResolveOutcome};
    pub use crate::categories::CategoryMap;
    pub use crate::estimate::{EstimateRequest, EstimatedFactor, Estimator, NoEstimator};
    pub use crate::resolve::{Engine, EngineConfig, Layer, ResolveRequest};
    pub use crate::store::FactorStore;
    pub use emisia_core::prelude::*;
}
