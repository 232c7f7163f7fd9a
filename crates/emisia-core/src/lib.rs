//! emisia-core
//!
//! Core primitives for EMISIA:
//! - Factor record model (activity identity, region, unit, value, provenance)
//! - Quality tiers and gas-species breakdowns
//! - Deterministic activity/region key normalization
//! - Fixed unit table with dimension-safe conversions
//! - Shared error types
//!
//! The core crate does not do network or filesystem I/O, does not read
//! environment variables, and never consults the system clock. Higher-level
//! crates perform I/O and pass records and requests in.

pub mod errors;
pub mod model;
pub mod normalize;
pub mod units;

pub use crate::errors::{EmisiaError, EmisiaResult};

/// The distinguished region that acts as the universal fallback.
pub const GLOBAL_REGION: &str = "Global";

/// Relative tolerance within which a gas breakdown must sum to the record value.
pub const GAS_SUM_REL_TOL: f64 = 1e-3;

/// Convenience re-exports.
pub mod prelude {
    pub use crate::model::{FactorRecord, GasBreakdown, QualityTier};
    pub use crate::normalize::{fold_key, fold_region, is_global, normalize_activity_key};
    pub use crate::units::{convert, parse_unit, same_dimension, Dimension, UnitDef};
    pub use crate::{EmisiaError, EmisiaResult, GLOBAL_REGION};
}
