//! The estimation adapter seam.
//!
//! Layer 3 is the only place the engine touches an external capability. The
//! `Estimator` trait isolates that capability's transport, authentication,
//! and response format behind one call, so the resolver depends on none of
//! them. A malformed, missing, or non-positive answer is `None`, never a
//! numeric value of zero, and estimates are never written back into the
//! factor store.

use serde::{Deserialize, Serialize};

#[cfg(feature = "http-estimator")]
pub mod http;

#[cfg(feature = "http-estimator")]
pub use http::HttpEstimator;

/// What the resolver knows when it asks for an estimate.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateRequest {
    pub activity_type: String,
    pub quantity: f64,
    pub unit: String,
    pub region: String,
    pub free_text_context: String,
}

/// A plausible factor proposed by the external capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedFactor {
    /// Kilograms of CO2e per one `unit` of activity. Must be finite and
    /// positive to be usable.
    pub value: f64,

    /// Unit the estimate is denominated per. Defaults to the caller's unit
    /// when absent.
    #[serde(default)]
    pub unit: Option<String>,

    /// Attribution label for the estimate.
    #[serde(default)]
    pub source: Option<String>,

    /// Free-text reasoning, carried into the audit trail.
    #[serde(default)]
    pub rationale: Option<String>,
}

impl EstimatedFactor {
    /// Whether the proposed value is usable at all. Zero and below are
    /// indistinguishable from a fabricated answer and are discarded.
    pub fn is_usable(&self) -> bool {
        self.value.is_finite() && self.value > 0.0
    }
}

/// The one seam to the external estimation capability.
///
/// Implementations own their transport and their timeout; a timed-out or
/// failed request must surface as `None`, identical to "no response".
pub trait Estimator {
    fn estimate(&self, request: &EstimateRequest) -> Option<EstimatedFactor>;
}

/// Default estimator: the capability is absent, Layer 3 always comes up
/// empty and resolution falls through to the terminal failure path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEstimator;

impl Estimator for NoEstimator {
    fn estimate(&self, _request: &EstimateRequest) -> Option<EstimatedFactor> {
        None
    }
}
