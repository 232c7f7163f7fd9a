//! The fixed confidence mapping.
//!
//! Confidence is derived from `(layer, quality tier)` alone. The mapping is a
//! constant table, not a tunable model:
//! - confidence strictly decreases as the layer number increases, for any
//!   fixed tier
//! - within a layer, the authoritative tier never scores below the industry
//!   or generic tiers
//! - every category-proxy score sits below every exact and unit-normalized
//!   score, regardless of the underlying record's own tier
//! - estimated results always land on the lowest tier

use emisia_core::model::QualityTier;

use crate::resolve::Layer;

/// Confidence for a result found at `layer` backed by a record of `tier`.
pub fn confidence_for(layer: Layer, tier: QualityTier) -> f64 {
    let base = match layer {
        Layer::Exact => 0.95,
        Layer::UnitNormalized => 0.80,
        Layer::CategoryProxy => 0.55,
        Layer::Estimated => 0.30,
    };

    let tier_penalty = match tier {
        QualityTier::Authoritative => 0.0,
        QualityTier::IndustryFramework => 0.05,
        QualityTier::GenericGlobal => 0.10,
    };

    base - tier_penalty
}
