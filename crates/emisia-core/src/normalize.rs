//! Deterministic key normalization for EMISIA.
//!
//! Caller input arrives in messy shapes ("Diesel ", "diesel fuel", "PETROL").
//! Reference records are indexed by a folded form of the activity name, and
//! every caller-facing lookup folds through the same rules, so that identical
//! logical names always hit the same index entry.
//!
//! Rules:
//! - lowercase ASCII
//! - runs of non-alphanumeric characters collapse to a single underscore
//! - leading/trailing underscores are trimmed
//! - a small synonym table folds common aliases onto one canonical key
//!
//! These utilities are purely in-memory and intentionally conservative.

use crate::GLOBAL_REGION;

/// Fold a free-form name into its index form.
///
/// `"  Freight Truck (Heavy) "` becomes `"freight_truck_heavy"`.
pub fn fold_key(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for ch in input.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Fold an activity name and apply the synonym table.
pub fn normalize_activity_key(input: &str) -> String {
    let folded = fold_key(input);
    match canonical_synonym(&folded) {
        Some(canonical) => canonical.to_string(),
        None => folded,
    }
}

/// Canonical key for a known alias, if any.
///
/// The table only folds spellings of the *same* activity. It never maps an
/// activity onto a broader category; that is the proxy layer's job.
pub fn canonical_synonym(folded: &str) -> Option<&'static str> {
    Some(match folded {
        "petrol" | "motor_spirit" | "petrol_fuel" => "gasoline",
        "diesel_fuel" | "gas_oil" | "derv" => "diesel",
        "power" | "grid_electricity" | "electricity_consumption" | "purchased_electricity" => {
            "electricity"
        }
        "png" | "piped_natural_gas" | "natural_gas_consumption" => "natural_gas",
        "hgv" | "lorry" | "heavy_goods_vehicle" => "freight_truck_heavy",
        "jet_a1" | "aviation_turbine_fuel" | "atf" => "jet_fuel",
        _ => return None,
    })
}

/// Fold a region name for index comparisons. Display strings keep their
/// original casing; only lookups go through this form.
pub fn fold_region(input: &str) -> String {
    fold_key(input)
}

/// Whether a region string denotes the universal fallback region.
pub fn is_global(region: &str) -> bool {
    fold_region(region) == fold_region(GLOBAL_REGION)
}
