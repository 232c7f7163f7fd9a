//! Unit table and dimension-safe conversion for EMISIA.
//!
//! Emission factors are denominated per unit of activity across several
//! physical dimensions (mass, volume, energy, distance, and the compound
//! freight/passenger distance units). Conversion is only ever linear and only
//! ever within one dimension; a cross-dimension request (litres to kilograms)
//! is an error, never a guessed density.
//!
//! Requirements:
//! - every supported spelling folds to exactly one canonical unit
//! - every successful conversion is reversible within float tolerance
//! - no scaling factor is ever dropped silently

use serde::{Deserialize, Serialize};

use crate::errors::{EmisiaError, EmisiaResult};
use crate::normalize::fold_key;

/// Physical dimension of a unit. Conversions never cross dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Mass,
    Volume,
    Energy,
    Distance,
    FreightDistance,
    PassengerDistance,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mass => "mass",
            Self::Volume => "volume",
            Self::Energy => "energy",
            Self::Distance => "distance",
            Self::FreightDistance => "freight-distance",
            Self::PassengerDistance => "passenger-distance",
        }
    }

    /// Canonical base unit the dimension's scale factors are expressed in.
    pub fn base_unit(&self) -> &'static str {
        match self {
            Self::Mass => "kg",
            Self::Volume => "litre",
            Self::Energy => "kwh",
            Self::Distance => "km",
            Self::FreightDistance => "tonne_km",
            Self::PassengerDistance => "passenger_km",
        }
    }
}

/// A resolved unit: canonical spelling, dimension, and scale to the
/// dimension's base unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitDef {
    pub canonical: &'static str,
    pub dimension: Dimension,
    /// How many base units one of this unit is worth.
    pub to_base: f64,
}

/// Resolve a caller-supplied unit spelling to its definition.
///
/// Spellings fold through the same rules as activity keys, so `"Litre"`,
/// `" liter "`, and `"L"` all resolve to the canonical `litre`.
pub fn parse_unit(input: &str) -> Option<UnitDef> {
    let folded = fold_key(input);
    let (canonical, dimension, to_base) = match folded.as_str() {
        // Mass
        "kg" | "kilogram" | "kilograms" => ("kg", Dimension::Mass, 1.0),
        "g" | "gram" | "grams" => ("g", Dimension::Mass, 1e-3),
        "tonne" | "tonnes" | "t" | "metric_ton" | "metric_tonne" => {
            ("tonne", Dimension::Mass, 1000.0)
        }
        "lb" | "lbs" | "pound" | "pounds" => ("lb", Dimension::Mass, 0.453_592_37),

        // Volume
        "litre" | "litres" | "liter" | "liters" | "l" => ("litre", Dimension::Volume, 1.0),
        "ml" | "millilitre" | "milliliter" => ("ml", Dimension::Volume, 1e-3),
        "m3" | "cubic_metre" | "cubic_meter" | "scm" => ("m3", Dimension::Volume, 1000.0),
        "gallon" | "gallons" | "gal" | "us_gallon" => {
            ("gallon", Dimension::Volume, 3.785_411_784)
        }

        // Energy
        "kwh" | "kilowatt_hour" | "kilowatt_hours" => ("kwh", Dimension::Energy, 1.0),
        "wh" | "watt_hour" => ("wh", Dimension::Energy, 1e-3),
        "mwh" | "megawatt_hour" => ("mwh", Dimension::Energy, 1000.0),
        "gwh" => ("gwh", Dimension::Energy, 1e6),
        "mj" | "megajoule" | "megajoules" => ("mj", Dimension::Energy, 1.0 / 3.6),
        "gj" | "gigajoule" | "gigajoules" => ("gj", Dimension::Energy, 1000.0 / 3.6),
        "therm" | "therms" => ("therm", Dimension::Energy, 29.3071),

        // Distance
        "km" | "kilometre" | "kilometres" | "kilometer" | "kilometers" => {
            ("km", Dimension::Distance, 1.0)
        }
        "m" | "metre" | "meter" => ("m", Dimension::Distance, 1e-3),
        "mile" | "miles" | "mi" => ("mile", Dimension::Distance, 1.609_344),

        // Freight distance
        "tonne_km" | "t_km" | "tkm" | "ton_km" | "tonne_kilometre" => {
            ("tonne_km", Dimension::FreightDistance, 1.0)
        }
        "tonne_mile" | "t_mi" => ("tonne_mile", Dimension::FreightDistance, 1.609_344),

        // Passenger distance
        "passenger_km" | "pkm" | "p_km" | "passenger_kilometre" => {
            ("passenger_km", Dimension::PassengerDistance, 1.0)
        }
        "passenger_mile" | "p_mi" => {
            ("passenger_mile", Dimension::PassengerDistance, 1.609_344)
        }

        _ => return None,
    };

    Some(UnitDef {
        canonical,
        dimension,
        to_base,
    })
}

/// Whether two units share a dimension (and are therefore convertible).
pub fn same_dimension(a: &UnitDef, b: &UnitDef) -> bool {
    a.dimension == b.dimension
}

/// Convert a quantity between two units of the same dimension.
///
/// Cross-dimension requests are rejected rather than guessed; the engine
/// surfaces that rejection to callers with a usable suggestion.
pub fn convert(quantity: f64, from: &UnitDef, to: &UnitDef) -> EmisiaResult<f64> {
    if !same_dimension(from, to) {
        return Err(EmisiaError::invalid_argument(format!(
            "cannot convert {} ({}) to {} ({}): different dimensions",
            from.canonical,
            from.dimension.as_str(),
            to.canonical,
            to.dimension.as_str()
        )));
    }
    Ok(quantity * from.to_base / to.to_base)
}
