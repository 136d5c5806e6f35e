//! Unit definitions.
//!
//! Units follow the SBML model: a [`UnitDefinition`] is a product of [`Unit`]s, each being
//! `(multiplier * 10^scale * kind)^exponent`.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Id of the conventional flux unit of constraint-based models.
pub const FLUX_UNIT_ID: &str = "mmol_per_gDW_per_hr";

/// Legacy id under which some exporters store the flux unit.
pub const LEGACY_FLUX_UNIT_ID: &str = "FLUX_UNIT";

/// A single factor of a unit definition.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, PartialEq)]
pub struct Unit {
    /// SBML base unit kind, e.g. `mole` or `second`.
    #[builder(setter(into))]
    pub kind: String,

    #[serde(default = "one")]
    #[builder(default = "1.0")]
    pub exponent: f64,

    #[serde(default)]
    #[builder(default)]
    pub scale: i32,

    #[serde(default = "one")]
    #[builder(default = "1.0")]
    pub multiplier: f64,
}

fn one() -> f64 {
    1.0
}

impl Unit {
    pub fn new(kind: impl Into<String>, exponent: f64, scale: i32, multiplier: f64) -> Self {
        Self {
            kind: kind.into(),
            exponent,
            scale,
            multiplier,
        }
    }
}

/// A named, ordered product of units.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
pub struct UnitDefinition {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub name: String,

    #[serde(default)]
    #[builder(default, setter(into, each(name = "unit")))]
    pub units: Vec<Unit>,
}

impl UnitDefinition {
    /// The default flux unit, millimoles per gram dry weight per hour.
    pub fn flux_default() -> Self {
        Self {
            id: FLUX_UNIT_ID.to_string(),
            name: "mmol per gDW per hr".to_string(),
            units: vec![
                Unit::new("mole", 1.0, -3, 1.0),
                Unit::new("gram", -1.0, 0, 1.0),
                Unit::new("second", -1.0, 0, 3600.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_default() {
        let unit = UnitDefinition::flux_default();
        assert_eq!(unit.id, FLUX_UNIT_ID);
        assert_eq!(unit.units.len(), 3);
        assert_eq!(unit.units[0].scale, -3);
        assert_eq!(unit.units[2].multiplier, 3600.0);
    }

    #[test]
    fn test_unit_definition_builder() {
        let molar = UnitDefinitionBuilder::default()
            .id("M")
            .name("molar")
            .unit(Unit::new("mole", 1.0, 0, 1.0))
            .unit(Unit::new("litre", -1.0, 0, 1.0))
            .build()
            .expect("Failed to build unit definition");

        assert_eq!(molar.units.len(), 2);
        assert_eq!(molar.units[1].exponent, -1.0);
    }
}
