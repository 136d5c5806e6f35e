//! Conversion between SBML `<unitDefinition>` elements and [`UnitDefinition`].
//!
//! Unit kinds are checked against the base units of SBML Levels 1 to 3. `liter` and
//! `meter` are accepted as the American spellings of `litre` and `metre`.

use crate::{
    network::units::{Unit, UnitDefinition},
    sbml::{error::SBMLError, xml::XmlElement},
};

/// Base unit kinds known to SBML.
pub const UNIT_KINDS: &[&str] = &[
    "ampere",
    "avogadro",
    "becquerel",
    "candela",
    "celsius",
    "coulomb",
    "dimensionless",
    "farad",
    "gram",
    "gray",
    "henry",
    "hertz",
    "item",
    "joule",
    "katal",
    "kelvin",
    "kilogram",
    "liter",
    "litre",
    "lumen",
    "lux",
    "meter",
    "metre",
    "mole",
    "newton",
    "ohm",
    "pascal",
    "radian",
    "second",
    "siemens",
    "sievert",
    "steradian",
    "tesla",
    "volt",
    "watt",
    "weber",
];

/// Converts an SBML `<unitDefinition>` into a [`UnitDefinition`].
///
/// The id is taken as written; decoding it is up to the caller.
///
/// # Errors
///
/// Returns an `SBMLError` if any of the base units cannot be converted.
impl TryFrom<&XmlElement> for UnitDefinition {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        let units = element
            .child("listOfUnits")
            .map(|list| {
                list.children_named("unit")
                    .map(Unit::try_from)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(UnitDefinition {
            id: element.attr_local("id").unwrap_or_default().to_string(),
            name: element.attr_local("name").unwrap_or_default().to_string(),
            units,
        })
    }
}

/// Converts an SBML `<unit>` into a [`Unit`].
///
/// Missing attributes take the SBML Level 2 defaults.
///
/// # Errors
///
/// Returns `SBMLError::InvalidUnitKind` if the kind is not an SBML base unit.
impl TryFrom<&XmlElement> for Unit {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        let kind = element.attr_local("kind").unwrap_or_default();
        let kind = match kind {
            "liter" => "litre",
            "meter" => "metre",
            other => other,
        };
        if !UNIT_KINDS.contains(&kind) {
            return Err(SBMLError::InvalidUnitKind(kind.to_string()));
        }

        let number = |name: &str, default: f64| {
            element
                .attr_local(name)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(default)
        };

        Ok(Unit {
            kind: kind.to_string(),
            exponent: number("exponent", 1.0),
            scale: number("scale", 0.0) as i32,
            multiplier: number("multiplier", 1.0),
        })
    }
}

/// Builds the `<unitDefinition>` element of a unit definition.
pub fn unit_definition_to_xml(unit_definition: &UnitDefinition, level: u32) -> XmlElement {
    let mut element = XmlElement::new("unitDefinition").with_attr("id", &unit_definition.id);
    if !unit_definition.name.is_empty() {
        element.set_attr("name", &unit_definition.name);
    }

    if unit_definition.units.is_empty() {
        return element;
    }

    let mut list = XmlElement::new("listOfUnits");
    for unit in &unit_definition.units {
        let mut child = XmlElement::new("unit")
            .with_attr("kind", &unit.kind)
            .with_attr("exponent", format_number(unit.exponent))
            .with_attr("scale", unit.scale.to_string());
        if level >= 2 || unit.multiplier != 1.0 {
            child.set_attr("multiplier", format_number(unit.multiplier));
        }
        list.push_child(child);
    }
    element.push_child(list);
    element
}

/// Formats a number the way SBML tools usually write it (`1` rather than `1.0`).
pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::sbml::xml::parse_document;

    /// Creates a Molar unit (mole per liter) and verifies all properties
    #[test]
    fn test_unit_definition_from_xml() {
        let element = parse_document(
            r#"<unitDefinition id="M" name="Molar">
                 <listOfUnits>
                   <unit kind="mole" exponent="1" scale="0" multiplier="1"/>
                   <unit kind="liter" exponent="-1"/>
                 </listOfUnits>
               </unitDefinition>"#,
        )
        .unwrap();

        let unit = UnitDefinition::try_from(&element).unwrap();
        assert_eq!(unit.id, "M");
        assert_eq!(unit.name, "Molar");
        assert_eq!(unit.units.len(), 2);
        assert_eq!(unit.units[1].kind, "litre");
        assert_relative_eq!(unit.units[1].exponent, -1.0);
        assert_relative_eq!(unit.units[1].multiplier, 1.0);
    }

    #[test]
    fn test_invalid_unit_kind() {
        let element =
            parse_document(r#"<unit kind="furlong" exponent="1"/>"#).unwrap();
        let result = Unit::try_from(&element);
        assert!(matches!(result, Err(SBMLError::InvalidUnitKind(kind)) if kind == "furlong"));
    }

    #[test]
    fn test_unit_definition_to_xml_round_trip() {
        let flux = UnitDefinition::flux_default();
        let element = unit_definition_to_xml(&flux, 3);
        let parsed = UnitDefinition::try_from(&element).unwrap();
        assert_eq!(parsed, flux);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1000.0), "1000");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(f64::INFINITY), "INF");
    }
}
