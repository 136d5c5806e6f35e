//! Reaction equations such as `2 h2o2[c] -> 2 h2o[c] + o2[c]`.
//!
//! An equation is a list of terms on each side of an arrow. A term is an optional
//! stoichiometric coefficient followed by a metabolite id, optionally suffixed by a
//! compartment in brackets. A compartment in brackets followed by a colon at the start of
//! the equation (`[c] : glc + atp -> g6p + adp`) applies to every term without its own.

use std::fmt::Write;

use crate::{
    network::entity::{Participant, Reaction},
    tabular::{config::TabularConfig, error::TabularError},
};

/// Sides and direction of a parsed equation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEquation {
    pub left: Vec<Participant>,
    pub right: Vec<Participant>,
    pub reversible: bool,
}

/// Splits a trailing compartment suffix off a term.
fn split_compartment<'a>(term: &'a str, config: &TabularConfig) -> (&'a str, Option<&'a str>) {
    let (open, close) = config.compartment_brackets;
    let Some(inner) = term.strip_suffix(close) else {
        return (term, None);
    };

    match inner.rfind(open) {
        Some(position) => {
            let compartment = inner[position + open.len_utf8()..].trim();
            let id = inner[..position].trim();
            if compartment.is_empty() || id.is_empty() {
                (term, None)
            } else {
                (id, Some(compartment))
            }
        }
        None => (term, None),
    }
}

fn parse_coefficient(token: &str) -> Option<f64> {
    let token = token
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(token);
    token.parse::<f64>().ok().filter(|c| c.is_finite() && *c > 0.0)
}

fn parse_side(
    side: &str,
    default_compartment: &str,
    config: &TabularConfig,
) -> Vec<Participant> {
    side.split(" + ")
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| {
            let (coefficient, rest) = match term.split_once(char::is_whitespace) {
                Some((first, rest)) => match parse_coefficient(first) {
                    Some(coefficient) => (coefficient, rest.trim()),
                    None => (1.0, term),
                },
                None => (1.0, term),
            };

            let (id, compartment) = split_compartment(rest, config);
            let compartment = compartment.unwrap_or(default_compartment);
            Participant {
                species: config.metabolite_id(id, compartment),
                coefficient,
                compartment: Some(compartment.to_string()),
            }
        })
        .collect()
}

/// Parses a reaction equation.
///
/// The reversible arrow is looked for first, then the irreversible and backward ones.
/// A backward arrow swaps both sides so that the reaction always runs left to right.
///
/// # Errors
/// Returns `TabularError::UnknownReactionSign` if the equation contains no arrow.
pub fn parse_equation(text: &str, config: &TabularConfig) -> Result<ParsedEquation, TabularError> {
    let mut equation = config.strip(text);

    let (open, close) = config.compartment_brackets;
    let mut default_compartment = config.default_compartment.as_str();
    if let Some(rest) = equation.strip_prefix(open) {
        if let Some((compartment, tail)) = rest.split_once(close) {
            if let Some(tail) = tail.trim_start().strip_prefix(':') {
                default_compartment = compartment.trim();
                equation = tail.trim();
            }
        }
    }

    let arrows = [
        (config.reversible_arrow.as_str(), true, false),
        (config.irreversible_arrow.as_str(), false, false),
        (config.backward_arrow.as_str(), false, true),
    ];
    let Some((left, right, reversible, backward)) = arrows
        .iter()
        .filter(|(arrow, ..)| !arrow.is_empty())
        .find_map(|(arrow, reversible, backward)| {
            equation
                .split_once(arrow)
                .map(|(left, right)| (left, right, *reversible, *backward))
        })
    else {
        return Err(TabularError::UnknownReactionSign(text.to_string()));
    };

    let left = parse_side(left, default_compartment, config);
    let right = parse_side(right, default_compartment, config);
    let (left, right) = if backward { (right, left) } else { (left, right) };

    Ok(ParsedEquation {
        left,
        right,
        reversible,
    })
}

fn write_side(out: &mut String, participants: &[Participant], config: &TabularConfig) {
    let (open, close) = config.compartment_brackets;
    for (index, participant) in participants.iter().enumerate() {
        if index > 0 {
            out.push_str(" + ");
        }
        if participant.coefficient != 1.0 {
            let _ = write!(out, "{} ", participant.coefficient);
        }
        out.push_str(&participant.species);
        if let Some(compartment) = &participant.compartment {
            let _ = write!(out, "{open}{compartment}{close}");
        }
    }
}

/// Writes the equation of a reaction in the format read by [`parse_equation`].
pub fn format_equation(reaction: &Reaction, config: &TabularConfig) -> String {
    let mut out = String::new();
    write_side(&mut out, &reaction.left, config);

    let arrow = if reaction.reversible {
        &config.reversible_arrow
    } else {
        &config.irreversible_arrow
    };
    out.push(' ');
    out.push_str(arrow);
    out.push(' ');

    write_side(&mut out, &reaction.right, config);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tabular::config::TabularConfigBuilder;

    fn species<'a>(equation: &'a ParsedEquation) -> (Vec<(&'a str, f64)>, Vec<(&'a str, f64)>) {
        let side = |participants: &'a [Participant]| {
            participants
                .iter()
                .map(|p| (p.species.as_str(), p.coefficient))
                .collect::<Vec<_>>()
        };
        (side(&equation.left), side(&equation.right))
    }

    #[test]
    fn test_parse_simple_equation() {
        let equation = parse_equation("A + B -> C", &TabularConfig::default()).unwrap();
        assert!(!equation.reversible);
        assert_eq!(
            species(&equation),
            (vec![("A", 1.0), ("B", 1.0)], vec![("C", 1.0)])
        );
        assert_eq!(equation.left[0].compartment.as_deref(), Some("c"));
    }

    #[test]
    fn test_parse_coefficients_and_compartments() {
        let equation =
            parse_equation("2 h2o2[x] <-> (2) h2o[x] + o2[x]", &TabularConfig::default()).unwrap();
        assert!(equation.reversible);
        assert_eq!(
            species(&equation),
            (vec![("h2o2", 2.0)], vec![("h2o", 2.0), ("o2", 1.0)])
        );
        assert!(equation
            .right
            .iter()
            .all(|p| p.compartment.as_deref() == Some("x")));
    }

    #[test]
    fn test_equation_wide_compartment_and_backward_arrow() {
        let config = TabularConfigBuilder::default()
            .palsson_ids(true)
            .build()
            .unwrap();
        let equation = parse_equation("[m] : C <- A + B", &config).unwrap();
        assert_eq!(
            species(&equation),
            (vec![("M_A_m", 1.0), ("M_B_m", 1.0)], vec![("M_C_m", 1.0)])
        );
    }

    #[test]
    fn test_unknown_reaction_sign() {
        let result = parse_equation("A + B = C", &TabularConfig::default());
        assert!(matches!(result, Err(TabularError::UnknownReactionSign(_))));
    }

    #[test]
    fn test_format_equation() {
        let mut reaction = Reaction::new("R1", "");
        reaction.reversible = true;
        let mut substrate = Participant::new("A", 2.0);
        substrate.compartment = Some("c".to_string());
        reaction.left.push(substrate);
        reaction.right.push(Participant::new("B", 1.0));

        assert_eq!(
            format_equation(&reaction, &TabularConfig::default()),
            "2 A[c] <-> B"
        );
    }
}
