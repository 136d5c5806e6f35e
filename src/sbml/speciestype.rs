use std::fmt::Display;

use variantly::Variantly;

pub(crate) const SMALL_MOLECULE_SBO_TERM: &str = "SBO:0000247";
pub(crate) const METABOLITE_SBO_TERM: &str = "SBO:0000299";
pub(crate) const PROTEIN_SBO_TERM: &str = "SBO:0000252";
pub(crate) const COMPLEX_SBO_TERM: &str = "SBO:0000296";
pub(crate) const MACROMOLECULAR_COMPLEX_SBO_TERM: &str = "SBO:0000297";

/// Kind of entity an SBML `<species>` stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Variantly)]
pub enum SpeciesType {
    Metabolite,
    Protein,
    Complex,
}

impl Display for SpeciesType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SpeciesType::Metabolite => "metabolite",
            SpeciesType::Protein => "protein",
            SpeciesType::Complex => "complex",
        };
        write!(f, "{name}")
    }
}

impl SpeciesType {
    /// Species type implied by an SBO term, if the term is one of the known ones.
    ///
    /// Accepts both `SBO:0000252` and the bare number `252` used by SBML Level 2.
    pub fn from_sbo(sbo_term: &str) -> Option<Self> {
        let normalized = normalize_sbo(sbo_term)?;
        Some(match normalized.as_str() {
            SMALL_MOLECULE_SBO_TERM | METABOLITE_SBO_TERM => SpeciesType::Metabolite,
            PROTEIN_SBO_TERM => SpeciesType::Protein,
            COMPLEX_SBO_TERM | MACROMOLECULAR_COMPLEX_SBO_TERM => SpeciesType::Complex,
            _ => return None,
        })
    }

    /// SBO term written for species of this type.
    pub fn sbo_term(&self) -> &'static str {
        match self {
            SpeciesType::Metabolite => SMALL_MOLECULE_SBO_TERM,
            SpeciesType::Protein => PROTEIN_SBO_TERM,
            SpeciesType::Complex => MACROMOLECULAR_COMPLEX_SBO_TERM,
        }
    }
}

/// Canonical `SBO:xxxxxxx` spelling of an SBO term.
pub fn normalize_sbo(sbo_term: &str) -> Option<String> {
    let digits = sbo_term.trim();
    let digits = digits
        .strip_prefix("SBO:")
        .or_else(|| digits.strip_prefix("SBO_"))
        .unwrap_or(digits);
    let number: u32 = digits.parse().ok()?;
    Some(format!("SBO:{number:07}"))
}
