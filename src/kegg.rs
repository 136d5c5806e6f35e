//! KEGG flat files.
//!
//! The KEGG REST API returns compounds and reactions as blocks of `KEY  value` lines
//! terminated by `///`. A key starts at the first column; lines starting with spaces
//! continue the value of the previous key:
//!
//! ```text
//! ENTRY       C00031                      Compound
//! NAME        D-Glucose;
//!             Grape sugar
//! FORMULA     C6H12O6
//! DBLINKS     ChEBI: 4167 17634
//! ///
//! ```
//!
//! [`parse_entries`] splits such a text into [`KeggEntry`] records, which
//! [`compound_from_entry`] and [`reaction_from_entry`] map onto network entities.
//! [`import_entries`] does both and adds the result to a network.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::{
    network::{
        entity::{Metabolite, Participant, Pathway, Reaction},
        error::NetworkError,
        graph::BioNetwork,
        refs::{BioRef, Relation},
    },
    warning::Warnings,
};

/// Origin tag of references read from KEGG entries.
pub const ORIGIN_KEGG: &str = "KEGG";

lazy_static! {
    /// A stoichiometric term such as `2 C00031`, `n C00001` or `C00002(n+1)`.
    static ref TERM: Regex =
        Regex::new(r"^(?:(\S+)\s+)?([A-Z]\d{5})(?:\([^)]*\))?$").unwrap();
}

#[derive(Error, Debug)]
pub enum KeggError {
    /// A block does not start with an `ENTRY` line
    #[error("KEGG block {0} has no ENTRY line")]
    MissingEntry(usize),

    #[error("KEGG entry {entry} has no {field} field")]
    MissingField { entry: String, field: &'static str },

    #[error("Invalid equation in KEGG entry {entry}: {equation}")]
    InvalidEquation { entry: String, equation: String },

    #[error(transparent)]
    NetworkError(#[from] NetworkError),
}

/// Kind of a KEGG entry, from the second token of its `ENTRY` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Compound,
    Reaction,
    Other,
}

/// One block of a KEGG flat file.
#[derive(Debug, Clone, PartialEq)]
pub struct KeggEntry {
    pub id: String,
    pub kind: EntryKind,
    /// Values by key, one per line, in file order
    pub fields: IndexMap<String, Vec<String>>,
}

impl KeggEntry {
    /// All lines of a field.
    pub fn values(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// First line of a field.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key).first().map(String::as_str)
    }

    /// The entry names, without their trailing semicolons.
    pub fn names(&self) -> Vec<&str> {
        self.values("NAME")
            .iter()
            .map(|name| name.trim().trim_end_matches(';').trim())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Database links as `(database, id)` pairs, one per id.
    pub fn db_links(&self) -> Vec<(String, String)> {
        self.values("DBLINKS")
            .iter()
            .filter_map(|line| line.split_once(':'))
            .flat_map(|(db, ids)| {
                let db = db.trim().to_lowercase();
                ids.split_whitespace()
                    .map(move |id| (db.clone(), id.to_string()))
            })
            .collect()
    }

    /// Pathways as `(id, name)` pairs.
    pub fn pathways(&self) -> Vec<(&str, &str)> {
        self.values("PATHWAY")
            .iter()
            .filter_map(|line| {
                let line = line.trim();
                match line.split_once(char::is_whitespace) {
                    Some((id, name)) => Some((id, name.trim())),
                    None if !line.is_empty() => Some((line, "")),
                    None => None,
                }
            })
            .collect()
    }
}

/// Splits a KEGG flat file into entries.
///
/// # Errors
/// Returns `KeggError::MissingEntry` for a block whose first key is not `ENTRY`.
pub fn parse_entries(text: &str) -> Result<Vec<KeggEntry>, KeggError> {
    let mut entries = Vec::new();

    for (index, block) in text.split("///").enumerate() {
        if block.trim().is_empty() {
            continue;
        }

        let mut fields: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut current: Option<String> = None;
        for line in block.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if line.starts_with(char::is_whitespace) {
                if let Some(key) = &current {
                    fields
                        .entry(key.clone())
                        .or_default()
                        .push(line.trim().to_string());
                }
                continue;
            }

            let (key, value) = line
                .split_once(char::is_whitespace)
                .unwrap_or((line, ""));
            fields
                .entry(key.to_string())
                .or_default()
                .push(value.trim().to_string());
            current = Some(key.to_string());
        }

        if fields.keys().next().map(String::as_str) != Some("ENTRY") {
            return Err(KeggError::MissingEntry(index));
        }

        let mut tokens = fields["ENTRY"]
            .first()
            .map(|line| line.split_whitespace())
            .into_iter()
            .flatten();
        let id = tokens.next().unwrap_or_default().to_string();
        let kind = match tokens.next() {
            Some("Compound") => EntryKind::Compound,
            Some("Reaction") => EntryKind::Reaction,
            _ if id.starts_with('C') => EntryKind::Compound,
            _ if id.starts_with('R') => EntryKind::Reaction,
            _ => EntryKind::Other,
        };

        entries.push(KeggEntry { id, kind, fields });
    }

    log::debug!("Parsed {} KEGG entries", entries.len());
    Ok(entries)
}

/// Maps a compound entry onto a metabolite.
///
/// The first name becomes the metabolite name; the KEGG id and the `DBLINKS` become
/// references.
pub fn compound_from_entry(entry: &KeggEntry) -> Metabolite {
    let name = entry.names().first().copied().unwrap_or(entry.id.as_str());
    let mut metabolite = Metabolite::new(entry.id.clone(), name);

    metabolite.formula = entry.first("FORMULA").map(str::to_string);
    metabolite.molecular_weight = entry
        .first("MOL_WEIGHT")
        .and_then(|weight| weight.parse::<f64>().ok());

    metabolite.refs.add(BioRef::new(
        "kegg.compound",
        entry.id.clone(),
        ORIGIN_KEGG,
        Relation::Is,
    ));
    for (db, id) in entry.db_links() {
        metabolite
            .refs
            .add(BioRef::new(db, id, ORIGIN_KEGG, Relation::Is));
    }
    metabolite
}

fn parse_side(
    entry: &KeggEntry,
    side: &str,
    warnings: &mut Warnings,
) -> Result<Vec<Participant>, KeggError> {
    side.split(" + ")
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| {
            let captures = TERM.captures(term).ok_or_else(|| KeggError::InvalidEquation {
                entry: entry.id.clone(),
                equation: term.to_string(),
            })?;
            let coefficient = match captures.get(1).map(|c| c.as_str()) {
                None => 1.0,
                Some(coefficient) => coefficient.parse::<f64>().unwrap_or_else(|_| {
                    warnings.element(
                        &entry.id,
                        format!("Using 1 for the variable coefficient '{coefficient}'"),
                    );
                    1.0
                }),
            };
            Ok(Participant::new(&captures[2], coefficient))
        })
        .collect()
}

/// Maps a reaction entry onto a reaction.
///
/// KEGG equations are written reversibly (`<=>`), so the reaction is reversible.
/// Variable coefficients such as `n` are replaced by 1 with a warning.
///
/// # Errors
/// Returns an error if the entry has no `EQUATION` or the equation cannot be parsed.
pub fn reaction_from_entry(
    entry: &KeggEntry,
    warnings: &mut Warnings,
) -> Result<Reaction, KeggError> {
    let equation = entry.first("EQUATION").ok_or_else(|| KeggError::MissingField {
        entry: entry.id.clone(),
        field: "EQUATION",
    })?;
    let (left, right) = ["<=>", "=>", "<="]
        .iter()
        .find_map(|arrow| equation.split_once(arrow))
        .ok_or_else(|| KeggError::InvalidEquation {
            entry: entry.id.clone(),
            equation: equation.to_string(),
        })?;

    let name = entry.names().first().copied().unwrap_or_default();
    let mut reaction = Reaction::new(entry.id.clone(), name);
    reaction.left = parse_side(entry, left, warnings)?;
    reaction.right = parse_side(entry, right, warnings)?;
    reaction.reversible = true;

    let enzymes: Vec<&str> = entry
        .values("ENZYME")
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect();
    if !enzymes.is_empty() {
        reaction.ec_number = Some(enzymes.join(" || "));
    }
    reaction.pathways = entry
        .pathways()
        .into_iter()
        .map(|(id, _)| id.to_string())
        .collect();

    reaction.refs.add(BioRef::new(
        "kegg.reaction",
        entry.id.clone(),
        ORIGIN_KEGG,
        Relation::Is,
    ));
    Ok(reaction)
}

/// Adds the compounds and reactions of a KEGG flat file to a network.
///
/// Compounds are added first so that reactions find their participants. Participants
/// without a compound entry become bare metabolites, pathways are created from the
/// `PATHWAY` lines of reactions, and entries already in the network are skipped with a
/// warning.
pub fn import_entries(text: &str, network: &mut BioNetwork) -> Result<Warnings, KeggError> {
    let mut warnings = Warnings::default();
    let entries = parse_entries(text)?;

    for entry in entries.iter().filter(|e| e.kind == EntryKind::Compound) {
        if network.metabolites.contains_key(&entry.id) {
            warnings.element(&entry.id, "Compound already in the network");
            continue;
        }
        network.add_metabolite(compound_from_entry(entry))?;
    }

    for entry in &entries {
        match entry.kind {
            EntryKind::Compound => continue,
            EntryKind::Other => {
                warnings.element(&entry.id, "Skipping entry that is neither compound nor reaction");
                continue;
            }
            EntryKind::Reaction => {}
        }
        if network.reactions.contains_key(&entry.id) {
            warnings.element(&entry.id, "Reaction already in the network");
            continue;
        }

        let reaction = reaction_from_entry(entry, &mut warnings)?;
        for species in reaction.species_ids() {
            if !network.metabolites.contains_key(species) {
                network.add_metabolite(Metabolite::new(species, species))?;
            }
        }
        for (id, name) in entry.pathways() {
            if !network.pathways.contains_key(id) {
                network.add_pathway(Pathway::new(id, name))?;
            }
        }
        network.add_reaction(reaction)?;
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    const FLAT_FILE: &str = "\
ENTRY       C00031                      Compound
NAME        D-Glucose;
            Grape sugar
FORMULA     C6H12O6
MOL_WEIGHT  180.1559
DBLINKS     CAS: 50-99-7
            ChEBI: 4167 17634
///
ENTRY       R00299                      Reaction
NAME        ATP:D-glucose 6-phosphotransferase
EQUATION    C00002 + C00031 <=> C00008 + C00092
ENZYME      2.7.1.1         2.7.1.2
PATHWAY     rn00010  Glycolysis / Gluconeogenesis
            rn00500  Starch and sucrose metabolism
///
";

    #[test]
    fn test_parse_entries() {
        let entries = parse_entries(FLAT_FILE).unwrap();
        assert_eq!(entries.len(), 2);

        let compound = &entries[0];
        assert_eq!(compound.id, "C00031");
        assert_eq!(compound.kind, EntryKind::Compound);
        assert_eq!(compound.names(), vec!["D-Glucose", "Grape sugar"]);
        assert_eq!(compound.db_links().len(), 3);
        assert_eq!(entries[1].kind, EntryKind::Reaction);
    }

    #[test]
    fn test_compound_from_entry() {
        let entries = parse_entries(FLAT_FILE).unwrap();
        let metabolite = compound_from_entry(&entries[0]);
        assert_eq!(metabolite.name, "D-Glucose");
        assert_eq!(metabolite.formula.as_deref(), Some("C6H12O6"));
        assert_relative_eq!(metabolite.molecular_weight.unwrap(), 180.1559);
        assert!(metabolite.refs.contains("chebi", "17634"));
        assert!(metabolite.refs.contains("kegg.compound", "C00031"));
    }

    #[test]
    fn test_import_entries() {
        let mut network = BioNetwork::new("kegg", "");
        let warnings = import_entries(FLAT_FILE, &mut network).unwrap();
        assert!(warnings.is_empty());

        let reaction = &network.reactions["R00299"];
        assert!(reaction.reversible);
        assert_eq!(reaction.left.len(), 2);
        assert_eq!(reaction.ec_number.as_deref(), Some("2.7.1.1 || 2.7.1.2"));
        assert_eq!(network.metabolites.len(), 4);
        assert_eq!(
            network.pathways["rn00010"].name,
            "Glycolysis / Gluconeogenesis"
        );
    }

    #[test]
    fn test_variable_coefficient() {
        let text = "ENTRY       R00001  Reaction\nEQUATION    C00404 + n C00001 <=> (n+1) C02174\n///";
        let entries = parse_entries(text).unwrap();
        let mut warnings = Warnings::default();
        let reaction = reaction_from_entry(&entries[0], &mut warnings).unwrap();
        assert_eq!(reaction.right[0].species, "C02174");
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_block_without_entry() {
        let result = parse_entries("NAME        glucose\n///\n");
        assert!(matches!(result, Err(KeggError::MissingEntry(0))));
    }
}
