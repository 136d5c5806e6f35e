//! Reconciliation of SBML `<notes>` with structured entity attributes.
//!
//! Many genome-scale models store facts as `KEY: value` lines in the XHTML notes of an
//! element, e.g. `<p>FORMULA: C6H12O6</p>` or `<p>SUBSYSTEM: Glycolysis || TCA</p>`.
//! [`Notes`] gives keyed access to these lines without otherwise touching the markup:
//! lookups are case-insensitive and treat spaces, underscores and dashes in keys alike,
//! updates only replace the value text of an existing line, and unknown lines are left
//! byte-for-byte intact.
//!
//! On read, the `apply_*` functions fill structured fields from the notes but never
//! overwrite a field that is already set. On write, the `notes_for_*` functions inject
//! the structured values back into the notes.

use std::ops::Range;

use lazy_static::lazy_static;
use quick_xml::escape::{escape, unescape};
use regex::Regex;

use crate::{
    network::{
        entity::{Entity, Gene, Metabolite, Reaction},
        graph::BioNetwork,
        refs::{BioRef, Relation, ORIGIN_NOTES},
    },
    warning::Warnings,
};

/// Separator of multi-valued notes fields.
pub const VALUE_SEPARATOR: &str = " || ";

/// Namespace of the XHTML body wrapping notes lines.
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Value used by some exporters for "no value".
const NOT_AVAILABLE: &str = "NA";

pub const KEY_FORMULA: &str = "FORMULA";
pub const KEY_CHARGE: &str = "CHARGE";
pub const KEY_INCHI: &str = "INCHI";
pub const KEY_INCHIKEY: &str = "INCHIKEY";
pub const KEY_SMILES: &str = "SMILES";
pub const KEY_SUBSYSTEM: &str = "SUBSYSTEM";
pub const KEY_EC_NUMBER: &str = "EC NUMBER";
pub const KEY_PROTEIN_CLASS: &str = "PROTEIN CLASS";
pub const KEY_SCORE: &str = "SCORE";
pub const KEY_CONFIDENCE: &str = "CONFIDENCE LEVEL";
pub const KEY_STATUS: &str = "STATUS";
pub const KEY_AUTHORS: &str = "AUTHORS";
pub const KEY_PMID: &str = "PMID";
pub const KEY_GENE_ASSOCIATION: &str = "GENE ASSOCIATION";
pub const KEY_GPR: &str = "GPR";
pub const KEY_COMMENTS: &str = "COMMENTS";
pub const KEY_GENE_NAME: &str = "GENE NAME";
pub const KEY_NAME: &str = "NAME";

/// Notes keys holding database cross-references, with the database name they map to.
pub const DATABASE_KEYS: &[(&str, &str)] = &[
    ("KEGG", "kegg"),
    ("CHEBI", "chebi"),
    ("PUBCHEM", "pubchem"),
    ("HMDB", "hmdb"),
    ("METACYC", "metacyc"),
    ("BIGG", "bigg"),
    ("SEED", "seed"),
    ("REACTOME", "reactome"),
    ("BIOCYC", "biocyc"),
    ("METANETX", "metanetx"),
    ("LIPIDMAPS", "lipidmaps"),
    ("SABIORK", "sabiork"),
    ("RHEA", "rhea"),
    ("UNIPROT", "uniprot"),
];

lazy_static! {
    /// A `KEY: value` line. The key directly follows a tag (or the start of the text)
    /// and the value runs until the next tag or line break.
    static ref LINE: Regex =
        Regex::new(r"(?:^|>)\s*([A-Za-z][A-Za-z0-9 _\-]*?)\s*:[ \t]*([^<\n]*)").unwrap();
    static ref BODY_END: Regex = Regex::new(r"</(?:[A-Za-z0-9]+:)?body\s*>").unwrap();
    static ref PMID: Regex = Regex::new(r"(?i)PMID\s*:?\s*(\d+)").unwrap();
    static ref DIGITS: Regex = Regex::new(r"\d+").unwrap();
}

/// Canonical form of a notes key: upper case, single spaces as separators.
pub fn normalize_key(key: &str) -> String {
    key.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

struct NotesLine {
    key: String,
    value: Range<usize>,
}

/// The XHTML content of an SBML `<notes>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notes(String);

impl Default for Notes {
    fn default() -> Self {
        Notes(format!("<body xmlns=\"{XHTML_NS}\"></body>"))
    }
}

impl From<String> for Notes {
    fn from(xhtml: String) -> Self {
        Notes(xhtml)
    }
}

impl From<&str> for Notes {
    fn from(xhtml: &str) -> Self {
        Notes(xhtml.to_string())
    }
}

impl Notes {
    /// Wraps existing notes, or starts an empty XHTML body.
    pub fn from_option(xhtml: Option<&str>) -> Self {
        match xhtml {
            Some(xhtml) if !xhtml.trim().is_empty() => Notes(xhtml.to_string()),
            _ => Notes::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    fn lines(&self) -> impl Iterator<Item = NotesLine> + '_ {
        LINE.captures_iter(&self.0).filter_map(|caps| {
            let key = caps.get(1)?;
            let value = caps.get(2)?;
            let trimmed = value.as_str().trim_end();
            Some(NotesLine {
                key: normalize_key(key.as_str()),
                value: value.start()..value.start() + trimmed.len(),
            })
        })
    }

    fn find(&self, key: &str) -> Option<NotesLine> {
        let key = normalize_key(key);
        self.lines().find(|line| line.key == key)
    }

    /// Normalized keys of all lines, in document order.
    pub fn keys(&self) -> Vec<String> {
        self.lines().map(|line| line.key).collect()
    }

    /// The unescaped, trimmed value of the first line with the given key.
    ///
    /// Empty values are reported as absent.
    pub fn value_of(&self, key: &str) -> Option<String> {
        let line = self.find(key)?;
        let raw = self.0[line.value].trim();
        if raw.is_empty() {
            return None;
        }
        let value = unescape(raw)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        Some(value)
    }

    /// The first present value among several key spellings.
    pub fn first_value_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.value_of(key))
    }

    /// Values of a multi-valued line, split on [`VALUE_SEPARATOR`].
    pub fn values_of(&self, key: &str) -> Vec<String> {
        self.value_of(key)
            .map(|value| {
                value
                    .split("||")
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sets the value of a line.
    ///
    /// An existing line keeps its key spelling and surrounding markup and only has its
    /// value replaced; otherwise a `<p>KEY: value</p>` line is appended to the body.
    /// Setting the same value twice leaves the notes unchanged.
    pub fn set_value(&mut self, key: &str, value: &str) {
        let escaped = escape(value.trim()).into_owned();

        if let Some(line) = self.find(key) {
            self.0.replace_range(line.value, &escaped);
            return;
        }

        let line = format!("<p>{}: {}</p>", normalize_key(key), escaped);
        match BODY_END.find_iter(&self.0).last().map(|end| end.start()) {
            Some(position) => self.0.insert_str(position, &line),
            None => self.0.push_str(&line),
        }
    }

    /// Sets a multi-valued line.
    pub fn set_values<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(VALUE_SEPARATOR);
        if !joined.is_empty() {
            self.set_value(key, &joined);
        }
    }
}

fn is_available(value: &str) -> bool {
    !value.is_empty() && !value.eq_ignore_ascii_case(NOT_AVAILABLE)
}

fn fill(field: &mut Option<String>, value: Option<String>) {
    if field.is_none() {
        *field = value.filter(|v| is_available(v));
    }
}

/// Adds the database cross-references found in the notes to an entity.
pub fn apply_references<E: Entity>(notes: &Notes, entity: &mut E) {
    for line_key in notes.keys() {
        let key = line_key.strip_suffix(" ID").unwrap_or(&line_key);
        let Some((_, db)) = DATABASE_KEYS.iter().find(|(k, _)| *k == key) else {
            continue;
        };

        for id in notes.values_of(&line_key) {
            if is_available(&id) {
                entity
                    .refs_mut()
                    .add(BioRef::new(*db, id, ORIGIN_NOTES, Relation::Is));
            }
        }
    }
}

/// Fills unset metabolite attributes from its notes.
pub fn apply_to_metabolite(notes: &Notes, metabolite: &mut Metabolite, warnings: &mut Warnings) {
    fill(&mut metabolite.formula, notes.value_of(KEY_FORMULA));
    fill(&mut metabolite.inchi, notes.value_of(KEY_INCHI));
    fill(&mut metabolite.inchikey, notes.value_of(KEY_INCHIKEY));
    fill(&mut metabolite.smiles, notes.value_of(KEY_SMILES));

    if metabolite.charge.is_none() {
        if let Some(charge) = notes.value_of(KEY_CHARGE).filter(|v| is_available(v)) {
            match charge.parse::<f64>() {
                Ok(value) if value.fract() == 0.0 => metabolite.charge = Some(value as i32),
                _ => warnings.element(
                    &metabolite.id,
                    format!("Ignoring unparseable charge '{charge}' in notes"),
                ),
            }
        }
    }

    apply_references(notes, metabolite);
}

/// Fills the name of an unnamed gene and its cross-references from its notes.
pub fn apply_to_gene(notes: &Notes, gene: &mut Gene) {
    if gene.name.is_empty() {
        if let Some(name) = notes
            .first_value_of(&[KEY_GENE_NAME, KEY_NAME])
            .filter(|v| is_available(v))
        {
            gene.name = name;
        }
    }
    apply_references(notes, gene);
}

/// Fills unset reaction attributes from its notes.
///
/// Returns the gene association text found in the notes, if any. Whether it is used is
/// up to the caller, since structured enzyme data takes precedence.
pub fn apply_to_reaction(notes: &Notes, reaction: &mut Reaction) -> Option<String> {
    fill(
        &mut reaction.ec_number,
        notes.first_value_of(&[KEY_EC_NUMBER, KEY_PROTEIN_CLASS]),
    );
    fill(
        &mut reaction.score,
        notes.first_value_of(&[KEY_SCORE, KEY_CONFIDENCE]),
    );
    fill(&mut reaction.status, notes.value_of(KEY_STATUS));
    fill(&mut reaction.comment, notes.value_of(KEY_COMMENTS));

    if reaction.pathways.is_empty() {
        reaction.pathways.extend(
            notes
                .values_of(KEY_SUBSYSTEM)
                .into_iter()
                .filter(|p| is_available(p)),
        );
    }

    if reaction.pmids.is_empty() {
        if let Some(authors) = notes.value_of(KEY_AUTHORS) {
            reaction
                .pmids
                .extend(PMID.captures_iter(&authors).map(|caps| caps[1].to_string()));
        }
        if let Some(pmids) = notes.value_of(KEY_PMID) {
            reaction
                .pmids
                .extend(DIGITS.find_iter(&pmids).map(|m| m.as_str().to_string()));
        }
    }

    apply_references(notes, reaction);

    notes
        .first_value_of(&[KEY_GENE_ASSOCIATION, KEY_GPR])
        .filter(|gpr| is_available(gpr))
}

/// Notes of a metabolite with its structured attributes injected.
///
/// Returns `None` when the metabolite has neither notes nor attributes to write.
pub fn notes_for_metabolite(metabolite: &Metabolite) -> Option<Notes> {
    let mut notes = Notes::from_option(metabolite.notes.as_deref());
    let mut touched = metabolite.notes.is_some();

    let fields = [
        (KEY_FORMULA, metabolite.formula.clone()),
        (KEY_CHARGE, metabolite.charge.map(|c| c.to_string())),
        (KEY_INCHI, metabolite.inchi.clone()),
        (KEY_INCHIKEY, metabolite.inchikey.clone()),
        (KEY_SMILES, metabolite.smiles.clone()),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            notes.set_value(key, &value);
            touched = true;
        }
    }

    touched.then_some(notes)
}

/// Notes of a reaction with its structured attributes injected.
///
/// Pathways are written by name and `gene_association` is the textual GPR of the
/// reaction's enzymes, if any.
pub fn notes_for_reaction(
    network: &BioNetwork,
    reaction: &Reaction,
    gene_association: Option<&str>,
) -> Option<Notes> {
    let mut notes = Notes::from_option(reaction.notes.as_deref());
    let mut touched = reaction.notes.is_some();

    // keep the legacy spelling when that is the only one present
    let ec_key = if notes.find(KEY_PROTEIN_CLASS).is_some() && notes.find(KEY_EC_NUMBER).is_none()
    {
        KEY_PROTEIN_CLASS
    } else {
        KEY_EC_NUMBER
    };

    let mut set = |key: &str, value: Option<&str>| {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            notes.set_value(key, value);
            touched = true;
        }
    };
    set(ec_key, reaction.ec_number.as_deref());
    set(KEY_SCORE, reaction.score.as_deref());
    set(KEY_STATUS, reaction.status.as_deref());
    set(KEY_COMMENTS, reaction.comment.as_deref());
    set(KEY_GENE_ASSOCIATION, gene_association);

    if !reaction.pmids.is_empty() {
        let authors = reaction
            .pmids
            .iter()
            .map(|pmid| format!("PMID:{pmid}"))
            .collect::<Vec<_>>()
            .join(",");
        set(KEY_AUTHORS, Some(&authors));
    }

    if !reaction.pathways.is_empty() {
        let names = reaction
            .pathways
            .iter()
            .map(|id| {
                network
                    .pathways
                    .get(id)
                    .map(|p| p.display_name().to_string())
                    .unwrap_or_else(|| id.clone())
            })
            .collect::<Vec<_>>()
            .join(VALUE_SEPARATOR);
        set(KEY_SUBSYSTEM, Some(&names));
    }

    touched.then_some(notes)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const NOTES: &str = r#"<body xmlns="http://www.w3.org/1999/xhtml">
  <p>FORMULA: C6H12O6</p>
  <p>charge: -1</p>
  <p>KEGG: C00031 || C00267</p>
  <p>Free text without a key</p>
  <p>SUBSYSTEM: Glycolysis &amp; Gluconeogenesis || TCA</p>
  <p>GENE_ASSOCIATION: (b1 and b2) or b3</p>
</body>"#;

    #[test]
    fn test_keyed_lookup() {
        let notes = Notes::from(NOTES);
        assert_eq!(notes.value_of("formula").as_deref(), Some("C6H12O6"));
        assert_eq!(notes.value_of("CHARGE").as_deref(), Some("-1"));
        assert_eq!(notes.values_of("KEGG"), vec!["C00031", "C00267"]);
        assert_eq!(
            notes.values_of("SUBSYSTEM"),
            vec!["Glycolysis & Gluconeogenesis", "TCA"]
        );
        assert_eq!(
            notes.value_of("gene association").as_deref(),
            Some("(b1 and b2) or b3")
        );
        assert_eq!(notes.value_of("SMILES"), None);
    }

    #[test]
    fn test_keys_are_normalized() {
        let notes = Notes::from(NOTES);
        assert_eq!(
            notes.keys(),
            vec!["FORMULA", "CHARGE", "KEGG", "SUBSYSTEM", "GENE ASSOCIATION"]
        );
        assert_eq!(normalize_key("ec-number"), "EC NUMBER");
        assert_eq!(normalize_key(" Protein_Class "), "PROTEIN CLASS");
    }

    #[test]
    fn test_set_value_replaces_in_place() {
        let mut notes = Notes::from(NOTES);
        notes.set_value("Formula", "C6H12O7");

        assert_eq!(notes.value_of("FORMULA").as_deref(), Some("C6H12O7"));
        assert!(notes.as_str().contains("<p>FORMULA: C6H12O7</p>"));
        assert!(notes.as_str().contains("<p>Free text without a key</p>"));
        assert_eq!(notes.keys().len(), 5);
    }

    #[test]
    fn test_set_value_appends_before_body_end() {
        let mut notes = Notes::from(NOTES);
        notes.set_value("SMILES", "OC1OC(CO)C(O)C(O)C1O");
        assert!(notes
            .as_str()
            .ends_with("<p>SMILES: OC1OC(CO)C(O)C(O)C1O</p></body>"));

        let mut empty = Notes::default();
        empty.set_value("status", "validated");
        assert_eq!(
            empty.as_str(),
            r#"<body xmlns="http://www.w3.org/1999/xhtml"><p>STATUS: validated</p></body>"#
        );
    }

    #[test]
    fn test_set_value_is_idempotent() {
        let mut notes = Notes::from(NOTES);
        notes.set_values("SUBSYSTEM", ["A & B", "C"]);
        notes.set_value("EC NUMBER", "1.1.1.1");
        let once = notes.clone();

        notes.set_values("SUBSYSTEM", ["A & B", "C"]);
        notes.set_value("EC NUMBER", "1.1.1.1");

        assert_eq!(notes, once);
        assert!(notes.as_str().contains("SUBSYSTEM: A &amp; B || C"));
    }

    #[test]
    fn test_metabolite_fields_are_not_clobbered() {
        let notes = Notes::from(NOTES);
        let mut metabolite = Metabolite::new("glc", "glucose");
        metabolite.formula = Some("C6H12O6X".to_string());

        let mut warnings = Warnings::default();
        apply_to_metabolite(&notes, &mut metabolite, &mut warnings);

        assert_eq!(metabolite.formula.as_deref(), Some("C6H12O6X"));
        assert_eq!(metabolite.charge, Some(-1));
        assert!(metabolite.refs.contains("kegg", "C00031"));
        assert!(metabolite.refs.contains("kegg", "C00267"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unparseable_charge_is_a_warning() {
        let notes = Notes::from("<body><p>CHARGE: minus one</p></body>");
        let mut metabolite = Metabolite::new("m", "");
        let mut warnings = Warnings::default();
        apply_to_metabolite(&notes, &mut metabolite, &mut warnings);

        assert_eq!(metabolite.charge, None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_reaction_fields_from_notes() {
        let notes = Notes::from(
            "<body><p>PROTEIN_CLASS: 2.7.1.1</p><p>AUTHORS: PMID:123, PMID: 456</p>\
             <p>SUBSYSTEM: NA</p><p>GPR: g1 or g2</p><p>Confidence Level: 3</p></body>",
        );
        let mut reaction = Reaction::new("R1", "");
        let gpr = apply_to_reaction(&notes, &mut reaction);

        assert_eq!(reaction.ec_number.as_deref(), Some("2.7.1.1"));
        assert_eq!(reaction.score.as_deref(), Some("3"));
        assert_eq!(
            reaction.pmids.iter().collect::<Vec<_>>(),
            vec!["123", "456"]
        );
        assert!(reaction.pathways.is_empty());
        assert_eq!(gpr.as_deref(), Some("g1 or g2"));
    }

    #[test]
    fn test_gene_name_from_notes() {
        let notes = Notes::from("<body><p>GENE_NAME: pgi</p><p>KEGG: eco:b4025</p></body>");
        let mut unnamed = Gene::new("b4025", "");
        apply_to_gene(&notes, &mut unnamed);
        assert_eq!(unnamed.name, "pgi");
        assert!(unnamed.refs.contains("kegg", "eco:b4025"));

        let mut named = Gene::new("b4025", "pgiA");
        apply_to_gene(&notes, &mut named);
        assert_eq!(named.name, "pgiA");
    }

    #[test]
    fn test_na_ec_number_is_not_stored() {
        let notes = Notes::from("<body><p>EC Number: NA</p></body>");
        let mut reaction = Reaction::new("R1", "");
        apply_to_reaction(&notes, &mut reaction);
        assert_eq!(reaction.ec_number, None);
    }

    #[test]
    fn test_notes_for_reaction_round_trip() {
        let mut network = BioNetwork::default();
        network
            .add_pathway(crate::network::entity::Pathway::new("glyco", "Glycolysis"))
            .unwrap();

        let mut reaction = Reaction::new("R1", "");
        reaction.ec_number = Some("2.7.1.1".to_string());
        reaction.pathways.insert("glyco".to_string());
        reaction.pmids.insert("123".to_string());

        let notes = notes_for_reaction(&network, &reaction, Some("g1 and g2")).unwrap();
        let mut parsed = Reaction::new("R1", "");
        let gpr = apply_to_reaction(&notes, &mut parsed);

        assert_eq!(parsed.ec_number, reaction.ec_number);
        assert_eq!(parsed.pmids, reaction.pmids);
        assert!(parsed.pathways.contains("Glycolysis"));
        assert_eq!(gpr.as_deref(), Some("g1 and g2"));

        assert!(notes_for_reaction(&network, &Reaction::new("R2", ""), None).is_none());
    }
}
