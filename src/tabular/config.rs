//! Options and column names of the tabular formats.

use derive_builder::Builder;

/// Options of tabular import and export.
#[derive(Debug, Clone, Builder)]
pub struct TabularConfig {
    /// Field delimiter
    #[builder(default = "b'\\t'")]
    pub delimiter: u8,

    /// Character stripped from both ends of every cell
    #[builder(default = "Some('\"')")]
    pub quote: Option<char>,

    /// Brackets of compartment suffixes in equations, as in `glc[c]`
    #[builder(default = "('[', ']')")]
    pub compartment_brackets: (char, char),

    /// Brackets around pathway lists, if any
    #[builder(default)]
    pub pathway_brackets: Option<(char, char)>,

    /// Parentheses used in gene associations
    #[builder(default = "('(', ')')")]
    pub gpr_brackets: (char, char),

    /// Compartment of metabolites without an explicit one
    #[builder(default = "\"c\".to_string()", setter(into))]
    pub default_compartment: String,

    /// Prefix reaction ids with `R_` and metabolite ids with `M_`, suffixing the latter
    /// with their compartment
    #[builder(default)]
    pub palsson_ids: bool,

    #[builder(default = "\"<->\".to_string()", setter(into))]
    pub reversible_arrow: String,

    #[builder(default = "\"->\".to_string()", setter(into))]
    pub irreversible_arrow: String,

    /// Irreversible arrow written from products to substrates
    #[builder(default = "\"<-\".to_string()", setter(into))]
    pub backward_arrow: String,

    /// Separator of multi-valued cells
    #[builder(default = "\" || \".to_string()", setter(into))]
    pub list_separator: String,

    #[builder(default = "-1000.0")]
    pub default_lower_bound: f64,

    #[builder(default = "1000.0")]
    pub default_upper_bound: f64,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            quote: Some('"'),
            compartment_brackets: ('[', ']'),
            pathway_brackets: None,
            gpr_brackets: ('(', ')'),
            default_compartment: "c".to_string(),
            palsson_ids: false,
            reversible_arrow: "<->".to_string(),
            irreversible_arrow: "->".to_string(),
            backward_arrow: "<-".to_string(),
            list_separator: " || ".to_string(),
            default_lower_bound: -1000.0,
            default_upper_bound: 1000.0,
        }
    }
}

impl TabularConfig {
    /// Removes the quote character around a cell.
    pub fn strip<'a>(&self, cell: &'a str) -> &'a str {
        let cell = cell.trim();
        match self.quote {
            Some(quote) => cell.trim_matches(quote).trim(),
            None => cell,
        }
    }

    /// Splits a multi-valued cell.
    pub fn split_list<'a>(&self, cell: &'a str) -> Vec<&'a str> {
        let mut cell = self.strip(cell);
        if let Some((open, close)) = self.pathway_brackets {
            cell = cell
                .strip_prefix(open)
                .and_then(|c| c.strip_suffix(close))
                .unwrap_or(cell);
        }

        let separator = match self.list_separator.trim() {
            "" => self.list_separator.as_str(),
            trimmed => trimmed,
        };
        cell.split(separator)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn reaction_id(&self, id: &str) -> String {
        if self.palsson_ids && !id.starts_with("R_") {
            format!("R_{id}")
        } else {
            id.to_string()
        }
    }

    pub fn metabolite_id(&self, id: &str, compartment: &str) -> String {
        if !self.palsson_ids {
            return id.to_string();
        }

        let prefixed = if id.starts_with("M_") {
            id.to_string()
        } else {
            format!("M_{id}")
        };
        let suffix = format!("_{compartment}");
        if prefixed.ends_with(&suffix) {
            prefixed
        } else {
            prefixed + &suffix
        }
    }
}

/// Recognized columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Identifier,
    Name,
    Equation,
    Gpr,
    EcNumber,
    Pathways,
    Status,
    Comment,
    LowerBound,
    UpperBound,
    Biblio,
    Score,
    Formula,
    MolecularWeight,
    Charge,
    Compartment,
    Inchi,
    InchiKey,
    Smiles,
}

pub const REACTION_COLUMNS: &[Column] = &[
    Column::Identifier,
    Column::Name,
    Column::Equation,
    Column::Gpr,
    Column::EcNumber,
    Column::Pathways,
    Column::Status,
    Column::Comment,
    Column::LowerBound,
    Column::UpperBound,
    Column::Biblio,
    Column::Score,
];

pub const METABOLITE_COLUMNS: &[Column] = &[
    Column::Identifier,
    Column::Name,
    Column::Formula,
    Column::MolecularWeight,
    Column::Charge,
    Column::Compartment,
    Column::Inchi,
    Column::InchiKey,
    Column::Smiles,
];

impl Column {
    /// Header written on export.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Identifier => "Identifier",
            Column::Name => "Name",
            Column::Equation => "Reaction Equation",
            Column::Gpr => "GPR",
            Column::EcNumber => "EC Number",
            Column::Pathways => "Pathway List",
            Column::Status => "Reaction Status",
            Column::Comment => "Comment",
            Column::LowerBound => "Flux lower Bound",
            Column::UpperBound => "Flux upper Bound",
            Column::Biblio => "Biblio",
            Column::Score => "Score",
            Column::Formula => "Chemical Formula",
            Column::MolecularWeight => "Molecular Weight",
            Column::Charge => "Charge",
            Column::Compartment => "Compartments",
            Column::Inchi => "Inchi",
            Column::InchiKey => "InchiKey",
            Column::Smiles => "SMILES",
        }
    }

    /// Column named by a header, ignoring case and a few common aliases.
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized = header.trim().to_lowercase().replace(['_', '-'], " ");
        let column = match normalized.as_str() {
            "identifier" | "id" => Column::Identifier,
            "name" => Column::Name,
            "reaction equation" | "equation" | "formula" => Column::Equation,
            "gpr" | "gene association" => Column::Gpr,
            "ec number" | "ec" => Column::EcNumber,
            "pathway list" | "pathways" | "pathway" | "subsystem" => Column::Pathways,
            "reaction status" | "status" => Column::Status,
            "comment" | "comments" => Column::Comment,
            "flux lower bound" | "lower bound" => Column::LowerBound,
            "flux upper bound" | "upper bound" => Column::UpperBound,
            "biblio" | "pmid" | "references" => Column::Biblio,
            "score" | "confidence" => Column::Score,
            "chemical formula" => Column::Formula,
            "molecular weight" | "mass" => Column::MolecularWeight,
            "charge" => Column::Charge,
            "compartments" | "compartment" => Column::Compartment,
            "inchi" => Column::Inchi,
            "inchikey" => Column::InchiKey,
            "smiles" => Column::Smiles,
            _ => return None,
        };
        Some(column)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_headers_are_recognized() {
        for column in REACTION_COLUMNS.iter().chain(METABOLITE_COLUMNS) {
            assert_eq!(Column::from_header(column.header()), Some(*column));
        }
        assert_eq!(Column::from_header(" lower_bound "), Some(Column::LowerBound));
        assert_eq!(Column::from_header("unknown"), None);
    }

    #[test]
    fn test_split_list_with_brackets() {
        let config = TabularConfigBuilder::default()
            .pathway_brackets(Some(('(', ')')))
            .build()
            .unwrap();
        assert_eq!(
            config.split_list("\"(Glycolysis || TCA cycle)\""),
            vec!["Glycolysis", "TCA cycle"]
        );
    }

    #[test]
    fn test_palsson_ids() {
        let config = TabularConfigBuilder::default()
            .palsson_ids(true)
            .build()
            .unwrap();
        assert_eq!(config.reaction_id("PGI"), "R_PGI");
        assert_eq!(config.metabolite_id("glc", "c"), "M_glc_c");
        assert_eq!(config.metabolite_id("M_glc_c", "c"), "M_glc_c");
    }
}
