//! Export of reaction and metabolite tables.
//!
//! The tables use the headers of [`REACTION_COLUMNS`] and [`METABOLITE_COLUMNS`] and can
//! be read back with the importers of this module's sibling `reader`.

use std::io::Write;

use itertools::Itertools;

use crate::{
    gpr::resolver::association_for_reaction,
    network::graph::BioNetwork,
    tabular::{
        config::{Column, TabularConfig, METABOLITE_COLUMNS, REACTION_COLUMNS},
        equation::format_equation,
        error::TabularError,
    },
    warning::Warnings,
};

fn csv_writer<W: Write>(writer: W, config: &TabularConfig) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer)
}

fn header<W: Write>(
    writer: &mut csv::Writer<W>,
    columns: &[Column],
) -> Result<(), TabularError> {
    writer.write_record(columns.iter().map(Column::header))?;
    Ok(())
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Writes the reactions of a network as a reaction table.
///
/// The gene association column is derived from the enzymes of each reaction, so the
/// returned warnings list the enzymes that could not be expressed as genes.
pub fn export_reactions<W: Write>(
    network: &BioNetwork,
    writer: W,
    config: &TabularConfig,
) -> Result<Warnings, TabularError> {
    let mut warnings = Warnings::default();
    let mut writer = csv_writer(writer, config);
    header(&mut writer, REACTION_COLUMNS)?;

    let (open, close) = config.gpr_brackets;
    for reaction in network.reactions.values() {
        let gpr = association_for_reaction(network, reaction, &mut warnings)
            .map(|expr| {
                expr.to_string()
                    .chars()
                    .map(|c| match c {
                        '(' => open,
                        ')' => close,
                        c => c,
                    })
                    .collect::<String>()
            })
            .unwrap_or_default();

        let mut pathways = reaction
            .pathways
            .iter()
            .map(|id| {
                network
                    .pathways
                    .get(id)
                    .filter(|pathway| !pathway.name.is_empty())
                    .map_or(id.as_str(), |pathway| pathway.name.as_str())
            })
            .join(&config.list_separator);
        if let (Some((open, close)), false) = (config.pathway_brackets, pathways.is_empty()) {
            pathways = format!("{open}{pathways}{close}");
        }

        let record = REACTION_COLUMNS.iter().map(|column| match column {
            Column::Identifier => reaction.id.clone(),
            Column::Name => reaction.name.clone(),
            Column::Equation => format_equation(reaction, config),
            Column::Gpr => gpr.clone(),
            Column::EcNumber => optional(&reaction.ec_number),
            Column::Pathways => pathways.clone(),
            Column::Status => optional(&reaction.status),
            Column::Comment => optional(&reaction.comment),
            Column::LowerBound => optional(&reaction.lower_bound.as_ref().map(|b| b.value)),
            Column::UpperBound => optional(&reaction.upper_bound.as_ref().map(|b| b.value)),
            Column::Biblio => reaction.pmids.iter().join(&config.list_separator),
            Column::Score => optional(&reaction.score),
            _ => String::new(),
        });
        writer.write_record(record)?;
    }

    writer.flush()?;
    Ok(warnings)
}

/// Writes the metabolites of a network as a metabolite table.
pub fn export_metabolites<W: Write>(
    network: &BioNetwork,
    writer: W,
    config: &TabularConfig,
) -> Result<(), TabularError> {
    let mut writer = csv_writer(writer, config);
    header(&mut writer, METABOLITE_COLUMNS)?;

    for metabolite in network.metabolites.values() {
        let record = METABOLITE_COLUMNS.iter().map(|column| match column {
            Column::Identifier => metabolite.id.clone(),
            Column::Name => metabolite.name.clone(),
            Column::Formula => optional(&metabolite.formula),
            Column::MolecularWeight => optional(&metabolite.molecular_weight),
            Column::Charge => optional(&metabolite.charge),
            Column::Compartment => optional(&metabolite.compartment),
            Column::Inchi => optional(&metabolite.inchi),
            Column::InchiKey => optional(&metabolite.inchikey),
            Column::Smiles => optional(&metabolite.smiles),
            _ => String::new(),
        });
        writer.write_record(record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tabular::reader::{import_metabolites, import_reactions};

    const REACTIONS: &str = "Identifier\tName\tReaction Equation\tGPR\tPathway List\n\
        R1\tfirst\tA + 2 B -> C\tg1 or (g2 and g3)\tGlycolysis\n";

    #[test]
    fn test_export_reactions() {
        let config = TabularConfig::default();
        let mut network = BioNetwork::new("net", "");
        import_reactions(REACTIONS.as_bytes(), &mut network, &config).unwrap();

        let mut out = Vec::new();
        let warnings = export_reactions(&network, &mut out, &config).unwrap();
        assert!(warnings.is_empty());

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            REACTION_COLUMNS.iter().map(Column::header).join("\t")
        );
        assert_eq!(
            lines.next().unwrap(),
            "R1\tfirst\tA[c] + 2 B[c] -> C[c]\tg1 or (g2 and g3)\t\tGlycolysis\t\t\t0\t1000\t\t"
        );
    }

    #[test]
    fn test_reactions_read_back() {
        let config = TabularConfig::default();
        let mut network = BioNetwork::new("net", "");
        import_reactions(REACTIONS.as_bytes(), &mut network, &config).unwrap();

        let mut out = Vec::new();
        export_reactions(&network, &mut out, &config).unwrap();

        let mut reread = BioNetwork::new("net", "");
        import_reactions(out.as_slice(), &mut reread, &config).unwrap();
        assert_eq!(reread.reactions["R1"], network.reactions["R1"]);
        assert_eq!(reread.complexes.len(), 1);
    }

    #[test]
    fn test_export_metabolites() {
        let config = TabularConfig::default();
        let table = "Identifier\tName\tCharge\nglc\tglucose\t0\n";
        let mut network = BioNetwork::new("net", "");
        import_metabolites(table.as_bytes(), &mut network, &config).unwrap();

        let mut out = Vec::new();
        export_metabolites(&network, &mut out, &config).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("glc\tglucose\t\t\t0\tc\t\t\t"));
    }
}
