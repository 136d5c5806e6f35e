//! Import of reaction and metabolite tables.
//!
//! The first line of a table names its columns (see [`Column::from_header`]); unknown
//! columns are ignored. Only the `Identifier` column is required. Rows are read into the
//! network one by one, and a malformed cell leaves its field empty with a warning. A
//! reaction equation without a recognized arrow aborts the import.

use std::collections::HashMap;
use std::io::Read;

use crate::{
    gpr::resolver::EnzymeResolver,
    network::{
        entity::{Compartment, FluxBound, Metabolite, Pathway, Reaction},
        graph::BioNetwork,
    },
    tabular::{
        config::{Column, TabularConfig},
        equation::parse_equation,
        error::TabularError,
    },
    warning::Warnings,
};

/// A data row with its cells addressed by column.
struct Row<'a> {
    record: &'a csv::StringRecord,
    columns: &'a HashMap<Column, usize>,
    config: &'a TabularConfig,
}

impl<'a> Row<'a> {
    /// The stripped cell of a column, `None` when absent or empty.
    fn get(&self, column: Column) -> Option<&'a str> {
        let index = *self.columns.get(&column)?;
        let cell = self.config.strip(self.record.get(index)?);
        (!cell.is_empty()).then_some(cell)
    }

    fn get_f64(&self, column: Column, id: &str, warnings: &mut Warnings) -> Option<f64> {
        let cell = self.get(column)?;
        match cell.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                warnings.element(id, format!("Invalid {} '{cell}'", column.header()));
                None
            }
        }
    }
}

fn csv_reader<R: Read>(reader: R, config: &TabularConfig) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn header_columns<R: Read>(
    reader: &mut csv::Reader<R>,
) -> Result<HashMap<Column, usize>, TabularError> {
    let mut columns = HashMap::new();
    for (index, header) in reader.headers()?.iter().enumerate() {
        match Column::from_header(header) {
            Some(column) => {
                columns.entry(column).or_insert(index);
            }
            None => log::debug!("Ignoring column '{header}'"),
        }
    }

    if !columns.contains_key(&Column::Identifier) {
        return Err(TabularError::MissingColumn(Column::Identifier.header()));
    }
    Ok(columns)
}

fn ensure_compartment(network: &mut BioNetwork, id: &str) -> Result<(), TabularError> {
    if !network.compartments.contains_key(id) {
        network.add_compartment(Compartment::new(id))?;
    }
    Ok(())
}

/// Reads a reaction table into a network.
///
/// Metabolites, compartments and pathways named by a row are created when the network
/// does not have them yet. Missing flux bounds default to the configured ones, with a
/// lower bound of at least zero for irreversible reactions. The gene association is
/// resolved into proteins and complexes attached to the reaction.
///
/// # Arguments
///
/// * `reader` - Source of the table
/// * `network` - Network receiving the reactions
/// * `config` - Delimiters and brackets of the table
///
/// # Returns
///
/// The warnings collected while reading.
pub fn import_reactions<R: Read>(
    reader: R,
    network: &mut BioNetwork,
    config: &TabularConfig,
) -> Result<Warnings, TabularError> {
    let mut warnings = Warnings::default();
    let mut reader = csv_reader(reader, config);
    let columns = header_columns(&mut reader)?;
    let resolver = EnzymeResolver::default();

    for record in reader.records() {
        let record = record?;
        let row = Row {
            record: &record,
            columns: &columns,
            config,
        };

        let Some(identifier) = row.get(Column::Identifier) else {
            warnings.document(format!(
                "Skipping reaction row {} without identifier",
                record.position().map_or(0, |p| p.line())
            ));
            continue;
        };
        let id = config.reaction_id(identifier);
        if network.reactions.contains_key(&id) {
            warnings.element(&id, "Duplicated reaction, keeping the first row");
            continue;
        }

        let mut reaction = Reaction::new(id.clone(), row.get(Column::Name).unwrap_or_default());

        if let Some(text) = row.get(Column::Equation) {
            let equation = parse_equation(text, config)?;
            for participant in equation.left.iter().chain(&equation.right) {
                let compartment = participant
                    .compartment
                    .as_deref()
                    .unwrap_or(config.default_compartment.as_str());
                ensure_compartment(network, compartment)?;
                if !network.metabolites.contains_key(&participant.species) {
                    let mut metabolite =
                        Metabolite::new(participant.species.clone(), participant.species.clone());
                    metabolite.compartment = Some(compartment.to_string());
                    network.add_metabolite(metabolite)?;
                }
            }
            reaction.left = equation.left;
            reaction.right = equation.right;
            reaction.reversible = equation.reversible;
        }

        let unit = network.ensure_flux_unit();
        let default_lower = if reaction.reversible {
            config.default_lower_bound
        } else {
            config.default_lower_bound.max(0.0)
        };
        let lower = row
            .get_f64(Column::LowerBound, &id, &mut warnings)
            .unwrap_or(default_lower);
        let upper = row
            .get_f64(Column::UpperBound, &id, &mut warnings)
            .unwrap_or(config.default_upper_bound);
        reaction.lower_bound = Some(FluxBound::new(lower, unit.clone()));
        reaction.upper_bound = Some(FluxBound::new(upper, unit));

        reaction.ec_number = row.get(Column::EcNumber).map(str::to_string);
        reaction.status = row.get(Column::Status).map(str::to_string);
        reaction.comment = row.get(Column::Comment).map(str::to_string);
        reaction.score = row.get(Column::Score).map(str::to_string);

        if let Some(cell) = row.get(Column::Pathways) {
            for name in config.split_list(cell) {
                if !network.pathways.contains_key(name) {
                    network.add_pathway(Pathway::new(name, name))?;
                }
                reaction.pathways.insert(name.to_string());
            }
        }

        if let Some(cell) = row.get(Column::Biblio) {
            for reference in config.split_list(cell) {
                let pmid = reference
                    .trim_start_matches("PMID:")
                    .trim_start_matches("pmid:")
                    .trim();
                if !pmid.is_empty() && pmid.chars().all(|c| c.is_ascii_digit()) {
                    reaction.pmids.insert(pmid.to_string());
                } else {
                    warnings.element(&id, format!("Ignoring reference '{reference}'"));
                }
            }
        }

        network.add_reaction(reaction)?;

        if let Some(gpr) = row.get(Column::Gpr) {
            let (open, close) = config.gpr_brackets;
            let gpr: String = gpr
                .chars()
                .map(|c| match c {
                    c if c == open => '(',
                    c if c == close => ')',
                    c => c,
                })
                .collect();
            let enzymes = resolver.resolve_gene_association(network, &id, &gpr)?;
            log::debug!("Reaction {id} is catalysed by {} enzymes", enzymes.len());
        }
    }

    Ok(warnings)
}

/// Reads a metabolite table into a network.
///
/// Existing metabolites are completed: only the fields they lack are taken from the
/// table. The first compartment of the `Compartments` cell, or the default one, becomes
/// the compartment of the metabolite.
pub fn import_metabolites<R: Read>(
    reader: R,
    network: &mut BioNetwork,
    config: &TabularConfig,
) -> Result<Warnings, TabularError> {
    let mut warnings = Warnings::default();
    let mut reader = csv_reader(reader, config);
    let columns = header_columns(&mut reader)?;

    for record in reader.records() {
        let record = record?;
        let row = Row {
            record: &record,
            columns: &columns,
            config,
        };

        let Some(identifier) = row.get(Column::Identifier) else {
            warnings.document("Skipping metabolite row without identifier");
            continue;
        };

        let compartment = row
            .get(Column::Compartment)
            .and_then(|cell| config.split_list(cell).into_iter().next())
            .unwrap_or(config.default_compartment.as_str())
            .to_string();
        ensure_compartment(network, &compartment)?;

        let id = config.metabolite_id(identifier, &compartment);
        if !network.metabolites.contains_key(&id) {
            network.add_metabolite(Metabolite::new(id.clone(), ""))?;
        }

        let molecular_weight = row.get_f64(Column::MolecularWeight, &id, &mut warnings);
        let charge = row.get(Column::Charge).and_then(|cell| {
            let parsed = cell
                .parse::<i32>()
                .ok()
                .or_else(|| cell.parse::<f64>().ok().map(|c| c.round() as i32));
            if parsed.is_none() {
                warnings.element(&id, format!("Invalid charge '{cell}'"));
            }
            parsed
        });

        let Some(metabolite) = network.metabolites.get_mut(&id) else {
            continue;
        };
        if metabolite.name.is_empty() || metabolite.name == metabolite.id {
            if let Some(name) = row.get(Column::Name) {
                metabolite.name = name.to_string();
            }
        }
        if metabolite.compartment.is_none() {
            metabolite.compartment = Some(compartment);
        }

        let fill = |field: &mut Option<String>, value: Option<&str>| {
            if field.is_none() {
                *field = value.map(str::to_string);
            }
        };
        fill(&mut metabolite.formula, row.get(Column::Formula));
        fill(&mut metabolite.inchi, row.get(Column::Inchi));
        fill(&mut metabolite.inchikey, row.get(Column::InchiKey));
        fill(&mut metabolite.smiles, row.get(Column::Smiles));

        if metabolite.molecular_weight.is_none() {
            metabolite.molecular_weight = molecular_weight;
        }
        if metabolite.charge.is_none() {
            metabolite.charge = charge;
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::network::entity::{EnzymeRef, Participant};

    const REACTIONS: &str = "Identifier\tName\tReaction Equation\tGPR\tPathway List\tBiblio\n\
        R00109\tcatalase\t\"A + B -> C\"\t\"(g1 and g2)\"\tGlycolysis || TCA cycle\t12345\n\
        R2\t\t2 C[m] <-> D[m]\tg3\t\t\n";

    #[test]
    fn test_import_reactions() {
        let mut network = BioNetwork::new("net", "");
        let warnings =
            import_reactions(REACTIONS.as_bytes(), &mut network, &TabularConfig::default())
                .unwrap();
        assert!(warnings.is_empty(), "{warnings:?}");

        let reaction = &network.reactions["R00109"];
        let species = |side: &[Participant]| {
            side.iter()
                .map(|p| (p.species.clone(), p.coefficient))
                .collect::<Vec<_>>()
        };
        assert_eq!(
            species(&reaction.left),
            vec![("A".to_string(), 1.0), ("B".to_string(), 1.0)]
        );
        assert_eq!(species(&reaction.right), vec![("C".to_string(), 1.0)]);
        assert!(!reaction.reversible);

        assert_eq!(reaction.enzymes.len(), 1);
        let Some(EnzymeRef::Complex(complex_id)) = reaction.enzymes.iter().next() else {
            panic!("expected a complex enzyme");
        };
        let genes: Vec<_> = network.complexes[complex_id]
            .components
            .iter()
            .map(|component| network.proteins[component.enzyme.id()].gene.clone())
            .collect();
        assert_eq!(
            genes,
            vec![Some("g1".to_string()), Some("g2".to_string())]
        );

        assert_eq!(reaction.pathways.len(), 2);
        assert!(network.pathways.contains_key("TCA cycle"));
        assert!(reaction.pmids.contains("12345"));

        let lower = reaction.lower_bound.as_ref().unwrap();
        assert_relative_eq!(lower.value, 0.0);
        assert_eq!(lower.unit, "mmol_per_gDW_per_hr");
    }

    #[test]
    fn test_reversible_defaults_and_compartments() {
        let mut network = BioNetwork::new("net", "");
        import_reactions(REACTIONS.as_bytes(), &mut network, &TabularConfig::default()).unwrap();

        let reaction = &network.reactions["R2"];
        assert!(reaction.reversible);
        assert_relative_eq!(reaction.lower_bound.as_ref().unwrap().value, -1000.0);
        assert_eq!(network.metabolites["D"].compartment.as_deref(), Some("m"));
        assert!(network.compartments.contains_key("m"));
        assert!(network.compartments.contains_key("c"));
    }

    #[test]
    fn test_unknown_reaction_sign_aborts() {
        let table = "Identifier\tReaction Equation\nR1\tA = B\n";
        let mut network = BioNetwork::new("net", "");
        let result = import_reactions(table.as_bytes(), &mut network, &TabularConfig::default());
        assert!(matches!(result, Err(TabularError::UnknownReactionSign(_))));
    }

    #[test]
    fn test_missing_identifier_column() {
        let table = "Name\tReaction Equation\ncatalase\tA -> B\n";
        let mut network = BioNetwork::new("net", "");
        let result = import_reactions(table.as_bytes(), &mut network, &TabularConfig::default());
        assert!(matches!(result, Err(TabularError::MissingColumn(_))));
    }

    #[test]
    fn test_import_metabolites_fills_missing_fields() {
        let mut network = BioNetwork::new("net", "");
        let mut glucose = Metabolite::new("glc", "glucose");
        glucose.formula = Some("C6H12O6".to_string());
        glucose.compartment = Some("c".to_string());
        network.add_metabolite(glucose).unwrap();

        let table = "Identifier\tName\tChemical Formula\tCharge\tMolecular Weight\n\
            glc\tD-glucose\tXXX\t0\t180.16\n\
            atp\tATP\tC10H12N5O13P3\t-4\tnot a number\n";
        let warnings =
            import_metabolites(table.as_bytes(), &mut network, &TabularConfig::default())
                .unwrap();
        assert_eq!(warnings.len(), 1);

        let glucose = &network.metabolites["glc"];
        assert_eq!(glucose.name, "glucose");
        assert_eq!(glucose.formula.as_deref(), Some("C6H12O6"));
        assert_relative_eq!(glucose.molecular_weight.unwrap(), 180.16);

        let atp = &network.metabolites["atp"];
        assert_eq!(atp.name, "ATP");
        assert_eq!(atp.charge, Some(-4));
        assert_eq!(atp.molecular_weight, None);
    }
}
