//! Human readable summaries of networks.
//!
//! `BioNetwork` implements `Display` as a table of entity counts followed by a table of
//! reactions. The CLI `info` command prints it.

use std::fmt::{self, Display};

use itertools::Itertools;
use tabled::{builder::Builder, settings::Style};

use crate::network::{
    entity::{FluxBound, Participant, Reaction},
    graph::BioNetwork,
};

/// Row view of an entity for table output.
trait TableRecord {
    fn columns() -> Vec<String>;

    fn to_record(&self) -> Vec<String>;
}

impl Display for BioNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        let title = if self.name.is_empty() {
            self.id.clone()
        } else {
            format!("{} ({})", self.name, self.id)
        };
        builder.push_record(vec![title]);
        builder.push_record(vec![summary_table(self)]);

        if !self.reactions.is_empty() {
            builder.push_record(vec!["Reactions".to_string()]);
            builder.push_record(vec![to_table(self.reactions.values())]);
        }

        let mut table = builder.build();
        table.with(Style::sharp());
        write!(f, "{table}")
    }
}

/// Number of entities of each kind.
pub fn summary_table(network: &BioNetwork) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Entity", "Count"]);

    let counts = [
        ("Compartments", network.compartments.len()),
        ("Metabolites", network.metabolites.len()),
        ("Genes", network.genes.len()),
        ("Proteins", network.proteins.len()),
        ("Complexes", network.complexes.len()),
        ("Pathways", network.pathways.len()),
        ("Reactions", network.reactions.len()),
        ("Unit definitions", network.unit_definitions.len()),
    ];
    for (kind, count) in counts {
        builder.push_record([kind.to_string(), count.to_string()]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn to_table<'a, T, I>(records: I) -> String
where
    T: TableRecord + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut builder = Builder::default();
    builder.push_record(T::columns());
    for record in records {
        builder.push_record(record.to_record());
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

impl TableRecord for Reaction {
    fn columns() -> Vec<String> {
        vec![
            "ID".to_string(),
            "Name".to_string(),
            "Scheme".to_string(),
            "Bounds".to_string(),
            "Enzymes".to_string(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        let bound = |bound: &Option<FluxBound>| {
            bound
                .as_ref()
                .map_or("-".to_string(), |b| b.value.to_string())
        };
        vec![
            self.id.to_string(),
            self.name.to_string(),
            reaction_scheme(self),
            format!("[{}, {}]", bound(&self.lower_bound), bound(&self.upper_bound)),
            self.enzymes.iter().map(|e| e.id()).join(", "),
        ]
    }
}

/// `2 A + B → C`, with `⇄` for reversible reactions.
fn reaction_scheme(reaction: &Reaction) -> String {
    let side = |participants: &[Participant]| {
        participants
            .iter()
            .map(|p| {
                if p.coefficient == 1.0 {
                    p.species.clone()
                } else {
                    format!("{} {}", p.coefficient, p.species)
                }
            })
            .join(" + ")
    };
    let arrow = if reaction.reversible { "⇄" } else { "→" };
    format!("{} {} {}", side(&reaction.left), arrow, side(&reaction.right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::entity::Metabolite;

    #[test]
    fn test_network_table() {
        let mut network = BioNetwork::new("ecoli", "E. coli core");
        network.add_metabolite(Metabolite::new("A", "")).unwrap();
        network.add_metabolite(Metabolite::new("B", "")).unwrap();
        let mut reaction = Reaction::new("R1", "isomerase");
        reaction.left.push(Participant::new("A", 2.0));
        reaction.right.push(Participant::new("B", 1.0));
        reaction.reversible = true;
        network.add_reaction(reaction).unwrap();

        let table = network.to_string();
        assert!(table.contains("E. coli core (ecoli)"));
        assert!(table.contains("2 A ⇄ B"));
        assert!(table.contains("Metabolites"));
    }
}
