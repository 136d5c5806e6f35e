use crate::network::entity::{FluxBound, Reaction};
use crate::network::graph::BioNetwork;
use crate::validation::consistency::{Report, Severity, ValidationResult};

/// Validates the references and flux bounds of every reaction.
pub fn check_reactions(network: &BioNetwork, report: &mut Report) {
    for reaction in network.reactions.values() {
        check_participants(network, report, reaction);
        check_enzymes(network, report, reaction);
        check_pathways(network, report, reaction);
        check_bounds(network, report, reaction);
    }
}

fn error(report: &mut Report, reaction: &Reaction, location: String, message: String) {
    report.add_result(ValidationResult::new(
        format!("/reactions/{}/{location}", reaction.id),
        message,
        Severity::Error,
        Some(reaction.id.clone()),
    ));
}

fn is_species(network: &BioNetwork, id: &str) -> bool {
    network.contains_metabolite(id) || network.contains_protein(id) || network.contains_complex(id)
}

fn check_participants(network: &BioNetwork, report: &mut Report, reaction: &Reaction) {
    for (side, participants) in [("left", &reaction.left), ("right", &reaction.right)] {
        for participant in participants {
            if !is_species(network, &participant.species) {
                error(
                    report,
                    reaction,
                    format!("{side}/{}", participant.species),
                    format!(
                        "Species '{}' in reaction is not defined in the network.",
                        participant.species
                    ),
                );
            }
        }
    }

    for (flag, ids) in [
        ("side_compounds", &reaction.side_compounds),
        ("cofactors", &reaction.cofactors),
    ] {
        for id in ids {
            if !network.contains_metabolite(id) {
                report.add_result(ValidationResult::new(
                    format!("/reactions/{}/{flag}/{id}", reaction.id),
                    format!("Metabolite '{id}' flagged in {flag} is not defined."),
                    Severity::Warning,
                    Some(reaction.id.clone()),
                ));
            }
        }
    }
}

fn check_enzymes(network: &BioNetwork, report: &mut Report, reaction: &Reaction) {
    for enzyme in &reaction.enzymes {
        if !network.contains_enzyme(enzyme) {
            error(
                report,
                reaction,
                format!("enzymes/{}", enzyme.id()),
                format!("Enzyme '{}' is not defined in the network.", enzyme.id()),
            );
        }
    }
}

fn check_pathways(network: &BioNetwork, report: &mut Report, reaction: &Reaction) {
    for pathway in &reaction.pathways {
        if !network.contains_pathway(pathway) {
            error(
                report,
                reaction,
                format!("pathways/{pathway}"),
                format!("Pathway '{pathway}' is not defined in the network."),
            );
        }
    }
}

fn check_bounds(network: &BioNetwork, report: &mut Report, reaction: &Reaction) {
    let bounds: [(&str, &Option<FluxBound>); 2] = [
        ("lower_bound", &reaction.lower_bound),
        ("upper_bound", &reaction.upper_bound),
    ];
    for (name, bound) in bounds {
        let Some(bound) = bound else {
            continue;
        };
        if !network.contains_unit_definition(&bound.unit) {
            error(
                report,
                reaction,
                name.to_string(),
                format!("Flux bound uses undefined unit '{}'.", bound.unit),
            );
        }
    }

    if let (Some(lower), Some(upper)) = (&reaction.lower_bound, &reaction.upper_bound) {
        if lower.value > upper.value {
            error(
                report,
                reaction,
                "lower_bound".to_string(),
                format!(
                    "Lower bound {} exceeds upper bound {}.",
                    lower.value, upper.value
                ),
            );
        }
    }
}
