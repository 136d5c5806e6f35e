use crate::network::entity::EnzymeRef;
use crate::network::error::NetworkError;
use crate::network::graph::BioNetwork;
use crate::validation::consistency::{Report, Severity, ValidationResult};

/// Validates proteins, complexes and the enzyme index of a network.
///
/// # Details
/// - Gene links of proteins must resolve
/// - Components of complexes must resolve and complexes must not contain themselves
/// - Every entry of the enzyme index must resolve
pub fn check_enzymes(network: &BioNetwork, report: &mut Report) {
    for protein in network.proteins.values() {
        if let Some(gene) = &protein.gene {
            if !network.contains_gene(gene) {
                report.add_result(ValidationResult::new(
                    format!("/proteins/{}/gene", protein.id),
                    format!("Protein '{}' is encoded by unknown gene '{gene}'.", protein.id),
                    Severity::Error,
                    Some(protein.id.clone()),
                ));
            }
        }
    }

    for complex in network.complexes.values() {
        let mut resolved = true;
        for component in &complex.components {
            if !network.contains_enzyme(&component.enzyme) {
                resolved = false;
                report.add_result(ValidationResult::new(
                    format!("/complexes/{}/components/{}", complex.id, component.enzyme.id()),
                    format!(
                        "Complex '{}' contains unknown enzyme '{}'.",
                        complex.id,
                        component.enzyme.id()
                    ),
                    Severity::Error,
                    Some(complex.id.clone()),
                ));
            }
        }

        // unknown entities deeper down are reported on their own complex
        if resolved {
            check_complex_tree(network, report, &complex.id);
        }
    }

    for enzyme in &network.enzymes {
        if !network.contains_enzyme(enzyme) {
            report.add_result(ValidationResult::new(
                format!("/enzymes/{}", enzyme.id()),
                format!("Enzyme index refers to unknown enzyme '{}'.", enzyme.id()),
                Severity::Error,
                Some(enzyme.id().to_string()),
            ));
        }
    }
}

fn check_complex_tree(network: &BioNetwork, report: &mut Report, complex_id: &str) {
    let enzyme = EnzymeRef::Complex(complex_id.to_string());
    if let Err(err @ (NetworkError::ComplexCycle(_) | NetworkError::ComplexTooDeep(..))) =
        network.enzyme_tree(&enzyme)
    {
        report.add_result(ValidationResult::new(
            format!("/complexes/{complex_id}"),
            err.to_string(),
            Severity::Error,
            Some(complex_id.to_string()),
        ));
    }
}
