use crate::network::graph::BioNetwork;
use crate::validation::consistency::{Report, Severity, ValidationResult};

/// Checks the compartments of compartments, metabolites, proteins and complexes.
pub fn check_species(network: &BioNetwork, report: &mut Report) {
    for compartment in network.compartments.values() {
        if let Some(outside) = &compartment.outside {
            if !network.contains_compartment(outside) {
                report.add_result(ValidationResult::new(
                    format!("/compartments/{}/outside", compartment.id),
                    format!(
                        "Compartment '{}' lies in unknown compartment '{outside}'.",
                        compartment.id
                    ),
                    Severity::Error,
                    Some(compartment.id.clone()),
                ));
            }
        }

        if let Some(units) = &compartment.units {
            if !network.contains_unit_definition(units) && !is_base_unit(units) {
                report.add_result(ValidationResult::new(
                    format!("/compartments/{}/units", compartment.id),
                    format!(
                        "Compartment '{}' uses undefined unit '{units}'.",
                        compartment.id
                    ),
                    Severity::Warning,
                    Some(compartment.id.clone()),
                ));
            }
        }
    }

    for metabolite in network.metabolites.values() {
        match &metabolite.compartment {
            Some(compartment) => check_compartment(
                network,
                report,
                "metabolites",
                &metabolite.id,
                compartment,
            ),
            None => report.add_result(ValidationResult::new(
                format!("/metabolites/{}", metabolite.id),
                format!("Metabolite '{}' has no compartment.", metabolite.id),
                Severity::Warning,
                Some(metabolite.id.clone()),
            )),
        }
    }

    for protein in network.proteins.values() {
        if let Some(compartment) = &protein.compartment {
            check_compartment(network, report, "proteins", &protein.id, compartment);
        }
    }

    for complex in network.complexes.values() {
        if let Some(compartment) = &complex.compartment {
            check_compartment(network, report, "complexes", &complex.id, compartment);
        }
    }
}

fn check_compartment(
    network: &BioNetwork,
    report: &mut Report,
    collection: &str,
    id: &str,
    compartment: &str,
) {
    if !network.contains_compartment(compartment) {
        report.add_result(ValidationResult::new(
            format!("/{collection}/{id}/compartment"),
            format!("'{id}' is located in unknown compartment '{compartment}'."),
            Severity::Error,
            Some(id.to_string()),
        ));
    }
}

/// Units predefined by SBML, usable without a unit definition.
fn is_base_unit(unit: &str) -> bool {
    matches!(
        unit,
        "substance" | "volume" | "area" | "length" | "time" | "dimensionless"
    ) || crate::sbml::units::UNIT_KINDS.contains(&unit)
}
