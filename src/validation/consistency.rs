//! Consistency checks of networks.
//!
//! A network is consistent when every id it refers to resolves: reaction participants,
//! enzymes, pathways and flux units, complex components, protein genes, and the
//! compartments of species. Complexes must also be free of cycles.
//!
//! The main entry point is [`check_consistency`], which runs all checks and returns a
//! [`Report`].

use std::fmt;

use colored::Colorize;

use crate::network::graph::BioNetwork;
use crate::validation::enzymes::check_enzymes;
use crate::validation::reactions::check_reactions;
use crate::validation::species::check_species;

/// Checks the consistency of a network.
///
/// # Arguments
///
/// * `network` - The network to check
///
/// # Returns
///
/// Returns a `Report` containing the results of the checks.
pub fn check_consistency(network: &BioNetwork) -> Report {
    let mut report = Report::new();

    check_species(network, &mut report);
    check_enzymes(network, &mut report);
    check_reactions(network, &mut report);

    report
}

/// Results of the consistency checks.
///
/// The network is considered invalid if any result has Error severity.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Default)]
pub struct Report {
    /// False as soon as one result is an error
    pub is_valid: bool,
    pub results: Vec<ValidationResult>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            results: Vec::new(),
        }
    }

    /// Records a result, invalidating the report on errors.
    pub fn add_result(&mut self, result: ValidationResult) {
        self.is_valid &= result.severity != Severity::Error;
        self.results.push(result);
    }

    /// Results concerning the entity with the given id.
    pub fn filter_results(&self, identifier: &str) -> Vec<ValidationResult> {
        self.results
            .iter()
            .filter(|result| result.identifier.as_deref() == Some(identifier))
            .cloned()
            .collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.results
            .iter()
            .filter(|result| result.severity == severity)
            .count()
    }

    /// Drops every result below the given severity.
    pub fn retain_severity(&mut self, minimum: Severity) {
        self.results.retain(|result| result.severity.rank() >= minimum.rank());
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(f, "{result}")?;
        }

        let summary = format!(
            "{} errors, {} warnings",
            self.count(Severity::Error),
            self.count(Severity::Warning)
        );
        let summary = if self.is_valid {
            summary.bold().green()
        } else {
            summary.bold().red()
        };
        write!(f, "{summary}")
    }
}

/// A single issue found during the checks.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ValidationResult {
    /// Path of the offending field, e.g. `/reactions/R1/enzymes/P1`
    location: String,
    message: String,
    severity: Severity,
    identifier: Option<String>,
}

impl ValidationResult {
    pub fn new(
        location: String,
        message: String,
        severity: Severity,
        identifier: Option<String>,
    ) -> Self {
        Self {
            location,
            message,
            severity,
            identifier,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> &Severity {
        &self.severity
    }

    pub fn identifier(&self) -> &Option<String> {
        &self.identifier
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.severity.to_string().bold();
        let (label, message) = match self.severity {
            Severity::Error => (label.red(), self.message.red()),
            Severity::Warning => (label.yellow(), self.message.yellow()),
            Severity::Info => (label.cyan(), self.message.normal()),
        };
        write!(f, "{label} {}: {message}", self.location.dimmed())
    }
}

/// Severity of an issue.
///
/// Errors are references that do not resolve; the network cannot be written or analysed
/// as is. Warnings flag incomplete but usable data.
#[derive(Debug, Clone, PartialEq, Eq, Copy, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    fn rank(self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Warning => 1,
            Severity::Error => 2,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "{name}")
    }
}
