//! Recoverable conversion issues.
//!
//! Conversions never abort on a single malformed record. Instead the record is left
//! partially populated and a [`ConversionWarning`] is collected, so callers can inspect
//! what was skipped once the conversion has finished. Every warning is also forwarded to
//! the `log` facade.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A single recoverable issue found during a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionWarning {
    /// Id of the element the issue was found on, if any.
    pub element: Option<String>,
    pub message: String,
}

impl Display for ConversionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.element {
            Some(element) => write!(f, "[{}] {}", element, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Collection of warnings accumulated during one conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Warnings(Vec<ConversionWarning>);

impl Warnings {
    /// Records a warning attached to an element.
    pub fn element(&mut self, element: impl Into<String>, message: impl Into<String>) {
        self.record(ConversionWarning {
            element: Some(element.into()),
            message: message.into(),
        });
    }

    /// Records a warning about the document as a whole.
    pub fn document(&mut self, message: impl Into<String>) {
        self.record(ConversionWarning {
            element: None,
            message: message.into(),
        });
    }

    fn record(&mut self, warning: ConversionWarning) {
        log::warn!("{warning}");
        self.0.push(warning);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversionWarning> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    pub fn into_vec(self) -> Vec<ConversionWarning> {
        self.0
    }
}
