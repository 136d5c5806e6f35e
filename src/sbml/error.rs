use thiserror::Error;

use crate::network::error::NetworkError;

/// Errors that abort an SBML conversion.
///
/// Problems limited to a single record (an unparseable number, a malformed notes line,
/// a dangling reference) are not errors; they are collected as
/// [`ConversionWarning`](crate::warning::ConversionWarning)s instead.
#[derive(Debug, Error)]
pub enum SBMLError {
    /// Error when reading or writing an SBML file fails
    #[error("Failed to access SBML file: {0}")]
    IOError(#[from] std::io::Error),

    /// Error reported by the XML tokenizer
    #[error("Failed to parse XML: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Error when the XML is well-formed at token level but not as a tree
    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// Error when the root element is not `<sbml>`
    #[error("Not an SBML document: root element is <{0}>")]
    NotSBML(String),

    /// Error when the SBML document doesn't contain a model
    #[error("SBML document has no model")]
    MissingModel,

    /// Error when a structurally required list is absent
    #[error("Model is missing the required {0}")]
    MissingList(&'static str),

    /// Error when a structurally required list appears more than once
    #[error("Model contains {0} more than once")]
    DuplicateList(&'static str),

    /// Error when an invalid unit kind is encountered
    #[error("Invalid unit kind: {0}")]
    InvalidUnitKind(String),

    /// Error when a level/version pair cannot be written
    #[error("Unsupported SBML level {0} version {1}")]
    UnsupportedLevel(u32, u32),

    /// Error when the network itself is inconsistent
    #[error(transparent)]
    NetworkError(#[from] NetworkError),
}
