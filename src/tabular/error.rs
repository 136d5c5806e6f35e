use thiserror::Error;

use crate::{gpr::error::GprError, network::error::NetworkError};

/// Errors of tabular import and export.
#[derive(Error, Debug)]
pub enum TabularError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// No reaction arrow was found in an equation
    #[error("Unknown reaction sign in equation '{0}'")]
    UnknownReactionSign(String),

    /// A column without which no row can be read
    #[error("Missing column '{0}'")]
    MissingColumn(&'static str),

    #[error(transparent)]
    NetworkError(#[from] NetworkError),

    #[error(transparent)]
    GprError(#[from] GprError),
}
