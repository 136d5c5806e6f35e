use thiserror::Error;

use crate::network::error::NetworkError;

/// Errors raised while parsing or resolving gene-protein-reaction rules.
#[derive(Debug, Error, PartialEq)]
pub enum GprError {
    /// The expression contains no gene at all
    #[error("Empty gene association")]
    Empty,

    /// A token appeared where it is not allowed
    #[error("Unexpected token '{token}' at position {position} in gene association")]
    UnexpectedToken { token: String, position: usize },

    /// The expression ended while an operand was expected
    #[error("Gene association ended unexpectedly")]
    UnexpectedEnd,

    /// Opening and closing parentheses do not match
    #[error("Unbalanced parentheses in gene association")]
    UnbalancedParentheses,

    /// Error while attaching the resolved enzymes to the network
    #[error(transparent)]
    NetworkError(#[from] NetworkError),
}
