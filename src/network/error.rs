use thiserror::Error;

/// Errors raised while building or traversing a [`BioNetwork`](super::graph::BioNetwork).
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    /// An entity with the same id already exists in the mapping of its kind
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// A referenced entity does not exist in the network
    #[error("Unknown {kind}: {id}")]
    UnknownEntity { kind: &'static str, id: String },

    /// A complex contains itself, directly or through sub-complexes
    #[error("Complex {0} contains itself")]
    ComplexCycle(String),

    /// Complex nesting exceeds the traversal limit
    #[error("Complex {0} is nested deeper than {1} levels")]
    ComplexTooDeep(String, usize),
}
