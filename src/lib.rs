//! Genome-scale metabolic networks
//!
//! This library provides an in-memory graph of the entities of a metabolic network and
//! conversions between that graph and external formats:
//! - Reading and writing SBML Levels 1 to 3, with the `fbc` and `groups` packages
//! - Resolving gene associations into proteins and enzyme complexes
//! - Reading and writing reaction and metabolite tables
//! - Reading KEGG flat files
//! - Checking the consistency of networks
//! - Persisting networks as JSON

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::gpr::expr::*;
    pub use crate::gpr::resolver::*;
    pub use crate::io::*;
    pub use crate::network::entity::*;
    pub use crate::network::error::*;
    pub use crate::network::graph::*;
    pub use crate::network::refs::*;
    pub use crate::network::units::*;
    pub use crate::sbml::error::SBMLError;
    pub use crate::sbml::reader::*;
    pub use crate::sbml::writer::*;
    pub use crate::validation::consistency::*;
    pub use crate::warning::*;

    #[cfg(feature = "kegg")]
    pub use crate::kegg::*;

    #[cfg(feature = "tabular")]
    pub use crate::tabular::{
        config::*, equation::*, error::TabularError, reader::*, writer::*,
    };
}

/// The network model
pub mod network {
    /// Entities of the network and references between them
    pub mod entity;
    /// Errors of network edits
    pub mod error;
    /// The network graph
    pub mod graph;
    /// Cross-references to external databases
    pub mod refs;
    /// Unit definitions
    pub mod units;
}

/// Recoverable conversion issues
pub mod warning;

/// Gene associations
pub mod gpr {
    /// Errors of gene association parsing and resolution
    pub mod error;
    /// Gene association expressions
    pub mod expr;
    /// Resolution of gene associations into enzymes
    pub mod resolver;
}

/// SBML reading and writing
pub mod sbml {
    /// CV term annotations
    pub mod annotation;
    /// Errors of SBML conversion
    pub mod error;
    /// Structured values in notes
    pub mod notes;
    /// Reading SBML documents
    pub mod reader;
    /// SId escaping
    pub mod sid;
    /// Kinds of SBML species
    pub mod speciestype;
    /// Unit definitions
    pub mod units;
    /// Writing SBML documents
    pub mod writer;
    /// Minimal XML element tree
    pub mod xml;
}

/// Reaction and metabolite tables
#[cfg(feature = "tabular")]
pub mod tabular {
    /// Options and column names
    pub mod config;
    /// Reaction equations
    pub mod equation;
    /// Errors of tabular conversion
    pub mod error;
    /// Reading tables
    pub mod reader;
    /// Writing tables
    pub mod writer;
}

/// KEGG flat files
#[cfg(feature = "kegg")]
pub mod kegg;

/// Consistency checks of networks
pub mod validation {
    /// Main consistency interface
    pub mod consistency;
    /// Checks of proteins and complexes
    mod enzymes;
    /// Checks of reactions
    mod reactions;
    /// Checks of compartments and metabolites
    mod species;
}

/// Tables summarizing networks
pub mod info;

/// IO functionality
pub mod io;
