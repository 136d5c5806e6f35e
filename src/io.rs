//! JSON persistence of networks.
//!
//! The JSON form is the serde serialization of [`BioNetwork`]: entity collections keyed
//! by id, relations expressed through ids.

use std::path::PathBuf;

use thiserror::Error;

use crate::network::graph::BioNetwork;

/// Loads a network from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the JSON file
///
/// # Returns
///
/// Returns a `Result` containing either:
/// * `Ok(BioNetwork)` - The parsed network
/// * `Err(IOError)` - The file could not be opened or is not a network
pub fn load_network(path: impl Into<PathBuf>) -> Result<BioNetwork, IOError> {
    let path = path.into();
    let file = std::fs::File::open(&path).map_err(IOError::FileNotFound)?;
    let network = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(IOError::JsonParseError)?;
    log::debug!("Loaded network from {}", path.display());
    Ok(network)
}

/// Saves a network to a pretty-printed JSON file.
///
/// # Arguments
///
/// * `path` - Destination of the JSON file
/// * `network` - The network to save
pub fn save_network(path: impl Into<PathBuf>, network: &BioNetwork) -> Result<(), IOError> {
    let path = path.into();
    let file = std::fs::File::create(&path).map_err(IOError::FileNotFound)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), network)
        .map_err(IOError::JsonParseError)?;
    log::debug!("Saved network to {}", path.display());
    Ok(())
}

/// Errors of network persistence.
#[derive(Error, Debug)]
pub enum IOError {
    /// The file could not be opened or created.
    #[error("File not found: {0}")]
    FileNotFound(#[from] std::io::Error),

    /// The file contents could not be parsed as, or serialized to, JSON.
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::network::entity::{Metabolite, Reaction};

    #[test]
    fn test_save_and_load() {
        let mut network = BioNetwork::new("net", "A network");
        network.add_metabolite(Metabolite::new("glc", "glucose")).unwrap();
        network.add_reaction(Reaction::new("R1", "")).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        save_network(&path, &network).unwrap();

        let loaded = load_network(&path).unwrap();
        assert_eq!(loaded, network);
    }

    #[test]
    fn test_missing_file() {
        let result = load_network("does/not/exist.json");
        assert!(matches!(result, Err(IOError::FileNotFound(_))));
    }
}
