use thiserror::Error;

use super::config::{ConfigError, PlacementMode};
use crate::core::models::ligand::LigandError;
use crate::core::polyhedra::catalog::CatalogError;
use crate::core::topology::linkers::LinkerError;
use crate::core::topology::registry::RegistryLoadError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Polyhedron catalog error: {source}")]
    Catalog {
        #[from]
        source: CatalogError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Ligand registry error: {source}")]
    Registry {
        #[from]
        source: RegistryLoadError,
    },

    #[error("Anchor discovery failed: {source}")]
    AnchorDiscovery {
        #[from]
        source: LinkerError,
    },

    #[error("Invalid ligand template: {source}")]
    Ligand {
        #[from]
        source: LigandError,
    },

    #[error("Placement mode '{mode}' needs {expected} anchor atoms, but ligand '{ligand}' has {found}")]
    AnchorCountMismatch {
        mode: PlacementMode,
        ligand: String,
        expected: usize,
        found: usize,
    },

    #[error("Failed to place ligand copy on {target}: {message}")]
    Placement { target: String, message: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
