use crate::core::models::ligand::LinkerPair;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Explicit anchor definition for one ligand, as written in a registry file.
///
/// ```toml
/// [BDC]
/// anchors = [0, 17]
/// linker-oxygen = 1
/// linker-carbon = 2
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LigandEntry {
    pub anchors: Vec<usize>,
    pub linker_oxygen: Option<usize>,
    pub linker_carbon: Option<usize>,
}

impl LigandEntry {
    /// The linker pair, when both of its atoms are given.
    pub fn linker(&self) -> Option<LinkerPair> {
        match (self.linker_oxygen, self.linker_carbon) {
            (Some(oxygen), Some(carbon)) => Some(LinkerPair { oxygen, carbon }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LigandRegistry {
    registry: HashMap<String, LigandEntry>,
}

impl LigandRegistry {
    pub fn load(path: &Path) -> Result<Self, RegistryLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| RegistryLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let registry: HashMap<String, LigandEntry> = toml::from_str(content)?;
        Ok(Self { registry })
    }

    /// Looks up a ligand by name; the exact name wins over a case-insensitive match.
    pub fn get(&self, ligand_name: &str) -> Option<&LigandEntry> {
        self.registry.get(ligand_name).or_else(|| {
            self.registry
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(ligand_name))
                .map(|(_, entry)| entry)
        })
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum RegistryLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}
