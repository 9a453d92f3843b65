//! # Topology Module
//!
//! This module turns a ligand's connectivity into the anchor atoms used for placement.
//!
//! ## Overview
//!
//! Anchors are the chemical attachment points of a ligand (typically the metal atoms capping
//! each coordinating group). They can be discovered automatically from force field types and
//! bonds, or supplied explicitly through a registry file keyed by ligand name:
//!
//! - **Anchor discovery** - Metal and non-metal type tables applied to the bond graph
//! - **Ligand registry** - Explicit anchors and linker atoms loaded from TOML
//!
//! ## Key Components
//!
//! - [`linkers`] - Automatic discovery of anchors and oxygen/carbon linker pairs
//! - [`registry`] - Registry of explicit anchor definitions
//!
//! ## Usage
//!
//! ```ignore
//! use mopbuild::core::topology::{linkers, registry::LigandRegistry};
//!
//! let found = linkers::locate_in_ligand(&ligand)?;
//! let registry = LigandRegistry::load(Path::new("ligands.toml"))?;
//! let bdc = registry.get("BDC").unwrap();
//! ```

pub mod linkers;
pub mod registry;
