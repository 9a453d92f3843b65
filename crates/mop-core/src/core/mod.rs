//! # Core Module
//!
//! This module provides the stateless building blocks of polyhedral ligand placement:
//! molecular models, reference solids, anchor discovery, geometry helpers, and file I/O.
//!
//! ## Overview
//!
//! Everything in `core` is either immutable data (the polyhedron catalog) or a plain value
//! type manipulated by the [`crate::engine`] layer (ligands, molecules, the simulation box).
//! No module here decides how a ligand is placed; they describe what is being placed and
//! where it may go.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, ligand templates, copies, boundaries, and the box
//! - **Reference Geometry** ([`polyhedra`]) - The five Platonic solids and the nearest-neighbour edge finder
//! - **Anchor Knowledge** ([`topology`]) - Metal/non-metal type tables and explicit anchor registries
//! - **File I/O** ([`io`]) - BGF reading of ligand templates and writing of assembled boxes
//! - **Math Utilities** ([`utils`]) - Axis/angle derivation with a defined degenerate fallback
//!
//! ## Key Capabilities
//!
//! - **Index-stable templates** so anchors and bonds stay valid across every copy
//! - **Catalog built once** from literal tables and validated against computed edges
//! - **Automatic anchor discovery** from force field types and bonds
//! - **Periodic re-imaging** behind a single boundary trait

pub mod io;
pub mod models;
pub mod polyhedra;
pub mod topology;
pub mod utils;
