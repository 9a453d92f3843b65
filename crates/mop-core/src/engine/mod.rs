//! # Engine Module
//!
//! This module implements the placement engine: everything that moves ligand copies onto
//! the edges and faces of a scaled polyhedron.
//!
//! ## Overview
//!
//! A run is described by an [`config::AssemblyConfig`]. From it the workflow layer picks a
//! [`placement::PlacementStrategy`], which fixes the coordinate multiplier once and then
//! moves each staged copy onto its target. All motion goes through the
//! [`aligner::RigidAligner`], so every copy is re-imaged into the box after each move.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Shape, placement mode, scaling, orientation, anchors, and box settings
//! - **Rigid Motion** ([`aligner`]) - The single rotate primitive and the isometries it applies
//! - **Anchor Matching** ([`matching`]) - Minimum-cost assignment of anchors to targets
//! - **Scaling** ([`scaling`]) - Coordinate multiplier and automatic box sizing
//! - **Placement Strategies** ([`placement`]) - Edge, face, bent, and single-copy placement
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types and error propagation
//!
//! ## Key Capabilities
//!
//! - **One cross-product convention** for every axis derived from two directions
//! - **Deterministic degenerate handling** for parallel and anti-parallel alignments
//! - **General nearest assignment** for 3, 4, and 5 anchor ligands
//! - **Least-squares refinement** when a ligand is not exactly congruent with its face

pub mod aligner;
pub mod config;
pub mod error;
pub mod matching;
pub mod placement;
pub mod progress;
pub mod scaling;
