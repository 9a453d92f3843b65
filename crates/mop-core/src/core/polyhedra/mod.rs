//! # Polyhedra Module
//!
//! Reference solids that ligand copies are fitted onto.
//!
//! ## Overview
//!
//! The catalog holds the vertex coordinates and face cycles of the five Platonic solids.
//! Coordinates use the conventional integer/golden-ratio forms rather than unit edges, so
//! every consumer derives the physical scale from [`catalog::Polyhedron::min_edge_length`],
//! which is itself computed by the edge finder from the raw vertices.
//!
//! ## Key Components
//!
//! - [`catalog`] - Immutable per-solid tables, built once on first use
//! - [`edges`] - Nearest-neighbour edge finder working on any vertex set

pub mod catalog;
pub mod edges;
