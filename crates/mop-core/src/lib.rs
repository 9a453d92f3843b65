//! # mopbuild Core Library
//!
//! A library for building the initial coordinates of metal-organic polyhedra (MOPs) by
//! rigidly placing copies of a ligand template on the edges or faces of a Platonic solid.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture so that geometry, placement logic,
//! and end-to-end procedures can be tested in isolation.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Ligand`, `SimulationBox`), the
//!   polyhedron catalog and edge finder, anchor discovery, and BGF I/O.
//!
//! - **[`engine`]: The Logic Core.** The rigid alignment primitive, nearest-assignment
//!   matching, scale factors, and the edge and face placers that chain them together.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into a complete,
//!   all-or-nothing assembly of a cage inside a simulation box.

pub mod core;
pub mod engine;
pub mod workflows;
