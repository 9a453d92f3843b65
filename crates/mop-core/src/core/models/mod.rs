//! # Core Models Module
//!
//! This module contains the data structures used to represent ligand templates, their placed
//! copies, and the simulation box that receives an assembled metal-organic polyhedron.
//!
//! ## Overview
//!
//! A ligand is described once, as a template, and then copied once per polyhedron edge or
//! face. Copies only carry positions, indexed exactly like the template's atoms, so that
//! anchors, bonds, and linker atoms keep their meaning across every copy. The models are
//! designed to:
//!
//! - **Keep identity separate from geometry** - Names, types, and bonds live on the template
//! - **Make index stability explicit** - Every per-atom quantity is addressed by template index
//! - **Isolate periodicity** - Re-imaging is a property of the box boundary, not of molecules
//!
//! ## Key Components
//!
//! - [`atom`] - Template atom with name, force field type, charge, and reference position
//! - [`ligand`] - Ligand template, anchor set, linker pair, and placed molecule copies
//! - [`topology`] - Bond and bond order definitions and neighbour tables
//! - [`boundary`] - Periodic and open boundaries providing central-image shifts
//! - [`simulation_box`] - Species and molecule bookkeeping for an assembly
//! - [`ids`] - Key types for species stored in the box
//!
//! ## Usage
//!
//! ```ignore
//! use mopbuild::core::models::{simulation_box::SimulationBox, boundary::OpenBoundary};
//!
//! let mut sim_box = SimulationBox::new(Box::new(OpenBoundary));
//! let species = sim_box.add_species(ligand);
//! sim_box.set_molecule_count(species, 12);
//! ```

pub mod atom;
pub mod boundary;
pub mod ids;
pub mod ligand;
pub mod simulation_box;
pub mod topology;
