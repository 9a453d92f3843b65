//! Provides input/output functionality for molecular file formats.
//!
//! Ligand templates are read with their connectivity and force field types, which anchor
//! discovery depends on; assembled boxes are written back with one residue per placed
//! molecule and the template bonds replicated for every copy.

pub mod bgf;
pub mod traits;
