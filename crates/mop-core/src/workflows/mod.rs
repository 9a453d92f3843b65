//! # Workflows Module
//!
//! This module provides the top-level entry points that turn a ligand template and an
//! [`crate::engine::config::AssemblyConfig`] into an assembled polyhedron.
//!
//! ## Overview
//!
//! A workflow resolves the anchors of the template, validates every precondition, stages
//! one transformed copy per target, and only then commits the copies to the simulation
//! box. A failure at any point leaves the box exactly as it was.
//!
//! ## Architecture
//!
//! - **Assembly Workflow** ([`assemble`]) - Anchor resolution, staging, validation, and commit
//!
//! ## Key Capabilities
//!
//! - **All-or-nothing commits** so partial assemblies never reach the box
//! - **Anchor resolution order** of explicit indices, registry entries, then discovery
//! - **Automatic box sizing** from the scaled solid and the ligand's extent
//! - **Progress monitoring** with phase and task reporting

pub mod assemble;
