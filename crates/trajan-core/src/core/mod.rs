//! # Core Module
//!
//! Fundamental building blocks shared by every analysis: molecular models, periodic
//! boundary geometry, and file readers.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, bonds, molecules, and frames
//! - **Periodic Boundaries** ([`pbc`]) - Simulation boxes, minimum image, whole molecules
//! - **File I/O** ([`io`]) - BGF and GRO structures, GRO and XYZ trajectories, index groups
//! - **Utilities** ([`utils`]) - Geometric reductions over coordinate sets
//!
//! All lengths are stored in nanometers and all times in picoseconds. Readers for
//! Angstrom-based formats convert on load.

pub mod io;
pub mod models;
pub mod pbc;
pub mod utils;
