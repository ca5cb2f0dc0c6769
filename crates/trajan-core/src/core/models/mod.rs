//! # Core Models Module
//!
//! Data structures describing the static system (the topology) and the dynamic state of
//! one trajectory step (the frame).
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atom metadata
//! - [`element`] - Element symbols and standard atomic masses
//! - [`residue`] - Residue grouping of atoms
//! - [`topology`] - Bonds, molecules, and the complete `Topology`
//! - [`builder`] - Incremental construction of a `Topology` from file records
//! - [`frame`] - The reusable per-step coordinate buffer
//!
//! ## Usage
//!
//! ```ignore
//! use trajan::core::models::builder::TopologyBuilder;
//!
//! let mut builder = TopologyBuilder::new();
//! builder.start_residue(1, "SOL", 'A');
//! builder.add_atom(1, "OW", "OW", 0.0);
//! builder.add_atom(2, "HW1", "HW", 0.0);
//! builder.add_bond(1, 2)?;
//! let topology = builder.build();
//! ```

pub mod atom;
pub mod builder;
pub mod element;
pub mod frame;
pub mod residue;
pub mod topology;
