//! Periodic boundary handling.
//!
//! - [`cell`] - Simulation box geometry and the minimum-image convention
//! - [`whole`] - Reconstruction of molecules split across periodic images

pub mod cell;
pub mod whole;
