//! Readers for structure, trajectory, and index-group files.
//!
//! Structure formats produce a [`traits::Structure`] (topology plus reference
//! coordinates); trajectory formats implement [`traits::FrameReader`] and overwrite a
//! reusable [`Frame`](crate::core::models::frame::Frame) on every read. All coordinates
//! are converted to nm on load.

pub mod bgf;
pub mod error;
pub mod gro;
pub mod infer;
pub mod ndx;
pub mod traits;
pub mod xyz;

/// Conversion factor for formats that store coordinates in Å.
pub(crate) const ANGSTROM_TO_NM: f64 = 0.1;
