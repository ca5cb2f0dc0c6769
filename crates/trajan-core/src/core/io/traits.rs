use super::error::FormatError;
use crate::core::models::frame::Frame;
use crate::core::models::topology::Topology;
use crate::core::pbc::cell::{PbcType, SimulationBox};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A topology together with the reference coordinates it was read with.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    pub topology: Topology,
    pub positions: Vec<Point3<f64>>,
    pub velocities: Option<Vec<Vector3<f64>>>,
    pub simulation_box: Option<SimulationBox>,
    pub pbc_type: PbcType,
}

impl Structure {
    pub fn title(&self) -> &str {
        self.topology.title()
    }

    pub fn has_connectivity(&self) -> bool {
        self.topology.has_connectivity()
    }
}

/// Defines the interface for reading structure (topology) file formats.
pub trait StructureFile {
    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Structure, FormatError>;

    /// Reads a structure from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Structure, FormatError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}

/// Sequential access to the frames of a trajectory.
pub trait FrameReader {
    /// Overwrites `frame` with the next frame of the stream.
    ///
    /// Returns `Ok(false)` at a clean end of stream; a truncated frame is an error.
    fn read_frame(&mut self, frame: &mut Frame) -> Result<bool, FormatError>;
}

/// Reads one line into `buffer` without its line terminator and advances `line_num`.
/// Returns `false` at end of input.
pub(crate) fn next_line(
    reader: &mut impl BufRead,
    buffer: &mut String,
    line_num: &mut usize,
) -> Result<bool, FormatError> {
    buffer.clear();
    if reader.read_line(buffer)? == 0 {
        return Ok(false);
    }
    *line_num += 1;
    let trimmed_len = buffer.trim_end_matches(['\n', '\r']).len();
    buffer.truncate(trimmed_len);
    Ok(true)
}
