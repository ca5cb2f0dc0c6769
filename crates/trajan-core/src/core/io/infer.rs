use super::bgf::BgfFile;
use super::error::FormatError;
use super::gro::{GroFile, GroTrajectory};
use super::traits::{FrameReader, Structure, StructureFile};
use super::xyz::XyzTrajectory;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Bgf,
    Gro,
    Xyz,
    Ndx,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "bgf" => Some(FileFormat::Bgf),
            "gro" => Some(FileFormat::Gro),
            "xyz" => Some(FileFormat::Xyz),
            "ndx" => Some(FileFormat::Ndx),
            _ => None,
        }
    }
}

fn unknown(path: &Path, role: &str) -> FormatError {
    FormatError::UnknownFormat(format!(
        "'{}' is not a supported {} file",
        path.display(),
        role
    ))
}

/// Reads a topology file, choosing the parser from the file extension.
pub fn load_structure(path: &Path) -> Result<Structure, FormatError> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Bgf) => BgfFile::read_from_path(path),
        Some(FileFormat::Gro) => GroFile::read_from_path(path),
        _ => Err(unknown(path, "structure")),
    }
}

/// Opens a trajectory file, choosing the reader from the file extension.
pub fn open_trajectory(path: &Path) -> Result<Box<dyn FrameReader>, FormatError> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Gro) => Ok(Box::new(GroTrajectory::open(path)?)),
        Some(FileFormat::Xyz) => Ok(Box::new(XyzTrajectory::open(path)?)),
        _ => Err(unknown(path, "trajectory")),
    }
}
