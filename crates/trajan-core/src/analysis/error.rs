use super::options::OptionError;
use crate::core::io::error::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// Broad classes of user-facing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inputs are missing, inconsistent with each other, or unloadable.
    Configuration,
    /// A trajectory could not be opened or read.
    Io,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to load topology '{}': {source}", path.display())]
    TopologyLoad { path: PathBuf, source: FormatError },

    #[error("Failed to load index file '{}': {source}", path.display())]
    IndexLoad { path: PathBuf, source: FormatError },

    #[error("Failed to read trajectory '{}': {source}", path.display())]
    Trajectory { path: PathBuf, source: FormatError },

    #[error("Trajectory '{}' contains no frames that can be analyzed", path.display())]
    EmptyTrajectory { path: PathBuf },

    #[error("Option error: {source}")]
    Option {
        #[from]
        source: OptionError,
    },

    #[error("Analysis module failed: {0}")]
    Module(String),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Trajectory { .. } | AnalysisError::EmptyTrajectory { .. } => {
                ErrorKind::Io
            }
            _ => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trajectory_failures_are_io_errors() {
        let err = AnalysisError::EmptyTrajectory {
            path: PathBuf::from("traj.gro"),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("traj.gro"));
    }

    #[test]
    fn topology_failures_are_configuration_errors() {
        let err = AnalysisError::TopologyLoad {
            path: PathBuf::from("conf.bgf"),
            source: FormatError::MissingRecord("ATOM/HETATM records".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            err.to_string(),
            "Failed to load topology 'conf.bgf': Missing required record: ATOM/HETATM records"
        );
    }
}
