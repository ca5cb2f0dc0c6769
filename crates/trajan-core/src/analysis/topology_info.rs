use crate::core::io::error::FormatError;
use crate::core::io::infer;
use crate::core::models::topology::Topology;
use crate::core::pbc::cell::{PbcType, SimulationBox};
use nalgebra::{Point3, Vector3};
use std::path::{Path, PathBuf};
use tracing::info;

/// The topology loaded for an analysis run, with the reference coordinates, box and
/// periodicity that came with it.
///
/// Loaded at most once. Topology positions and velocities are dropped when the run
/// reads a trajectory and the module did not ask to keep them.
#[derive(Debug, Default)]
pub struct TopologyInformation {
    path: Option<PathBuf>,
    topology: Option<Topology>,
    positions: Option<Vec<Point3<f64>>>,
    velocities: Option<Vec<Vector3<f64>>>,
    simulation_box: Option<SimulationBox>,
    pbc_type: PbcType,
}

impl TopologyInformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the topology from a structure file.
    ///
    /// # Panics
    ///
    /// Panics if a topology was already loaded.
    pub fn fill_from_input_file(&mut self, path: &Path) -> Result<(), FormatError> {
        assert!(
            self.topology.is_none(),
            "topology information can only be loaded once"
        );
        let structure = infer::load_structure(path)?;
        info!(
            path = %path.display(),
            atoms = structure.topology.atom_count(),
            bonds = structure.topology.bonds().len(),
            "Loaded topology"
        );
        self.path = Some(path.to_path_buf());
        self.positions = Some(structure.positions);
        self.velocities = structure.velocities;
        self.simulation_box = structure.simulation_box;
        self.pbc_type = structure.pbc_type;
        self.topology = Some(structure.topology);
        Ok(())
    }

    pub fn has_topology(&self) -> bool {
        self.topology.is_some()
    }

    /// Whether the topology carries bond connectivity.
    pub fn has_full_topology(&self) -> bool {
        self.topology
            .as_ref()
            .is_some_and(Topology::has_connectivity)
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn title(&self) -> &str {
        self.topology.as_ref().map_or("", Topology::title)
    }

    pub fn atom_count(&self) -> usize {
        self.topology.as_ref().map_or(0, Topology::atom_count)
    }

    pub fn positions(&self) -> Option<&[Point3<f64>]> {
        self.positions.as_deref()
    }

    pub fn velocities(&self) -> Option<&[Vector3<f64>]> {
        self.velocities.as_deref()
    }

    pub fn simulation_box(&self) -> Option<&SimulationBox> {
        self.simulation_box.as_ref()
    }

    pub fn pbc_type(&self) -> PbcType {
        self.pbc_type
    }

    pub(crate) fn clear_positions(&mut self) {
        self.positions = None;
    }

    pub(crate) fn clear_velocities(&mut self) {
        self.velocities = None;
    }
}
