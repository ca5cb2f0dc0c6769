use crate::core::pbc::cell::SimulationBox;
use bitflags::bitflags;
use nalgebra::{Point3, Vector3};

bitflags! {
    /// Selects which per-atom channels are materialized when a frame is read.
    ///
    /// `READ_*` keeps a channel when the file provides it; `NEED_*` additionally skips
    /// frames that lack it. The numeric values match the classic trajectory I/O flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameFlags: u32 {
        const READ_POSITIONS = 1 << 0;
        const NEED_POSITIONS = 1 << 1;
        const READ_VELOCITIES = 1 << 2;
        const NEED_VELOCITIES = 1 << 3;
        const READ_FORCES = 1 << 4;
        const NEED_FORCES = 1 << 5;
    }
}

impl Default for FrameFlags {
    fn default() -> Self {
        FrameFlags::NEED_POSITIONS
    }
}

impl FrameFlags {
    pub fn wants_velocities(self) -> bool {
        self.intersects(FrameFlags::READ_VELOCITIES | FrameFlags::NEED_VELOCITIES)
    }

    pub fn wants_forces(self) -> bool {
        self.intersects(FrameFlags::READ_FORCES | FrameFlags::NEED_FORCES)
    }
}

/// The currently loaded trajectory step.
///
/// A single `Frame` is reused for the whole trajectory: every read overwrites positions,
/// channels, box, and time in place, keeping the allocated capacity. The optional atom
/// index maps frame slots to topology atoms when the trajectory stores only a subset of
/// the system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    step: Option<i64>,
    time: Option<f64>,
    simulation_box: Option<SimulationBox>,
    positions: Vec<Point3<f64>>,
    velocities: Vec<Vector3<f64>>,
    has_velocities: bool,
    forces: Vec<Vector3<f64>>,
    has_forces: bool,
    index: Option<Vec<usize>>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    pub fn step(&self) -> Option<i64> {
        self.step
    }

    /// The simulation time of this frame in ps, when the format records it.
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    pub fn simulation_box(&self) -> Option<&SimulationBox> {
        self.simulation_box.as_ref()
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    pub fn velocities(&self) -> Option<&[Vector3<f64>]> {
        self.has_velocities.then_some(self.velocities.as_slice())
    }

    pub fn forces(&self) -> Option<&[Vector3<f64>]> {
        self.has_forces.then_some(self.forces.as_slice())
    }

    /// The topology atom of every frame slot, when the frame holds a subset.
    pub fn index(&self) -> Option<&[usize]> {
        self.index.as_deref()
    }

    /// Maps a frame slot to its topology atom.
    pub fn topology_index(&self, slot: usize) -> usize {
        self.index.as_ref().map_or(slot, |index| index[slot])
    }

    pub fn set_step(&mut self, step: Option<i64>) {
        self.step = step;
    }

    pub fn set_time(&mut self, time: Option<f64>) {
        self.time = time;
    }

    pub fn set_simulation_box(&mut self, simulation_box: Option<SimulationBox>) {
        self.simulation_box = simulation_box;
    }

    /// Clears all per-atom data while keeping allocations and the atom index.
    pub fn reset(&mut self) {
        self.step = None;
        self.time = None;
        self.simulation_box = None;
        self.positions.clear();
        self.velocities.clear();
        self.has_velocities = false;
        self.forces.clear();
        self.has_forces = false;
    }

    pub fn push_position(&mut self, position: Point3<f64>) {
        self.positions.push(position);
    }

    pub fn push_velocity(&mut self, velocity: Vector3<f64>) {
        self.velocities.push(velocity);
        self.has_velocities = true;
    }

    pub fn push_force(&mut self, force: Vector3<f64>) {
        self.forces.push(force);
        self.has_forces = true;
    }

    pub fn set_positions(&mut self, positions: &[Point3<f64>]) {
        self.positions.clear();
        self.positions.extend_from_slice(positions);
    }

    pub fn set_velocities(&mut self, velocities: Option<&[Vector3<f64>]>) {
        self.velocities.clear();
        self.has_velocities = velocities.is_some();
        if let Some(velocities) = velocities {
            self.velocities.extend_from_slice(velocities);
        }
    }

    pub fn clear_velocities(&mut self) {
        self.velocities.clear();
        self.has_velocities = false;
    }

    pub fn clear_forces(&mut self) {
        self.forces.clear();
        self.has_forces = false;
    }

    pub(crate) fn set_index(&mut self, index: Option<Vec<usize>>) {
        self.index = index;
    }
}
