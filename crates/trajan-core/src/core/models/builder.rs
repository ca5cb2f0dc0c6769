use super::atom::Atom;
use super::residue::Residue;
use super::topology::Topology;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyBuildError {
    #[error("Atom {serial} was added before any residue was started")]
    NoResidue { serial: usize },
    #[error("Duplicate atom serial: {0}")]
    DuplicateSerial(usize),
    #[error("Bond references unknown atom serial: {0}")]
    UnknownSerial(usize),
    #[error("Atom {0} cannot be bonded to itself")]
    SelfBond(usize),
}

/// Builds a [`Topology`] incrementally from file records addressed by atom serial.
///
/// Readers start a residue whenever the residue key changes in the file and then add
/// the residue's atoms in order; bonds refer to atom serials and may be added at any
/// time after both atoms exist.
pub struct TopologyBuilder {
    topology: Topology,

    // --- Builder-specific state for efficient construction ---
    atom_serial_map: HashMap<usize, usize>,
    current_residue_idx: Option<usize>,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self {
            topology: Topology::default(),
            atom_serial_map: HashMap::new(),
            current_residue_idx: None,
        }
    }

    pub fn title(&mut self, title: &str) -> &mut Self {
        self.topology.title = title.to_string();
        self
    }

    pub fn start_residue(&mut self, number: isize, name: &str, chain_id: char) -> &mut Self {
        let idx = self
            .topology
            .push_residue(Residue::new(number, name, chain_id));
        self.current_residue_idx = Some(idx);
        self
    }

    /// Adds an atom to the current residue and returns its topology index.
    pub fn add_atom(
        &mut self,
        serial: usize,
        name: &str,
        force_field_type: &str,
        charge: f64,
    ) -> Result<usize, TopologyBuildError> {
        let residue_index = self
            .current_residue_idx
            .ok_or(TopologyBuildError::NoResidue { serial })?;
        if self.atom_serial_map.contains_key(&serial) {
            return Err(TopologyBuildError::DuplicateSerial(serial));
        }

        let mut atom = Atom::new(serial, name, residue_index, force_field_type);
        atom.partial_charge = charge;
        let index = self.topology.push_atom(atom);
        self.atom_serial_map.insert(serial, index);
        Ok(index)
    }

    pub fn add_bond(&mut self, serial1: usize, serial2: usize) -> Result<(), TopologyBuildError> {
        if serial1 == serial2 {
            return Err(TopologyBuildError::SelfBond(serial1));
        }
        let idx1 = *self
            .atom_serial_map
            .get(&serial1)
            .ok_or(TopologyBuildError::UnknownSerial(serial1))?;
        let idx2 = *self
            .atom_serial_map
            .get(&serial2)
            .ok_or(TopologyBuildError::UnknownSerial(serial2))?;
        self.topology.add_bond(idx1, idx2);
        Ok(())
    }

    pub fn atom_count(&self) -> usize {
        self.topology.atom_count()
    }

    pub fn build(mut self) -> Topology {
        self.topology.rebuild_molecules();
        self.topology
    }
}
