use crate::core::models::residue::Residue;
use crate::core::models::topology::{Molecule, Topology};

/// Read-only view of the loaded system for selection tooling.
///
/// Implementors need only supply the topology and an atom count; the remaining
/// queries are answered from the topology when one is loaded.
pub trait TopologyProvider {
    fn topology(&self) -> Option<&Topology>;

    /// Atoms in the system: from the topology when loaded, otherwise from the current
    /// frame, otherwise zero.
    fn atom_count(&self) -> usize;

    fn atom_name(&self, atom: usize) -> Option<&str> {
        self.topology()?.atom(atom).map(|a| a.name.as_str())
    }

    fn residue_of(&self, atom: usize) -> Option<&Residue> {
        self.topology()?.residue_of(atom)
    }

    fn molecules(&self) -> &[Molecule] {
        self.topology().map(Topology::molecules).unwrap_or(&[])
    }
}
