use super::atom::Atom;
use super::residue::Residue;
use std::collections::VecDeque;

/// A covalent bond between two atoms, stored as topology indices with
/// `atom1 < atom2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
}

impl Bond {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            atom1: a.min(b),
            atom2: a.max(b),
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }

    /// Returns the atom on the other end of the bond, if `atom` is part of it.
    pub fn partner(&self, atom: usize) -> Option<usize> {
        if self.atom1 == atom {
            Some(self.atom2)
        } else if self.atom2 == atom {
            Some(self.atom1)
        } else {
            None
        }
    }
}

/// A bonded group: one connected component of the bond graph.
///
/// Atoms without any bond form single-atom molecules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Molecule {
    atoms: Vec<usize>, // Topology indices, ascending
}

impl Molecule {
    pub(crate) fn new(mut atoms: Vec<usize>) -> Self {
        atoms.sort_unstable();
        Self { atoms }
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atoms.binary_search(&atom).is_ok()
    }
}

/// The static description of a simulated system: atoms, residues, bonds, and the
/// molecules derived from the bond graph.
///
/// Atoms are addressed by their index in the topology, which is also their index in a
/// full-system frame.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub(crate) title: String,
    pub(crate) atoms: Vec<Atom>,
    pub(crate) residues: Vec<Residue>,
    pub(crate) bonds: Vec<Bond>,
    /// Cached adjacency list for bond connectivity, indexed by atom.
    pub(crate) adjacency: Vec<Vec<usize>>,
    pub(crate) molecules: Vec<Molecule>,
}

impl Topology {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    /// Returns the residue that owns the given atom.
    pub fn residue_of(&self, atom: usize) -> Option<&Residue> {
        self.atoms
            .get(atom)
            .and_then(|a| self.residues.get(a.residue_index))
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Returns the atoms bonded to `atom`; empty for unknown atoms.
    pub fn bonded_neighbors(&self, atom: usize) -> &[usize] {
        self.adjacency.get(atom).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    /// Returns true when bond information is available.
    pub fn has_connectivity(&self) -> bool {
        !self.bonds.is_empty()
    }

    pub(crate) fn push_residue(&mut self, residue: Residue) -> usize {
        self.residues.push(residue);
        self.residues.len() - 1
    }

    pub(crate) fn push_atom(&mut self, atom: Atom) -> usize {
        let index = self.atoms.len();
        if let Some(residue) = self.residues.get_mut(atom.residue_index) {
            residue.atoms.push(index);
        }
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        index
    }

    /// Adds a bond; repeated bonds are ignored. Returns `None` for self-bonds or
    /// unknown atoms.
    pub(crate) fn add_bond(&mut self, a: usize, b: usize) -> Option<()> {
        if a == b || a >= self.atoms.len() || b >= self.atoms.len() {
            return None;
        }
        if self.adjacency[a].contains(&b) {
            return Some(());
        }
        self.bonds.push(Bond::new(a, b));
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        Some(())
    }

    pub(crate) fn rebuild_molecules(&mut self) {
        self.molecules = connected_components(&self.adjacency)
            .into_iter()
            .map(Molecule::new)
            .collect();
    }
}

/// Splits a graph given as adjacency lists into connected components, ordered by their
/// lowest vertex.
pub(crate) fn connected_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; adjacency.len()];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..adjacency.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);
        let mut component = Vec::new();
        while let Some(current) = queue.pop_front() {
            component.push(current);
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }
    components
}
