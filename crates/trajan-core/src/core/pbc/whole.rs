use super::cell::Pbc;
use crate::core::models::topology::Topology;
use nalgebra::Point3;
use std::collections::VecDeque;

/// Precomputed bond traversal that reassembles molecules split by periodic wrapping.
///
/// The traversal works in frame slot space: bonds are kept only when both atoms are
/// present in the frame. Every connected component is walked breadth-first from its
/// lowest slot, and the resulting `(parent, child)` edges are replayed on each frame,
/// placing each child at the periodic image closest to its already placed parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WholeMolecules {
    edges: Vec<(usize, usize)>,
    atom_count: usize,
}

impl WholeMolecules {
    /// Builds the traversal for a frame of `atom_count` slots.
    ///
    /// `index` maps frame slots to topology atoms; without it slot `i` is topology
    /// atom `i`.
    pub fn new(topology: &Topology, index: Option<&[usize]>, atom_count: usize) -> Self {
        let atom_of_slot = |slot: usize| index.map_or(slot, |index| index[slot]);

        let mut slot_of_atom = vec![None; topology.atom_count()];
        for slot in 0..atom_count {
            if let Some(entry) = slot_of_atom.get_mut(atom_of_slot(slot)) {
                *entry = Some(slot);
            }
        }

        let adjacency: Vec<Vec<usize>> = (0..atom_count)
            .map(|slot| {
                topology
                    .bonded_neighbors(atom_of_slot(slot))
                    .iter()
                    .filter_map(|&neighbor| slot_of_atom.get(neighbor).copied().flatten())
                    .collect()
            })
            .collect();

        let mut visited = vec![false; atom_count];
        let mut edges = Vec::new();
        let mut queue = VecDeque::new();
        for root in 0..atom_count {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            queue.push_back(root);
            while let Some(parent) = queue.pop_front() {
                for &child in &adjacency[parent] {
                    if !visited[child] {
                        visited[child] = true;
                        edges.push((parent, child));
                        queue.push_back(child);
                    }
                }
            }
        }

        Self { edges, atom_count }
    }

    /// Number of frame slots the traversal was built for.
    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    /// Number of bonds that take part in the reconstruction.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Makes every bonded group contiguous in place.
    ///
    /// # Panics
    ///
    /// Panics when `positions` does not have the slot count the traversal was built for.
    pub fn make_whole(&self, positions: &mut [Point3<f64>], pbc: &Pbc) {
        assert_eq!(
            positions.len(),
            self.atom_count,
            "frame has {} atoms but whole-molecule data was built for {}",
            positions.len(),
            self.atom_count
        );
        for &(parent, child) in &self.edges {
            let anchor = positions[parent];
            positions[child] = anchor + pbc.dx(&positions[child], &anchor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::TopologyBuilder;
    use crate::core::pbc::cell::{PbcType, SimulationBox};

    const BOX_LENGTH: f64 = 3.0;

    fn chain_topology(length: usize) -> Topology {
        let mut builder = TopologyBuilder::new();
        builder.start_residue(1, "CHN", 'A');
        for serial in 1..=length {
            builder.add_atom(serial, "C", "C_3", 0.0).unwrap();
        }
        for serial in 1..length {
            builder.add_bond(serial, serial + 1).unwrap();
        }
        builder.build()
    }

    fn cubic_pbc() -> Pbc {
        Pbc::new(
            PbcType::Xyz,
            SimulationBox::rectangular(BOX_LENGTH, BOX_LENGTH, BOX_LENGTH),
        )
        .unwrap()
    }

    /// A straight chain along x starting near the right face, wrapped into the box.
    fn wrapped_chain(length: usize) -> Vec<Point3<f64>> {
        (0..length)
            .map(|i| {
                let x = 2.5 + 0.15 * i as f64;
                Point3::new(x.rem_euclid(BOX_LENGTH), 1.0, 1.0)
            })
            .collect()
    }

    fn max_neighbor_jump(positions: &[Point3<f64>]) -> f64 {
        positions
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn straddling_chain_becomes_contiguous() {
        let topology = chain_topology(10);
        let whole = WholeMolecules::new(&topology, None, 10);
        assert_eq!(whole.edge_count(), 9);

        let mut positions = wrapped_chain(10);
        assert!(max_neighbor_jump(&positions) > BOX_LENGTH / 2.0);

        whole.make_whole(&mut positions, &cubic_pbc());
        assert!(max_neighbor_jump(&positions) < 0.2);
        assert!((positions[0].x - 2.5).abs() < 1e-12);
        assert!((positions[9].x - (2.5 + 0.15 * 9.0)).abs() < 1e-9);
    }

    #[test]
    fn chain_inside_one_image_is_unchanged() {
        let topology = chain_topology(4);
        let whole = WholeMolecules::new(&topology, None, 4);
        let original: Vec<_> = (0..4)
            .map(|i| Point3::new(0.5 + 0.2 * i as f64, 1.0, 1.0))
            .collect();
        let mut positions = original.clone();
        whole.make_whole(&mut positions, &cubic_pbc());
        for (a, b) in positions.iter().zip(&original) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn make_whole_is_idempotent() {
        let topology = chain_topology(10);
        let whole = WholeMolecules::new(&topology, None, 10);
        let pbc = cubic_pbc();
        let mut positions = wrapped_chain(10);
        whole.make_whole(&mut positions, &pbc);
        let once = positions.clone();
        whole.make_whole(&mut positions, &pbc);
        for (a, b) in positions.iter().zip(&once) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn index_subset_keeps_only_bonds_between_present_atoms() {
        let topology = chain_topology(6);
        // Atoms 2, 3, 5 of the chain: only the 2-3 bond survives.
        let index = [2, 3, 5];
        let whole = WholeMolecules::new(&topology, Some(&index[..]), 3);
        assert_eq!(whole.edge_count(), 1);

        let mut positions = vec![
            Point3::new(2.9, 1.0, 1.0),
            Point3::new(0.1, 1.0, 1.0),
            Point3::new(0.1, 2.0, 1.0),
        ];
        whole.make_whole(&mut positions, &cubic_pbc());
        assert!((positions[1].x - 3.1).abs() < 1e-9);
        assert!((positions[2].x - 0.1).abs() < 1e-12);
    }

    #[test]
    fn unbonded_atoms_produce_no_edges() {
        let mut builder = TopologyBuilder::new();
        builder.start_residue(1, "ION", 'A');
        builder.add_atom(1, "NA", "Na", 1.0).unwrap();
        builder.add_atom(2, "CL", "Cl", -1.0).unwrap();
        let whole = WholeMolecules::new(&builder.build(), None, 2);
        assert_eq!(whole.edge_count(), 0);
    }

    #[test]
    #[should_panic(expected = "whole-molecule data was built for")]
    fn mismatched_frame_size_panics() {
        let whole = WholeMolecules::new(&chain_topology(3), None, 3);
        let mut positions = vec![Point3::origin(); 2];
        whole.make_whole(&mut positions, &cubic_pbc());
    }
}
