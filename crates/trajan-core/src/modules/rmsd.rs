use crate::analysis::data::DataSeries;
use crate::analysis::error::AnalysisError;
use crate::analysis::module::AnalysisModule;
use crate::analysis::options::{OptionDef, OptionRegistry, OptionsContainer};
use crate::analysis::settings::{AnalysisFlags, AnalysisSettings};
use crate::analysis::topology_info::TopologyInformation;
use crate::core::models::frame::Frame;
use crate::core::pbc::cell::{Pbc, PbcType};
use crate::core::utils::geometry::calculate_rmsd;
use nalgebra::{Point3, Vector3};
use tracing::debug;

pub const NEAREST_IMAGE: &str = "nearest-image";

const HELP: &[&str] = &[
    "Computes the root-mean-square deviation of every frame from the topology",
    "coordinates, without fitting. Molecules are made whole before comparison.",
    "",
    "Coordinates are compared as stored, so a molecule that crosses the box",
    "boundary moves by a box vector and its deviation jumps accordingly. With",
    "[TT]--nearest-image[tt] every molecule is first shifted by whole box vectors",
    "so that its center lies closest to the reference center.",
];

/// RMSD of each frame against the reference structure.
pub struct ReferenceRmsd {
    nearest_image: bool,
    reference: Vec<Point3<f64>>,
    molecules: Vec<Vec<usize>>,
    matched: Vec<Point3<f64>>,
    molecule_slots: Vec<Vec<usize>>,
    positions: Vec<Point3<f64>>,
    data: DataSeries,
}

impl Default for ReferenceRmsd {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceRmsd {
    pub fn new() -> Self {
        Self {
            nearest_image: false,
            reference: Vec::new(),
            molecules: Vec::new(),
            matched: Vec::new(),
            molecule_slots: Vec::new(),
            positions: Vec::new(),
            data: DataSeries::new("RMSD", "RMSD (nm)", &["RMSD"]),
        }
    }

    pub fn uses_nearest_image(&self) -> bool {
        self.nearest_image
    }

    /// Shifts each molecule of `positions` by box vectors toward `reference`.
    fn place_nearest_reference(
        positions: &mut [Point3<f64>],
        reference: &[Point3<f64>],
        molecule_slots: &[Vec<usize>],
        pbc: &Pbc,
    ) {
        for slots in molecule_slots {
            let offset = slots
                .iter()
                .map(|&slot| positions[slot] - reference[slot])
                .fold(Vector3::zeros(), |acc, d| acc + d)
                / slots.len() as f64;
            let shift = pbc.minimum_image(offset) - offset;
            if shift != Vector3::zeros() {
                for &slot in slots {
                    positions[slot] += shift;
                }
            }
        }
    }
}

impl AnalysisModule for ReferenceRmsd {
    fn name(&self) -> &'static str {
        "rmsd"
    }

    fn init_options(
        &mut self,
        options: &mut dyn OptionsContainer,
        settings: &mut AnalysisSettings,
    ) -> Result<(), AnalysisError> {
        settings.set_help_text(HELP);
        options.add_option(OptionDef::boolean(
            NEAREST_IMAGE,
            "Place each molecule in the periodic image nearest the reference",
            self.nearest_image,
        ))?;
        settings.set_flags(
            AnalysisFlags::REQUIRE_TOPOLOGY
                | AnalysisFlags::USE_TOPOLOGY_POSITIONS
                | AnalysisFlags::NO_USER_PBC,
        );
        settings.set_pbc(false);
        Ok(())
    }

    fn options_finished(
        &mut self,
        options: &OptionRegistry,
        _settings: &mut AnalysisSettings,
    ) -> Result<(), AnalysisError> {
        self.nearest_image = options.bool(NEAREST_IMAGE).unwrap_or(self.nearest_image);
        Ok(())
    }

    fn init_analysis(
        &mut self,
        _settings: &AnalysisSettings,
        topology: &TopologyInformation,
    ) -> Result<(), AnalysisError> {
        let positions = topology.positions().ok_or_else(|| {
            AnalysisError::Module("The topology provides no reference coordinates".into())
        })?;
        self.reference = positions.to_vec();
        self.molecules = topology
            .topology()
            .map(|t| t.molecules().iter().map(|m| m.atoms().to_vec()).collect())
            .unwrap_or_default();
        Ok(())
    }

    fn init_after_first_frame(
        &mut self,
        _settings: &AnalysisSettings,
        frame: &Frame,
    ) -> Result<(), AnalysisError> {
        self.matched = (0..frame.atom_count())
            .map(|slot| {
                let atom = frame.topology_index(slot);
                self.reference.get(atom).copied().ok_or_else(|| {
                    AnalysisError::Module(format!("No reference coordinates for atom {}", atom + 1))
                })
            })
            .collect::<Result<_, _>>()?;

        let mut slot_of = vec![None; self.reference.len()];
        for slot in 0..frame.atom_count() {
            slot_of[frame.topology_index(slot)] = Some(slot);
        }
        self.molecule_slots = self
            .molecules
            .iter()
            .map(|atoms| atoms.iter().filter_map(|&atom| slot_of[atom]).collect::<Vec<_>>())
            .filter(|slots| !slots.is_empty())
            .collect();
        Ok(())
    }

    fn analyze_frame(
        &mut self,
        index: usize,
        frame: &Frame,
        _pbc: Option<&Pbc>,
    ) -> Result<(), AnalysisError> {
        let pbc = frame
            .simulation_box()
            .and_then(|simulation_box| Pbc::new(PbcType::Xyz, *simulation_box));
        let positions = match (&pbc, self.nearest_image) {
            (Some(pbc), true) if frame.atom_count() == self.matched.len() => {
                self.positions.clear();
                self.positions.extend_from_slice(frame.positions());
                Self::place_nearest_reference(
                    &mut self.positions,
                    &self.matched,
                    &self.molecule_slots,
                    pbc,
                );
                self.positions.as_slice()
            }
            (None, true) => {
                debug!(frame = index, "No box for nearest-image placement");
                frame.positions()
            }
            _ => frame.positions(),
        };
        let rmsd = calculate_rmsd(positions, &self.matched).ok_or_else(|| {
            AnalysisError::Module(format!(
                "Frame {} has {} atoms, the reference has {}",
                index,
                frame.atom_count(),
                self.matched.len()
            ))
        })?;
        self.data
            .push_row(frame.time().unwrap_or(index as f64), vec![rmsd]);
        Ok(())
    }

    fn data(&self) -> &DataSeries {
        &self.data
    }
}
