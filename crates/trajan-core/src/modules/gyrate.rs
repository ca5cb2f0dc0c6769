use crate::analysis::data::DataSeries;
use crate::analysis::error::AnalysisError;
use crate::analysis::module::AnalysisModule;
use crate::analysis::options::{OptionDef, OptionRegistry, OptionsContainer};
use crate::analysis::settings::AnalysisSettings;
use crate::analysis::topology_info::TopologyInformation;
use crate::core::models::frame::Frame;
use crate::core::pbc::cell::Pbc;
use crate::core::utils::geometry::radius_of_gyration;
use tracing::{debug, warn};

pub const MASS_WEIGHTED: &str = "mass-weighted";

const HELP: &[&str] = &[
    "Computes the radius of gyration of all atoms in the trajectory frames.",
    "",
    "Atoms are weighted by their mass unless [TT]--no-mass-weighted[tt] is given.",
    "Masses come from the topology elements; without a topology every atom",
    "has unit weight. Molecules should be made whole for meaningful results.",
];

/// Radius of gyration per frame.
pub struct RadiusOfGyration {
    mass_weighted: bool,
    topology_masses: Option<Vec<f64>>,
    weights: Vec<f64>,
    data: DataSeries,
}

impl Default for RadiusOfGyration {
    fn default() -> Self {
        Self::new()
    }
}

impl RadiusOfGyration {
    pub fn new() -> Self {
        Self {
            mass_weighted: true,
            topology_masses: None,
            weights: Vec::new(),
            data: DataSeries::new("Radius of gyration", "Rg (nm)", &["Rg"]),
        }
    }

    pub fn is_mass_weighted(&self) -> bool {
        self.mass_weighted
    }
}

impl AnalysisModule for RadiusOfGyration {
    fn name(&self) -> &'static str {
        "gyrate"
    }

    fn init_options(
        &mut self,
        options: &mut dyn OptionsContainer,
        settings: &mut AnalysisSettings,
    ) -> Result<(), AnalysisError> {
        settings.set_help_text(HELP);
        options.add_option(OptionDef::boolean(
            MASS_WEIGHTED,
            "Weight atoms by their mass",
            self.mass_weighted,
        ))?;
        Ok(())
    }

    fn options_finished(
        &mut self,
        options: &OptionRegistry,
        _settings: &mut AnalysisSettings,
    ) -> Result<(), AnalysisError> {
        self.mass_weighted = options.bool(MASS_WEIGHTED).unwrap_or(self.mass_weighted);
        Ok(())
    }

    fn init_analysis(
        &mut self,
        _settings: &AnalysisSettings,
        topology: &TopologyInformation,
    ) -> Result<(), AnalysisError> {
        if !self.mass_weighted {
            return Ok(());
        }
        match topology.topology() {
            Some(topology) => {
                self.topology_masses = Some(topology.atoms().iter().map(|a| a.mass).collect());
            }
            None => warn!("No topology loaded; using unit weights for all atoms"),
        }
        Ok(())
    }

    fn init_after_first_frame(
        &mut self,
        _settings: &AnalysisSettings,
        frame: &Frame,
    ) -> Result<(), AnalysisError> {
        self.weights = match &self.topology_masses {
            Some(masses) => (0..frame.atom_count())
                .map(|slot| masses.get(frame.topology_index(slot)).copied().unwrap_or(0.0))
                .collect(),
            None => vec![1.0; frame.atom_count()],
        };
        if self.weights.iter().sum::<f64>() <= 0.0 {
            return Err(AnalysisError::Module(
                "None of the analyzed atoms has a known mass".into(),
            ));
        }
        debug!(atoms = self.weights.len(), mass_weighted = self.mass_weighted, "Prepared weights");
        Ok(())
    }

    fn analyze_frame(
        &mut self,
        index: usize,
        frame: &Frame,
        _pbc: Option<&Pbc>,
    ) -> Result<(), AnalysisError> {
        let rg = radius_of_gyration(frame.positions(), &self.weights).ok_or_else(|| {
            AnalysisError::Module(format!(
                "Frame {} has {} atoms, expected {}",
                index,
                frame.atom_count(),
                self.weights.len()
            ))
        })?;
        self.data
            .push_row(frame.time().unwrap_or(index as f64), vec![rg]);
        Ok(())
    }

    fn data(&self) -> &DataSeries {
        &self.data
    }
}
