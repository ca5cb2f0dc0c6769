use super::data::DataSeries;
use super::error::AnalysisError;
use super::options::{OptionRegistry, OptionsContainer};
use super::settings::AnalysisSettings;
use super::topology_info::TopologyInformation;
use crate::core::models::frame::Frame;
use crate::core::pbc::cell::Pbc;

/// An analysis that is driven frame by frame over a trajectory.
///
/// Hooks are called in declaration order. `init_options` is the place to register
/// module options and declare requirements through [`AnalysisSettings`]; by the time
/// `init_analysis` runs the settings are final.
pub trait AnalysisModule {
    fn name(&self) -> &'static str;

    fn init_options(
        &mut self,
        options: &mut dyn OptionsContainer,
        settings: &mut AnalysisSettings,
    ) -> Result<(), AnalysisError>;

    /// Reads module option values after parsing.
    fn options_finished(
        &mut self,
        _options: &OptionRegistry,
        _settings: &mut AnalysisSettings,
    ) -> Result<(), AnalysisError> {
        Ok(())
    }

    fn init_analysis(
        &mut self,
        settings: &AnalysisSettings,
        topology: &TopologyInformation,
    ) -> Result<(), AnalysisError>;

    fn init_after_first_frame(
        &mut self,
        _settings: &AnalysisSettings,
        _frame: &Frame,
    ) -> Result<(), AnalysisError> {
        Ok(())
    }

    /// `pbc` is `None` when periodic boundaries are off or the frame has no box.
    fn analyze_frame(
        &mut self,
        index: usize,
        frame: &Frame,
        pbc: Option<&Pbc>,
    ) -> Result<(), AnalysisError>;

    fn finish_analysis(&mut self, _frame_count: usize) -> Result<(), AnalysisError> {
        Ok(())
    }

    fn data(&self) -> &DataSeries;
}
