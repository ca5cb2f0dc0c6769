use crate::analysis::error::AnalysisError;
use crate::analysis::module::AnalysisModule;
use crate::analysis::options::OptionRegistry;
use crate::analysis::progress::{Progress, ProgressReporter};
use crate::analysis::runner::RunnerCommon;
use crate::analysis::settings::{AnalysisSettings, CommandLineModuleSettings};
use crate::analysis::time::TimeUnitBehavior;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, instrument};

/// Help text a module published through [`AnalysisSettings::set_help_text`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleHelp {
    lines: Vec<String>,
}

impl ModuleHelp {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl CommandLineModuleSettings for ModuleHelp {
    fn set_help_text(&mut self, help: &[&str]) {
        self.lines = help.iter().map(|line| line.to_string()).collect();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSummary {
    pub frames: usize,
    pub first_time: Option<f64>,
    pub last_time: Option<f64>,
}

/// Drives one analysis module through a complete run.
///
/// Construction registers the module's options followed by the standard input
/// options. The caller then fills [`options_mut`](Self::options_mut) and calls
/// [`run`](Self::run) once.
pub struct AnalysisSession<M> {
    module: M,
    settings: AnalysisSettings,
    runner: RunnerCommon,
    time_units: TimeUnitBehavior,
    options: OptionRegistry,
    help: Rc<RefCell<ModuleHelp>>,
    finished: bool,
}

impl<M: AnalysisModule> AnalysisSession<M> {
    pub fn new(mut module: M) -> Result<Self, AnalysisError> {
        let help = Rc::new(RefCell::new(ModuleHelp::default()));
        let host: Rc<RefCell<dyn CommandLineModuleSettings>> = help.clone();

        let mut settings = AnalysisSettings::new();
        settings.set_options_module_settings(Rc::downgrade(&host));
        let mut options = OptionRegistry::new();
        let mut time_units = TimeUnitBehavior::new();
        let mut runner = RunnerCommon::new();

        module.init_options(&mut options, &mut settings)?;
        runner.init_options(&mut options, &mut time_units, &settings)?;

        Ok(Self {
            module,
            settings,
            runner,
            time_units,
            options,
            help,
            finished: false,
        })
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn into_module(self) -> M {
        self.module
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionRegistry {
        &mut self.options
    }

    pub fn help(&self) -> ModuleHelp {
        self.help.borrow().clone()
    }

    pub fn runner(&self) -> &RunnerCommon {
        &self.runner
    }

    /// Runs every phase and analyzes all selected frames.
    ///
    /// # Panics
    ///
    /// Panics when called a second time.
    #[instrument(skip_all, name = "analysis_session", fields(module = self.module.name()))]
    pub fn run(&mut self, reporter: &ProgressReporter) -> Result<AnalysisSummary, AnalysisError> {
        assert!(!self.finished, "an analysis session can only be run once");
        self.finished = true;

        reporter.report(Progress::PhaseStart {
            name: "Reading options",
        });
        self.runner
            .options_finished(&self.options, &mut self.time_units, &mut self.settings)?;
        self.module
            .options_finished(&self.options, &mut self.settings)?;
        reporter.report(Progress::PhaseFinish);

        reporter.report(Progress::PhaseStart {
            name: "Loading topology",
        });
        self.runner.init_topology(&self.settings)?;
        self.module
            .init_analysis(&self.settings, self.runner.topology_information())?;
        reporter.report(Progress::PhaseFinish);

        reporter.report(Progress::PhaseStart {
            name: "Reading first frame",
        });
        self.runner.init_first_frame(&self.settings)?;
        self.runner.init_frame_index_group()?;
        self.module
            .init_after_first_frame(&self.settings, self.runner.frame())?;
        let first_time = self.runner.frame().time();
        reporter.report(Progress::PhaseFinish);

        reporter.report(Progress::PhaseStart {
            name: "Analyzing frames",
        });
        let mut frames = 0;
        let mut last_time;
        loop {
            self.runner.init_frame();
            let pbc = self.runner.pbc();
            let frame = self.runner.frame();
            last_time = frame.time();
            self.module.analyze_frame(frames, frame, pbc.as_ref())?;
            reporter.report(Progress::FrameAnalyzed {
                index: frames,
                time: last_time,
            });
            frames += 1;
            if !self.runner.read_next_frame()? {
                break;
            }
        }
        reporter.report(Progress::PhaseFinish);

        self.module.finish_analysis(frames)?;
        info!(frames, "Analysis finished");
        Ok(AnalysisSummary {
            frames,
            first_time,
            last_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::data::DataSeries;
    use crate::analysis::options::{OptionDef, OptionValue, OptionsContainer};
    use crate::analysis::runner::option_names;
    use crate::analysis::runner::tests::chain_inputs;
    use crate::analysis::settings::AnalysisFlags;
    use crate::analysis::time::TimeUnit;
    use crate::analysis::topology_info::TopologyInformation;
    use crate::core::models::frame::Frame;
    use crate::core::pbc::cell::Pbc;
    use std::path::Path;

    struct Recording {
        flags: AnalysisFlags,
        events: Vec<String>,
        unit_seen_in_options_finished: Option<TimeUnit>,
        fail_at_frame: Option<usize>,
        data: DataSeries,
    }

    impl Recording {
        fn new(flags: AnalysisFlags) -> Self {
            Self {
                flags,
                events: Vec::new(),
                unit_seen_in_options_finished: None,
                fail_at_frame: None,
                data: DataSeries::new("Recording", "atoms", &["atoms"]),
            }
        }
    }

    impl AnalysisModule for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn init_options(
            &mut self,
            options: &mut dyn OptionsContainer,
            settings: &mut AnalysisSettings,
        ) -> Result<(), AnalysisError> {
            self.events.push("init_options".into());
            settings.set_flags(self.flags);
            settings.set_help_text(&["Records every hook."]);
            options.add_option(OptionDef::boolean("loud", "Record more", false))?;
            Ok(())
        }

        fn options_finished(
            &mut self,
            _options: &OptionRegistry,
            settings: &mut AnalysisSettings,
        ) -> Result<(), AnalysisError> {
            self.events.push("options_finished".into());
            self.unit_seen_in_options_finished = Some(settings.time_unit());
            Ok(())
        }

        fn init_analysis(
            &mut self,
            _settings: &AnalysisSettings,
            topology: &TopologyInformation,
        ) -> Result<(), AnalysisError> {
            self.events
                .push(format!("init_analysis {}", topology.atom_count()));
            Ok(())
        }

        fn init_after_first_frame(
            &mut self,
            _settings: &AnalysisSettings,
            frame: &Frame,
        ) -> Result<(), AnalysisError> {
            self.events
                .push(format!("init_after_first_frame {}", frame.atom_count()));
            Ok(())
        }

        fn analyze_frame(
            &mut self,
            index: usize,
            frame: &Frame,
            pbc: Option<&Pbc>,
        ) -> Result<(), AnalysisError> {
            if self.fail_at_frame == Some(index) {
                return Err(AnalysisError::Module(format!("refusing frame {index}")));
            }
            self.events
                .push(format!("analyze_frame {} pbc={}", index, pbc.is_some()));
            self.data.push_row(
                frame.time().unwrap_or(index as f64),
                vec![frame.atom_count() as f64],
            );
            Ok(())
        }

        fn finish_analysis(&mut self, frame_count: usize) -> Result<(), AnalysisError> {
            self.events.push(format!("finish_analysis {frame_count}"));
            Ok(())
        }

        fn data(&self) -> &DataSeries {
            &self.data
        }
    }

    fn session_for(
        module: Recording,
        topology: &Path,
        trajectory: &Path,
    ) -> AnalysisSession<Recording> {
        let mut session = AnalysisSession::new(module).unwrap();
        let options = session.options_mut();
        options
            .set(
                option_names::TOPOLOGY,
                OptionValue::Path(topology.to_path_buf()),
            )
            .unwrap();
        options
            .set(
                option_names::TRAJECTORY,
                OptionValue::Path(trajectory.to_path_buf()),
            )
            .unwrap();
        session
    }

    #[test]
    fn hooks_run_in_life_cycle_order() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 4, 3);
        let mut session = session_for(Recording::new(AnalysisFlags::empty()), &topology, &trajectory);

        let summary = session.run(&ProgressReporter::new()).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.first_time, Some(0.0));
        assert_eq!(summary.last_time, Some(2.0));

        let module = session.into_module();
        assert_eq!(
            module.events,
            vec![
                "init_options",
                "options_finished",
                "init_analysis 4",
                "init_after_first_frame 4",
                "analyze_frame 0 pbc=true",
                "analyze_frame 1 pbc=true",
                "analyze_frame 2 pbc=true",
                "finish_analysis 3",
            ]
        );
        assert_eq!(module.data.rows().len(), 3);
    }

    #[test]
    fn module_sees_reconciled_time_unit() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 2, 1);
        let mut session = session_for(Recording::new(AnalysisFlags::empty()), &topology, &trajectory);
        session
            .options_mut()
            .set_from_str(option_names::TIME_UNIT, "ns")
            .unwrap();
        session.run(&ProgressReporter::new()).unwrap();
        assert_eq!(
            session.module().unit_seen_in_options_finished,
            Some(TimeUnit::Ns)
        );
    }

    #[test]
    fn module_options_come_before_standard_options() {
        let session = AnalysisSession::new(Recording::new(AnalysisFlags::empty())).unwrap();
        let names: Vec<_> = session.options().definitions().iter().map(|d| d.name).collect();
        assert_eq!(names[0], "loud");
        assert_eq!(names[1], option_names::TOPOLOGY);
    }

    #[test]
    fn module_flags_hide_pbc_options() {
        let session = AnalysisSession::new(Recording::new(AnalysisFlags::NO_USER_PBC)).unwrap();
        assert!(!session.options().contains(option_names::PBC));
        assert!(session.options().contains(option_names::RMPBC));
    }

    #[test]
    fn help_text_reaches_the_session() {
        let session = AnalysisSession::new(Recording::new(AnalysisFlags::empty())).unwrap();
        assert_eq!(session.help().lines(), ["Records every hook.".to_string()]);
    }

    #[test]
    fn disabled_pbc_is_passed_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 2, 1);
        let mut session = session_for(Recording::new(AnalysisFlags::empty()), &topology, &trajectory);
        session
            .options_mut()
            .set(option_names::PBC, OptionValue::Bool(false))
            .unwrap();
        session.run(&ProgressReporter::new()).unwrap();
        assert!(session
            .module()
            .events
            .contains(&"analyze_frame 0 pbc=false".to_string()));
    }

    #[test]
    fn module_errors_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 2, 3);
        let mut module = Recording::new(AnalysisFlags::empty());
        module.fail_at_frame = Some(1);
        let mut session = session_for(module, &topology, &trajectory);
        let err = session.run(&ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::Module(_)));
        assert!(!session
            .module()
            .events
            .iter()
            .any(|event| event.starts_with("finish_analysis")));
    }

    #[test]
    fn progress_reports_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 2, 4);
        let mut session = session_for(Recording::new(AnalysisFlags::empty()), &topology, &trajectory);
        let frames = RefCell::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::FrameAnalyzed { index, .. } = event {
                frames.borrow_mut().push(index);
            }
        }));
        session.run(&reporter).unwrap();
        assert_eq!(*frames.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "can only be run once")]
    fn second_run_panics() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 2, 1);
        let mut session = session_for(Recording::new(AnalysisFlags::empty()), &topology, &trajectory);
        session.run(&ProgressReporter::new()).unwrap();
        let _ = session.run(&ProgressReporter::new());
    }
}
