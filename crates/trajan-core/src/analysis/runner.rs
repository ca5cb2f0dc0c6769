use super::error::AnalysisError;
use super::options::{OptionDef, OptionError, OptionRegistry, OptionsContainer};
use super::plot::{PLOT_FORMAT_NAMES, PlotFormat};
use super::provider::TopologyProvider;
use super::settings::{AnalysisFlags, AnalysisSettings};
use super::time::TimeUnitBehavior;
use super::topology_info::TopologyInformation;
use super::trajectory::{TimeWindow, TrajectoryReader};
use crate::core::io::ndx::{IndexGroup, IndexGroups};
use crate::core::models::frame::{Frame, FrameFlags};
use crate::core::models::topology::Topology;
use crate::core::pbc::cell::{Pbc, PbcType};
use crate::core::pbc::whole::WholeMolecules;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Names of the options registered by [`RunnerCommon::init_options`].
pub mod option_names {
    pub const TOPOLOGY: &str = "topology";
    pub const TRAJECTORY: &str = "trajectory";
    pub const INDEX: &str = "index";
    pub const FRAME_GROUP: &str = "fgroup";
    pub const BEGIN: &str = "begin";
    pub const END: &str = "end";
    pub const DT: &str = "dt";
    pub const TIME_UNIT: &str = "tu";
    pub const PLOT_FORMAT: &str = "xvg";
    pub const PBC: &str = "pbc";
    pub const RMPBC: &str = "rmpbc";
}

use option_names::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Constructed,
    OptionsInitialized,
    OptionsFinished,
    TopologyLoaded,
    FirstFrameLoaded,
}

/// Shared input handling for trajectory analysis tools.
///
/// Owns the standard input options, the loaded topology and the reused frame. The
/// phases must be driven in order: [`init_options`](Self::init_options),
/// [`options_finished`](Self::options_finished), [`init_topology`](Self::init_topology),
/// [`init_first_frame`](Self::init_first_frame) and
/// [`init_frame_index_group`](Self::init_frame_index_group), after which
/// [`init_frame`](Self::init_frame) and [`read_next_frame`](Self::read_next_frame)
/// alternate for every frame. Calling an operation out of order panics.
pub struct RunnerCommon {
    phase: Phase,
    topology_file: Option<PathBuf>,
    trajectory_file: Option<PathBuf>,
    index_file: Option<PathBuf>,
    trajectory_group_name: Option<String>,
    index_groups: Option<IndexGroups>,
    trajectory_group: Option<IndexGroup>,
    window: TimeWindow,
    topology_info: TopologyInformation,
    frame: Frame,
    reader: Option<TrajectoryReader>,
    whole: Option<WholeMolecules>,
    use_pbc: bool,
    make_whole: bool,
    frames_read: usize,
    exhausted: bool,
}

impl Default for RunnerCommon {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerCommon {
    pub fn new() -> Self {
        Self {
            phase: Phase::Constructed,
            topology_file: None,
            trajectory_file: None,
            index_file: None,
            trajectory_group_name: None,
            index_groups: None,
            trajectory_group: None,
            window: TimeWindow::default(),
            topology_info: TopologyInformation::new(),
            frame: Frame::new(),
            reader: None,
            whole: None,
            use_pbc: false,
            make_whole: false,
            frames_read: 0,
            exhausted: false,
        }
    }

    fn require_phase(&self, expected: Phase, operation: &str) {
        assert!(
            self.phase == expected,
            "{} called in phase {:?}, expected {:?}",
            operation,
            self.phase,
            expected
        );
    }

    fn require_at_least(&self, minimum: Phase, operation: &str) {
        assert!(
            self.phase >= minimum,
            "{} called in phase {:?}, requires at least {:?}",
            operation,
            self.phase,
            minimum
        );
    }

    /// Registers the input options.
    ///
    /// `pbc` and `rmpbc` are offered only when the module allows the user to choose,
    /// with the module's current choice as default.
    pub fn init_options(
        &mut self,
        options: &mut dyn OptionsContainer,
        time_units: &mut TimeUnitBehavior,
        settings: &AnalysisSettings,
    ) -> Result<(), OptionError> {
        self.require_phase(Phase::Constructed, "init_options");

        options.add_option(
            OptionDef::path(TOPOLOGY, "Input structure providing the topology").with_short('s'),
        )?;
        options.add_option(OptionDef::path(TRAJECTORY, "Input trajectory").with_short('f'))?;
        options.add_option(OptionDef::path(INDEX, "Index file with atom groups").with_short('n'))?;
        options.add_option(OptionDef::text(
            FRAME_GROUP,
            "Atoms stored in the trajectory, as an index group name or number",
        ))?;
        options.add_option(
            OptionDef::real(BEGIN, "First frame to read from the trajectory").with_short('b'),
        )?;
        options.add_option(
            OptionDef::real(END, "Last frame to read from the trajectory").with_short('e'),
        )?;
        options.add_option(OptionDef::real(
            DT,
            "Only use frames at multiples of this interval after the first one",
        ))?;
        time_units.add_time_unit_option(options, TIME_UNIT)?;
        options.add_option(OptionDef::choice(
            PLOT_FORMAT,
            "Plot formatting of data output",
            PLOT_FORMAT_NAMES,
            settings.plot_settings().plot_format().as_str(),
        ))?;
        if !settings.has_flag(AnalysisFlags::NO_USER_PBC) {
            options.add_option(OptionDef::boolean(
                PBC,
                "Use periodic boundary conditions for distances",
                settings.has_pbc(),
            ))?;
        }
        if !settings.has_flag(AnalysisFlags::NO_USER_RMPBC) {
            options.add_option(OptionDef::boolean(
                RMPBC,
                "Make molecules whole for each frame",
                settings.has_rmpbc(),
            ))?;
        }

        self.phase = Phase::OptionsInitialized;
        Ok(())
    }

    /// Validates the parsed input options and folds them into `settings`.
    pub fn options_finished(
        &mut self,
        values: &OptionRegistry,
        time_units: &mut TimeUnitBehavior,
        settings: &mut AnalysisSettings,
    ) -> Result<(), AnalysisError> {
        self.require_phase(Phase::OptionsInitialized, "options_finished");

        time_units.options_finished(values)?;
        let time_unit = time_units.time_unit();

        self.topology_file = values.path(TOPOLOGY).map(Path::to_path_buf);
        self.trajectory_file = values.path(TRAJECTORY).map(Path::to_path_buf);
        self.index_file = values.path(INDEX).map(Path::to_path_buf);
        self.trajectory_group_name = values.text(FRAME_GROUP).map(str::to_string);

        if self.trajectory_file.is_none() && self.topology_file.is_none() {
            return Err(AnalysisError::Configuration(
                "Nothing to do: provide a trajectory or a topology".into(),
            ));
        }
        if self.trajectory_group_name.is_some() {
            if self.trajectory_file.is_none() {
                return Err(AnalysisError::Configuration(format!(
                    "Option '{}' needs a trajectory",
                    FRAME_GROUP
                )));
            }
            if self.index_file.is_none() {
                return Err(AnalysisError::Configuration(format!(
                    "Option '{}' needs an index file",
                    FRAME_GROUP
                )));
            }
        }

        let begin = values.real(BEGIN);
        let end = values.real(END);
        if let (Some(begin), Some(end)) = (begin, end) {
            if begin > end {
                return Err(AnalysisError::Configuration(format!(
                    "Begin time ({} {}) is after end time ({} {})",
                    begin, time_unit, end, time_unit
                )));
            }
        }
        let dt = values.real(DT);
        if dt.is_some_and(|dt| dt <= 0.0) {
            return Err(AnalysisError::Configuration(format!(
                "Option '{}' must be positive",
                DT
            )));
        }
        self.window = TimeWindow {
            begin: begin.map(|t| time_unit.to_ps(t)),
            end: end.map(|t| time_unit.to_ps(t)),
            dt: dt.map(|t| time_unit.to_ps(t)),
        };

        settings.set_time_unit(time_unit);
        if let Some(text) = values.text(PLOT_FORMAT) {
            let format: PlotFormat = text.parse().map_err(|_| OptionError::InvalidChoice {
                name: PLOT_FORMAT.to_string(),
                value: text.to_string(),
                choices: PLOT_FORMAT_NAMES.join(", "),
            })?;
            settings.plot_settings_mut().set_plot_format(format);
        }

        let user_choice = |name: &str| values.is_set(name).then(|| values.bool(name)).flatten();
        settings.apply_user_overrides(user_choice(PBC), user_choice(RMPBC));

        debug!(
            topology = ?self.topology_file,
            trajectory = ?self.trajectory_file,
            window = ?self.window,
            "Input options finished"
        );
        self.phase = Phase::OptionsFinished;
        Ok(())
    }

    /// Loads the topology and the index file, when given.
    pub fn init_topology(&mut self, settings: &AnalysisSettings) -> Result<(), AnalysisError> {
        self.require_phase(Phase::OptionsFinished, "init_topology");

        if settings.has_flag(AnalysisFlags::REQUIRE_TOPOLOGY) && self.topology_file.is_none() {
            return Err(AnalysisError::Configuration(
                "No topology provided, but one is required for this analysis".into(),
            ));
        }

        if let Some(path) = &self.topology_file {
            self.topology_info
                .fill_from_input_file(path)
                .map_err(|source| AnalysisError::TopologyLoad {
                    path: path.clone(),
                    source,
                })?;
            if self.trajectory_file.is_some() {
                if !settings.has_flag(AnalysisFlags::USE_TOPOLOGY_POSITIONS) {
                    self.topology_info.clear_positions();
                }
                if !settings.has_flag(AnalysisFlags::USE_TOPOLOGY_VELOCITIES) {
                    self.topology_info.clear_velocities();
                }
            }
            if settings.has_rmpbc() && !self.topology_info.has_full_topology() {
                warn!(
                    path = %path.display(),
                    "Topology has no bonds; molecules will not be made whole"
                );
            }
        }

        if let Some(path) = &self.index_file {
            let groups =
                IndexGroups::read_from_path(path).map_err(|source| AnalysisError::IndexLoad {
                    path: path.clone(),
                    source,
                })?;
            if let Some(selector) = &self.trajectory_group_name {
                let group = groups.find(selector).ok_or_else(|| {
                    AnalysisError::Configuration(format!(
                        "Index group '{}' not found in '{}'",
                        selector,
                        path.display()
                    ))
                })?;
                self.trajectory_group = Some(group.clone());
            }
            debug!(path = %path.display(), groups = groups.groups().len(), "Loaded index file");
            self.index_groups = Some(groups);
        }

        self.phase = Phase::TopologyLoaded;
        Ok(())
    }

    /// Reads the first frame, or builds one from the topology coordinates when no
    /// trajectory was given. Calling it again after success does nothing.
    pub fn init_first_frame(&mut self, settings: &AnalysisSettings) -> Result<(), AnalysisError> {
        if self.phase == Phase::FirstFrameLoaded {
            return Ok(());
        }
        self.require_phase(Phase::TopologyLoaded, "init_first_frame");

        if let Some(path) = self.trajectory_file.clone() {
            let flags = settings.frame_flags() | FrameFlags::NEED_POSITIONS;
            let trajectory_error = |source| AnalysisError::Trajectory {
                path: path.clone(),
                source,
            };
            let mut reader =
                TrajectoryReader::open(&path, flags, self.window).map_err(trajectory_error)?;
            if !reader.read_first(&mut self.frame).map_err(trajectory_error)? {
                return Err(AnalysisError::EmptyTrajectory { path });
            }
            let topology_atoms = self.topology_info.atom_count();
            if self.topology_info.has_topology() && self.frame.atom_count() > topology_atoms {
                return Err(AnalysisError::Configuration(format!(
                    "Trajectory '{}' has {} atoms, but the topology has only {}",
                    path.display(),
                    self.frame.atom_count(),
                    topology_atoms
                )));
            }
            info!(
                path = %path.display(),
                atoms = self.frame.atom_count(),
                "Opened trajectory"
            );
            self.reader = Some(reader);
        } else {
            let positions = self.topology_info.positions().ok_or_else(|| {
                AnalysisError::Configuration("The topology provides no coordinates".into())
            })?;
            let velocities = if settings.frame_flags().wants_velocities() {
                let velocities = self.topology_info.velocities();
                if velocities.is_none()
                    && settings.frame_flags().contains(FrameFlags::NEED_VELOCITIES)
                {
                    return Err(AnalysisError::Configuration(
                        "Velocities are required, but the topology provides none".into(),
                    ));
                }
                velocities
            } else {
                None
            };
            self.frame.reset();
            self.frame.set_positions(positions);
            self.frame.set_velocities(velocities);
            self.frame
                .set_simulation_box(self.topology_info.simulation_box().copied());
            self.frame.set_time(Some(0.0));
            self.frame.set_step(Some(0));
            debug!(atoms = self.frame.atom_count(), "Using topology coordinates as the only frame");
        }

        self.frames_read = 1;
        self.use_pbc = settings.has_pbc();
        self.make_whole = settings.has_rmpbc() && self.topology_info.has_topology();
        self.rebuild_whole();
        self.phase = Phase::FirstFrameLoaded;
        Ok(())
    }

    /// Replaces the group describing which topology atoms the trajectory holds.
    pub fn set_trajectory_group(&mut self, group: IndexGroup) {
        self.require_at_least(Phase::OptionsFinished, "set_trajectory_group");
        self.trajectory_group = Some(group);
    }

    /// Applies the trajectory group to the frame, once its size is known.
    pub fn init_frame_index_group(&mut self) -> Result<(), AnalysisError> {
        self.require_phase(Phase::FirstFrameLoaded, "init_frame_index_group");
        let Some(group) = &self.trajectory_group else {
            return Ok(());
        };
        if group.len() != self.frame.atom_count() {
            return Err(AnalysisError::Configuration(format!(
                "Index group '{}' has {} atoms, but the trajectory frames have {}",
                group.name,
                group.len(),
                self.frame.atom_count()
            )));
        }
        if self.topology_info.has_topology() {
            let topology_atoms = self.topology_info.atom_count();
            if let Some(&atom) = group.atoms.iter().find(|&&atom| atom >= topology_atoms) {
                return Err(AnalysisError::Configuration(format!(
                    "Index group '{}' refers to atom {}, but the topology has {} atoms",
                    group.name,
                    atom + 1,
                    topology_atoms
                )));
            }
        }
        self.frame.set_index(Some(group.atoms.clone()));
        self.rebuild_whole();
        Ok(())
    }

    fn rebuild_whole(&mut self) {
        self.whole = match self.topology_info.topology() {
            Some(topology) if self.make_whole => Some(WholeMolecules::new(
                topology,
                self.frame.index(),
                self.frame.atom_count(),
            )),
            _ => None,
        };
    }

    /// Prepares the current frame for analysis by making molecules whole.
    pub fn init_frame(&mut self) {
        self.require_phase(Phase::FirstFrameLoaded, "init_frame");
        let Some(whole) = &self.whole else {
            return;
        };
        let Some(pbc) = self.periodic_context() else {
            return;
        };
        whole.make_whole(self.frame.positions_mut(), &pbc);
    }

    fn periodic_context(&self) -> Option<Pbc> {
        let simulation_box = self
            .frame
            .simulation_box()
            .or(self.topology_info.simulation_box())
            .copied()?;
        let pbc_type = match self.topology_info.pbc_type() {
            PbcType::Xy => PbcType::Xy,
            _ => PbcType::Xyz,
        };
        Pbc::new(pbc_type, simulation_box)
    }

    /// The periodic context for distance calculations on the current frame.
    ///
    /// `None` when periodic boundaries are off or no usable box is known.
    pub fn pbc(&self) -> Option<Pbc> {
        self.require_phase(Phase::FirstFrameLoaded, "pbc");
        if !self.use_pbc {
            return None;
        }
        self.periodic_context()
    }

    /// Advances to the next frame. Once this returns `false` or an error it keeps
    /// returning `false` and leaves the frame alone.
    pub fn read_next_frame(&mut self) -> Result<bool, AnalysisError> {
        self.require_phase(Phase::FirstFrameLoaded, "read_next_frame");
        if self.exhausted {
            return Ok(false);
        }
        let Some(reader) = self.reader.as_mut() else {
            self.exhausted = true;
            return Ok(false);
        };
        match reader.read_next(&mut self.frame) {
            Ok(true) => {
                self.frames_read += 1;
                debug!(frame = self.frames_read, time = ?self.frame.time(), "Read frame");
                Ok(true)
            }
            Ok(false) => {
                self.exhausted = true;
                self.reader = None;
                info!(frames = self.frames_read, "Finished reading trajectory");
                Ok(false)
            }
            Err(source) => {
                self.exhausted = true;
                self.reader = None;
                Err(AnalysisError::Trajectory {
                    path: self.trajectory_file.clone().unwrap_or_default(),
                    source,
                })
            }
        }
    }

    pub fn has_trajectory(&self) -> bool {
        self.require_at_least(Phase::OptionsFinished, "has_trajectory");
        self.trajectory_file.is_some()
    }

    pub fn time_window(&self) -> TimeWindow {
        self.require_at_least(Phase::OptionsFinished, "time_window");
        self.window
    }

    pub fn topology_information(&self) -> &TopologyInformation {
        self.require_at_least(Phase::TopologyLoaded, "topology_information");
        &self.topology_info
    }

    pub fn index_groups(&self) -> Option<&IndexGroups> {
        self.require_at_least(Phase::TopologyLoaded, "index_groups");
        self.index_groups.as_ref()
    }

    pub fn frame(&self) -> &Frame {
        self.require_phase(Phase::FirstFrameLoaded, "frame");
        &self.frame
    }

    /// Frames delivered so far, including the first one.
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// The system view for selection tooling. Usable from option parsing on.
    pub fn topology_provider(&self) -> &dyn TopologyProvider {
        self
    }
}

impl TopologyProvider for RunnerCommon {
    fn topology(&self) -> Option<&Topology> {
        self.topology_info.topology()
    }

    fn atom_count(&self) -> usize {
        if self.topology_info.has_topology() {
            self.topology_info.atom_count()
        } else if self.phase == Phase::FirstFrameLoaded {
            self.frame.atom_count()
        } else {
            0
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::options::OptionValue;
    use crate::analysis::time::TimeUnit;
    use crate::core::io::bgf::tests::atom_line;
    use std::fs;

    pub(crate) const BOX_NM: f64 = 3.0;

    /// A BGF chain of `length` carbons 1.5 Å apart, bonded in sequence, in a 30 Å box.
    pub(crate) fn chain_bgf(length: usize) -> String {
        let mut lines = vec![
            "BIOGRF 200".to_string(),
            "DESCRP chain".to_string(),
            "CRYSTX    30.00000   30.00000   30.00000   90.00000   90.00000   90.00000".into(),
        ];
        for i in 0..length {
            let serial = i + 1;
            lines.push(atom_line(serial, "C", "CHN", 1, [1.5 * i as f64, 10.0, 10.0], "C_3", 0.0));
        }
        for serial in 1..length {
            lines.push(format!("CONECT{:>6}{:>6}", serial, serial + 1));
        }
        lines.push("END".into());
        lines.join("\n")
    }

    /// One GRO frame with the given positions in nm and a cubic box.
    pub(crate) fn gro_frame(time: f64, positions: &[[f64; 3]]) -> String {
        let mut text = format!("chain t= {:.5} step= {}\n{:>5}\n", time, time as i64, positions.len());
        for (i, [x, y, z]) in positions.iter().enumerate() {
            text.push_str(&format!(
                "{:>5}{:<5}{:>5}{:>5}{:>8.3}{:>8.3}{:>8.3}\n",
                1,
                "CHN",
                "C",
                i + 1,
                x,
                y,
                z
            ));
        }
        text.push_str(&format!("{:>10.5}{:>10.5}{:>10.5}\n", BOX_NM, BOX_NM, BOX_NM));
        text
    }

    /// A chain along x starting at `start`, wrapped into the box.
    pub(crate) fn wrapped_chain(length: usize, start: f64) -> Vec<[f64; 3]> {
        (0..length)
            .map(|i| [(start + 0.15 * i as f64).rem_euclid(BOX_NM), 1.0, 1.0])
            .collect()
    }

    pub(crate) fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Writes a chain topology and a trajectory of `frames` frames 1 ps apart.
    pub(crate) fn chain_inputs(dir: &Path, length: usize, frames: usize) -> (PathBuf, PathBuf) {
        let topology = write(dir, "chain.bgf", &chain_bgf(length));
        let trajectory: String = (0..frames)
            .map(|i| gro_frame(i as f64, &wrapped_chain(length, 2.5)))
            .collect();
        (topology, write(dir, "traj.gro", &trajectory))
    }

    struct Harness {
        runner: RunnerCommon,
        registry: OptionRegistry,
        time_units: TimeUnitBehavior,
        settings: AnalysisSettings,
    }

    impl Harness {
        fn new(settings: AnalysisSettings) -> Self {
            let mut harness = Self {
                runner: RunnerCommon::new(),
                registry: OptionRegistry::new(),
                time_units: TimeUnitBehavior::new(),
                settings,
            };
            harness
                .runner
                .init_options(&mut harness.registry, &mut harness.time_units, &harness.settings)
                .unwrap();
            harness
        }

        fn set_path(&mut self, name: &str, path: &Path) -> &mut Self {
            self.registry
                .set(name, OptionValue::Path(path.to_path_buf()))
                .unwrap();
            self
        }

        fn set(&mut self, name: &str, raw: &str) -> &mut Self {
            self.registry.set_from_str(name, raw).unwrap();
            self
        }

        fn finish_options(&mut self) -> Result<(), AnalysisError> {
            self.runner
                .options_finished(&self.registry, &mut self.time_units, &mut self.settings)
        }

        fn run_to_first_frame(&mut self) -> Result<(), AnalysisError> {
            self.finish_options()?;
            self.runner.init_topology(&self.settings)?;
            self.runner.init_first_frame(&self.settings)?;
            self.runner.init_frame_index_group()
        }
    }

    fn max_neighbor_jump(frame: &Frame) -> f64 {
        frame
            .positions()
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn registers_standard_options() {
        let harness = Harness::new(AnalysisSettings::new());
        for name in [
            TOPOLOGY, TRAJECTORY, INDEX, FRAME_GROUP, BEGIN, END, DT, TIME_UNIT, PLOT_FORMAT,
            PBC, RMPBC,
        ] {
            assert!(harness.registry.contains(name), "missing option {name}");
        }
        assert_eq!(harness.registry.bool(PBC), Some(true));
        assert_eq!(harness.registry.text(PLOT_FORMAT), Some("xmgrace"));
    }

    #[test]
    fn pbc_switches_are_hidden_when_the_module_forbids_them() {
        let mut settings = AnalysisSettings::new();
        settings.set_flags(AnalysisFlags::NO_USER_PBC | AnalysisFlags::NO_USER_RMPBC);
        let harness = Harness::new(settings);
        assert!(!harness.registry.contains(PBC));
        assert!(!harness.registry.contains(RMPBC));
    }

    #[test]
    fn module_default_is_offered_to_the_user() {
        let mut settings = AnalysisSettings::new();
        settings.set_rmpbc(false);
        let harness = Harness::new(settings);
        assert_eq!(harness.registry.bool(RMPBC), Some(false));
    }

    #[test]
    #[should_panic(expected = "init_topology called in phase OptionsInitialized")]
    fn out_of_order_phase_panics() {
        let harness = Harness::new(AnalysisSettings::new());
        let mut runner = harness.runner;
        let _ = runner.init_topology(&harness.settings);
    }

    #[test]
    #[should_panic(expected = "frame called in phase")]
    fn frame_before_first_frame_panics() {
        RunnerCommon::new().frame();
    }

    #[test]
    fn nothing_to_do_is_a_configuration_error() {
        let mut harness = Harness::new(AnalysisSettings::new());
        let err = harness.finish_options().unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(ref m) if m.contains("Nothing to do")));
    }

    #[test]
    fn frame_group_needs_trajectory_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let topology = write(dir.path(), "chain.bgf", &chain_bgf(3));

        let mut harness = Harness::new(AnalysisSettings::new());
        harness.set_path(TOPOLOGY, &topology).set(FRAME_GROUP, "System");
        let err = harness.finish_options().unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(ref m) if m.contains("trajectory")));

        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TRAJECTORY, &dir.path().join("traj.gro"))
            .set(FRAME_GROUP, "System");
        let err = harness.finish_options().unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(ref m) if m.contains("index file")));
    }

    #[test]
    fn inverted_or_zero_time_window_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let trajectory = dir.path().join("traj.gro");

        let mut harness = Harness::new(AnalysisSettings::new());
        harness.set_path(TRAJECTORY, &trajectory).set(BEGIN, "10").set(END, "5");
        assert!(matches!(
            harness.finish_options(),
            Err(AnalysisError::Configuration(_))
        ));

        let mut harness = Harness::new(AnalysisSettings::new());
        harness.set_path(TRAJECTORY, &trajectory).set(DT, "0");
        assert!(matches!(
            harness.finish_options(),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn time_options_are_converted_to_ps() {
        let dir = tempfile::tempdir().unwrap();
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TRAJECTORY, &dir.path().join("traj.gro"))
            .set(TIME_UNIT, "ns")
            .set(BEGIN, "1")
            .set(DT, "0.5");
        harness.finish_options().unwrap();
        let window = harness.runner.time_window();
        assert_eq!(window.begin, Some(1000.0));
        assert_eq!(window.dt, Some(500.0));
        assert_eq!(window.end, None);
        assert_eq!(harness.settings.time_unit(), TimeUnit::Ns);
        assert_eq!(harness.settings.plot_settings().time_unit(), TimeUnit::Ns);
    }

    #[test]
    fn user_choices_reach_the_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TRAJECTORY, &dir.path().join("traj.gro"))
            .set(PBC, "no")
            .set(PLOT_FORMAT, "none");
        harness.finish_options().unwrap();
        assert!(!harness.settings.has_pbc());
        assert!(harness.settings.has_rmpbc());
        assert_eq!(harness.settings.plot_settings().plot_format(), PlotFormat::None);
    }

    #[test]
    fn required_topology_must_be_given() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = AnalysisSettings::new();
        settings.set_flag(AnalysisFlags::REQUIRE_TOPOLOGY, true);
        let mut harness = Harness::new(settings);
        harness.set_path(TRAJECTORY, &dir.path().join("traj.gro"));
        harness.finish_options().unwrap();
        let err = harness.runner.init_topology(&harness.settings).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn unreadable_topology_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut harness = Harness::new(AnalysisSettings::new());
        harness.set_path(TOPOLOGY, &dir.path().join("missing.bgf"));
        harness.finish_options().unwrap();
        let err = harness.runner.init_topology(&harness.settings).unwrap_err();
        assert!(matches!(err, AnalysisError::TopologyLoad { .. }));
    }

    #[test]
    fn topology_only_run_yields_a_single_pseudo_frame() {
        let dir = tempfile::tempdir().unwrap();
        let topology = write(dir.path(), "chain.bgf", &chain_bgf(4));
        let mut harness = Harness::new(AnalysisSettings::new());
        harness.set_path(TOPOLOGY, &topology);
        harness.run_to_first_frame().unwrap();

        let runner = &mut harness.runner;
        assert!(!runner.has_trajectory());
        assert_eq!(runner.frame().atom_count(), 4);
        assert_eq!(runner.frame().time(), Some(0.0));
        assert_eq!(runner.frame().step(), Some(0));
        assert!(runner.frame().simulation_box().is_some());
        assert!((runner.frame().positions()[1].x - 0.15).abs() < 1e-9);
        assert!(!runner.read_next_frame().unwrap());
        assert!(!runner.read_next_frame().unwrap());
        assert_eq!(runner.frames_read(), 1);
    }

    #[test]
    fn trajectory_frames_are_read_until_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 5, 3);
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory);
        harness.run_to_first_frame().unwrap();

        let runner = &mut harness.runner;
        assert_eq!(runner.frame().time(), Some(0.0));
        assert!(runner.read_next_frame().unwrap());
        assert!(runner.read_next_frame().unwrap());
        assert_eq!(runner.frame().time(), Some(2.0));
        assert!(!runner.read_next_frame().unwrap());
        assert!(!runner.read_next_frame().unwrap());
        assert_eq!(runner.frame().time(), Some(2.0));
        assert_eq!(runner.frames_read(), 3);
    }

    #[test]
    fn read_error_ends_the_trajectory() {
        let dir = tempfile::tempdir().unwrap();
        let topology = write(dir.path(), "chain.bgf", &chain_bgf(3));
        let chain = wrapped_chain(3, 0.5);
        let content = [
            gro_frame(0.0, &chain),
            "broken frame\nnot-a-count\n".to_string(),
            gro_frame(2.0, &chain),
            gro_frame(3.0, &chain),
        ]
        .concat();
        let trajectory = write(dir.path(), "traj.gro", &content);
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory);
        harness.run_to_first_frame().unwrap();

        let runner = &mut harness.runner;
        let err = runner.read_next_frame().unwrap_err();
        assert!(matches!(err, AnalysisError::Trajectory { .. }));
        assert!(!runner.read_next_frame().unwrap());
        assert!(!runner.read_next_frame().unwrap());
        assert_eq!(runner.frames_read(), 1);
    }

    #[test]
    fn topology_chain_over_five_frames_stays_whole() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 10, 5);
        let mut settings = AnalysisSettings::new();
        settings.set_flags(AnalysisFlags::REQUIRE_TOPOLOGY | AnalysisFlags::USE_TOPOLOGY_POSITIONS);
        let mut harness = Harness::new(settings);
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory);
        harness.run_to_first_frame().unwrap();

        let runner = &mut harness.runner;
        assert_eq!(runner.topology_information().positions().map(<[_]>::len), Some(10));
        runner.init_frame();
        assert!(max_neighbor_jump(runner.frame()) < 0.2);

        let mut advances = Vec::new();
        for _ in 0..5 {
            let advanced = runner.read_next_frame().unwrap();
            advances.push(advanced);
            runner.init_frame();
            assert!(max_neighbor_jump(runner.frame()) < 0.2);
        }
        assert_eq!(advances, vec![true, true, true, true, false]);
        assert_eq!(runner.frames_read(), 5);
    }

    #[test]
    fn topology_coordinates_are_dropped_unless_requested() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 3, 1);

        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory);
        harness.run_to_first_frame().unwrap();
        assert!(harness.runner.topology_information().positions().is_none());

        let mut settings = AnalysisSettings::new();
        settings.set_flag(AnalysisFlags::USE_TOPOLOGY_POSITIONS, true);
        let mut harness = Harness::new(settings);
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory);
        harness.run_to_first_frame().unwrap();
        assert_eq!(
            harness.runner.topology_information().positions().map(<[_]>::len),
            Some(3)
        );
    }

    #[test]
    fn trajectory_larger_than_topology_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let topology = write(dir.path(), "chain.bgf", &chain_bgf(2));
        let trajectory = write(dir.path(), "traj.gro", &gro_frame(0.0, &wrapped_chain(3, 0.5)));
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory);
        let err = harness.run_to_first_frame().unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(ref m) if m.contains("only 2")));
    }

    #[test]
    fn empty_trajectory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let trajectory = write(dir.path(), "traj.gro", "");
        let mut harness = Harness::new(AnalysisSettings::new());
        harness.set_path(TRAJECTORY, &trajectory);
        let err = harness.run_to_first_frame().unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyTrajectory { .. }));
        assert_eq!(err.kind(), crate::analysis::error::ErrorKind::Io);
    }

    #[test]
    fn init_first_frame_twice_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 3, 2);
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory);
        harness.run_to_first_frame().unwrap();
        harness.runner.init_first_frame(&harness.settings).unwrap();
        assert_eq!(harness.runner.frame().time(), Some(0.0));
        assert_eq!(harness.runner.frames_read(), 1);
    }

    #[test]
    fn init_frame_makes_the_chain_whole() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 10, 1);
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory);
        harness.run_to_first_frame().unwrap();

        assert!(max_neighbor_jump(harness.runner.frame()) > BOX_NM / 2.0);
        harness.runner.init_frame();
        assert!(max_neighbor_jump(harness.runner.frame()) < 0.2);
        assert!(harness.runner.pbc().is_some());
    }

    #[test]
    fn rmpbc_off_leaves_frame_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 10, 1);
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory)
            .set(RMPBC, "no")
            .set(PBC, "no");
        harness.run_to_first_frame().unwrap();
        harness.runner.init_frame();
        assert!(max_neighbor_jump(harness.runner.frame()) > BOX_NM / 2.0);
        assert!(harness.runner.pbc().is_none());
    }

    #[test]
    fn trajectory_group_narrows_the_frame() {
        let dir = tempfile::tempdir().unwrap();
        let topology = write(dir.path(), "chain.bgf", &chain_bgf(6));
        let trajectory = write(
            dir.path(),
            "traj.gro",
            &gro_frame(0.0, &[[2.9, 1.0, 1.0], [0.1, 1.0, 1.0], [0.1, 2.0, 1.0]]),
        );
        let index = write(dir.path(), "index.ndx", "[ System ]\n1 2 3 4 5 6\n[ Part ]\n3 4 6\n");

        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory)
            .set_path(INDEX, &index)
            .set(FRAME_GROUP, "part");
        harness.run_to_first_frame().unwrap();

        let runner = &mut harness.runner;
        assert_eq!(runner.frame().index(), Some(&[2, 3, 5][..]));
        assert_eq!(runner.frame().topology_index(2), 5);
        runner.init_frame();
        assert!((runner.frame().positions()[1].x - 3.1).abs() < 1e-6);
        assert!((runner.frame().positions()[2].x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn trajectory_group_size_must_match_frames() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 4, 1);
        let index = write(dir.path(), "index.ndx", "[ Pair ]\n1 2\n");
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory)
            .set_path(INDEX, &index)
            .set(FRAME_GROUP, "0");
        let err = harness.run_to_first_frame().unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(ref m) if m.contains("Pair")));
    }

    #[test]
    fn unknown_trajectory_group_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (topology, trajectory) = chain_inputs(dir.path(), 4, 1);
        let index = write(dir.path(), "index.ndx", "[ Pair ]\n1 2\n");
        let mut harness = Harness::new(AnalysisSettings::new());
        harness
            .set_path(TOPOLOGY, &topology)
            .set_path(TRAJECTORY, &trajectory)
            .set_path(INDEX, &index)
            .set(FRAME_GROUP, "Backbone");
        harness.finish_options().unwrap();
        let err = harness.runner.init_topology(&harness.settings).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(ref m) if m.contains("Backbone")));
    }

    #[test]
    fn provider_counts_atoms_from_topology_or_frame() {
        let dir = tempfile::tempdir().unwrap();
        let (_, trajectory) = chain_inputs(dir.path(), 4, 1);
        let mut harness = Harness::new(AnalysisSettings::new());
        assert_eq!(harness.runner.topology_provider().atom_count(), 0);
        harness.set_path(TRAJECTORY, &trajectory);
        harness.run_to_first_frame().unwrap();
        let provider = harness.runner.topology_provider();
        assert!(provider.topology().is_none());
        assert_eq!(provider.atom_count(), 4);
        assert!(provider.molecules().is_empty());
    }
}
