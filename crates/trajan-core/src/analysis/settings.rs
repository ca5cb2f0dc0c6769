use super::plot::PlotSettings;
use super::time::TimeUnit;
use crate::core::models::frame::FrameFlags;
use bitflags::bitflags;
use std::cell::RefCell;
use std::rc::Weak;

bitflags! {
    /// Requirements an analysis module declares before options are parsed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnalysisFlags: u32 {
        /// Load a topology even when the user did not name one explicitly.
        const REQUIRE_TOPOLOGY = 1 << 0;
        /// Keep the topology coordinates available next to the trajectory.
        const USE_TOPOLOGY_POSITIONS = 1 << 1;
        /// Keep the topology velocities available next to the trajectory.
        const USE_TOPOLOGY_VELOCITIES = 1 << 2;
        /// Do not offer the user a switch for PBC handling.
        const NO_USER_PBC = 1 << 4;
        /// Do not offer the user a switch for making molecules whole.
        const NO_USER_RMPBC = 1 << 5;
    }
}

/// The part of the hosting command that receives module help text.
pub trait CommandLineModuleSettings {
    fn set_help_text(&mut self, help: &[&str]);
}

/// A boolean with a module-declared value and an optional user override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbcChoice {
    pub module_default: bool,
    pub user_override: Option<bool>,
}

impl Default for PbcChoice {
    fn default() -> Self {
        Self {
            module_default: true,
            user_override: None,
        }
    }
}

impl PbcChoice {
    fn effective(&self, user_allowed: bool) -> bool {
        match self.user_override {
            Some(value) if user_allowed => value,
            _ => self.module_default,
        }
    }
}

/// Settings an analysis module uses to describe what it needs from the framework.
///
/// Modules fill these in while declaring their options; the runner reads them when it
/// loads the topology and the trajectory. After option parsing the user's `pbc` and
/// `rmpbc` choices are folded in, unless the corresponding `NO_USER_*` flag forbids it.
#[derive(Default)]
pub struct AnalysisSettings {
    flags: AnalysisFlags,
    pbc: PbcChoice,
    rmpbc: PbcChoice,
    frame_flags: FrameFlags,
    time_unit: TimeUnit,
    plot_settings: PlotSettings,
    host: Option<Weak<RefCell<dyn CommandLineModuleSettings>>>,
}

impl AnalysisSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> AnalysisFlags {
        self.flags
    }

    /// Whether any bit of `flag` is set.
    pub fn has_flag(&self, flag: AnalysisFlags) -> bool {
        self.flags.intersects(flag)
    }

    /// Replaces all flags.
    pub fn set_flags(&mut self, flags: AnalysisFlags) {
        self.flags = flags;
    }

    pub fn set_flag(&mut self, flag: AnalysisFlags, on: bool) {
        self.flags.set(flag, on);
    }

    /// Whether periodic boundaries are used for analysis.
    pub fn has_pbc(&self) -> bool {
        self.pbc.effective(!self.has_flag(AnalysisFlags::NO_USER_PBC))
    }

    /// Whether molecules are made whole before each frame is analyzed.
    pub fn has_rmpbc(&self) -> bool {
        self.rmpbc.effective(!self.has_flag(AnalysisFlags::NO_USER_RMPBC))
    }

    /// Sets whether periodic boundaries are used.
    ///
    /// Before options are parsed this is the default offered to the user; afterwards
    /// it replaces whatever the user chose.
    pub fn set_pbc(&mut self, on: bool) {
        self.pbc = PbcChoice {
            module_default: on,
            user_override: None,
        };
    }

    /// Sets whether molecules are made whole. See [`set_pbc`](Self::set_pbc).
    pub fn set_rmpbc(&mut self, on: bool) {
        self.rmpbc = PbcChoice {
            module_default: on,
            user_override: None,
        };
    }

    pub fn pbc_choice(&self) -> PbcChoice {
        self.pbc
    }

    pub fn rmpbc_choice(&self) -> PbcChoice {
        self.rmpbc
    }

    pub fn frame_flags(&self) -> FrameFlags {
        self.frame_flags
    }

    /// Selects which channels are read from the trajectory. Defaults to positions.
    pub fn set_frame_flags(&mut self, frame_flags: FrameFlags) {
        self.frame_flags = frame_flags;
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    pub fn plot_settings(&self) -> &PlotSettings {
        &self.plot_settings
    }

    /// Installs the hosting command that receives [`set_help_text`](Self::set_help_text).
    pub fn set_options_module_settings(
        &mut self,
        host: Weak<RefCell<dyn CommandLineModuleSettings>>,
    ) {
        self.host = Some(host);
    }

    /// Forwards help text lines verbatim to the hosting command.
    ///
    /// # Panics
    ///
    /// Panics if no host was installed or the host no longer exists.
    pub fn set_help_text(&self, help: &[&str]) {
        let host = self
            .host
            .as_ref()
            .and_then(Weak::upgrade)
            .expect("set_help_text requires a live host from set_options_module_settings");
        host.borrow_mut().set_help_text(help);
    }

    pub(crate) fn apply_user_overrides(&mut self, pbc: Option<bool>, rmpbc: Option<bool>) {
        if !self.has_flag(AnalysisFlags::NO_USER_PBC) {
            self.pbc.user_override = pbc;
        }
        if !self.has_flag(AnalysisFlags::NO_USER_RMPBC) {
            self.rmpbc.user_override = rmpbc;
        }
    }

    pub(crate) fn set_time_unit(&mut self, time_unit: TimeUnit) {
        self.time_unit = time_unit;
        self.plot_settings.set_time_unit(time_unit);
    }

    pub(crate) fn plot_settings_mut(&mut self) -> &mut PlotSettings {
        &mut self.plot_settings
    }
}
