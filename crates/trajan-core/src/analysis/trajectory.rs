use crate::core::io::error::FormatError;
use crate::core::io::infer;
use crate::core::io::traits::FrameReader;
use crate::core::models::frame::{Frame, FrameFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Relative tolerance for comparing frame times against the window.
const TIME_TOLERANCE: f64 = 1e-6;
/// Accepted deviation from a whole number of `dt` steps, as a fraction of `dt`.
const STRIDE_TOLERANCE: f64 = 1e-3;

/// Which frames of a trajectory are analyzed, in ps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeWindow {
    pub begin: Option<f64>,
    pub end: Option<f64>,
    /// Only frames whose time is a multiple of `dt` after the first analyzed frame.
    pub dt: Option<f64>,
}

impl TimeWindow {
    fn tolerance(value: f64) -> f64 {
        TIME_TOLERANCE * value.abs().max(1.0)
    }

    fn before_begin(&self, time: f64) -> bool {
        self.begin.is_some_and(|begin| time < begin - Self::tolerance(begin))
    }

    fn past_end(&self, time: f64) -> bool {
        self.end.is_some_and(|end| time > end + Self::tolerance(end))
    }

    fn is_restricted(&self) -> bool {
        self.begin.is_some() || self.end.is_some() || self.dt.is_some()
    }

    fn off_stride(&self, time: f64, first: f64) -> bool {
        self.dt.is_some_and(|dt| {
            let steps = (time - first) / dt;
            (steps - steps.round()).abs() > STRIDE_TOLERANCE
        })
    }
}

/// A trajectory file filtered by frame channels and a time window.
pub struct TrajectoryReader {
    path: PathBuf,
    reader: Box<dyn FrameReader>,
    flags: FrameFlags,
    window: TimeWindow,
    first_time: Option<f64>,
    atom_count: Option<usize>,
    frames_scanned: usize,
    frames_accepted: usize,
    warned_untimed: bool,
}

impl TrajectoryReader {
    pub fn open(path: &Path, flags: FrameFlags, window: TimeWindow) -> Result<Self, FormatError> {
        let reader = infer::open_trajectory(path)?;
        Ok(Self::from_reader(path, reader, flags, window))
    }

    pub fn from_reader(
        path: &Path,
        reader: Box<dyn FrameReader>,
        flags: FrameFlags,
        window: TimeWindow,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            reader,
            flags,
            window,
            first_time: None,
            atom_count: None,
            frames_scanned: 0,
            frames_accepted: 0,
            warned_untimed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flags(&self) -> FrameFlags {
        self.flags
    }

    pub fn frames_accepted(&self) -> usize {
        self.frames_accepted
    }

    /// Reads the first frame that passes the filters.
    pub fn read_first(&mut self, frame: &mut Frame) -> Result<bool, FormatError> {
        self.read_accepted(frame)
    }

    /// Reads the next frame that passes the filters.
    pub fn read_next(&mut self, frame: &mut Frame) -> Result<bool, FormatError> {
        self.read_accepted(frame)
    }

    fn read_accepted(&mut self, frame: &mut Frame) -> Result<bool, FormatError> {
        loop {
            if !self.reader.read_frame(frame)? {
                debug!(
                    scanned = self.frames_scanned,
                    accepted = self.frames_accepted,
                    "End of trajectory"
                );
                return Ok(false);
            }
            self.frames_scanned += 1;

            if let Some(expected) = self.atom_count {
                if frame.atom_count() != expected {
                    return Err(FormatError::Inconsistency(format!(
                        "Frame {} has {} atoms, but earlier frames have {}",
                        self.frames_scanned,
                        frame.atom_count(),
                        expected
                    )));
                }
            }

            if let Some(time) = self.window_time(frame) {
                if self.window.before_begin(time) {
                    continue;
                }
                if self.window.past_end(time) {
                    debug!(time, "Frame is past the end of the time window");
                    return Ok(false);
                }
                if let Some(first) = self.first_time {
                    if self.window.off_stride(time, first) {
                        continue;
                    }
                }
            }

            if !self.has_needed_channels(frame) {
                continue;
            }
            if !self.flags.wants_velocities() {
                frame.clear_velocities();
            }
            if !self.flags.wants_forces() {
                frame.clear_forces();
            }

            if self.frames_accepted == 0 {
                self.first_time = self.window_time(frame);
                self.atom_count = Some(frame.atom_count());
            }
            self.frames_accepted += 1;
            return Ok(true);
        }
    }

    /// Time used for window filtering. Frames without a time are placed by their
    /// 0-based position in the file, one unit per frame.
    fn window_time(&mut self, frame: &Frame) -> Option<f64> {
        if let Some(time) = frame.time() {
            return Some(time);
        }
        if !self.window.is_restricted() {
            return None;
        }
        if !self.warned_untimed {
            warn!(
                path = %self.path.display(),
                "Trajectory frames carry no time; the time window counts frames instead"
            );
            self.warned_untimed = true;
        }
        Some(self.frames_scanned.saturating_sub(1) as f64)
    }

    fn has_needed_channels(&self, frame: &Frame) -> bool {
        let missing = [
            (FrameFlags::NEED_POSITIONS, frame.atom_count() > 0, "positions"),
            (FrameFlags::NEED_VELOCITIES, frame.velocities().is_some(), "velocities"),
            (FrameFlags::NEED_FORCES, frame.forces().is_some(), "forces"),
        ]
        .into_iter()
        .find(|(flag, present, _)| self.flags.contains(*flag) && !present)
        .map(|(_, _, channel)| channel);

        if let Some(channel) = missing {
            warn!(
                frame = self.frames_scanned,
                time = ?frame.time(),
                "Skipping frame without {}", channel
            );
        }
        missing.is_none()
    }
}
