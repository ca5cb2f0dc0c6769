use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use trajan::analysis::progress::{Progress, ProgressCallback};
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Spinner on stderr that follows the phases of an analysis session.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.disable_steady_tick();
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();

        Box::new(move |progress: Progress| match pb.lock() {
            Ok(guard) => render(&guard, progress),
            Err(_) => warn!("Progress bar mutex was poisoned. Cannot update progress."),
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Failed to create spinner style template")
    }

    fn frame_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} Frame {pos} {msg} ({elapsed})")
            .expect("Failed to create frame style template")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn render(pb: &ProgressBar, progress: Progress) {
    match progress {
        Progress::PhaseStart { name } => {
            pb.reset();
            pb.set_length(0);
            pb.set_style(CliProgressHandler::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            pb.set_message(name);
        }
        Progress::PhaseFinish => {
            pb.disable_steady_tick();
            pb.finish_with_message("✓ Done");
        }
        Progress::FrameAnalyzed { index, time } => {
            if pb.position() == 0 {
                pb.set_style(CliProgressHandler::frame_style());
            }
            pb.set_position(index as u64 + 1);
            pb.set_message(time.map(|t| format!("t = {:.3} ps", t)).unwrap_or_default());
        }
        Progress::Message(msg) if pb.is_finished() => pb.set_message(msg),
        Progress::Message(msg) => pb.println(format!("  {}", msg)),
    }
}
