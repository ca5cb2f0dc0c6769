use crate::cli::InputArgs;
use crate::config;
use crate::error::Result;
use crate::output;
use crate::utils::progress::CliProgressHandler;
use tracing::{info, warn};
use trajan::analysis::module::AnalysisModule;
use trajan::analysis::options::OptionValue;
use trajan::analysis::progress::ProgressReporter;
use trajan::workflows::analyze::{AnalysisSession, AnalysisSummary};

/// Runs `module` over the inputs and writes its data series.
///
/// `module_options` are applied after the shared inputs so module-specific flags win.
pub fn run<M: AnalysisModule>(
    module: M,
    input: &InputArgs,
    module_options: Vec<(&'static str, OptionValue)>,
) -> Result<AnalysisSummary> {
    let resolved = config::resolve_inputs(input)?;

    let mut session = AnalysisSession::new(module)?;
    info!("Registered {} options", session.options().definitions().len());
    config::apply(session.options_mut(), resolved.assignments)?;
    config::apply(session.options_mut(), module_options)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the '{}' analysis...", session.module().name());
    let summary = session.run(&reporter)?;

    let plot = *session.settings().plot_settings();
    let data = session.module().data();
    if data.rows().is_empty() {
        warn!("The analysis produced no data rows.");
    }
    output::write_series(data, &plot, resolved.output.as_deref())?;

    let unit = plot.time_unit();
    let span = match (summary.first_time, summary.last_time) {
        (Some(first), Some(last)) => format!(
            " from {:.3} to {:.3} {}",
            unit.from_ps(first),
            unit.from_ps(last),
            unit
        ),
        _ => String::new(),
    };
    match &resolved.output {
        Some(path) => println!(
            "✓ Analyzed {} frame(s){}. Data written to: {}",
            summary.frames,
            span,
            path.display()
        ),
        None => eprintln!("✓ Analyzed {} frame(s){}.", summary.frames, span),
    }

    Ok(summary)
}
