use super::analyze;
use crate::cli::{GyrateArgs, switch_value};
use crate::error::Result;
use tracing::info;
use trajan::analysis::options::OptionValue;
use trajan::modules::gyrate::{MASS_WEIGHTED, RadiusOfGyration};

pub fn run(args: GyrateArgs) -> Result<()> {
    let weighting = &args.mass_weighting;
    let module_options = switch_value(weighting.mass_weighted, weighting.no_mass_weighted)
        .map(|on| vec![(MASS_WEIGHTED, OptionValue::Bool(on))])
        .unwrap_or_default();

    let summary = analyze::run(RadiusOfGyration::new(), &args.input, module_options)?;
    info!(frames = summary.frames, "Radius of gyration computed");
    Ok(())
}
