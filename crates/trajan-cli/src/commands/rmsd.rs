use super::analyze;
use crate::cli::RmsdArgs;
use crate::error::Result;
use tracing::info;
use trajan::analysis::options::OptionValue;
use trajan::modules::rmsd::{NEAREST_IMAGE, ReferenceRmsd};

pub fn run(args: RmsdArgs) -> Result<()> {
    let module_options = if args.nearest_image {
        vec![(NEAREST_IMAGE, OptionValue::Bool(true))]
    } else {
        Vec::new()
    };
    let summary = analyze::run(ReferenceRmsd::new(), &args.input, module_options)?;
    info!(frames = summary.frames, "RMSD computed");
    Ok(())
}
