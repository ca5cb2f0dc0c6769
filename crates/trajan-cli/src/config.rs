use crate::cli::InputArgs;
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use trajan::analysis::options::{OptionRegistry, OptionValue};
use trajan::analysis::plot::PlotFormat;
use trajan::analysis::runner::option_names;
use trajan::analysis::time::TimeUnit;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileInputConfig {
    topology: Option<PathBuf>,
    trajectory: Option<PathBuf>,
    index: Option<PathBuf>,
    fgroup: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileTimeConfig {
    begin: Option<f64>,
    end: Option<f64>,
    dt: Option<f64>,
    unit: Option<TimeUnit>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FilePbcConfig {
    pbc: Option<bool>,
    rmpbc: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileOutputConfig {
    plot_format: Option<PlotFormat>,
    path: Option<PathBuf>,
}

/// Analysis settings read from a TOML file. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    input: FileInputConfig,
    #[serde(default)]
    time: FileTimeConfig,
    #[serde(default)]
    pbc: FilePbcConfig,
    #[serde(default)]
    output: FileOutputConfig,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        if !path.is_file() {
            return Err(CliError::Config(format!(
                "Configuration file '{}' does not exist",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Option values merged from the command line and the configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedInputs {
    pub assignments: Vec<(&'static str, OptionValue)>,
    pub output: Option<PathBuf>,
}

/// Merges command-line arguments over the configuration file. Options neither source
/// mentions keep the defaults the analysis module declared.
pub fn resolve_inputs(args: &InputArgs) -> Result<ResolvedInputs> {
    let file = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    Ok(merge(args, file))
}

fn merge(args: &InputArgs, file: FileConfig) -> ResolvedInputs {
    let mut assignments = Vec::new();
    let mut path = |name: &'static str, cli: &Option<PathBuf>, file: Option<PathBuf>| {
        if let Some(value) = cli.clone().or(file) {
            assignments.push((name, OptionValue::Path(value)));
        }
    };
    path(option_names::TOPOLOGY, &args.topology, file.input.topology);
    path(option_names::TRAJECTORY, &args.trajectory, file.input.trajectory);
    path(option_names::INDEX, &args.index, file.input.index);

    let text = [
        (option_names::FRAME_GROUP, args.fgroup.clone().or(file.input.fgroup)),
        (
            option_names::TIME_UNIT,
            args.time_unit
                .clone()
                .or(file.time.unit.map(|unit| unit.to_string())),
        ),
        (
            option_names::PLOT_FORMAT,
            args.plot_format
                .clone()
                .or(file.output.plot_format.map(|format| format.to_string())),
        ),
    ];
    let real = [
        (option_names::BEGIN, args.begin.or(file.time.begin)),
        (option_names::END, args.end.or(file.time.end)),
        (option_names::DT, args.dt.or(file.time.dt)),
    ];
    let switches = [
        (option_names::PBC, args.pbc.value().or(file.pbc.pbc)),
        (option_names::RMPBC, args.rmpbc.value().or(file.pbc.rmpbc)),
    ];

    assignments.extend(
        text.into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, OptionValue::Text(v)))),
    );
    assignments.extend(
        real.into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, OptionValue::Real(v)))),
    );
    assignments.extend(
        switches
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, OptionValue::Bool(v)))),
    );

    ResolvedInputs {
        assignments,
        output: args.output.clone().or(file.output.path),
    }
}

/// Stores the merged values in the registry.
///
/// Values for options the module did not register are skipped with a warning.
pub fn apply(
    registry: &mut OptionRegistry,
    assignments: Vec<(&'static str, OptionValue)>,
) -> Result<()> {
    for (name, value) in assignments {
        if !registry.contains(name) {
            warn!("Option '{}' is fixed by this analysis and was ignored", name);
            continue;
        }
        registry.set(name, value)?;
    }
    Ok(())
}
