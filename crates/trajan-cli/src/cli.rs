use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "TRAJAN - sequential analysis of molecular simulation trajectories with periodic-boundary aware frame preparation.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the radius of gyration of every frame.
    Gyrate(GyrateArgs),
    /// Compute the RMSD of every frame against the topology coordinates.
    Rmsd(RmsdArgs),
    /// Print the description of an analysis module.
    Describe {
        #[arg(value_enum)]
        module: ModuleName,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleName {
    Gyrate,
    Rmsd,
}

/// Input, time-window and output arguments shared by every analysis command.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Structure file providing the topology (.bgf or .gro).
    #[arg(short = 's', long, value_name = "PATH")]
    pub topology: Option<PathBuf>,

    /// Trajectory file (.gro or .xyz).
    #[arg(short = 'f', long, value_name = "PATH")]
    pub trajectory: Option<PathBuf>,

    /// Index file with atom groups (.ndx).
    #[arg(short = 'n', long, value_name = "PATH")]
    pub index: Option<PathBuf>,

    /// Index group describing the atoms stored in the trajectory (name or number).
    #[arg(long, value_name = "GROUP")]
    pub fgroup: Option<String>,

    /// First frame to read, in the selected time unit.
    #[arg(short = 'b', long, value_name = "TIME")]
    pub begin: Option<f64>,

    /// Last frame to read, in the selected time unit.
    #[arg(short = 'e', long, value_name = "TIME")]
    pub end: Option<f64>,

    /// Only use frames at multiples of this interval.
    #[arg(long, value_name = "TIME")]
    pub dt: Option<f64>,

    /// Unit for time values (fs, ps, ns, us, ms, s).
    #[arg(long = "tu", value_name = "UNIT")]
    pub time_unit: Option<String>,

    /// Plot formatting of the output (xmgrace, xmgr, none).
    #[arg(long = "xvg", value_name = "FORMAT")]
    pub plot_format: Option<String>,

    #[command(flatten)]
    pub pbc: PbcSwitch,

    #[command(flatten)]
    pub rmpbc: RmpbcSwitch,

    /// Configuration file in TOML format. Command-line arguments take precedence.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output data file. Written as CSV when the extension is .csv; stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// A group to handle mutually exclusive flags for periodic boundary conditions.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct PbcSwitch {
    /// Use periodic boundary conditions for distances.
    #[arg(long)]
    pub pbc: bool,
    /// Ignore periodic boundary conditions.
    #[arg(long)]
    pub no_pbc: bool,
}

/// A group to handle mutually exclusive flags for making molecules whole.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct RmpbcSwitch {
    /// Make molecules whole for each frame.
    #[arg(long)]
    pub rmpbc: bool,
    /// Analyze frames exactly as stored.
    #[arg(long)]
    pub no_rmpbc: bool,
}

/// Collapses a `--x` / `--no-x` pair into an optional choice.
pub fn switch_value(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

impl PbcSwitch {
    pub fn value(&self) -> Option<bool> {
        switch_value(self.pbc, self.no_pbc)
    }
}

impl RmpbcSwitch {
    pub fn value(&self) -> Option<bool> {
        switch_value(self.rmpbc, self.no_rmpbc)
    }
}

/// Arguments for the `gyrate` subcommand.
#[derive(Args, Debug)]
pub struct GyrateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub mass_weighting: MassWeighting,
}

/// A group to handle mutually exclusive flags for mass weighting.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct MassWeighting {
    /// Weight atoms by their mass (the default).
    #[arg(long)]
    pub mass_weighted: bool,
    /// Give every atom unit weight.
    #[arg(long)]
    pub no_mass_weighted: bool,
}

/// Arguments for the `rmsd` subcommand.
#[derive(Args, Debug)]
pub struct RmsdArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Place each molecule in the periodic image nearest the reference before comparing.
    #[arg(long)]
    pub nearest_image: bool,
}
