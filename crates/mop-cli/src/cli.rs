use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "mopbuild CLI - Build initial coordinates of metal-organic polyhedra by placing ligand copies on the edges or faces of a Platonic solid.",
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
    /// Assemble a polyhedral cage from a ligand template and write it as BGF.
    Build(BuildArgs),
    /// Print the catalog geometry of a polyhedron.
    Describe(DescribeArgs),
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    // --- Core Arguments ---
    /// Path to the ligand template (BGF).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the assembled output structure (BGF).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Polyhedron Overrides ---
    /// Reference solid: tetra, cube, octa, icosa, or dodeca.
    #[arg(short = 'p', long, value_name = "SHAPE")]
    pub shape: Option<String>,

    /// Placement mode: edge, face, bent, or single.
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Scaling convention: edge-length or circumradius.
    #[arg(long, value_name = "CONVENTION")]
    pub scaling: Option<String>,

    /// Side of each face the ligand faces in face and bent modes: outward or inward.
    #[arg(long, value_name = "SIDE")]
    pub orientation: Option<String>,

    // --- Anchor Overrides ---
    /// Comma-separated anchor atom indices (0-based), overriding registry and discovery.
    #[arg(short, long, value_name = "I,J,...")]
    pub anchors: Option<String>,

    /// Linker oxygen and carbon indices (0-based) used with --anchors.
    #[arg(long, value_name = "O,C", requires = "anchors")]
    pub linker: Option<String>,

    /// Ligand registry file with explicit anchors keyed by ligand name.
    #[arg(short, long, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    // --- Box Overrides ---
    #[command(flatten)]
    pub box_args: BoxArgs,

    // --- Validation ---
    /// Fail the run if any anchor misses its target by more than this distance (Å).
    #[arg(long, value_name = "FLOAT")]
    pub max_anchor_deviation: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S polyhedron.mode=face
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Mutually exclusive ways of specifying the simulation box.
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct BoxArgs {
    /// Periodic box edge lengths in Å.
    #[arg(long, value_name = "X,Y,Z")]
    pub box_lengths: Option<String>,

    /// Size a cubic periodic box automatically, with this much padding in Å.
    #[arg(long, value_name = "FLOAT")]
    pub padding: Option<f64>,

    /// Do not use periodic boundaries.
    #[arg(long)]
    pub open_box: bool,
}

/// Arguments for the `describe` subcommand.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Solid to describe: tetra, cube, octa, icosa, or dodeca.
    #[arg(required = true)]
    pub shape: String,

    /// Also list vertex coordinates.
    #[arg(long)]
    pub vertices: bool,
}
