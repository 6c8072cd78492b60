use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use traj_stitch::AtomScheme;

#[derive(Parser)]
#[command(
    name = "tstitch",
    about = "Reconcile restarted molecular dynamics output",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Stitch the restarted runs of a replicate into one trajectory
    #[command(visible_alias = "s")]
    Stitch(StitchArgs),

    /// Concatenate reconciled replicates into a master dataset
    #[command(visible_alias = "m")]
    Merge(MergeArgs),

    /// Write reconciled coordinates into a PDB template
    #[command(visible_alias = "p")]
    Project(ProjectArgs),

    /// Drop incomplete frames from a concatenated trajectory
    Clean(CleanArgs),

    /// Concatenate single-point structures of every replicate
    Gather(GatherArgs),

    /// Combine single-point charges into one table per replicate
    #[command(name = "qm-charges")]
    QmCharges(QmChargesArgs),

    /// List template atom indices for residues
    Select(SelectArgs),
}

/// Options shared by all commands.
#[derive(Args)]
pub struct GlobalOptions {
    /// Settings file (TOML) supplying defaults for every command
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress progress output and informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// File names used inside replicate and run directories.
#[derive(Args)]
#[command(next_help_heading = "Run Files")]
pub struct RunFileOptions {
    /// Prefix of the run (scratch) directory names
    #[arg(long, value_name = "PREFIX")]
    pub run_prefix: Option<String>,

    /// Coordinate file inside each run directory [default: coors.xyz]
    #[arg(long, value_name = "NAME")]
    pub coords_file: Option<String>,

    /// Charge file inside each run directory [default: charge.xls]
    #[arg(long, value_name = "NAME")]
    pub charges_file: Option<String>,

    /// Reconciled coordinate file written to the replicate [default: all_coors.xyz]
    #[arg(long, value_name = "NAME")]
    pub output_coords: Option<String>,

    /// Reconciled charge file written to the replicate [default: all_charges.xls]
    #[arg(long, value_name = "NAME")]
    pub output_charges: Option<String>,
}

/// How frame numbers are read from coordinate blocks.
#[derive(Args)]
#[command(next_help_heading = "Frame Numbering")]
pub struct FrameOptions {
    /// Whitespace field of the title line holding the frame number (0-based)
    #[arg(long, value_name = "N", conflicts_with = "sequential")]
    pub frame_field: Option<usize>,

    /// Number frames by position instead of reading the title line
    #[arg(long)]
    pub sequential: bool,

    /// Atoms per frame (read from the first coordinate file if omitted)
    #[arg(long, value_name = "N")]
    pub atom_count: Option<usize>,
}

#[derive(Args)]
pub struct StitchArgs {
    /// Replicate directory, or the root holding replicates with --all
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Treat DIR as a root and stitch every replicate below it
    #[arg(short, long)]
    pub all: bool,

    /// Worker threads for --all (0 uses every core)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Continue from the state left by a previous pass
    #[arg(long)]
    pub resume: bool,

    /// Order in which runs are stitched
    #[arg(long, value_name = "ORDER")]
    pub run_order: Option<RunOrderArg>,

    /// Which run directories to keep after a successful stitch
    #[arg(long, value_name = "POLICY")]
    pub retention: Option<RetentionArg>,

    /// Directory name skipped under the root, repeatable
    #[arg(long, value_name = "NAME", action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,

    #[command(flatten)]
    pub files: RunFileOptions,

    #[command(flatten)]
    pub frames: FrameOptions,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Root directory holding reconciled replicates
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Master coordinate output [default: ROOT/all_coors.xyz]
    #[arg(short, long, value_name = "FILE")]
    pub output_coords: Option<PathBuf>,

    /// Master charge output [default: ROOT/all_charges.xls]
    #[arg(long, value_name = "FILE")]
    pub output_charges: Option<PathBuf>,

    /// Reconciled coordinate file inside each replicate
    #[arg(long, value_name = "NAME")]
    pub coords_file: Option<String>,

    /// Reconciled charge file inside each replicate
    #[arg(long, value_name = "NAME")]
    pub charges_file: Option<String>,

    /// What to do with charge rows containing nan
    #[arg(long = "nan", value_name = "POLICY")]
    pub nan_policy: Option<NanPolicyArg>,

    /// Directory name skipped under the root, repeatable
    #[arg(long, value_name = "NAME", action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,
}

#[derive(Args)]
pub struct ProjectArgs {
    /// Reconciled coordinate trajectory
    #[arg(value_name = "COORDS")]
    pub coords: PathBuf,

    /// PDB template defining atom order and record payload
    #[arg(short, long, value_name = "FILE")]
    pub template: PathBuf,

    /// Output file (per-frame output derives one name per frame from it)
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Output layout
    #[arg(long, value_name = "LAYOUT")]
    pub framing: Option<FramingArg>,

    /// Handling of coordinates wider than their field
    #[arg(long, value_name = "POLICY")]
    pub overflow: Option<OverflowArg>,

    /// Header line for multi-model output [default: template name]
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Concatenated coordinate trajectory
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Filtered output [default: INPUT with a _clean suffix]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Atoms per frame (read from the first line if omitted)
    #[arg(long, value_name = "N")]
    pub atom_count: Option<usize>,
}

#[derive(Args)]
pub struct GatherArgs {
    /// Root directory holding single-point replicates
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Output file name inside ROOT [default: <ROOT name>_geometry.xyz]
    #[arg(short, long, value_name = "NAME")]
    pub output: Option<String>,

    /// Folder of structures inside each replicate
    #[arg(long, value_name = "NAME")]
    pub coordinates_dir: Option<String>,

    /// Directory name skipped under the root, repeatable
    #[arg(long, value_name = "NAME", action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,
}

#[derive(Args)]
pub struct QmChargesArgs {
    /// Root directory holding single-point replicates
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// First job directory
    #[arg(long, value_name = "N", default_value = "0")]
    pub first: u64,

    /// Job directory bound (exclusive)
    #[arg(long, value_name = "N")]
    pub last: u64,

    /// Step between job directories
    #[arg(long, value_name = "N", default_value = "1")]
    pub step: u64,

    /// Scratch folder inside each job
    #[arg(long, value_name = "NAME")]
    pub scr_dir: Option<String>,

    /// Charge file inside each scratch folder
    #[arg(long, value_name = "NAME")]
    pub charge_file: Option<String>,

    /// Directory name skipped under the root, repeatable
    #[arg(long, value_name = "NAME", action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,
}

#[derive(Args)]
pub struct SelectArgs {
    /// PDB template
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Residue numbers, e.g. "1-4,6,8-10", repeatable
    #[arg(short, long, value_name = "LIST", required = true, action = clap::ArgAction::Append)]
    pub residues: Vec<String>,

    /// Atoms of each residue to select
    #[arg(long, value_name = "SCHEME", default_value = "all")]
    pub scheme: AtomScheme,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RunOrderArg {
    /// Lexicographic by directory name
    Name,
    /// Oldest modification time first
    Modified,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RetentionArg {
    /// Keep every run directory
    #[value(name = "keep-all", alias = "all")]
    KeepAll,
    /// Remove all but the most recently modified run directory
    #[value(name = "keep-newest", alias = "newest")]
    KeepNewest,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum NanPolicyArg {
    /// Keep the row and report it
    Keep,
    /// Remove the row and report it
    Drop,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FramingArg {
    /// All frames in one file, each closed by END
    Flat,
    /// One file with MODEL/ENDMDL per frame
    #[value(name = "multi-model", alias = "models")]
    MultiModel,
    /// One file per frame
    #[value(name = "per-frame", alias = "split")]
    PerFrame,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OverflowArg {
    /// Stop with an error
    Fail,
    /// Cut the token to the field width and warn
    Truncate,
}

pub fn parse() -> Cli {
    Cli::parse()
}
