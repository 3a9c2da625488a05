use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ocfl_types::VersionNumber;

#[derive(Parser)]
#[command(
    name = "ocfl",
    about = "Oxford Common File Layout storage roots and objects",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./ocfl.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new storage root
    Init(InitArgs),
    /// Create an object from a directory
    Add(AddArgs),
    /// Record a new version mirroring a directory
    Update(UpdateArgs),
    /// Remove files from an object in a new version
    Delete(DeleteArgs),
    /// Show an object's versions
    Stat(StatArgs),
    /// List the objects in a storage root
    List(ListArgs),
    /// Copy a version's files out of an object
    Extract(ExtractArgs),
    /// Validate a storage root or one object
    Check(CheckArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub root: PathBuf,
    /// Layout extension name
    #[arg(long)]
    pub layout: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    pub root: PathBuf,
    pub id: String,
    pub source: PathBuf,
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub root: PathBuf,
    pub id: String,
    pub source: PathBuf,
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub root: PathBuf,
    pub id: String,
    #[arg(required = true)]
    pub paths: Vec<String>,
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct StatArgs {
    pub root: PathBuf,
    pub id: String,
}

#[derive(Args)]
pub struct ListArgs {
    pub root: PathBuf,
}

#[derive(Args)]
pub struct ExtractArgs {
    pub root: PathBuf,
    pub id: String,
    pub dest: PathBuf,
    /// Version to extract (defaults to head)
    #[arg(long)]
    pub version: Option<VersionNumber>,
}

#[derive(Args)]
pub struct CheckArgs {
    pub root: PathBuf,
    /// Check only this object
    #[arg(long)]
    pub object: Option<String>,
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}
