use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;

/// Runs a script of path-addressed commands against an in-memory tree.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// Script file, one command per line
    pub script: PathBuf,
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// YAML file holding the initial tree
    #[clap(long, short)]
    pub seed: Option<PathBuf>,

    /// Allow siblings to share a name
    #[clap(long)]
    pub allow_duplicates: bool,

    /// Stop at the first command that fails instead of skipping it
    #[clap(long)]
    pub strict: bool,

    /// Do not print any tree output
    #[clap(long, short)]
    pub quiet: bool,
}
