use std::path::PathBuf;

use crate::cli::Cli;
use crate::store::StoreOptions;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub script: PathBuf,
    pub seed: Option<PathBuf>,
    pub options: StoreOptions,
    pub strict: bool,
    pub quiet: bool,
}

impl RuntimeConfig {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            seed: None,
            options: StoreOptions::default(),
            strict: false,
            quiet: false,
        }
    }
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            script: cli.script,
            seed: cli.seed,
            options: StoreOptions {
                unique: !cli.allow_duplicates,
            },
            strict: cli.strict,
            quiet: cli.quiet,
        }
    }
}
