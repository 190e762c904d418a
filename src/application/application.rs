use snafu::Snafu;
use snafu::prelude::*;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::application::RuntimeConfig;
use crate::config::{SeedError, TreeSeed};
use crate::render::TreeRenderer;
use crate::script::{Outcome, Script, ScriptError};
use crate::store::TreeStore;
use crate::tree::{Children, Snapshot, TreeError};

pub struct Application;

/// What a run did to the store.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub applied: usize,
    pub failed: usize,
    pub committed: usize,
    pub snapshot: Snapshot,
}

impl Application {
    pub async fn run(
        runtime_config: impl Into<RuntimeConfig>,
    ) -> Result<RunSummary, ApplicationError> {
        let runtime_config: RuntimeConfig = runtime_config.into();
        debug!("Runtime config: {:?}", runtime_config);

        let initial = match &runtime_config.seed {
            Some(path) => TreeSeed::read(path).await.context(SeedSnafu)?.into_children(),
            None => Children::new(),
        };
        let script = Script::read(&runtime_config.script)
            .await
            .context(ScriptSnafu)?;

        let mut store = TreeStore::new(initial, runtime_config.options);
        let renderer = TreeRenderer::for_stdout();
        let show = |output: String| {
            if !runtime_config.quiet {
                print!("{output}");
            }
        };

        let mut applied = 0;
        let mut failed = 0;
        let mut committed = 0;
        for line in script.lines() {
            match line.command.apply(&mut store) {
                Ok(outcome) => {
                    applied += 1;
                    match outcome {
                        Outcome::Applied => committed += 1,
                        Outcome::Node(node) => show(renderer.render_node(&node)),
                        Outcome::Tree(snapshot) => show(renderer.render_tree(&snapshot)),
                    }
                }
                Err(source) if runtime_config.strict => {
                    return Err(source).context(CommandSnafu { line: line.number });
                }
                Err(error) => {
                    failed += 1;
                    warn!("Skipping line {}: {}", line.number, error);
                }
            }
        }

        info!(
            "Applied {} commands, skipped {}, committed {} snapshots",
            applied, failed, committed
        );

        let snapshot = store.current_snapshot();
        show(renderer.render_tree(&snapshot));

        Ok(RunSummary {
            applied,
            failed,
            committed,
            snapshot,
        })
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the seed tree"))]
    SeedError { source: SeedError },
    #[snafu(display("Critical failure encountered while loading the script"))]
    ScriptError { source: ScriptError },
    #[snafu(display("Command on line {} failed", line))]
    CommandError { line: usize, source: TreeError },
}
