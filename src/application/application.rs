use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::{MirrorReport, RuntimeConfig};
use crate::config::{TaskLookupError, TaskRegistry, TaskRegistryCreationError};
use crate::ext::PathExt;
use crate::filesystem::{IngestionError, MirrorTree};
use crate::tasks::Task;

pub struct Application;

impl Application {
    /// Mirrors the inputs of the requested tasks and prints the report.
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<MirrorReport, ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        let colorize = app_config.color.should_colorize();
        colored::control::set_override(colorize);

        let report = Self::mirror(app_config).await?;
        report
            .write_to(&mut io::stdout().lock(), colorize)
            .context(OutputSnafu)?;

        Ok(report)
    }

    pub async fn mirror(app_config: RuntimeConfig) -> Result<MirrorReport, ApplicationError> {
        let root = app_config
            .root
            .to_absolute()
            .context(CurrentDirSnafu)?
            .normalized();

        let registry = TaskRegistry::read(&root).await.context(TaskRegistrySnafu)?;
        debug!("Loaded {} tasks from {}", registry.len(), root.display());

        let tasks = registry
            .needed_tasks(app_config.target.as_deref())
            .context(TaskLookupSnafu)?;

        let mut mirror = MirrorTree::new();
        for input in Self::distinct_inputs(&root, &tasks) {
            Self::mirror_input(&mut mirror, &input)?;
        }

        let report = MirrorReport::collect(&mirror, &app_config.skip);
        info!(
            "Mirrored {} nodes for {} tasks: {} leaves, {} pruned subtrees",
            report.node_count,
            tasks.len(),
            report.leaves.len(),
            report.pruned
        );
        Ok(report)
    }

    /// Input paths of `tasks` resolved against `root`, first occurrence wins.
    fn distinct_inputs(root: &Path, tasks: &[&Task]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        tasks
            .iter()
            .flat_map(|task| task.inputs())
            .map(|input| root.join(input).normalized())
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    fn mirror_input(mirror: &mut MirrorTree, path: &Path) -> Result<(), ApplicationError> {
        if path.is_dir() {
            mirror.add_tree(path).context(IngestionSnafu)?;
            return Ok(());
        }

        let Some(path_str) = path.to_str() else {
            warn!("Skipping input with a non UTF-8 path: {}", path.display());
            return Ok(());
        };
        if !path.exists() {
            debug!("Input {} does not exist yet, mirroring it anyway", path_str);
        }
        mirror.add_node(path_str);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Failed to obtain current dir"))]
    CurrentDirError { source: io::Error },
    #[snafu(display("Critical failure encountered while reading the task file"))]
    TaskRegistryError { source: TaskRegistryCreationError },
    #[snafu(display("Critical failure encountered while selecting tasks"))]
    TaskLookupError { source: TaskLookupError },
    #[snafu(display("Critical failure encountered while mirroring task inputs"))]
    IngestionError { source: IngestionError },
    #[snafu(display("Failed to write the report"))]
    OutputError { source: io::Error },
}
