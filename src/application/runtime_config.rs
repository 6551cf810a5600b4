use std::path::PathBuf;

use crate::application::data::ColorChoice;
use crate::cli::Cli;

#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Task whose inputs are mirrored, every task when absent.
    pub target: Option<String>,
    pub root: PathBuf,
    /// Segment names whose subtrees are left out of the report.
    pub skip: Vec<String>,
    pub color: ColorChoice,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            target: cli.target,
            root: cli.root,
            skip: cli.skip,
            color: cli.color,
        }
    }
}
