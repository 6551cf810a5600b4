use std::io::{self, Write};

use colored::Colorize;

use crate::filesystem::{MirrorTree, PATH_SEPARATOR, VisitDirective};

/// Outcome of walking a mirror: the leaf paths that survived the skip
/// rules, plus counters for the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub leaves: Vec<String>,
    pub node_count: usize,
    pub pruned: usize,
}

impl MirrorReport {
    pub fn collect(mirror: &MirrorTree, skip: &[String]) -> Self {
        let root = mirror.root();
        let mut leaves = Vec::new();
        let mut pruned = 0;

        mirror.visit(root, |name, node| {
            if skip.iter().any(|skipped| skipped == name) {
                pruned += 1;
                return VisitDirective::Skip;
            }
            if node.is_leaf() && node.id() != root {
                leaves.push(node.path().to_string());
            }
            VisitDirective::Continue
        });

        Self {
            leaves,
            node_count: mirror.len(),
            pruned,
        }
    }

    pub fn write_to(&self, out: &mut impl Write, colorize: bool) -> io::Result<()> {
        for leaf in &self.leaves {
            if colorize {
                let (dir, name) = leaf.rsplit_once(PATH_SEPARATOR).unwrap_or(("", leaf));
                writeln!(
                    out,
                    "{}{}{}",
                    dir.dimmed(),
                    PATH_SEPARATOR.to_string().dimmed(),
                    name.bold()
                )?;
            } else {
                writeln!(out, "{leaf}")?;
            }
        }
        Ok(())
    }
}
