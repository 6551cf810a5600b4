use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::ext::PathExt;
use crate::filesystem::node::{MirrorNodes, NodeId, NodeRef, VisitDirective};

const PATH_SEPARATORS: &[char] = &['/', MAIN_SEPARATOR];

/// Splits a path on `/` and the platform separator, dropping empty segments.
pub fn path_segments(absolute_path: &str) -> Vec<&str> {
    absolute_path
        .split(PATH_SEPARATORS)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// In-memory mirror of the parts of the file system a build touched.
///
/// The tree is not synchronized. Insertions need `&mut self`, so sharing it
/// between threads means wrapping it in a lock owned by the caller.
#[derive(Debug)]
pub struct MirrorTree {
    nodes: MirrorNodes,
    root: NodeId,
}

impl Default for MirrorTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorTree {
    pub fn new() -> Self {
        let (nodes, root) = MirrorNodes::with_root();
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        self.nodes.node_ref(id)
    }

    pub fn path(&self, id: NodeId) -> &str {
        self.nodes.path(id)
    }

    pub fn add_node(&mut self, absolute_path: &str) -> NodeId {
        let segments = path_segments(absolute_path);
        self.nodes.add(self.root, &segments, 0)
    }

    /// Same as [`MirrorTree::add_node`], for callers that look a node up and
    /// materialize it when missing.
    pub fn get_or_create(&mut self, absolute_path: &str) -> NodeId {
        self.add_node(absolute_path)
    }

    pub fn get_at(&self, absolute_path: &str) -> Option<NodeId> {
        let segments = path_segments(absolute_path);
        self.nodes.get_at(self.root, &segments, 0)
    }

    /// Walks the subtree below `from`. See [`MirrorNodes::visit`].
    pub fn visit<F>(&self, from: NodeId, visitor: F)
    where
        F: FnMut(&str, NodeRef<'_>) -> VisitDirective,
    {
        let name = self.nodes.name_of(from).unwrap_or_default();
        self.nodes.visit(from, name, visitor);
    }

    /// Inserts `root` and mirrors every directory and file found beneath it
    /// on disk.
    ///
    /// Entries that cannot be read are skipped. Failing to read `root`
    /// itself aborts the ingestion, leaving the tree in an unspecified state.
    pub fn add_tree(&mut self, root: impl AsRef<Path>) -> Result<NodeId, IngestionError> {
        let root = root.as_ref().to_absolute().context(CurrentDirSnafu)?;
        let root_str = root.to_str().context(NonUtf8PathSnafu { path: root.clone() })?;
        let root_node = self.add_node(root_str);
        let nodes_before = self.len();
        debug!("Ingesting {}", root.display());

        // cursor[depth] is the node mirroring the directory open at that depth
        let mut cursor = vec![root_node];

        let mut walk = WalkDir::new(&root).follow_links(false).into_iter();
        while let Some(entry) = walk.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) if error.depth() == 0 => {
                    return Err(error).context(WalkSnafu { path: root.clone() });
                }
                Err(error) => {
                    warn!("Skipping unreadable entry: {}", error);
                    continue;
                }
            };

            let depth = entry.depth();
            if depth == 0 {
                continue;
            }

            cursor.truncate(depth);
            let Some(&parent) = cursor.last() else {
                continue;
            };
            let name = entry.file_name().to_string_lossy();

            if !entry.file_type().is_dir() {
                self.nodes.add_child(parent, &name);
                continue;
            }

            // a directory is mirrored only once its listing can be opened
            if let Err(error) = fs::read_dir(entry.path()) {
                warn!(
                    "Skipping unreadable directory {}: {}",
                    entry.path().display(),
                    error
                );
                walk.skip_current_dir();
                continue;
            }
            cursor.push(self.nodes.add_child(parent, &name));
        }

        debug!(
            "Ingested {}: {} new nodes",
            root.display(),
            self.len() - nodes_before
        );
        Ok(root_node)
    }
}

#[derive(Debug, Snafu)]
pub enum IngestionError {
    #[snafu(display("Failed to obtain current dir"))]
    CurrentDirError { source: std::io::Error },
    #[snafu(display("Path {} is not valid UTF-8", path.display()))]
    NonUtf8PathError { path: PathBuf },
    #[snafu(display("Failed to walk {}", path.display()))]
    WalkError {
        path: PathBuf,
        source: walkdir::Error,
    },
}
