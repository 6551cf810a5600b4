//! In-memory mirror of the file system used for change detection.
//!
//! [`MirrorTree`] owns the root and resolves absolute paths, while
//! [`MirrorNodes`] stores the nodes and implements insertion, lookup,
//! path reconstruction and pruned walks.

mod node;
mod tree;

pub use node::{
    Children, MirrorNode, MirrorNodes, NodeId, NodeRef, PATH_SEPARATOR, SegmentsError,
    VisitDirective,
};
pub use tree::{IngestionError, MirrorTree, path_segments};
