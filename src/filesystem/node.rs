use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use derive_more::{Display, Into};
use hashlink::LinkedHashMap;
use snafu::Snafu;
use tracing::trace;

/// Separator used when materializing a node path.
pub const PATH_SEPARATOR: char = '/';

/// Index of a node inside its [`MirrorNodes`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
#[display("#{_0}")]
pub struct NodeId(usize);

/// Directive returned by a visitor to control descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitDirective {
    Continue,
    /// Do not visit any children of the current node.
    Skip,
}

/// Children of a node, indexed both by name and by child id.
///
/// The child itself never knows its name, path reconstruction asks the
/// parent through [`Children::name_of`].
#[derive(Debug, Default)]
pub struct Children {
    by_name: LinkedHashMap<Arc<str>, NodeId>,
    by_node: HashMap<NodeId, Arc<str>>,
}

impl Children {
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, child: NodeId) -> Option<&str> {
        self.by_node.get(&child).map(|name| name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.by_name.iter().map(|(name, id)| (name.as_ref(), *id))
    }

    fn register(&mut self, name: &str, child: NodeId) {
        let name: Arc<str> = Arc::from(name);
        self.by_node.insert(child, name.clone());
        self.by_name.insert(name, child);
    }
}

/// A single mirrored path segment.
#[derive(Debug, Default)]
pub struct MirrorNode {
    parent: Option<NodeId>,
    children: Children,
    cached_path: OnceLock<String>,
}

impl MirrorNode {
    fn with_parent(parent: NodeId) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &Children {
        &self.children
    }
}

#[derive(Debug, Snafu)]
pub enum SegmentsError {
    #[snafu(display("'{}' is not an ancestor of '{}'", ancestor, node))]
    NotAnAncestor { ancestor: String, node: String },
}

/// Arena owning every node of one mirror tree.
///
/// A node is reachable only through its parent's [`Children`], so the
/// arena is the storage while the parent remains the logical owner.
/// Nodes are never removed, which keeps every issued [`NodeId`] valid.
#[derive(Debug)]
pub struct MirrorNodes {
    nodes: Vec<MirrorNode>,
}

impl MirrorNodes {
    /// Creates an arena holding only the root node.
    pub fn with_root() -> (Self, NodeId) {
        let nodes = MirrorNodes {
            nodes: vec![MirrorNode::default()],
        };
        (nodes, NodeId(0))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True while the arena holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Panics when `id` was issued by another arena.
    pub fn node(&self, id: NodeId) -> &MirrorNode {
        &self.nodes[id.0]
    }

    pub fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { nodes: self, id }
    }

    /// Descends from `from` along `segments[start..]`, creating missing
    /// children on the way, and returns the terminal node.
    pub fn add<S: AsRef<str>>(&mut self, from: NodeId, segments: &[S], start: usize) -> NodeId {
        segments
            .get(start..)
            .unwrap_or_default()
            .iter()
            .fold(from, |current, segment| {
                self.add_child(current, segment.as_ref())
            })
    }

    /// Returns the child of `parent` named `segment`, creating it if needed.
    pub fn add_child(&mut self, parent: NodeId, segment: &str) -> NodeId {
        if let Some(existing) = self.node(parent).children.get(segment) {
            return existing;
        }

        let child = NodeId(self.nodes.len());
        self.nodes.push(MirrorNode::with_parent(parent));
        self.nodes[parent.0].children.register(segment, child);
        trace!("Created node {} '{}' under {}", child, segment, parent);
        child
    }

    /// Read-only counterpart of [`MirrorNodes::add`]; `None` as soon as a
    /// segment is missing.
    pub fn get_at<S: AsRef<str>>(&self, from: NodeId, segments: &[S], start: usize) -> Option<NodeId> {
        segments
            .get(start..)
            .unwrap_or_default()
            .iter()
            .try_fold(from, |current, segment| {
                self.node(current).children.get(segment.as_ref())
            })
    }

    /// Pre-order walk starting at `from`, which is reported to the visitor
    /// under `name`. Returning [`VisitDirective::Skip`] prunes the subtree.
    pub fn visit<'a, F>(&'a self, from: NodeId, name: &'a str, mut visitor: F)
    where
        F: FnMut(&str, NodeRef<'_>) -> VisitDirective,
    {
        let mut pending = vec![(name, from)];

        while let Some((name, id)) = pending.pop() {
            if visitor(name, self.node_ref(id)) == VisitDirective::Skip {
                continue;
            }
            let first_child = pending.len();
            pending.extend(self.node(id).children.iter());
            pending[first_child..].reverse();
        }
    }

    /// Name the parent of `id` uses for it. `None` for the root.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        let parent = self.node(id).parent?;
        self.node(parent).children.name_of(id)
    }

    /// Memoized path of `id`: ancestors joined by [`PATH_SEPARATOR`], the
    /// root contributing the empty string.
    pub fn path(&self, id: NodeId) -> &str {
        if let Some(path) = self.node(id).cached_path.get() {
            return path;
        }

        let mut uncached = vec![id];
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).cached_path.get().is_some() {
                break;
            }
            uncached.push(parent);
            current = parent;
        }

        // top-down, so every parent is cached before its child needs it
        for &pending in uncached.iter().rev() {
            let node = self.node(pending);
            node.cached_path.get_or_init(|| {
                let (Some(parent), Some(name)) = (node.parent, self.name_of(pending)) else {
                    return String::new();
                };
                let parent_path = self.cached_path(parent);
                let mut path = String::with_capacity(parent_path.len() + 1 + name.len());
                path.push_str(parent_path);
                path.push(PATH_SEPARATOR);
                path.push_str(name);
                path
            });
        }
        self.cached_path(id)
    }

    fn cached_path(&self, id: NodeId) -> &str {
        self.node(id)
            .cached_path
            .get()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Names on the way from `stop` down to `id`, in root-to-leaf order.
    pub fn segments(&self, id: NodeId, stop: NodeId) -> Result<Vec<String>, SegmentsError> {
        let mut segments = Vec::new();
        let mut current = id;

        while current != stop {
            let (Some(parent), Some(name)) = (self.node(current).parent, self.name_of(current))
            else {
                return NotAnAncestorSnafu {
                    ancestor: self.path(stop),
                    node: self.path(id),
                }
                .fail();
            };
            segments.push(name.to_string());
            current = parent;
        }

        segments.reverse();
        Ok(segments)
    }
}

/// Borrowed view of one node together with the arena it lives in.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    nodes: &'a MirrorNodes,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&'a str> {
        self.nodes.name_of(self.id)
    }

    pub fn path(&self) -> &'a str {
        self.nodes.path(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let nodes = self.nodes;
        nodes.node(self.id).parent.map(|id| nodes.node_ref(id))
    }

    pub fn child(&self, name: &str) -> Option<NodeRef<'a>> {
        let nodes = self.nodes;
        nodes.node(self.id).children.get(name).map(|id| nodes.node_ref(id))
    }

    pub fn children(&self) -> impl Iterator<Item = (&'a str, NodeRef<'a>)> + use<'a> {
        let nodes = self.nodes;
        nodes
            .node(self.id)
            .children
            .iter()
            .map(move |(name, id)| (name, nodes.node_ref(id)))
    }

    pub fn is_leaf(&self) -> bool {
        self.nodes.node(self.id).children.is_empty()
    }

    pub fn segments(&self, stop: NodeId) -> Result<Vec<String>, SegmentsError> {
        self.nodes.segments(self.id, stop)
    }
}
