//! Tree model interface consumed by the layout cache.
//!
//! The model is a synchronous, possibly lazily backed hierarchy. The cache
//! never owns it: every operation that needs to read the hierarchy borrows
//! the model for the duration of the call.
//!
//! Nodes are identified by [`TreePath`], the chain of model objects from the
//! root down to the node. Two paths are the same node iff their segments
//! compare equal, so model objects must be unique among their siblings.

use std::fmt;
use std::hash::Hash;

/// A hierarchy provider.
pub trait TreeModel {
    /// Model object stored at each path segment.
    type Node: Clone + Eq + Hash + fmt::Debug;

    /// Root object, or `None` for an empty model.
    fn root(&self) -> Option<Self::Node>;

    /// Child of `parent` at `index`.
    fn child(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;

    /// Number of children under `parent`.
    fn child_count(&self, parent: &Self::Node) -> usize;

    /// Whether `node` is a leaf. Defaults to "has no children".
    fn is_leaf(&self, node: &Self::Node) -> bool {
        self.child_count(node) == 0
    }
}

/// Chain of model objects from the root to a node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TreePath<N> {
    segments: Vec<N>,
}

impl<N: Clone> TreePath<N> {
    /// Path consisting of the root object alone.
    #[must_use]
    pub fn root(node: N) -> Self {
        Self {
            segments: vec![node],
        }
    }

    /// Build a path from root-first segments.
    #[must_use]
    pub fn from_segments(segments: impl IntoIterator<Item = N>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    /// This path extended by one child segment.
    #[must_use]
    pub fn child(&self, node: N) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(node);
        Self { segments }
    }

    /// The parent path, or `None` for root and empty paths.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| self.prefix(self.segments.len() - 1))
    }

    /// The first `len` segments.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// This path with its last segment replaced.
    #[must_use]
    pub fn with_last(&self, node: N) -> Self {
        let mut segments = self.segments.clone();
        match segments.last_mut() {
            Some(last) => *last = node,
            None => segments.push(node),
        }
        Self { segments }
    }
}

impl<N> TreePath<N> {
    /// Root-first segments.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[N] {
        &self.segments
    }

    /// Number of segments.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Nesting depth: 0 for the root.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// The object this path points at.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&N> {
        self.segments.last()
    }

    /// The root object.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&N> {
        self.segments.first()
    }
}

impl<N: PartialEq> TreePath<N> {
    /// Whether `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &TreePath<N>) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl<N: fmt::Debug> fmt::Debug for TreePath<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.segments).finish()
    }
}

/// A model mutation notification.
///
/// `path` names the parent whose children changed (or, for a structure
/// change, the node whose whole subtree must be reloaded). `child_indices`
/// are positions in the parent's child list: post-insert positions for
/// inserts, pre-remove positions for removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeModelEvent<N> {
    pub path: TreePath<N>,
    pub child_indices: Vec<usize>,
}

impl<N> TreeModelEvent<N> {
    /// Event for the given parent and child positions.
    #[must_use]
    pub fn new(path: TreePath<N>, child_indices: Vec<usize>) -> Self {
        Self {
            path,
            child_indices,
        }
    }

    /// Event with no child positions (node-level change or structure change).
    #[must_use]
    pub fn at(path: TreePath<N>) -> Self {
        Self::new(path, Vec::new())
    }
}
