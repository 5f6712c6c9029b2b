//! Node arena backing the layout cache.
//!
//! Nodes reference their parent and children by [`NodeId`] rather than by
//! pointer, so the parent back-edge never owns anything and whole subtrees
//! can be dropped by recycling slots.
//!
//! ```text
//! LayoutNode {
//!     parent:       Option<NodeId>   // None only for the root
//!     path:         TreePath<N>      // model objects root..=self
//!     row:          Option<usize>    // None = not in the row list
//!     x, width:     i32              // cached horizontal geometry
//!     height_delta: i32              // measured height - default height
//!     size_valid:   bool             // geometry is current
//!     expanded:     bool             // children requested visible
//!     reexpand_on_insert: bool       // collapsed because it ran out of children
//!     children:     Option<Vec<NodeId>>  // None until first load
//! }
//! ```

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::model::TreePath;

/// Handle to a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// One materialized model object.
#[derive(Debug, Clone)]
pub(crate) struct LayoutNode<N> {
    pub(crate) parent: Option<NodeId>,
    pub(crate) path: TreePath<N>,
    pub(crate) row: Option<usize>,
    pub(crate) x: i32,
    pub(crate) width: i32,
    pub(crate) height_delta: i32,
    pub(crate) size_valid: bool,
    pub(crate) expanded: bool,
    pub(crate) reexpand_on_insert: bool,
    pub(crate) children: Option<Vec<NodeId>>,
}

impl<N> LayoutNode<N> {
    pub(crate) fn new(parent: Option<NodeId>, path: TreePath<N>) -> Self {
        Self {
            parent,
            path,
            row: None,
            x: 0,
            width: 0,
            height_delta: 0,
            size_valid: false,
            expanded: false,
            reexpand_on_insert: false,
            children: None,
        }
    }

    /// Drop cached geometry, returning the height delta that was cached.
    pub(crate) fn clear_size(&mut self) -> i32 {
        let old = self.height_delta;
        self.x = 0;
        self.width = 0;
        self.height_delta = 0;
        self.size_valid = false;
        old
    }

    /// Number of loaded children (0 when not loaded).
    pub(crate) fn loaded_child_count(&self) -> usize {
        self.children.as_ref().map_or(0, Vec::len)
    }
}

/// Slot storage with a free list.
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<N> {
    slots: Vec<Option<LayoutNode<N>>>,
    free_list: Vec<u32>,
}

impl<N> NodeArena<N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, node: LayoutNode<N>) -> NodeId {
        if let Some(slot) = self.free_list.pop() {
            self.slots[slot as usize] = Some(node);
            NodeId(slot)
        } else {
            let id = self.slots.len() as u32;
            self.slots.push(Some(node));
            NodeId(id)
        }
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Option<LayoutNode<N>> {
        let node = self.slots.get_mut(id.0 as usize)?.take()?;
        self.free_list.push(id.0);
        Some(node)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&LayoutNode<N>> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeId, &LayoutNode<N>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (NodeId(i as u32), node)))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut LayoutNode<N>> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }
}

impl<N> Index<NodeId> for NodeArena<N> {
    type Output = LayoutNode<N>;

    fn index(&self, id: NodeId) -> &LayoutNode<N> {
        match self.slots.get(id.0 as usize) {
            Some(Some(node)) => node,
            _ => panic!("dangling layout node {id}"),
        }
    }
}

impl<N> IndexMut<NodeId> for NodeArena<N> {
    fn index_mut(&mut self, id: NodeId) -> &mut LayoutNode<N> {
        match self.slots.get_mut(id.0 as usize) {
            Some(Some(node)) => node,
            _ => panic!("dangling layout node {id}"),
        }
    }
}
