//! In-memory tree model whose mutators return the matching event.
//!
//! Nodes are addressed by [`ModelNodeId`], which is what the layout cache
//! sees as the path segment type. Ids are never reused, so a path built
//! from ids stays unambiguous after removals.
//!
//! ```ignore
//! let mut model = MutableTreeModel::with_root("root");
//! let root = model.root_id().unwrap();
//! let (child, event) = model.push_child(root, "child");
//! cache.tree_nodes_inserted(&model, &event)?;
//! ```

use crate::model::{TreeModel, TreeModelEvent, TreePath};

/// Stable handle to a model node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelNodeId(u32);

impl ModelNodeId {
    /// Id from its raw index. Useful for building paths in tests.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    parent: Option<ModelNodeId>,
    children: Vec<ModelNodeId>,
}

/// Owned tree of values.
#[derive(Debug, Clone)]
pub struct MutableTreeModel<T> {
    entries: Vec<Option<Entry<T>>>,
    root: Option<ModelNodeId>,
}

impl<T> Default for MutableTreeModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MutableTreeModel<T> {
    /// Model with no root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            root: None,
        }
    }

    /// Model with a single root node.
    #[must_use]
    pub fn with_root(value: T) -> Self {
        let mut model = Self::new();
        model.set_root(value);
        model
    }

    /// Replace the whole tree with a single root node.
    ///
    /// Returns the structure event for the new root.
    pub fn set_root(&mut self, value: T) -> TreeModelEvent<ModelNodeId> {
        self.entries.iter_mut().for_each(|e| *e = None);
        let id = self.alloc(value, None);
        self.root = Some(id);
        TreeModelEvent::at(TreePath::root(id))
    }

    #[must_use]
    pub fn root_id(&self) -> Option<ModelNodeId> {
        self.root
    }

    #[must_use]
    pub fn value(&self, id: ModelNodeId) -> Option<&T> {
        self.entry(id).map(|e| &e.value)
    }

    #[must_use]
    pub fn children(&self, id: ModelNodeId) -> &[ModelNodeId] {
        self.entry(id).map_or(&[], |e| e.children.as_slice())
    }

    #[must_use]
    pub fn parent(&self, id: ModelNodeId) -> Option<ModelNodeId> {
        self.entry(id)?.parent
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Path from the root to `id`.
    #[must_use]
    pub fn path_to(&self, id: ModelNodeId) -> Option<TreePath<ModelNodeId>> {
        let mut chain = vec![id];
        let mut current = self.entry(id)?;
        while let Some(parent) = current.parent {
            chain.push(parent);
            current = self.entry(parent)?;
        }
        chain.reverse();
        Some(TreePath::from_segments(chain))
    }

    /// Insert `value` as child `index` of `parent` (clamped to the end).
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a live node.
    pub fn insert(
        &mut self,
        parent: ModelNodeId,
        index: usize,
        value: T,
    ) -> (ModelNodeId, TreeModelEvent<ModelNodeId>) {
        let parent_path = self
            .path_to(parent)
            .unwrap_or_else(|| panic!("insert under dead model node {parent:?}"));
        let id = self.alloc(value, Some(parent));
        let children = &mut self.entry_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, id);
        (id, TreeModelEvent::new(parent_path, vec![index]))
    }

    /// Append `value` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a live node.
    pub fn push_child(
        &mut self,
        parent: ModelNodeId,
        value: T,
    ) -> (ModelNodeId, TreeModelEvent<ModelNodeId>) {
        let index = self.children(parent).len();
        self.insert(parent, index, value)
    }

    /// Remove `id` and its subtree. Returns the removal event against the
    /// parent, or `None` for the root or an unknown id.
    pub fn remove(&mut self, id: ModelNodeId) -> Option<TreeModelEvent<ModelNodeId>> {
        let parent = self.entry(id)?.parent?;
        let parent_path = self.path_to(parent)?;
        let siblings = &mut self.entry_mut(parent).children;
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.remove(index);
        self.free_subtree(id);
        Some(TreeModelEvent::new(parent_path, vec![index]))
    }

    /// Replace the value at `id`. Returns the change event addressed the way
    /// the layout cache expects: by parent and index, or by the root path.
    pub fn set_value(&mut self, id: ModelNodeId, value: T) -> Option<TreeModelEvent<ModelNodeId>> {
        self.entries.get_mut(id.0 as usize)?.as_mut()?.value = value;
        match self.parent(id) {
            None => Some(TreeModelEvent::at(TreePath::root(id))),
            Some(parent) => {
                let index = self.children(parent).iter().position(|&c| c == id)?;
                Some(TreeModelEvent::new(self.path_to(parent)?, vec![index]))
            }
        }
    }

    /// Drop every child of `id` and attach `values` as new leaves.
    ///
    /// Returns the structure event for `id`.
    pub fn replace_children(
        &mut self,
        id: ModelNodeId,
        values: impl IntoIterator<Item = T>,
    ) -> Option<TreeModelEvent<ModelNodeId>> {
        let path = self.path_to(id)?;
        let old = std::mem::take(&mut self.entry_mut(id).children);
        for child in old {
            self.free_subtree(child);
        }
        for value in values {
            let child = self.alloc(value, Some(id));
            self.entry_mut(id).children.push(child);
        }
        Some(TreeModelEvent::at(path))
    }

    fn alloc(&mut self, value: T, parent: Option<ModelNodeId>) -> ModelNodeId {
        let id = ModelNodeId(self.entries.len() as u32);
        self.entries.push(Some(Entry {
            value,
            parent,
            children: Vec::new(),
        }));
        id
    }

    fn free_subtree(&mut self, id: ModelNodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(entry) = self.entries.get_mut(next.0 as usize).and_then(Option::take) {
                stack.extend(entry.children);
            }
        }
    }

    fn entry(&self, id: ModelNodeId) -> Option<&Entry<T>> {
        self.entries.get(id.0 as usize)?.as_ref()
    }

    fn entry_mut(&mut self, id: ModelNodeId) -> &mut Entry<T> {
        match self.entries.get_mut(id.0 as usize) {
            Some(Some(entry)) => entry,
            _ => panic!("dead model node {id:?}"),
        }
    }
}

impl<T> TreeModel for MutableTreeModel<T> {
    type Node = ModelNodeId;

    fn root(&self) -> Option<ModelNodeId> {
        self.root
    }

    fn child(&self, parent: &ModelNodeId, index: usize) -> Option<ModelNodeId> {
        self.children(*parent).get(index).copied()
    }

    fn child_count(&self, parent: &ModelNodeId) -> usize {
        self.children(*parent).len()
    }
}
