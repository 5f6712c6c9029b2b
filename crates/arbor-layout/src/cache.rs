//! Incremental tree layout cache.
//!
//! [`TreeLayoutCache`] flattens a lazily materialized tree into a row list
//! of currently visible nodes and answers row, path and pixel queries over
//! it. It stays consistent as nodes expand and collapse and as the model
//! reports mutations through the `tree_nodes_*` handlers.
//!
//! # Rows
//!
//! The row list holds the visible nodes in display order. A node is in the
//! list iff its `row` is set, and `rows[i].row == Some(i)` whenever no
//! mutation is in progress. The root is always logically present and
//! expanded on creation; it only occupies row 0 when the root is visible.
//!
//! # Heights
//!
//! With a positive row height every row has that height and
//! `y(row) = row * row_height`. With a non-positive row height rows are
//! measured through [`NodeDimensions`] and the difference from
//! `default_row_height` is kept in a [`FenwickTree`] indexed by row:
//!
//! ```text
//! y(row) = row * default_row_height + sum(delta[0..row))
//! ```
//!
//! # Complexity
//!
//! | Operation                | Time                  |
//! |--------------------------|-----------------------|
//! | row/path lookup          | O(1) / O(depth) hash  |
//! | bounds, y → row          | O(log n)              |
//! | expand, collapse, events | O(rows) renumbering   |
//!
//! Renumbering after a structural change is not amortized: every row after
//! the splice point is rewritten and the height index is rebuilt.

use std::fmt;

use arbor_core::geometry::Rect;
use rustc_hash::FxHashMap;

use crate::error::LayoutError;
use crate::fenwick::FenwickTree;
use crate::model::{TreeModel, TreePath};
use crate::node::{LayoutNode, NodeArena, NodeId};
use crate::visible::VisiblePaths;

/// Measures one row.
///
/// Receives the model object, its row, nesting depth (0 for the root),
/// whether its children are showing, and a scratch rectangle that may be
/// filled and returned instead of building a new one. Only `x`, `width` and
/// `height` of the result are used; `y` is computed by the cache.
pub trait NodeDimensions<N> {
    fn node_bounds(
        &mut self,
        node: &N,
        row: usize,
        depth: usize,
        expanded: bool,
        scratch: &mut Rect,
    ) -> Rect;
}

impl<N, F> NodeDimensions<N> for F
where
    F: FnMut(&N, usize, usize, bool, &mut Rect) -> Rect,
{
    fn node_bounds(
        &mut self,
        node: &N,
        row: usize,
        depth: usize,
        expanded: bool,
        scratch: &mut Rect,
    ) -> Rect {
        self(node, row, depth, expanded, scratch)
    }
}

/// Layout cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutCacheConfig {
    /// Whether the root occupies row 0.
    pub root_visible: bool,
    /// Fixed row height when positive; variable (measured) heights otherwise.
    pub row_height: i32,
    /// Baseline height for variable rows and for rows not yet measured.
    pub default_row_height: i32,
    /// Run the invariant checker after every mutation and log violations.
    pub check_invariants: bool,
}

impl Default for LayoutCacheConfig {
    fn default() -> Self {
        Self {
            root_visible: true,
            row_height: 20,
            default_row_height: 20,
            check_invariants: false,
        }
    }
}

impl LayoutCacheConfig {
    /// Whether every row has the same height.
    #[inline]
    #[must_use]
    pub const fn is_fixed_height(&self) -> bool {
        self.row_height > 0
    }
}

type AutoExpandHandler<N> = Box<dyn FnMut(&TreePath<N>)>;

/// Flattened, row-indexed view of an expandable tree.
pub struct TreeLayoutCache<N> {
    pub(crate) config: LayoutCacheConfig,
    pub(crate) nodes: NodeArena<N>,
    pub(crate) root: Option<NodeId>,
    pub(crate) rows: Vec<NodeId>,
    pub(crate) paths: FxHashMap<TreePath<N>, NodeId>,
    /// Present iff variable row heights are in use.
    pub(crate) heights: Option<FenwickTree>,
    dimensions: Option<Box<dyn NodeDimensions<N>>>,
    auto_expand: Option<AutoExpandHandler<N>>,
    pub(crate) selection_reset: Option<Box<dyn FnMut()>>,
    scratch: Rect,
}

impl<N> fmt::Debug for TreeLayoutCache<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeLayoutCache")
            .field("config", &self.config)
            .field("rows", &self.rows.len())
            .field("nodes", &self.nodes.len())
            .field("has_dimensions", &self.dimensions.is_some())
            .finish()
    }
}

impl<N> Default for TreeLayoutCache<N>
where
    N: Clone + Eq + std::hash::Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> TreeLayoutCache<N>
where
    N: Clone + Eq + std::hash::Hash + fmt::Debug,
{
    /// Empty cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LayoutCacheConfig::default())
    }

    /// Empty cache with the given settings.
    #[must_use]
    pub fn with_config(config: LayoutCacheConfig) -> Self {
        Self {
            config,
            nodes: NodeArena::new(),
            root: None,
            rows: Vec::new(),
            paths: FxHashMap::default(),
            heights: (!config.is_fixed_height()).then(|| FenwickTree::new(0)),
            dimensions: None,
            auto_expand: None,
            selection_reset: None,
            scratch: Rect::default(),
        }
    }

    /// Install the row measurer.
    #[must_use]
    pub fn with_node_dimensions(mut self, dimensions: impl NodeDimensions<N> + 'static) -> Self {
        self.dimensions = Some(Box::new(dimensions));
        self
    }

    /// Install the callback told about single-child reveals.
    ///
    /// Fired when a node goes from zero visible children to exactly one,
    /// with that child's path. The cache only reports the opportunity;
    /// expanding the child is up to the caller.
    #[must_use]
    pub fn with_auto_expand_handler(mut self, handler: impl FnMut(&TreePath<N>) + 'static) -> Self {
        self.auto_expand = Some(Box::new(handler));
        self
    }

    /// Install the callback run when a root structure change discards the
    /// whole tree, so the host can drop its selection.
    #[must_use]
    pub fn with_selection_reset(mut self, reset: impl FnMut() + 'static) -> Self {
        self.selection_reset = Some(Box::new(reset));
        self
    }

    /// Enable or disable invariant checking after mutations.
    #[must_use]
    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.config.check_invariants = enabled;
        self
    }

    /// Replace the row measurer and drop all cached geometry.
    pub fn set_node_dimensions(&mut self, dimensions: impl NodeDimensions<N> + 'static) {
        self.dimensions = Some(Box::new(dimensions));
        self.invalidate_sizes();
    }

    #[must_use]
    pub fn config(&self) -> &LayoutCacheConfig {
        &self.config
    }

    #[must_use]
    pub fn is_root_visible(&self) -> bool {
        self.config.root_visible
    }

    #[must_use]
    pub fn row_height(&self) -> i32 {
        self.config.row_height
    }

    #[must_use]
    pub fn default_row_height(&self) -> i32 {
        self.config.default_row_height
    }

    // ------------------------------------------------------------------
    // Model installation and configuration
    // ------------------------------------------------------------------

    /// Discard all state and rebuild from `model`'s root.
    ///
    /// The root is created expanded, so at least one level is visible.
    pub fn set_model<M>(&mut self, model: &M) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        self.rebuild(model)?;
        self.after_mutation("set_model");
        Ok(())
    }

    pub(crate) fn rebuild<M>(&mut self, model: &M) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("tree_layout.rebuild").entered();

        self.nodes.clear();
        self.paths.clear();
        self.rows.clear();
        self.root = None;
        if let Some(heights) = self.heights.as_mut() {
            heights.rebuild(&[]);
        }

        let Some(root_object) = model.root() else {
            return Ok(());
        };
        let root = self.create_node(None, TreePath::root(root_object));
        self.root = Some(root);
        if self.config.root_visible {
            self.rows.push(root);
            self.renumber_from(0);
        }
        self.expand_node(model, root)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "tree_layout.rebuilt",
            rows = self.rows.len(),
            nodes = self.nodes.len()
        );
        Ok(())
    }

    /// Show or hide the root row. Descendants keep their relative order.
    pub fn set_root_visible(&mut self, visible: bool) {
        if self.config.root_visible == visible {
            return;
        }
        self.config.root_visible = visible;
        let Some(root) = self.root else {
            return;
        };
        if visible {
            self.rows.insert(0, root);
        } else if self.rows.first() == Some(&root) {
            self.rows.remove(0);
            self.nodes[root].row = None;
        }
        self.renumber_from(0);
        self.nodes[root].clear_size();
        self.sync_heights();
        self.after_mutation("set_root_visible");
    }

    /// Select fixed (`height > 0`) or variable (`height <= 0`) row heights.
    ///
    /// Drops every cached row size.
    pub fn set_row_height(&mut self, height: i32) {
        self.config.row_height = height;
        self.heights = (!self.config.is_fixed_height()).then(|| FenwickTree::new(0));
        self.invalidate_sizes();
    }

    /// Change the baseline height used by variable rows.
    pub fn set_default_row_height(&mut self, height: i32) {
        self.config.default_row_height = height;
        self.invalidate_sizes();
    }

    // ------------------------------------------------------------------
    // Expansion
    // ------------------------------------------------------------------

    /// Expand or collapse the node at `path`.
    ///
    /// Expanding first makes every ancestor visible and expanded, loads the
    /// node's children if needed and splices its visible subtree in after
    /// it. Collapsing first makes the node itself visible, then removes its
    /// visible subtree from the row list while keeping the nodes loaded.
    pub fn set_expanded_state<M>(
        &mut self,
        model: &M,
        path: &TreePath<N>,
        expand: bool,
    ) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        if path.is_empty() {
            return Err(LayoutError::EmptyPath);
        }
        self.ensure_ancestors_expanded(model, path)?;
        let id = self.load_path(model, path)?;
        if expand {
            self.expand_node(model, id)?;
        } else {
            self.collapse_node(id);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "tree_layout.toggle",
            action = if expand { "expand" } else { "collapse" },
            depth = path.depth(),
            rows = self.rows.len()
        );
        self.after_mutation("set_expanded_state");
        Ok(())
    }

    /// Whether the node is visible and expanded. The root always counts as
    /// visible here, even when its row is hidden.
    #[must_use]
    pub fn get_expanded_state(&self, path: &TreePath<N>) -> bool {
        self.paths.get(path).is_some_and(|&id| {
            let node = &self.nodes[id];
            (Some(id) == self.root || node.row.is_some()) && node.expanded
        })
    }

    /// Whether the node's children are currently in the row list.
    ///
    /// Painting uses this to decide whether to descend into a subtree.
    #[must_use]
    pub fn is_expanded(&self, path: &TreePath<N>) -> bool {
        self.paths
            .get(path)
            .is_some_and(|&id| self.children_visible(id))
    }

    /// Paths of loaded descendants of `path` marked expanded, in pre-order,
    /// including those hidden under a collapsed ancestor.
    ///
    /// Replaying them through [`set_expanded_state`](Self::set_expanded_state)
    /// restores the expansion state on a fresh cache.
    #[must_use]
    pub fn expanded_descendants(&self, path: &TreePath<N>) -> Vec<TreePath<N>> {
        let Some(&id) = self.paths.get(path) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.nodes[next].expanded {
                out.push(self.nodes[next].path.clone());
            }
            stack.extend(self.children_of(next).iter().rev().copied());
        }
        out
    }

    // ------------------------------------------------------------------
    // Row queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn path_for_row(&self, row: usize) -> Option<&TreePath<N>> {
        self.rows.get(row).map(|&id| &self.nodes[id].path)
    }

    /// Row of the node at `path`, or `None` when it is not visible.
    #[must_use]
    pub fn row_for_path(&self, path: &TreePath<N>) -> Option<usize> {
        self.paths.get(path).and_then(|&id| self.nodes[id].row)
    }

    /// Batch form of [`row_for_path`](Self::row_for_path).
    #[must_use]
    pub fn rows_for_paths(&self, paths: &[TreePath<N>]) -> Vec<Option<usize>> {
        paths.iter().map(|p| self.row_for_path(p)).collect()
    }

    /// Visible paths from `path`'s row to the end of the row list.
    ///
    /// For a hidden root the sequence starts at row 0. Returns `None` when
    /// the node is unknown or not visible.
    #[must_use]
    pub fn visible_paths_from(&self, path: &TreePath<N>) -> Option<VisiblePaths<'_, N>> {
        let &id = self.paths.get(path)?;
        let start = match self.nodes[id].row {
            Some(row) => row,
            None if Some(id) == self.root => 0,
            None => return None,
        };
        Some(VisiblePaths::new(self, start))
    }

    /// Number of visible descendants of `path`, at any depth.
    #[must_use]
    pub fn visible_child_count(&self, path: &TreePath<N>) -> usize {
        self.paths
            .get(path)
            .map_or(0, |&id| self.visible_descendant_count(id))
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Bounds of the node at `path`, measuring it if needed.
    pub fn bounds(&mut self, path: &TreePath<N>) -> Option<Rect> {
        let row = self.row_for_path(path)?;
        self.row_bounds(row)
    }

    /// Bounds of the node at `row`, measuring it if needed.
    pub fn row_bounds(&mut self, row: usize) -> Option<Rect> {
        let &id = self.rows.get(row)?;
        self.ensure_size(id);
        let node = &self.nodes[id];
        Some(Rect::new(
            node.x,
            self.row_top(row),
            node.width,
            self.height_of(row),
        ))
    }

    /// Total height of all rows.
    #[must_use]
    pub fn preferred_height(&self) -> i32 {
        let rows = self.rows.len() as i64;
        match &self.heights {
            None => clamp_i32(rows * i64::from(self.config.row_height)),
            Some(heights) => {
                clamp_i32(rows * i64::from(self.config.default_row_height) + heights.total())
            }
        }
    }

    /// Widest `x + width` among rows overlapping `visible` vertically, or
    /// among all rows when `visible` is `None`. Measures rows as needed.
    pub fn preferred_width(&mut self, visible: Option<Rect>) -> i32 {
        let (start, limit) = match visible {
            None => (0, None),
            Some(area) => match self.row_at_y(area.y) {
                Some(row) => (row, Some(area.bottom())),
                None => return 0,
            },
        };
        let mut widest = 0;
        for row in start..self.rows.len() {
            if limit.is_some_and(|bottom| self.row_top(row) >= bottom) {
                break;
            }
            let id = self.rows[row];
            self.ensure_size(id);
            let node = &self.nodes[id];
            widest = widest.max(node.x.saturating_add(node.width));
        }
        widest
    }

    /// Row containing pixel `y`, clamped into the row range.
    ///
    /// Uses the heights measured so far; unmeasured rows count as
    /// `default_row_height`. When several rows share a top (zero-height
    /// rows), the last of them wins. `None` only when there are no rows.
    #[must_use]
    pub fn row_at_y(&self, y: i32) -> Option<usize> {
        let last = self.rows.len().checked_sub(1)?;
        if y < 0 {
            return Some(0);
        }
        let row = match &self.heights {
            None => (y / self.config.row_height) as usize,
            Some(heights) => heights
                .last_within(i64::from(self.config.default_row_height), i64::from(y))
                .unwrap_or(0),
        };
        Some(row.min(last))
    }

    /// Path of the row closest to `y`. The x coordinate does not affect the
    /// result; rows span the full width.
    #[must_use]
    pub fn path_closest_to(&self, _x: i32, y: i32) -> Option<&TreePath<N>> {
        self.row_at_y(y).and_then(|row| self.path_for_row(row))
    }

    /// Forget every cached row size. Visibility is untouched.
    pub fn invalidate_sizes(&mut self) {
        for node in self.nodes.iter_mut() {
            node.clear_size();
        }
        self.sync_heights();
    }

    /// Forget the cached size of one node.
    pub fn invalidate_path_bounds(&mut self, path: &TreePath<N>) {
        if let Some(&id) = self.paths.get(path) {
            self.invalidate_size(id);
        }
    }

    pub(crate) fn row_top(&self, row: usize) -> i32 {
        let row_i = row as i64;
        match &self.heights {
            None => clamp_i32(row_i * i64::from(self.config.row_height)),
            Some(heights) => clamp_i32(
                row_i * i64::from(self.config.default_row_height) + heights.sum_before(row),
            ),
        }
    }

    fn height_of(&self, row: usize) -> i32 {
        match &self.heights {
            None => self.config.row_height,
            Some(_) => {
                let delta = self.rows.get(row).map_or(0, |&id| self.nodes[id].height_delta);
                self.config.default_row_height.saturating_add(delta)
            }
        }
    }

    fn ensure_size(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        if node.size_valid {
            return;
        }
        let Some(row) = node.row else {
            return;
        };
        let depth = node.path.depth();
        let expanded = self.children_visible(id);
        let default = self.config.default_row_height;

        let node = &self.nodes[id];
        let measured = match (self.dimensions.as_mut(), node.path.last()) {
            (Some(dimensions), Some(object)) => {
                dimensions.node_bounds(object, row, depth, expanded, &mut self.scratch)
            }
            _ => Rect::new(0, 0, 0, default),
        };

        let delta = measured.height.saturating_sub(default);
        let node = &mut self.nodes[id];
        let old = node.height_delta;
        node.x = measured.x;
        node.width = measured.width;
        node.height_delta = delta;
        node.size_valid = true;
        if let Some(heights) = self.heights.as_mut() {
            if row < heights.len() {
                heights.update(row, i64::from(delta) - i64::from(old));
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals shared with the model listener
    // ------------------------------------------------------------------

    pub(crate) fn create_node(&mut self, parent: Option<NodeId>, path: TreePath<N>) -> NodeId {
        let id = self.nodes.insert(LayoutNode::new(parent, path.clone()));
        self.paths.insert(path, id);
        id
    }

    pub(crate) fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes[id].children.as_deref().unwrap_or(&[])
    }

    /// Root ignores its own visibility; everything else must be in a row.
    pub(crate) fn children_visible(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        (Some(id) == self.root || node.row.is_some()) && node.expanded
    }

    /// Direct children in the row list.
    pub(crate) fn shown_child_count(&self, id: NodeId) -> usize {
        if self.children_visible(id) {
            self.nodes[id].loaded_child_count()
        } else {
            0
        }
    }

    /// All descendants in the row list.
    pub(crate) fn visible_descendant_count(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if self.children_visible(next) {
                let children = self.children_of(next);
                count += children.len();
                stack.extend_from_slice(children);
            }
        }
        count
    }

    /// Row where `id`'s first child goes when its children are showing.
    pub(crate) fn first_child_row(&self, id: NodeId) -> usize {
        self.nodes[id].row.map_or(0, |row| row + 1)
    }

    /// Display-order descendants that show once `id`'s children are visible.
    fn collect_visible_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let mut stack: Vec<NodeId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            if self.nodes[next].expanded {
                stack.extend(self.children_of(next).iter().rev().copied());
            }
        }
    }

    pub(crate) fn load_children<M>(&mut self, model: &M, id: NodeId) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        if self.nodes[id].children.is_some() {
            return Err(LayoutError::ChildrenAlreadyLoaded {
                path: format!("{:?}", self.nodes[id].path),
            });
        }
        let path = self.nodes[id].path.clone();
        let Some(object) = path.last() else {
            return Err(LayoutError::EmptyPath);
        };
        let count = model.child_count(object);
        let mut children = Vec::with_capacity(count);
        for index in 0..count {
            let Some(child) = model.child(object, index) else {
                break;
            };
            children.push(self.create_node(Some(id), path.child(child)));
        }
        self.nodes[id].children = Some(children);
        Ok(())
    }

    /// Find or materialize the node for `path`, loading ancestors' children
    /// top-down as needed.
    pub(crate) fn load_path<M>(
        &mut self,
        model: &M,
        path: &TreePath<N>,
    ) -> Result<NodeId, LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        if let Some(&id) = self.paths.get(path) {
            return Ok(id);
        }
        let root = self.root.ok_or(LayoutError::NoModel)?;
        if path.first() != self.nodes[root].path.first() {
            return Err(LayoutError::PathOutsideModel {
                path: format!("{path:?}"),
            });
        }
        let mut current = root;
        for len in 2..=path.len() {
            let prefix = path.prefix(len);
            if let Some(&id) = self.paths.get(&prefix) {
                current = id;
                continue;
            }
            if self.nodes[current].children.is_none() {
                self.load_children(model, current)?;
            }
            current = *self
                .paths
                .get(&prefix)
                .ok_or_else(|| LayoutError::ChildNotFound {
                    depth: len - 1,
                    segment: prefix.last().map(|s| format!("{s:?}")).unwrap_or_default(),
                })?;
        }
        Ok(current)
    }

    /// Expand every strict ancestor of `path`, top-down.
    fn ensure_ancestors_expanded<M>(
        &mut self,
        model: &M,
        path: &TreePath<N>,
    ) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        for len in 1..path.len() {
            let id = self.load_path(model, &path.prefix(len))?;
            if !self.children_visible(id) {
                self.expand_node(model, id)?;
            }
        }
        Ok(())
    }

    pub(crate) fn expand_node<M>(&mut self, model: &M, id: NodeId) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        let (old_visible, new_visible) = self.reveal_children(model, id)?;
        self.notify_single_child_reveal(id, old_visible, new_visible);
        Ok(())
    }

    /// Expand without the single-child notification. Returns the visible
    /// child count before and after.
    pub(crate) fn reveal_children<M>(
        &mut self,
        model: &M,
        id: NodeId,
    ) -> Result<(usize, usize), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        let old_visible = self.shown_child_count(id);
        if self.nodes[id].children.is_none() {
            self.load_children(model, id)?;
        }
        let was_showing = self.children_visible(id);
        self.nodes[id].expanded = true;
        self.nodes[id].reexpand_on_insert = false;
        if !was_showing && self.children_visible(id) {
            let at = self.first_child_row(id);
            let mut subtree = Vec::new();
            self.collect_visible_subtree(id, &mut subtree);
            self.rows.splice(at..at, subtree);
            self.renumber_from(at);
        }
        self.nodes[id].clear_size();
        self.sync_heights();
        Ok((old_visible, self.shown_child_count(id)))
    }

    pub(crate) fn collapse_node(&mut self, id: NodeId) {
        if self.children_visible(id) {
            let start = self.first_child_row(id);
            let count = self.visible_descendant_count(id);
            self.remove_rows(start, count);
        }
        self.nodes[id].expanded = false;
        self.nodes[id].reexpand_on_insert = false;
        self.nodes[id].clear_size();
        self.sync_heights();
    }

    /// Drop `count` rows starting at `start`, clearing their row numbers and
    /// renumbering the tail.
    pub(crate) fn remove_rows(&mut self, start: usize, count: usize) {
        let end = (start + count).min(self.rows.len());
        for id in self.rows.drain(start..end) {
            self.nodes[id].row = None;
        }
        self.renumber_from(start);
    }

    /// Single-child reveal rule shared by expansion and insertion: fires only
    /// on the transition from zero visible children to exactly one.
    pub(crate) fn notify_single_child_reveal(
        &mut self,
        id: NodeId,
        old_visible: usize,
        new_visible: usize,
    ) {
        if old_visible != 0 || new_visible != 1 {
            return;
        }
        let Some(&child) = self.children_of(id).first() else {
            return;
        };
        let path = self.nodes[child].path.clone();
        if let Some(handler) = self.auto_expand.as_mut() {
            handler(&path);
        }
    }

    pub(crate) fn invalidate_size(&mut self, id: NodeId) {
        let row = self.nodes[id].row;
        let old = self.nodes[id].clear_size();
        if let (Some(row), Some(heights)) = (row, self.heights.as_mut()) {
            if row < heights.len() && old != 0 {
                heights.update(row, -i64::from(old));
            }
        }
    }

    pub(crate) fn renumber_from(&mut self, start: usize) {
        for (row, &id) in self.rows.iter().enumerate().skip(start) {
            self.nodes[id].row = Some(row);
        }
    }

    /// Rebuild the height index from the row list (variable mode only).
    pub(crate) fn sync_heights(&mut self) {
        let Some(heights) = self.heights.as_mut() else {
            return;
        };
        let deltas: Vec<i64> = self
            .rows
            .iter()
            .map(|&id| i64::from(self.nodes[id].height_delta))
            .collect();
        heights.rebuild(&deltas);
    }

    /// Remove `id` and every loaded descendant from the arena and path index.
    pub(crate) fn destroy_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.remove(next) else {
                continue;
            };
            if self.paths.get(&node.path) == Some(&next) {
                self.paths.remove(&node.path);
            }
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
    }

    pub(crate) fn after_mutation(&self, operation: &'static str) {
        if !self.config.check_invariants {
            return;
        }
        let violations = self.check_invariants();
        #[cfg(feature = "tracing")]
        for violation in &violations {
            tracing::debug!(
                message = "tree_layout.invariant",
                operation,
                violation = %violation
            );
        }
        #[cfg(not(feature = "tracing"))]
        let _ = (operation, violations);
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
