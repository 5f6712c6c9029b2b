//! Model mutation handling.
//!
//! Each handler takes the event's parent path and child indices as the
//! model reports them after the mutation has been applied. Events for paths
//! the cache has never materialized are ignored; there is nothing cached to
//! update.

use crate::cache::TreeLayoutCache;
use crate::error::LayoutError;
use crate::model::{TreeModel, TreeModelEvent, TreePath};
use crate::node::NodeId;

impl<N> TreeLayoutCache<N>
where
    N: Clone + Eq + std::hash::Hash + std::fmt::Debug,
{
    /// Objects at `event.child_indices` under `event.path` changed in place.
    ///
    /// With no indices the event refers to `event.path` itself (the root).
    /// When the model hands back an object that is not equal to the cached
    /// one, the node and its loaded descendants are re-keyed to new paths.
    pub fn tree_nodes_changed<M>(
        &mut self,
        model: &M,
        event: &TreeModelEvent<N>,
    ) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            message = "tree_layout.changed",
            depth = event.path.depth(),
            indices = ?event.child_indices
        );

        let Some(&id) = self.paths.get(&event.path) else {
            return Ok(());
        };
        self.invalidate_size(id);

        if event.child_indices.is_empty() {
            if Some(id) == self.root {
                if let Some(object) = model.root() {
                    self.replace_user_object(id, object);
                }
            }
        } else if self.nodes[id].children.is_some() {
            let Some(parent_object) = event.path.last() else {
                return Err(LayoutError::EmptyPath);
            };
            for &index in &event.child_indices {
                let Some(&child) = self.children_of(id).get(index) else {
                    continue;
                };
                if let Some(object) = model.child(parent_object, index) {
                    self.replace_user_object(child, object);
                }
                self.invalidate_size(child);
            }
        }

        self.after_mutation("tree_nodes_changed");
        Ok(())
    }

    /// Children were inserted under `event.path` at `event.child_indices`.
    ///
    /// A parent that [`tree_nodes_removed`](Self::tree_nodes_removed)
    /// collapsed for running out of children is expanded again.
    pub fn tree_nodes_inserted<M>(
        &mut self,
        model: &M,
        event: &TreeModelEvent<N>,
    ) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            message = "tree_layout.inserted",
            depth = event.path.depth(),
            indices = ?event.child_indices
        );

        let Some(&id) = self.paths.get(&event.path) else {
            return Ok(());
        };
        if self.nodes[id].children.is_none() {
            // Possibly a leaf becoming a parent; the expander changes.
            self.invalidate_size(id);
            self.after_mutation("tree_nodes_inserted");
            return Ok(());
        }
        let Some(parent_object) = event.path.last() else {
            return Err(LayoutError::EmptyPath);
        };

        let mut indices = event.child_indices.clone();
        indices.sort_unstable();
        indices.dedup();

        let reexpand = std::mem::take(&mut self.nodes[id].reexpand_on_insert);
        let old_visible = self.shown_child_count(id);
        let showing = self.children_visible(id);
        for &index in &indices {
            let Some(object) = model.child(parent_object, index) else {
                continue;
            };
            let child = self.create_node(Some(id), event.path.child(object));
            let slot = {
                let children = self.nodes[id].children.get_or_insert_with(Vec::new);
                let slot = index.min(children.len());
                children.insert(slot, child);
                slot
            };
            if showing {
                let row = self.insertion_row(id, slot);
                self.rows.insert(row, child);
                self.renumber_from(row);
            }
        }
        self.invalidate_size(id);
        self.sync_heights();

        if reexpand {
            // Emptied by removals earlier; restore the expansion it lost.
            self.expand_node(model, id)?;
        } else if indices.len() == 1 {
            let new_visible = self.shown_child_count(id);
            self.notify_single_child_reveal(id, old_visible, new_visible);
        }
        self.after_mutation("tree_nodes_inserted");
        Ok(())
    }

    /// Children previously at `event.child_indices` under `event.path` were
    /// removed from the model.
    ///
    /// An expanded parent left without children is collapsed until its next
    /// insertion.
    pub fn tree_nodes_removed<M>(
        &mut self,
        model: &M,
        event: &TreeModelEvent<N>,
    ) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            message = "tree_layout.removed",
            depth = event.path.depth(),
            indices = ?event.child_indices
        );

        let Some(&id) = self.paths.get(&event.path) else {
            return Ok(());
        };
        let Some(parent_object) = event.path.last() else {
            return Err(LayoutError::EmptyPath);
        };
        if self.nodes[id].children.is_none() {
            if model.child_count(parent_object) == 0 {
                self.invalidate_size(id);
            }
            self.after_mutation("tree_nodes_removed");
            return Ok(());
        }

        let mut indices = event.child_indices.clone();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();

        for index in indices {
            let removed = match self.nodes[id].children.as_mut() {
                Some(children) if index < children.len() => children.remove(index),
                _ => continue,
            };
            if let Some(row) = self.nodes[removed].row {
                let span = 1 + self.visible_descendant_count(removed);
                self.remove_rows(row, span);
            }
            self.destroy_subtree(removed);
        }

        if self.nodes[id].loaded_child_count() == 0 && model.is_leaf(parent_object) {
            let node = &mut self.nodes[id];
            node.reexpand_on_insert |= node.expanded;
            node.expanded = false;
        }
        self.invalidate_size(id);
        self.sync_heights();
        self.after_mutation("tree_nodes_removed");
        Ok(())
    }

    /// The subtree at `event.path` changed arbitrarily.
    ///
    /// At the root this discards everything and rebuilds from the model,
    /// then runs the selection reset hook. Elsewhere the node is replaced by
    /// a fresh one in the same slot, re-expanded if its children were
    /// showing.
    pub fn tree_structure_changed<M>(
        &mut self,
        model: &M,
        event: &TreeModelEvent<N>,
    ) -> Result<(), LayoutError>
    where
        M: TreeModel<Node = N>,
    {
        #[cfg(feature = "tracing")]
        tracing::trace!(message = "tree_layout.structure_changed", depth = event.path.depth());

        if event.path.len() <= 1 {
            self.rebuild(model)?;
            if let Some(reset) = self.selection_reset.as_mut() {
                reset();
            }
            self.after_mutation("tree_structure_changed");
            return Ok(());
        }

        let Some(&id) = self.paths.get(&event.path) else {
            return Ok(());
        };
        let Some(parent) = self.nodes[id].parent else {
            return Ok(());
        };
        let Some(slot) = self.children_of(parent).iter().position(|&c| c == id) else {
            return Ok(());
        };

        let was_showing = self.children_visible(id);
        let row = self.nodes[id].row;
        if let Some(row) = row {
            let span = 1 + self.visible_descendant_count(id);
            self.remove_rows(row, span);
        }

        let parent_path = self.nodes[parent].path.clone();
        let object = parent_path
            .last()
            .and_then(|p| model.child(p, slot))
            .or_else(|| event.path.last().cloned());
        self.destroy_subtree(id);
        let Some(object) = object else {
            return Err(LayoutError::EmptyPath);
        };

        let fresh = self.create_node(Some(parent), parent_path.child(object));
        if let Some(children) = self.nodes[parent].children.as_mut() {
            children[slot] = fresh;
        }
        if let Some(row) = row {
            self.rows.insert(row, fresh);
            self.renumber_from(row);
        }
        if was_showing {
            self.reveal_children(model, fresh)?;
        }
        self.sync_heights();
        self.after_mutation("tree_structure_changed");
        Ok(())
    }

    /// Row for a child inserted at `slot` under a parent whose children are
    /// showing: after the previous sibling's last visible descendant.
    fn insertion_row(&self, parent: NodeId, slot: usize) -> usize {
        if slot == 0 {
            return self.first_child_row(parent);
        }
        let prev = self.children_of(parent)[slot - 1];
        match self.nodes[prev].row {
            Some(row) => row + 1 + self.visible_descendant_count(prev),
            None => self.first_child_row(parent),
        }
    }

    /// Swap the object at `id`'s path slot, re-keying its loaded subtree
    /// when the new object is not equal to the old one.
    fn replace_user_object(&mut self, id: NodeId, object: N) {
        let old_path = self.nodes[id].path.clone();
        if old_path.last() == Some(&object) {
            return;
        }
        let new_path = old_path.with_last(object);
        let keep = old_path.len();

        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let current = self.nodes[next].path.clone();
            let rekeyed = TreePath::from_segments(
                new_path
                    .segments()
                    .iter()
                    .chain(&current.segments()[keep..])
                    .cloned(),
            );
            if self.paths.get(&current) == Some(&next) {
                self.paths.remove(&current);
            }
            self.paths.insert(rekeyed.clone(), next);
            self.nodes[next].path = rekeyed;
            stack.extend_from_slice(self.children_of(next));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::{LayoutCacheConfig, TreeLayoutCache};
    use crate::model::{TreeModel, TreeModelEvent, TreePath};
    use crate::mutable_model::{ModelNodeId, MutableTreeModel};
    use arbor_core::geometry::Rect;
    use rustc_hash::FxHashMap;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Cache = TreeLayoutCache<ModelNodeId>;

    fn labels(cache: &Cache, model: &MutableTreeModel<&'static str>) -> Vec<&'static str> {
        (0..cache.row_count())
            .map(|row| {
                let id = *cache.path_for_row(row).and_then(|p| p.last()).expect("row");
                *model.value(id).expect("value")
            })
            .collect()
    }

    fn checked() -> Cache {
        TreeLayoutCache::new().with_invariant_checks(true)
    }

    #[test]
    fn insert_under_expanded_parent_splices_rows() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        model.push_child(a, "A1");
        model.push_child(r, "B");
        let mut cache = checked();
        cache.set_model(&model).expect("model");
        let a_path = model.path_to(a).expect("path");
        cache.set_expanded_state(&model, &a_path, true).expect("expand");
        assert_eq!(labels(&cache, &model), ["R", "A", "A1", "B"]);

        let (_, event) = model.insert(r, 1, "X");
        cache.tree_nodes_inserted(&model, &event).expect("insert");
        assert_eq!(labels(&cache, &model), ["R", "A", "A1", "X", "B"]);

        let (_, event) = model.insert(r, 0, "Y");
        cache.tree_nodes_inserted(&model, &event).expect("insert");
        assert_eq!(labels(&cache, &model), ["R", "Y", "A", "A1", "X", "B"]);
        assert!(cache.check_invariants().is_empty());
    }

    #[test]
    fn insert_under_unloaded_parent_stays_lazy() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        let mut cache = checked();
        cache.set_model(&model).expect("model");

        let (child, event) = model.push_child(a, "A1");
        cache.tree_nodes_inserted(&model, &event).expect("insert");
        assert_eq!(labels(&cache, &model), ["R", "A"]);
        let child_path = model.path_to(child).expect("path");
        assert_eq!(cache.row_for_path(&child_path), None);
    }

    #[test]
    fn insert_into_collapsed_parent_adds_no_rows() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        model.push_child(a, "A1");
        let mut cache = checked();
        cache.set_model(&model).expect("model");
        let a_path = model.path_to(a).expect("path");
        cache.set_expanded_state(&model, &a_path, true).expect("expand");
        cache.set_expanded_state(&model, &a_path, false).expect("collapse");

        let (_, event) = model.push_child(a, "A2");
        cache.tree_nodes_inserted(&model, &event).expect("insert");
        assert_eq!(labels(&cache, &model), ["R", "A"]);
        cache.set_expanded_state(&model, &a_path, true).expect("expand");
        assert_eq!(labels(&cache, &model), ["R", "A", "A1", "A2"]);
    }

    #[test]
    fn single_insert_into_empty_expanded_parent_notifies() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let fired = Rc::new(Cell::new(0));
        let hits = Rc::clone(&fired);
        let mut cache =
            TreeLayoutCache::new().with_auto_expand_handler(move |_: &TreePath<ModelNodeId>| {
                hits.set(hits.get() + 1);
            });
        cache.set_model(&model).expect("model");
        assert_eq!(fired.get(), 0);

        let (_, event) = model.push_child(r, "only");
        cache.tree_nodes_inserted(&model, &event).expect("insert");
        assert_eq!(fired.get(), 1);

        let (_, event) = model.push_child(r, "second");
        cache.tree_nodes_inserted(&model, &event).expect("insert");
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn remove_excises_visible_subtree() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        let (a1, _) = model.push_child(a, "A1");
        model.push_child(r, "B");
        let mut cache = checked();
        cache.set_model(&model).expect("model");
        let a_path = model.path_to(a).expect("path");
        let a1_path = model.path_to(a1).expect("path");
        cache.set_expanded_state(&model, &a_path, true).expect("expand");

        let event = model.remove(a).expect("removed");
        cache.tree_nodes_removed(&model, &event).expect("remove");
        assert_eq!(labels(&cache, &model), ["R", "B"]);
        assert_eq!(cache.row_for_path(&a_path), None);
        assert_eq!(cache.row_for_path(&a1_path), None);
        assert!(!cache.is_expanded(&a_path));
        assert!(cache.check_invariants().is_empty());
    }

    #[test]
    fn emptied_parent_collapses_and_reexpands_on_refill() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        let (a1, _) = model.push_child(a, "A1");
        let mut cache = checked();
        cache.set_model(&model).expect("model");
        let a_path = model.path_to(a).expect("path");
        cache.set_expanded_state(&model, &a_path, true).expect("expand");

        let event = model.remove(a1).expect("removed");
        cache.tree_nodes_removed(&model, &event).expect("remove");
        assert_eq!(labels(&cache, &model), ["R", "A"]);
        assert!(!cache.get_expanded_state(&a_path));

        let (_, event) = model.push_child(a, "A2");
        cache.tree_nodes_inserted(&model, &event).expect("insert");
        assert_eq!(labels(&cache, &model), ["R", "A", "A2"]);
        assert!(cache.get_expanded_state(&a_path));
        assert!(cache.check_invariants().is_empty());
    }

    #[test]
    fn user_collapsed_parent_stays_collapsed_after_refill() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        let (a1, _) = model.push_child(a, "A1");
        let mut cache = checked();
        cache.set_model(&model).expect("model");
        let a_path = model.path_to(a).expect("path");
        cache.set_expanded_state(&model, &a_path, true).expect("expand");
        cache.set_expanded_state(&model, &a_path, false).expect("collapse");

        let event = model.remove(a1).expect("removed");
        cache.tree_nodes_removed(&model, &event).expect("remove");
        let (_, event) = model.push_child(a, "A2");
        cache.tree_nodes_inserted(&model, &event).expect("insert");
        assert_eq!(labels(&cache, &model), ["R", "A"]);
    }

    #[test]
    fn hidden_root_refills_after_losing_every_child() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        let revealed = Rc::new(Cell::new(0));
        let hits = Rc::clone(&revealed);
        let mut cache = TreeLayoutCache::with_config(LayoutCacheConfig {
            root_visible: false,
            check_invariants: true,
            ..LayoutCacheConfig::default()
        })
        .with_auto_expand_handler(move |_: &TreePath<ModelNodeId>| hits.set(hits.get() + 1));
        cache.set_model(&model).expect("model");
        assert_eq!(labels(&cache, &model), ["A"]);

        let event = model.remove(a).expect("removed");
        cache.tree_nodes_removed(&model, &event).expect("remove");
        assert_eq!(cache.row_count(), 0);

        let (_, event) = model.push_child(r, "B");
        cache.tree_nodes_inserted(&model, &event).expect("insert");
        assert_eq!(labels(&cache, &model), ["B"]);
        assert!(cache.get_expanded_state(&TreePath::root(r)));
        assert_eq!(revealed.get(), 2, "initial child and refill are both single reveals");
        assert!(cache.check_invariants().is_empty());
    }

    #[test]
    fn changed_refetches_objects_and_invalidates_sizes() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let mut cache = checked().with_node_dimensions(
            move |id: &ModelNodeId, _: usize, _: usize, _: bool, scratch: &mut Rect| {
                sink.borrow_mut().push(*id);
                *scratch
            },
        );
        cache.set_model(&model).expect("model");
        let a_path = model.path_to(a).expect("path");
        let _ = cache.bounds(&a_path);
        let _ = cache.bounds(&a_path);
        assert_eq!(calls.borrow().len(), 1);

        let event = model.set_value(a, "A'").expect("changed");
        cache.tree_nodes_changed(&model, &event).expect("changed");
        let _ = cache.bounds(&a_path);
        assert_eq!(calls.borrow().len(), 2);
        assert_eq!(cache.row_for_path(&a_path), Some(1));
    }

    #[test]
    fn structure_change_at_root_rebuilds_and_resets_selection() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        model.push_child(a, "A1");
        let resets = Rc::new(Cell::new(0));
        let counter = Rc::clone(&resets);
        let mut cache = checked().with_selection_reset(move || counter.set(counter.get() + 1));
        cache.set_model(&model).expect("model");
        let a_path = model.path_to(a).expect("path");
        cache.set_expanded_state(&model, &a_path, true).expect("expand");

        let event = model.replace_children(r, ["P", "Q"]).expect("structure");
        cache.tree_structure_changed(&model, &event).expect("structure");
        assert_eq!(labels(&cache, &model), ["R", "P", "Q"]);
        assert_eq!(resets.get(), 1);
        assert_eq!(cache.row_for_path(&a_path), None);
    }

    #[test]
    fn structure_change_below_root_keeps_expansion() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        model.push_child(a, "A1");
        model.push_child(r, "B");
        let mut cache = checked();
        cache.set_model(&model).expect("model");
        let a_path = model.path_to(a).expect("path");
        cache.set_expanded_state(&model, &a_path, true).expect("expand");

        let event = model.replace_children(a, ["N1", "N2"]).expect("structure");
        cache.tree_structure_changed(&model, &event).expect("structure");
        assert_eq!(labels(&cache, &model), ["R", "A", "N1", "N2", "B"]);
        assert!(cache.check_invariants().is_empty());
    }

    #[test]
    fn events_for_unknown_paths_are_ignored() {
        let mut model = MutableTreeModel::with_root("R");
        let r = model.root_id().expect("root");
        let (a, _) = model.push_child(r, "A");
        let mut cache = TreeLayoutCache::with_config(LayoutCacheConfig {
            check_invariants: true,
            ..LayoutCacheConfig::default()
        });
        cache.set_model(&model).expect("model");
        let ghost_path = model.path_to(a).expect("path").child(ModelNodeId::from_raw(99));
        let ghost = TreeModelEvent::new(ghost_path, vec![0]);
        cache.tree_nodes_inserted(&model, &ghost).expect("ignored");
        cache.tree_nodes_removed(&model, &ghost).expect("ignored");
        cache.tree_nodes_changed(&model, &ghost).expect("ignored");
        cache.tree_structure_changed(&model, &ghost).expect("ignored");
        assert_eq!(labels(&cache, &model), ["R", "A"]);
    }

    /// Model keyed by label, so renaming a node changes its identity.
    struct LabelTree {
        root: String,
        children: FxHashMap<String, Vec<String>>,
    }

    impl LabelTree {
        fn new(root: &str) -> Self {
            Self {
                root: root.to_owned(),
                children: FxHashMap::default(),
            }
        }

        fn with_children(mut self, parent: &str, kids: &[&str]) -> Self {
            let kids = kids.iter().map(|k| (*k).to_owned()).collect();
            self.children.insert(parent.to_owned(), kids);
            self
        }

        fn rename(&mut self, parent: &str, index: usize, to: &str) {
            let Some(slot) = self.children.get_mut(parent).and_then(|kids| kids.get_mut(index))
            else {
                return;
            };
            let from = std::mem::replace(slot, to.to_owned());
            if let Some(kids) = self.children.remove(&from) {
                self.children.insert(to.to_owned(), kids);
            }
        }
    }

    impl TreeModel for LabelTree {
        type Node = String;

        fn root(&self) -> Option<String> {
            Some(self.root.clone())
        }

        fn child(&self, parent: &String, index: usize) -> Option<String> {
            self.children.get(parent)?.get(index).cloned()
        }

        fn child_count(&self, parent: &String) -> usize {
            self.children.get(parent).map_or(0, Vec::len)
        }
    }

    fn label_path(segments: &[&str]) -> TreePath<String> {
        TreePath::from_segments(segments.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn changed_object_rekeys_node_and_loaded_descendants() {
        let mut model = LabelTree::new("R")
            .with_children("R", &["A", "B"])
            .with_children("A", &["A1"]);
        let mut cache: TreeLayoutCache<String> = checked_labels();
        cache.set_model(&model).expect("model");
        cache
            .set_expanded_state(&model, &label_path(&["R", "A"]), true)
            .expect("expand");

        model.rename("R", 0, "Z");
        let event = TreeModelEvent::new(label_path(&["R"]), vec![0]);
        cache.tree_nodes_changed(&model, &event).expect("changed");

        let rows: Vec<_> = (0..cache.row_count())
            .filter_map(|row| cache.path_for_row(row).cloned())
            .collect();
        assert_eq!(
            rows,
            [
                label_path(&["R"]),
                label_path(&["R", "Z"]),
                label_path(&["R", "Z", "A1"]),
                label_path(&["R", "B"]),
            ]
        );
        assert_eq!(cache.row_for_path(&label_path(&["R", "A"])), None);
        assert_eq!(cache.row_for_path(&label_path(&["R", "A", "A1"])), None);
        assert_eq!(cache.row_for_path(&label_path(&["R", "Z", "A1"])), Some(2));
        assert!(cache.is_expanded(&label_path(&["R", "Z"])));
        assert!(cache.check_invariants().is_empty());
    }

    fn checked_labels() -> TreeLayoutCache<String> {
        TreeLayoutCache::new().with_invariant_checks(true)
    }
}
