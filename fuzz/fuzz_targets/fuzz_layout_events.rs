#![no_main]

use arbitrary::Arbitrary;
use arbor_layout::{LayoutCacheConfig, ModelNodeId, MutableTreeModel, TreeLayoutCache};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Insert { parent: u8, index: u8 },
    Remove { node: u8 },
    Change { node: u8 },
    Replace { node: u8, count: u8 },
    Toggle { node: u8, expand: bool },
    RootVisible(bool),
    RowHeight(u8),
}

#[derive(Debug, Arbitrary)]
struct Script {
    root_visible: bool,
    ops: Vec<Op>,
}

/// Live model nodes in pre-order.
fn live_nodes(model: &MutableTreeModel<u32>) -> Vec<ModelNodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<ModelNodeId> = model.root_id().into_iter().collect();
    while let Some(id) = stack.pop() {
        out.push(id);
        stack.extend(model.children(id).iter().rev().copied());
    }
    out
}

fn pick(nodes: &[ModelNodeId], index: u8) -> Option<ModelNodeId> {
    if nodes.is_empty() {
        return None;
    }
    nodes.get(index as usize % nodes.len()).copied()
}

fuzz_target!(
    init: {
        // Quiet unless ARBOR_LOG asks for more.
        let _ = arbor_core::logging::init("arbor_layout=warn");
    },
    |script: Script| {
        let mut model = MutableTreeModel::with_root(0u32);
        let mut cache = TreeLayoutCache::with_config(LayoutCacheConfig {
            root_visible: script.root_visible,
            check_invariants: true,
            ..LayoutCacheConfig::default()
        });
        let _ = cache.set_model(&model);
        let mut label = 1u32;

        for op in script.ops.iter().take(256) {
            let nodes = live_nodes(&model);
            match *op {
                Op::Insert { parent, index } => {
                    let Some(parent) = pick(&nodes, parent) else { continue };
                    let (_, event) = model.insert(parent, index as usize, label);
                    label += 1;
                    let _ = cache.tree_nodes_inserted(&model, &event);
                }
                Op::Remove { node } => {
                    let Some(node) = pick(&nodes, node) else { continue };
                    if let Some(event) = model.remove(node) {
                        let _ = cache.tree_nodes_removed(&model, &event);
                    }
                }
                Op::Change { node } => {
                    let Some(node) = pick(&nodes, node) else { continue };
                    if let Some(event) = model.set_value(node, label) {
                        label += 1;
                        let _ = cache.tree_nodes_changed(&model, &event);
                    }
                }
                Op::Replace { node, count } => {
                    let Some(node) = pick(&nodes, node) else { continue };
                    let values: Vec<u32> = (0..u32::from(count % 5)).map(|i| label + i).collect();
                    label += 5;
                    if let Some(event) = model.replace_children(node, values) {
                        let _ = cache.tree_structure_changed(&model, &event);
                    }
                }
                Op::Toggle { node, expand } => {
                    let Some(path) = pick(&nodes, node).and_then(|id| model.path_to(id)) else {
                        continue;
                    };
                    let _ = cache.set_expanded_state(&model, &path, expand);
                }
                Op::RootVisible(visible) => cache.set_root_visible(visible),
                Op::RowHeight(height) => cache.set_row_height(i32::from(height % 40)),
            }

            let violations = cache.check_invariants();
            assert!(violations.is_empty(), "after {op:?}: {violations:?}");
        }
    }
);
