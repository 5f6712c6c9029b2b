#![forbid(unsafe_code)]

//! Row layout for expandable trees.
//!
//! [`TreeLayoutCache`] keeps the visible rows of a lazily loaded tree in
//! display order and maps between rows, paths and pixel offsets. The tree
//! itself comes from a [`TreeModel`]; the cache only materializes what has
//! been expanded or looked up, and follows the model through
//! [`TreeModelEvent`]s.
//!
//! ```ignore
//! use arbor_layout::{MutableTreeModel, TreeLayoutCache};
//!
//! let mut model = MutableTreeModel::with_root("root");
//! let root = model.root_id().unwrap();
//! model.push_child(root, "a");
//!
//! let mut cache = TreeLayoutCache::new();
//! cache.set_model(&model)?;
//! assert_eq!(cache.row_count(), 2);
//!
//! let (_, event) = model.push_child(root, "b");
//! cache.tree_nodes_inserted(&model, &event)?;
//! assert_eq!(cache.row_count(), 3);
//! ```

pub mod cache;
pub mod debug;
pub mod error;
pub mod fenwick;
mod listener;
pub mod model;
pub mod mutable_model;
mod node;
pub mod visible;

pub use arbor_core::geometry::Rect;
pub use cache::{LayoutCacheConfig, NodeDimensions, TreeLayoutCache};
pub use debug::InvariantViolation;
pub use error::LayoutError;
pub use fenwick::FenwickTree;
pub use model::{TreeModel, TreeModelEvent, TreePath};
pub use mutable_model::{ModelNodeId, MutableTreeModel};
pub use visible::VisiblePaths;
