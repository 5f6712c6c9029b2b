//! Errors raised for misuse of the layout cache.
//!
//! These are programmer errors: paths that do not belong to the installed
//! model, or event sequences that contradict the cache's loaded state.
//! Internal drift between the row list and the node graph is reported by
//! [`crate::debug`] instead and never surfaces here.

use thiserror::Error;

/// Layout cache operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The operation needs a model root but none is installed.
    #[error("no tree model root is installed")]
    NoModel,
    /// An empty path was supplied where a node path is required.
    #[error("tree path is empty")]
    EmptyPath,
    /// The path's first segment is not the current model root.
    #[error("path {path} is not rooted at the current model root")]
    PathOutsideModel { path: String },
    /// A path segment could not be found among its parent's children.
    #[error("segment {segment} at depth {depth} is not a child of its parent in the model")]
    ChildNotFound { depth: usize, segment: String },
    /// Children were requested to load twice for the same node.
    #[error("children of {path} are already loaded")]
    ChildrenAlreadyLoaded { path: String },
}
