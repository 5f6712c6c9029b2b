#![forbid(unsafe_code)]

//! Layout cache consistency checks.
//!
//! Walks the row list, node arena, path index and height index and reports
//! every disagreement it finds. Nothing here repairs state.
//!
//! # Runtime Gating
//!
//! [`TreeLayoutCache::check_invariants`] is always available. The cache
//! calls it after each mutation only when
//! [`LayoutCacheConfig::check_invariants`](crate::LayoutCacheConfig) is set,
//! and then logs violations at debug level under the `tracing` feature.
//!
//! # Usage
//!
//! ```ignore
//! let violations = cache.check_invariants();
//! for v in &violations {
//!     eprintln!("layout drift: {v}");
//! }
//! assert!(violations.is_empty());
//! ```

use std::fmt;

use crate::cache::TreeLayoutCache;

/// One detected inconsistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `rows[row]` refers to a node that was already freed.
    DeadRow { row: usize },
    /// `rows[row]` records a different row number.
    RowMismatch { row: usize, recorded: Option<usize> },
    /// A node claims a row it does not occupy.
    StrayRow { row: usize },
    /// A node is in the row list though its parent's children are hidden.
    HiddenDescendantVisible { row: usize },
    /// The rows following a node are not exactly its visible descendants.
    SubtreeSpan {
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// The height index has a different length than the row list.
    HeightIndexLength { rows: usize, entries: usize },
    /// A height prefix sum disagrees with the cached per-row deltas.
    HeightIndex {
        prefix: usize,
        expected: i64,
        actual: i64,
    },
    /// The path index and the node arena disagree.
    PathIndex { indexed: usize, nodes: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowMismatch { row, recorded } => {
                write!(f, "row {row} holds a node recording row {recorded:?}")
            }
            Self::DeadRow { row } => write!(f, "row {row} holds a freed node"),
            Self::StrayRow { row } => write!(f, "node claims row {row} but is not there"),
            Self::HiddenDescendantVisible { row } => {
                write!(f, "row {row} is visible under a collapsed parent")
            }
            Self::SubtreeSpan {
                row,
                expected,
                actual,
            } => write!(
                f,
                "row {row} has {expected} visible descendants but {actual} follow it"
            ),
            Self::HeightIndexLength { rows, entries } => {
                write!(f, "height index has {entries} entries for {rows} rows")
            }
            Self::HeightIndex {
                prefix,
                expected,
                actual,
            } => write!(
                f,
                "height prefix {prefix} sums to {actual}, rows say {expected}"
            ),
            Self::PathIndex { indexed, nodes } => {
                write!(f, "path index has {indexed} entries for {nodes} nodes")
            }
        }
    }
}

impl<N> TreeLayoutCache<N>
where
    N: Clone + Eq + std::hash::Hash + fmt::Debug,
{
    /// Report every inconsistency between the cache's internal structures.
    ///
    /// O(rows × depth) plus O(rows log rows) for the height index.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut out = Vec::new();

        for (row, &id) in self.rows.iter().enumerate() {
            let Some(node) = self.nodes.get(id) else {
                out.push(InvariantViolation::DeadRow { row });
                continue;
            };
            if node.row != Some(row) {
                out.push(InvariantViolation::RowMismatch {
                    row,
                    recorded: node.row,
                });
            }
            if let Some(parent) = node.parent {
                if !self.children_visible(parent) {
                    out.push(InvariantViolation::HiddenDescendantVisible { row });
                }
            }
            if self.children_visible(id) {
                let expected = self.visible_descendant_count(id);
                let actual = self.rows[row + 1..]
                    .iter()
                    .take_while(|&&next| {
                        self.nodes
                            .get(next)
                            .is_some_and(|below| node.path.is_ancestor_of(&below.path))
                    })
                    .count();
                if expected != actual {
                    out.push(InvariantViolation::SubtreeSpan {
                        row,
                        expected,
                        actual,
                    });
                }
            }
        }

        for (id, node) in self.nodes.iter() {
            if let Some(row) = node.row {
                if self.rows.get(row) != Some(&id) {
                    out.push(InvariantViolation::StrayRow { row });
                }
            }
        }

        if self.paths.len() != self.nodes.len()
            || self
                .nodes
                .iter()
                .any(|(id, node)| self.paths.get(&node.path) != Some(&id))
        {
            out.push(InvariantViolation::PathIndex {
                indexed: self.paths.len(),
                nodes: self.nodes.len(),
            });
        }

        if let Some(heights) = &self.heights {
            if heights.len() != self.rows.len() {
                out.push(InvariantViolation::HeightIndexLength {
                    rows: self.rows.len(),
                    entries: heights.len(),
                });
            } else {
                let mut expected = 0i64;
                let mut prefixes_agree = true;
                for (prefix, &id) in self.rows.iter().enumerate() {
                    let actual = heights.sum_before(prefix);
                    if actual != expected {
                        out.push(InvariantViolation::HeightIndex {
                            prefix,
                            expected,
                            actual,
                        });
                        prefixes_agree = false;
                        break;
                    }
                    expected += i64::from(self.nodes[id].height_delta);
                }
                if prefixes_agree && heights.total() != expected {
                    out.push(InvariantViolation::HeightIndex {
                        prefix: self.rows.len(),
                        expected,
                        actual: heights.total(),
                    });
                }
            }
        }

        out
    }
}
