use std::iter::FusedIterator;

use crate::cache::TreeLayoutCache;
use crate::model::TreePath;

/// Forward-only walk over visible paths in display order.
///
/// Borrows the cache, so it cannot outlive a mutation. Once exhausted it
/// stays exhausted; ask the cache for a new one to start over.
#[derive(Debug)]
pub struct VisiblePaths<'a, N> {
    cache: &'a TreeLayoutCache<N>,
    next_row: usize,
}

impl<'a, N> VisiblePaths<'a, N> {
    pub(crate) fn new(cache: &'a TreeLayoutCache<N>, start: usize) -> Self {
        Self {
            cache,
            next_row: start,
        }
    }
}

impl<'a, N> Iterator for VisiblePaths<'a, N> {
    type Item = &'a TreePath<N>;

    fn next(&mut self) -> Option<Self::Item> {
        let &id = self.cache.rows.get(self.next_row)?;
        self.next_row += 1;
        Some(&self.cache.nodes[id].path)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.cache.rows.len().saturating_sub(self.next_row);
        (left, Some(left))
    }
}

impl<N> ExactSizeIterator for VisiblePaths<'_, N> {}

impl<N> FusedIterator for VisiblePaths<'_, N> {}
