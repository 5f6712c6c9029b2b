#![forbid(unsafe_code)]

//! Fenwick tree (binary indexed tree) over signed row-height deltas.
//!
//! Each slot holds `actual_height - default_height` for one visible row, so
//! the top of row `r` is `r * default_height + sum_before(r)`.
//!
//! | Operation    | Time     |
//! |--------------|----------|
//! | `update`     | O(log n) |
//! | `prefix`     | O(log n) |
//! | `last_within`| O(log n) |
//! | `rebuild`    | O(n)     |
//!
//! Indices are 0-based on the public surface; the backing array is 1-based.

/// Prefix-sum index over `i64` values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenwickTree {
    /// `tree[0]` is unused padding.
    tree: Vec<i64>,
}

impl FenwickTree {
    /// Create a tree of `len` zeroes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            tree: vec![0; len + 1],
        }
    }

    /// Build a tree from initial values in O(n).
    #[must_use]
    pub fn from_values(values: &[i64]) -> Self {
        let mut ft = Self::new(values.len());
        ft.rebuild(values);
        ft
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len() - 1
    }

    /// Whether the tree has no slots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add `delta` to slot `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn update(&mut self, i: usize, delta: i64) {
        assert!(i < self.len(), "fenwick index {i} out of range");
        let mut idx = i + 1;
        while idx < self.tree.len() {
            self.tree[idx] += delta;
            idx += lowest_bit(idx);
        }
    }

    /// Overwrite slot `i` with `value`.
    pub fn set(&mut self, i: usize, value: i64) {
        let current = self.get(i);
        self.update(i, value - current);
    }

    /// Value stored in slot `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> i64 {
        if i == 0 {
            self.prefix(0)
        } else {
            self.prefix(i) - self.prefix(i - 1)
        }
    }

    /// Inclusive prefix sum `values[0..=i]`.
    #[must_use]
    pub fn prefix(&self, i: usize) -> i64 {
        self.sum_before(i + 1)
    }

    /// Exclusive prefix sum `values[0..count]`.
    ///
    /// `count` is clamped to `len()`.
    #[must_use]
    pub fn sum_before(&self, count: usize) -> i64 {
        let mut idx = count.min(self.len());
        let mut sum = 0;
        while idx > 0 {
            sum += self.tree[idx];
            idx -= lowest_bit(idx);
        }
        sum
    }

    /// Sum of every slot.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.sum_before(self.len())
    }

    /// Inclusive range sum `values[left..=right]`.
    #[must_use]
    pub fn range(&self, left: usize, right: usize) -> i64 {
        if left > right {
            return 0;
        }
        self.sum_before(right + 1) - self.sum_before(left)
    }

    /// Largest `count` in `0..=len()` with `count * base + sum_before(count) <= limit`,
    /// or `None` when even `count == 0` exceeds `limit`.
    ///
    /// Single top-down descent in O(log n). Requires `base + value >= 0` for
    /// every slot, so the scaled prefix never decreases.
    #[must_use]
    pub fn last_within(&self, base: i64, limit: i64) -> Option<usize> {
        if limit < 0 {
            return None;
        }
        let len = self.len();
        let mut pos = 0;
        let mut acc = 0i64;
        let mut step = if len == 0 { 0 } else { 1 << len.ilog2() };
        while step > 0 {
            let next = pos + step;
            if next <= len {
                let span = self.tree[next] + base * step as i64;
                if acc + span <= limit {
                    pos = next;
                    acc += span;
                }
            }
            step >>= 1;
        }
        Some(pos)
    }

    /// Replace all contents with `values`, resizing to match, in O(n).
    pub fn rebuild(&mut self, values: &[i64]) {
        self.tree.clear();
        self.tree.resize(values.len() + 1, 0);
        for (i, &v) in values.iter().enumerate() {
            self.tree[i + 1] = v;
        }
        for idx in 1..self.tree.len() {
            let parent = idx + lowest_bit(idx);
            if parent < self.tree.len() {
                let carried = self.tree[idx];
                self.tree[parent] += carried;
            }
        }
    }

    /// Grow (with zeroes) or shrink to `len` slots, preserving existing values.
    pub fn resize(&mut self, len: usize) {
        if len == self.len() {
            return;
        }
        let mut values: Vec<i64> = (0..self.len().min(len)).map(|i| self.get(i)).collect();
        values.resize(len, 0);
        self.rebuild(&values);
    }
}

#[inline]
fn lowest_bit(idx: usize) -> usize {
    idx & idx.wrapping_neg()
}
