//! Property-based invariant tests for the row-height Fenwick tree.
//!
//! 1. from_values matches sequential updates.
//! 2. sum_before(k) equals the naive prefix for every k, including k > len.
//! 3. get(i) recovers values after arbitrary set/update sequences.
//! 4. rebuild produces the same sums as from_values.
//! 5. resize preserves the surviving prefix.
//! 6. last_within finds the last scaled prefix under a limit.

use arbor_layout::FenwickTree;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn deltas(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(-500i64..=500, 0..=max_len)
}

fn naive_sum_before(values: &[i64], count: usize) -> i64 {
    values[..count.min(values.len())].iter().sum()
}

#[derive(Debug, Clone)]
enum Op {
    Set(usize, i64),
    Update(usize, i64),
}

fn ops(len: usize) -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        (0..len, -500i64..=500).prop_map(|(i, v)| Op::Set(i, v)),
        (0..len, -50i64..=50).prop_map(|(i, d)| Op::Update(i, d)),
    ];
    proptest::collection::vec(op, 0..40)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. from_values matches sequential updates
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn from_values_matches_sequential(values in deltas(100)) {
        let bulk = FenwickTree::from_values(&values);
        let mut seq = FenwickTree::new(values.len());
        for (i, &v) in values.iter().enumerate() {
            seq.update(i, v);
        }
        for i in 0..values.len() {
            prop_assert_eq!(bulk.get(i), seq.get(i), "index {}", i);
        }
        prop_assert_eq!(bulk.total(), seq.total());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. sum_before matches the naive prefix
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sum_before_matches_naive(values in deltas(100)) {
        let ft = FenwickTree::from_values(&values);
        for k in 0..=values.len() + 2 {
            prop_assert_eq!(ft.sum_before(k), naive_sum_before(&values, k), "k = {}", k);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. point operations keep every slot recoverable
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn point_ops_track_naive_array(
        (values, script) in (1usize..60).prop_flat_map(|n| {
            (proptest::collection::vec(-500i64..=500, n), ops(n))
        })
    ) {
        let mut ft = FenwickTree::from_values(&values);
        let mut naive = values.clone();
        for op in script {
            match op {
                Op::Set(i, v) => {
                    ft.set(i, v);
                    naive[i] = v;
                }
                Op::Update(i, d) => {
                    ft.update(i, d);
                    naive[i] += d;
                }
            }
        }
        for (i, &v) in naive.iter().enumerate() {
            prop_assert_eq!(ft.get(i), v);
            prop_assert_eq!(ft.range(0, i), naive_sum_before(&naive, i + 1));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. rebuild matches from_values
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rebuild_matches_from_values(first in deltas(50), second in deltas(50)) {
        let mut ft = FenwickTree::from_values(&first);
        ft.rebuild(&second);
        let fresh = FenwickTree::from_values(&second);
        prop_assert_eq!(ft.len(), fresh.len());
        for k in 0..=second.len() {
            prop_assert_eq!(ft.sum_before(k), fresh.sum_before(k));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. resize preserves the surviving prefix
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn resize_preserves_prefix(values in deltas(50), new_len in 0usize..80) {
        let mut ft = FenwickTree::from_values(&values);
        ft.resize(new_len);
        prop_assert_eq!(ft.len(), new_len);
        for i in 0..new_len {
            let expected = values.get(i).copied().unwrap_or(0);
            prop_assert_eq!(ft.get(i), expected);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. last_within agrees with a linear scan of scaled prefixes
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn last_within_matches_linear_scan(
        heights in proptest::collection::vec(0i64..=60, 0..=80),
        base in 0i64..=30,
        limit in -5i64..=3_000,
    ) {
        let values: Vec<i64> = heights.iter().map(|h| h - base).collect();
        let ft = FenwickTree::from_values(&values);
        let expected = (0..=values.len())
            .filter(|&count| count as i64 * base + naive_sum_before(&values, count) <= limit)
            .max();
        prop_assert_eq!(ft.last_within(base, limit), expected);
    }
}
