use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

// =============================================================================
// OrderedMap vs BTreeMap
// =============================================================================

#[derive(Clone, Debug, Arbitrary)]
enum MapOp {
    #[proptest(weight = 8)]
    Insert(#[proptest(strategy = "0u8..64")] u8, u32),
    #[proptest(weight = 3)]
    InsertOrAssign(#[proptest(strategy = "0u8..64")] u8, u32),
    #[proptest(weight = 3)]
    InsertHint(
        #[proptest(strategy = "0u8..64")] u8,
        #[proptest(strategy = "0u8..64")] u8,
        u32,
    ),
    #[proptest(weight = 6)]
    Remove(#[proptest(strategy = "0u8..64")] u8),
    #[proptest(weight = 4)]
    Get(#[proptest(strategy = "0u8..64")] u8),
    #[proptest(weight = 2)]
    Bounds(#[proptest(strategy = "0u8..64")] u8),
    #[proptest(weight = 1)]
    EraseRange(
        #[proptest(strategy = "0u8..64")] u8,
        #[proptest(strategy = "0u8..64")] u8,
    ),
    #[proptest(weight = 1)]
    Clear,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_map_equivalence(ops in prop::collection::vec(any::<MapOp>(), 0..=500)) {
        let alloc = Counting::new();
        let mut t = OrderedMap::new_in(natural(), alloc.clone());
        let mut m: BTreeMap<u8, u32> = BTreeMap::new();

        for op in ops {
            match op {
                MapOp::Insert(k, v) => {
                    let (pos, inserted) = t.insert(k, v).unwrap();
                    let fresh = !m.contains_key(&k);
                    m.entry(k).or_insert(v);
                    prop_assert_eq!(inserted, fresh);
                    prop_assert_eq!(t.cursor_at(pos).unwrap().get(), Some((&k, &m[&k])));
                }
                MapOp::InsertOrAssign(k, v) => {
                    prop_assert_eq!(t.insert_or_assign(k, v).unwrap(), m.insert(k, v));
                }
                MapOp::InsertHint(h, k, v) => {
                    let hint = t.lower_bound(&h).position();
                    let pos = t.insert_hint(hint, k, v).unwrap();
                    m.entry(k).or_insert(v);
                    prop_assert_eq!(t.cursor_at(pos).unwrap().key(), Some(&k));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(t.remove(&k), m.remove(&k));
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(t.get(&k), m.get(&k));
                    prop_assert_eq!(t.count(&k), usize::from(m.contains_key(&k)));
                }
                MapOp::Bounds(k) => {
                    let lower = m.range(k..).next().map(|(k, _)| *k);
                    let upper = m.range((Excluded(k), Unbounded)).next().map(|(k, _)| *k);
                    prop_assert_eq!(t.lower_bound(&k).key().copied(), lower);
                    prop_assert_eq!(t.upper_bound(&k).key().copied(), upper);
                    let (lo, hi) = t.equal_range(&k);
                    prop_assert_eq!(distance(&lo, &hi), usize::from(m.contains_key(&k)));
                }
                MapOp::EraseRange(a, b) => {
                    let (lo, hi) = (a.min(b), a.max(b));
                    let first = t.lower_bound(&lo).position();
                    let last = t.lower_bound(&hi).position();
                    let doomed: Vec<u8> = m.range(lo..hi).map(|(k, _)| *k).collect();
                    for k in &doomed {
                        m.remove(k);
                    }
                    prop_assert_eq!(t.erase_range(first, last), doomed.len());
                }
                MapOp::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
            prop_assert_eq!(t.validate(), m.len());
        }

        let got: Vec<(u8, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u8, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&got, &expected);

        let backward: Vec<(u8, u32)> = Range::new(t.rbegin(), t.rend()).map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(backward, expected.iter().rev().copied().collect::<Vec<_>>());

        drop(t);
        prop_assert_eq!(alloc.live_slots(), 0);
    }
}

// =============================================================================
// Array vs Vec
// =============================================================================

#[derive(Clone, Debug, Arbitrary)]
enum ArrayOp {
    #[proptest(weight = 8)]
    Push(u16),
    #[proptest(weight = 3)]
    Pop,
    #[proptest(weight = 4)]
    Insert(usize, u16),
    #[proptest(weight = 2)]
    InsertN(usize, #[proptest(strategy = "0usize..12")] usize, u16),
    #[proptest(weight = 2)]
    InsertIter(
        usize,
        #[proptest(strategy = "prop::collection::vec(any::<u16>(), 0..12)")] Vec<u16>,
    ),
    #[proptest(weight = 3)]
    Erase(usize),
    #[proptest(weight = 1)]
    EraseRange(usize, usize),
    #[proptest(weight = 1)]
    Resize(#[proptest(strategy = "0usize..64")] usize, u16),
    #[proptest(weight = 1)]
    Reserve(#[proptest(strategy = "0usize..128")] usize),
    #[proptest(weight = 1)]
    AssignN(#[proptest(strategy = "0usize..32")] usize, u16),
    #[proptest(weight = 1)]
    Clear,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_array_equivalence(ops in prop::collection::vec(any::<ArrayOp>(), 0..=300)) {
        let alloc = Counting::new();
        let mut a = Array::new_in(alloc.clone());
        let mut v: Vec<u16> = Vec::new();

        for op in ops {
            let cap = a.capacity();
            match op {
                ArrayOp::Push(x) => {
                    a.push(x).unwrap();
                    v.push(x);
                    if v.len() - 1 == cap {
                        prop_assert_eq!(a.capacity(), (cap * 2).max(1));
                    }
                }
                ArrayOp::Pop => {
                    prop_assert_eq!(a.pop(), v.pop());
                }
                ArrayOp::Insert(i, x) => {
                    let i = i % (v.len() + 1);
                    prop_assert_eq!(a.insert(i, x).unwrap(), i);
                    v.insert(i, x);
                }
                ArrayOp::InsertN(i, n, x) => {
                    let i = i % (v.len() + 1);
                    prop_assert_eq!(a.insert_n(i, n, &x).unwrap(), i);
                    v.splice(i..i, std::iter::repeat(x).take(n));
                    if v.len() > cap {
                        prop_assert_eq!(a.capacity(), (cap * 2).max(1).max(v.len()));
                    }
                }
                ArrayOp::InsertIter(i, xs) => {
                    let i = i % (v.len() + 1);
                    prop_assert_eq!(a.insert_iter(i, xs.iter().copied()).unwrap(), i);
                    v.splice(i..i, xs);
                }
                ArrayOp::Erase(i) => {
                    if !v.is_empty() {
                        let i = i % v.len();
                        prop_assert_eq!(a.erase(i), i);
                        v.remove(i);
                    }
                }
                ArrayOp::EraseRange(x, y) => {
                    let (x, y) = (x % (v.len() + 1), y % (v.len() + 1));
                    let (lo, hi) = (x.min(y), x.max(y));
                    prop_assert_eq!(a.erase_range(lo..hi), lo);
                    v.drain(lo..hi);
                    prop_assert_eq!(a.capacity(), cap);
                }
                ArrayOp::Resize(n, x) => {
                    a.resize(n, &x).unwrap();
                    v.resize(n, x);
                }
                ArrayOp::Reserve(n) => {
                    a.reserve(n).unwrap();
                    prop_assert_eq!(a.capacity(), cap.max(n));
                }
                ArrayOp::AssignN(n, x) => {
                    a.assign_n(n, &x).unwrap();
                    v.clear();
                    v.resize(n, x);
                    prop_assert_eq!(a.capacity(), cap.max(n));
                }
                ArrayOp::Clear => {
                    a.clear();
                    v.clear();
                    prop_assert_eq!(a.capacity(), cap);
                }
            }

            prop_assert!(a.len() <= a.capacity());
            prop_assert_eq!(a.as_slice(), v.as_slice());
            prop_assert_eq!(alloc.live_values(), v.len());
        }

        let backward: Vec<u16> = Range::new(a.rbegin(), a.rend()).copied().collect();
        prop_assert_eq!(backward, v.iter().rev().copied().collect::<Vec<_>>());
        prop_assert_eq!(distance(&a.begin(), &a.end()), v.len());

        drop(a);
        prop_assert_eq!(alloc.live_slots(), 0);
    }
}

// =============================================================================
// Exhaustive orders
// =============================================================================

/// Calls `visit` once per ordering of `items`, generated in place by Heap's
/// algorithm (each ordering differs from the last by one swap).
fn orderings<T: Clone>(items: &[T], mut visit: impl FnMut(&[T])) {
    let mut order = items.to_vec();
    let mut counters = vec![0usize; order.len()];
    visit(&order);
    let mut k = 1;
    while k < order.len() {
        if counters[k] < k {
            let j = if k % 2 == 0 { 0 } else { counters[k] };
            order.swap(j, k);
            visit(&order);
            counters[k] += 1;
            k = 1;
        } else {
            counters[k] = 0;
            k += 1;
        }
    }
}

#[test]
fn orderings_are_distinct_and_complete() {
    let mut seen = std::collections::BTreeSet::new();
    orderings(&[1, 2, 3, 4], |o| {
        assert!(seen.insert(o.to_vec()));
    });
    assert_eq!(seen.len(), 24);
    let mut single = 0;
    orderings(&['x'], |o| {
        assert_eq!(o, &['x']);
        single += 1;
    });
    assert_eq!(single, 1);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<&str> = vec!["a", "b", "c", "aa", "ab", "ba"];

    orderings(&keys, |order| {
        let mut t: OrderedMap<&str, u64> = OrderedMap::new();
        let mut m: BTreeMap<&str, u64> = BTreeMap::new();

        for (i, &k) in order.iter().enumerate() {
            let v = i as u64;
            assert_eq!(t.insert_or_assign(k, v).unwrap(), m.insert(k, v));
        }

        assert_eq!(t.validate(), m.len());
        let got: Vec<(&str, u64)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(&str, u64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_every_shape() {
    let keys: Vec<u32> = (0..5).collect();

    // Every insertion order gives a different tree shape; remove from each in
    // every order.
    orderings(&keys, |insert_order| {
        let mut base: OrderedMap<u32, u32> = OrderedMap::new();
        for &k in insert_order {
            base.insert(k, k).unwrap();
        }

        orderings(&keys, |remove_order| {
            let mut t = base.clone();
            for (i, &k) in remove_order.iter().enumerate() {
                assert_eq!(t.remove(&k), Some(k));
                assert_eq!(t.validate(), keys.len() - i - 1);
            }
            assert!(t.is_empty());
            assert_eq!(t.begin(), t.end());
        });
    });
}

#[test]
fn exhaustive_array_insert_positions() {
    let values: Vec<u8> = (0..5).collect();

    orderings(&values, |order| {
        // Each value is inserted at the position given by its own value,
        // clamped to the current length.
        let mut a: Array<u8> = Array::new();
        let mut v: Vec<u8> = Vec::new();
        for &x in order {
            let i = usize::from(x).min(v.len());
            a.insert(i, x).unwrap();
            v.insert(i, x);
        }
        assert_eq!(a.as_slice(), v.as_slice());
    });
}

// =============================================================================
// Seeded randomized runs
// =============================================================================

#[test]
fn random_map_workload_matches_btreemap() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut t: OrderedMap<u32, u32> = OrderedMap::new();
    let mut m: BTreeMap<u32, u32> = BTreeMap::new();

    for round in 0..20_000u32 {
        let k = rng.gen_range(0..2_000);
        if rng.gen_bool(0.6) {
            assert_eq!(t.insert_or_assign(k, round).unwrap(), m.insert(k, round));
        } else {
            assert_eq!(t.remove(&k), m.remove(&k));
        }
        if round % 1_000 == 0 {
            assert_eq!(t.validate(), m.len());
        }
    }

    assert_eq!(t.validate(), m.len());
    assert!(t.iter().map(|(k, v)| (*k, *v)).eq(m.iter().map(|(k, v)| (*k, *v))));
    assert!(t.iter().rev().map(|(k, _)| *k).eq(m.keys().rev().copied()));
}

#[test]
fn sorted_insertion_builds_a_deep_tree() {
    // Ascending keys degenerate into a right spine; nothing may recurse.
    let n = 50_000u32;
    let mut t: OrderedMap<u32, ()> = OrderedMap::new();
    let mut hint = t.end().position();
    for k in 0..n {
        hint = t.insert_hint(hint, k, ()).unwrap();
    }
    assert_eq!(t.len(), n as usize);
    assert!(t.keys().copied().eq(0..n));

    let copy = t.clone();
    assert_eq!(copy, t);
    drop(copy);

    let mut c = t.end();
    c.move_prev();
    assert_eq!(c.key(), Some(&(n - 1)));
    drop(t);
}
