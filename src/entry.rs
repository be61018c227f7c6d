//! Whole-entry comparison.
//!
//! [`OrderedMap`](crate::OrderedMap) orders keys with any
//! [`compare::Compare`] implementation: [`Natural`](compare::Natural) by
//! default, a reversed or closure comparator otherwise. Two keys are
//! equivalent when the comparator returns `Equal`; equivalence, not `==`,
//! decides key uniqueness.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use compare::Compare;

/// Compares whole `(key, value)` entries by key only.
pub struct EntryCompare<'a, K, V, C> {
    cmp: &'a C,
    _marker: PhantomData<fn(&K, &V)>,
}

impl<'a, K, V, C: Compare<K>> EntryCompare<'a, K, V, C> {
    pub(crate) fn new(cmp: &'a C) -> Self {
        Self {
            cmp,
            _marker: PhantomData,
        }
    }

    /// The key comparator this adapter delegates to.
    pub fn key_compare(&self) -> &'a C {
        self.cmp
    }
}

impl<'b, K, V, C: Compare<K>> Compare<(&'b K, &'b V)> for EntryCompare<'_, K, V, C> {
    #[inline]
    fn compare(&self, l: &(&'b K, &'b V), r: &(&'b K, &'b V)) -> Ordering {
        self.cmp.compare(l.0, r.0)
    }
}

impl<K, V, C> Clone for EntryCompare<'_, K, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, C> Copy for EntryCompare<'_, K, V, C> {}

impl<K, V, C: fmt::Debug> fmt::Debug for EntryCompare<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntryCompare").field(self.cmp).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compare::natural;

    #[test]
    fn test_entry_compare_ignores_values() {
        let cmp = natural();
        let entries = EntryCompare::<i32, &str, _>::new(&cmp);
        assert!(entries.compares_lt(&(&1, &"z"), &(&2, &"a")));
        assert!(entries.compares_eq(&(&2, &"a"), &(&2, &"b")));
        assert!(entries.key_compare().compares_gt(&3, &2));
    }

    #[test]
    fn test_entry_compare_follows_reversed_keys() {
        let cmp = natural::<i32>().rev();
        let entries = EntryCompare::<i32, (), _>::new(&cmp);
        assert!(entries.compares_lt(&(&3, &()), &(&1, &())));
    }

    #[test]
    fn test_closure_comparator_equivalence() {
        let by_len = |a: &String, b: &String| a.len().cmp(&b.len());
        let entries = EntryCompare::<String, u8, _>::new(&by_len);
        let (ab, cd) = ("ab".to_string(), "cd".to_string());
        // Different strings of equal length are equivalent.
        assert!(entries.compares_eq(&(&ab, &1), &(&cd, &2)));
    }
}
