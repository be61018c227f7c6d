//! Ordered, unique-key map over an unbalanced binary search tree.
//!
//! Keys are ordered by a [`Compare`] implementation and located by a plain
//! binary-search descent from the root. New nodes are attached where the
//! descent ends and the tree is never rebalanced, so its shape (and the cost
//! of every operation) depends on insertion order.
//!
//! Erasure splices the node out in place: a node with at most one child is
//! replaced by that child, a node with two children by its in-order
//! successor. Only positions naming the erased node are invalidated.
//!
//! Operations that need to hand a location back without keeping the map
//! borrowed return a [`Position`]; [`OrderedMap::cursor_at`] turns it back
//! into a [`TreeCursor`].

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Index;

use compare::{natural, Compare, Natural};
use tracing::trace;

use crate::alloc::{AllocStrategy, Global};
use crate::cursor::{Cursor, Range, Reverse};
use crate::entry::EntryCompare;
use crate::error::Result;
use crate::tree::{NodeId, Position, Side, Tree, TreeCursor, TreeCursorMut};

enum Search {
    Found(NodeId),
    Vacant { parent: Option<NodeId>, side: Side },
}

pub struct OrderedMap<K, V, C = Natural<K>, A: AllocStrategy = Global> {
    tree: Tree<K, V, A>,
    cmp: C,
}

impl<K: Ord, V> OrderedMap<K, V, Natural<K>, Global> {
    /// Makes a new, empty map ordered by `K: Ord`. Does not allocate.
    ///
    /// ```
    /// use cursor_collections::OrderedMap;
    ///
    /// let mut map = OrderedMap::new();
    /// map.insert(3, "c")?;
    /// map.insert(1, "a")?;
    /// map.insert(2, "b")?;
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    /// # Ok::<(), cursor_collections::Error>(())
    /// ```
    pub fn new() -> Self {
        Self::new_in(natural(), Global)
    }
}

impl<K, V, C: Compare<K>> OrderedMap<K, V, C, Global> {
    /// Makes a new, empty map ordered by `cmp`.
    ///
    /// ```
    /// use cursor_collections::OrderedMap;
    ///
    /// let mut map = OrderedMap::with_compare(|a: &i32, b: &i32| b.cmp(a));
    /// map.insert(1, ())?;
    /// map.insert(2, ())?;
    /// assert_eq!(map.first_key_value(), Some((&2, &())));
    /// # Ok::<(), cursor_collections::Error>(())
    /// ```
    pub fn with_compare(cmp: C) -> Self {
        Self::new_in(cmp, Global)
    }
}

impl<K, V, C: Compare<K>, A: AllocStrategy> OrderedMap<K, V, C, A> {
    pub fn new_in(cmp: C, alloc: A) -> Self {
        Self {
            tree: Tree::new_in(alloc),
            cmp,
        }
    }

    /// Builds a map from `(key, value)` pairs inserted in iteration order;
    /// later duplicates of a key are dropped.
    pub fn from_iter_in<I>(iter: I, cmp: C, alloc: A) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::new_in(cmp, alloc);
        map.insert_iter(iter)?;
        Ok(map)
    }

    /// Fallible counterpart of `clone`. The copy has the same tree shape.
    pub fn try_clone(&self) -> Result<Self>
    where
        K: Clone,
        V: Clone,
        C: Clone,
    {
        Ok(Self {
            tree: self.tree.try_clone()?,
            cmp: self.cmp.clone(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Largest number of entries the allocation strategy can represent.
    pub fn max_len(&self) -> usize {
        self.tree.max_len()
    }

    pub fn allocator(&self) -> &A {
        self.tree.allocator()
    }

    pub fn key_comp(&self) -> &C {
        &self.cmp
    }

    /// Comparator over whole entries, by key.
    pub fn value_comp(&self) -> EntryCompare<'_, K, V, C> {
        EntryCompare::new(&self.cmp)
    }

    #[inline]
    fn position(&self, node: Option<NodeId>) -> Position {
        self.tree.position(node)
    }

    /// The live node named by `pos`, if `pos` belongs to this map and is not
    /// the end position.
    fn resolve(&self, pos: Position) -> Option<NodeId> {
        self.tree.resolve(pos).flatten()
    }

    fn search_from(&self, start: Option<NodeId>, key: &K) -> Search {
        let Some(mut cur) = start else {
            return Search::Vacant {
                parent: None,
                side: Side::Left,
            };
        };
        loop {
            let node_key = &self.tree.node(cur).key;
            let (next, side) = match self.cmp.compare(key, node_key) {
                Ordering::Less => (self.tree.left(cur), Side::Left),
                Ordering::Greater => (self.tree.right(cur), Side::Right),
                Ordering::Equal => return Search::Found(cur),
            };
            match next {
                Some(id) => cur = id,
                None => {
                    return Search::Vacant {
                        parent: Some(cur),
                        side,
                    }
                }
            }
        }
    }

    #[inline]
    fn search(&self, key: &K) -> Search {
        self.search_from(self.tree.root(), key)
    }

    fn find_node(&self, key: &K) -> Option<NodeId> {
        match self.search(key) {
            Search::Found(id) => Some(id),
            Search::Vacant { .. } => None,
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Cursor at `key`, or the end cursor when absent.
    pub fn find(&self, key: &K) -> TreeCursor<'_, K, V, A> {
        self.tree.cursor(self.find_node(key))
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find_node(key).map(|id| self.tree.node(id).value())
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find_node(key)?;
        Some(self.tree.node_mut(id).value_mut())
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.find_node(key).map(|id| {
            let node = self.tree.node(id);
            (&node.key, node.value())
        })
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_node(key).is_some()
    }

    /// Number of entries with `key`: 0 or 1.
    pub fn count(&self, key: &K) -> usize {
        usize::from(self.contains_key(key))
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.begin().get()
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.rbegin().get()
    }

    /// First entry whose key is not less than `key`.
    pub fn lower_bound(&self, key: &K) -> TreeCursor<'_, K, V, A> {
        let mut best = None;
        let mut cur = self.tree.root();
        while let Some(id) = cur {
            if self.cmp.compares_lt(&self.tree.node(id).key, key) {
                cur = self.tree.right(id);
            } else {
                best = Some(id);
                cur = self.tree.left(id);
            }
        }
        self.tree.cursor(best)
    }

    /// First entry whose key is greater than `key`.
    pub fn upper_bound(&self, key: &K) -> TreeCursor<'_, K, V, A> {
        let mut best = None;
        let mut cur = self.tree.root();
        while let Some(id) = cur {
            if self.cmp.compares_lt(key, &self.tree.node(id).key) {
                best = Some(id);
                cur = self.tree.left(id);
            } else {
                cur = self.tree.right(id);
            }
        }
        self.tree.cursor(best)
    }

    /// `[lower_bound(key), upper_bound(key))`: one entry when `key` is
    /// present, an empty range at the insertion point otherwise.
    pub fn equal_range(&self, key: &K) -> (TreeCursor<'_, K, V, A>, TreeCursor<'_, K, V, A>) {
        let first = self.lower_bound(key);
        let mut last = first;
        if first.key().is_some_and(|k| self.cmp.compares_eq(key, k)) {
            last.move_next();
        }
        (first, last)
    }

    // =========================================================================
    // Cursors and iteration
    // =========================================================================

    /// Cursor at the smallest key (the end cursor when empty).
    pub fn begin(&self) -> TreeCursor<'_, K, V, A> {
        self.tree.first_cursor()
    }

    /// One past the largest key; stepping back lands on the largest key.
    pub fn end(&self) -> TreeCursor<'_, K, V, A> {
        self.tree.end_cursor()
    }

    pub fn rbegin(&self) -> Reverse<TreeCursor<'_, K, V, A>> {
        Reverse::new(self.end())
    }

    pub fn rend(&self) -> Reverse<TreeCursor<'_, K, V, A>> {
        Reverse::new(self.begin())
    }

    /// Cursor for a position from this map; `None` if the position belongs
    /// to another map or its node has been erased.
    pub fn cursor_at(&self, pos: Position) -> Option<TreeCursor<'_, K, V, A>> {
        self.tree.resolve(pos).map(|node| self.tree.cursor(node))
    }

    /// Mutable cursor at the smallest key.
    pub fn begin_mut(&mut self) -> TreeCursorMut<'_, K, V, A> {
        let first = self.tree.first();
        TreeCursorMut::new(&mut self.tree, first)
    }

    pub fn cursor_mut_at(&mut self, pos: Position) -> Option<TreeCursorMut<'_, K, V, A>> {
        let node = self.tree.resolve(pos)?;
        Some(TreeCursorMut::new(&mut self.tree, node))
    }

    /// Entries in key order.
    pub fn iter(&self) -> Iter<'_, K, V, A> {
        Iter {
            range: Range::new(self.begin(), self.end()),
            remaining: self.len(),
        }
    }

    /// Entries in key order, with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, A> {
        let tree: &Tree<K, V, A> = &self.tree;
        IterMut {
            front: tree.first(),
            back: tree.last(),
            remaining: tree.len(),
            tree,
            _marker: PhantomData,
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + ExactSizeIterator + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Inserts `key` unless an equivalent key is present.
    ///
    /// Returns the position of the entry holding `key` and whether it was
    /// inserted. When the key already exists the map is unchanged and
    /// `value` is dropped.
    pub fn insert(&mut self, key: K, value: V) -> Result<(Position, bool)> {
        match self.search(&key) {
            Search::Found(id) => Ok((self.position(Some(id)), false)),
            Search::Vacant { parent, side } => {
                let id = self.tree.attach(parent, side, key, value)?;
                Ok((self.position(Some(id)), true))
            }
        }
    }

    /// Inserts `key`, or overwrites the value of the existing equivalent
    /// key and returns the old value.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Result<Option<V>> {
        match self.search(&key) {
            Search::Found(id) => Ok(Some(std::mem::replace(self.tree.node_mut(id).value_mut(), value))),
            Search::Vacant { parent, side } => {
                self.tree.attach(parent, side, key, value)?;
                Ok(None)
            }
        }
    }

    /// Inserts `key` using `hint` to shorten the search.
    ///
    /// The search starts at the hinted node when the hint's key sorts before
    /// `key` and `key` sorts before the hint's successor (or the hint is the
    /// maximum). Any other hint, including the end position, a stale
    /// position or one from another map, falls back to a search from the
    /// root. Returns the position of the entry holding `key`.
    pub fn insert_hint(&mut self, hint: Position, key: K, value: V) -> Result<Position> {
        let start = match self.resolve(hint) {
            Some(id) if self.brackets(id, &key) => Some(id),
            _ => self.tree.root(),
        };
        match self.search_from(start, &key) {
            Search::Found(id) => Ok(self.position(Some(id))),
            Search::Vacant { parent, side } => {
                let id = self.tree.attach(parent, side, key, value)?;
                Ok(self.position(Some(id)))
            }
        }
    }

    fn brackets(&self, id: NodeId, key: &K) -> bool {
        if !self.cmp.compares_lt(&self.tree.node(id).key, key) {
            return false;
        }
        match self.tree.successor(id) {
            Some(next) => self.cmp.compares_lt(key, &self.tree.node(next).key),
            None => true,
        }
    }

    /// Inserts each pair in order, as by [`insert`](Self::insert).
    ///
    /// Stops at the first error; pairs inserted before it stay.
    pub fn insert_iter<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Mutable access to the value for `key`, inserting `V::default()` first
    /// when the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V>
    where
        V: Default,
    {
        let id = match self.search(&key) {
            Search::Found(id) => id,
            Search::Vacant { parent, side } => self.tree.attach(parent, side, key, V::default())?,
        };
        Ok(self.tree.node_mut(id).value_mut())
    }

    // =========================================================================
    // Erasure
    // =========================================================================

    /// Removes the entry at `pos`. Returns `None` (and changes nothing) for
    /// the end position, a stale position, or one from another map.
    pub fn erase_at(&mut self, pos: Position) -> Option<(K, V)> {
        let id = self.resolve(pos)?;
        Some(self.tree.unlink(id))
    }

    /// Removes `key`; returns the number of entries removed (0 or 1).
    pub fn erase(&mut self, key: &K) -> usize {
        usize::from(self.remove_entry(key).is_some())
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let id = self.find_node(key)?;
        Some(self.tree.unlink(id))
    }

    /// Removes the entries in `[first, last)`; returns how many were removed.
    ///
    /// `last` must be reachable from `first`. Positions that do not belong
    /// to this map, or stale ones, remove nothing.
    pub fn erase_range(&mut self, first: Position, last: Position) -> usize {
        let (Some(start), Some(stop)) = (self.tree.resolve(first), self.tree.resolve(last)) else {
            return 0;
        };
        // Unlinking keeps every other node in its slot, so the successor
        // taken before an unlink is still the next node afterwards.
        let mut removed = 0;
        let mut cur = start;
        while let Some(id) = cur {
            if cur == stop {
                break;
            }
            cur = self.tree.successor(id);
            self.tree.unlink(id);
            removed += 1;
        }
        trace!(removed, len = self.len(), "map range erased");
        removed
    }

    /// Keeps only the entries for which `keep` returns `true`, visiting them
    /// in key order.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) {
        let mut cur = self.tree.first();
        while let Some(id) = cur {
            cur = self.tree.successor(id);
            let (key, value) = self.tree.node_mut(id).entry_mut();
            if !keep(key, value) {
                self.tree.unlink(id);
            }
        }
    }

    /// Drops every entry and releases the node storage.
    pub fn clear(&mut self) {
        trace!(len = self.len(), "map cleared");
        self.tree.clear();
    }

    /// Exchanges all contents, comparator and allocator with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    #[cfg(test)]
    pub(crate) fn validate(&self) -> usize {
        self.tree.validate(|a, b| self.cmp.compares_lt(a, b))
    }
}

impl<K: Ord, V> Default for OrderedMap<K, V, Natural<K>, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, C: Compare<K> + Clone, A: AllocStrategy> Clone for OrderedMap<K, V, C, A> {
    /// # Panics
    ///
    /// If the allocation strategy refuses the copy.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(map) => map,
            Err(err) => panic!("OrderedMap::clone: {err}"),
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedMap<K, V, Natural<K>, Global> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        match Self::from_iter_in(iter, natural(), Global) {
            Ok(map) => map,
            Err(err) => panic!("OrderedMap::from_iter: {err}"),
        }
    }
}

impl<K, V, C: Compare<K>, A: AllocStrategy> Extend<(K, V)> for OrderedMap<K, V, C, A> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        if let Err(err) = self.insert_iter(iter) {
            panic!("OrderedMap::extend: {err}");
        }
    }
}

impl<'a, K: Copy, V: Copy, C: Compare<K>, A: AllocStrategy> Extend<(&'a K, &'a V)> for OrderedMap<K, V, C, A> {
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(k, v)| (*k, *v)));
    }
}

impl<K, V, C: Compare<K>, A: AllocStrategy> Index<&K> for OrderedMap<K, V, C, A> {
    type Output = V;

    /// # Panics
    ///
    /// If `key` is not present.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found in OrderedMap"),
        }
    }
}

impl<K, V, C, A, D, B> PartialEq<OrderedMap<K, V, D, B>> for OrderedMap<K, V, C, A>
where
    K: PartialEq,
    V: PartialEq,
    C: Compare<K>,
    D: Compare<K>,
    A: AllocStrategy,
    B: AllocStrategy,
{
    fn eq(&self, other: &OrderedMap<K, V, D, B>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C: Compare<K>, A: AllocStrategy> Eq for OrderedMap<K, V, C, A> {}

impl<K: PartialOrd, V: PartialOrd, C: Compare<K>, A: AllocStrategy> PartialOrd for OrderedMap<K, V, C, A> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K: Ord, V: Ord, C: Compare<K>, A: AllocStrategy> Ord for OrderedMap<K, V, C, A> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: Hash, V: Hash, C: Compare<K>, A: AllocStrategy> Hash for OrderedMap<K, V, C, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for entry in self.iter() {
            entry.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C: Compare<K>, A: AllocStrategy> fmt::Debug for OrderedMap<K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C: Compare<K>, A: AllocStrategy> IntoIterator for &'a OrderedMap<K, V, C, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C: Compare<K>, A: AllocStrategy> IntoIterator for &'a mut OrderedMap<K, V, C, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C: Compare<K>, A: AllocStrategy> IntoIterator for OrderedMap<K, V, C, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { tree: self.tree }
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Borrowing iterator over the entries of an [`OrderedMap`], in key order.
pub struct Iter<'a, K, V, A: AllocStrategy> {
    range: Range<TreeCursor<'a, K, V, A>>,
    remaining: usize,
}

impl<K, V, A: AllocStrategy> Clone for Iter<'_, K, V, A> {
    fn clone(&self) -> Self {
        Self {
            range: self.range.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, A: AllocStrategy> Iterator for Iter<'a, K, V, A> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.range.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, A: AllocStrategy> DoubleEndedIterator for Iter<'_, K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.range.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<K, V, A: AllocStrategy> ExactSizeIterator for Iter<'_, K, V, A> {}

impl<K, V, A: AllocStrategy> FusedIterator for Iter<'_, K, V, A> {}

/// Iterator over the entries of an [`OrderedMap`] with mutable values.
///
/// Walks the tree from both ends by successor and predecessor links;
/// `remaining` stops the two ends before they cross.
pub struct IterMut<'a, K, V, A: AllocStrategy> {
    tree: &'a Tree<K, V, A>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
    _marker: PhantomData<&'a mut V>,
}

impl<'a, K, V, A: AllocStrategy> IterMut<'a, K, V, A> {
    fn entry(&self, id: NodeId) -> (&'a K, &'a mut V) {
        let tree: &'a Tree<K, V, A> = self.tree;
        let node = tree.node(id);
        // SAFETY: the iterator was built from `&'a mut OrderedMap`, so
        // nothing else reaches the values for `'a`, and each node is yielded
        // once because `remaining` counts the nodes between the two ends.
        (&node.key, unsafe { &mut *node.value_ptr() })
    }
}

impl<'a, K, V, A: AllocStrategy> Iterator for IterMut<'a, K, V, A> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.front = self.tree.successor(id);
        self.remaining -= 1;
        Some(self.entry(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, A: AllocStrategy> DoubleEndedIterator for IterMut<'_, K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.back = self.tree.predecessor(id);
        self.remaining -= 1;
        Some(self.entry(id))
    }
}

impl<K, V, A: AllocStrategy> ExactSizeIterator for IterMut<'_, K, V, A> {}

impl<K, V, A: AllocStrategy> FusedIterator for IterMut<'_, K, V, A> {}

/// Owning iterator over the entries of an [`OrderedMap`], in key order.
pub struct IntoIter<K, V, A: AllocStrategy> {
    tree: Tree<K, V, A>,
}

impl<K, V, A: AllocStrategy> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let id = self.tree.first()?;
        Some(self.tree.unlink(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<K, V, A: AllocStrategy> DoubleEndedIterator for IntoIter<K, V, A> {
    fn next_back(&mut self) -> Option<(K, V)> {
        let id = self.tree.last()?;
        Some(self.tree.unlink(id))
    }
}

impl<K, V, A: AllocStrategy> ExactSizeIterator for IntoIter<K, V, A> {}

impl<K, V, A: AllocStrategy> FusedIterator for IntoIter<K, V, A> {}
