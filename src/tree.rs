//! Binary-tree node arena and in-order cursors.
//!
//! Nodes live in an [`Array`] of slots owned by the tree and refer to each
//! other by index. A missing link (`None`) plays the part of the sentinel:
//! it marks both "no child" and the one-past-the-end position. Erased nodes
//! leave a vacant slot threaded onto a free list and reused by the next
//! insertion, so indices of surviving nodes never move.
//!
//! The tree knows nothing about key order; [`OrderedMap`](crate::OrderedMap)
//! decides where nodes are attached. Nothing here rebalances: the shape is
//! whatever the insertion order produced.

use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::alloc::AllocStrategy;
use crate::array::Array;
use crate::cursor::Cursor;
use crate::error::Result;

/// Index of a node slot in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// Process-unique identity of one tree; stands in for the sentinel address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TreeId(u64);

impl TreeId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A linked node. The value sits in an `UnsafeCell` so that
/// [`IterMut`](crate::IterMut) can hand out `&mut V` for nodes it has passed
/// while still reading the links of the tree.
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    value: UnsafeCell<V>,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn value(&self) -> &V {
        // SAFETY: `&mut V` into a node only exists through `value_mut` or
        // `value_ptr`, both of which require the tree to be borrowed
        // exclusively.
        unsafe { &*self.value.get() }
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut V {
        self.value.get_mut()
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self) -> (&K, &mut V) {
        (&self.key, self.value.get_mut())
    }

    /// Raw access for iterators that hold the tree's exclusive borrow and
    /// yield each node at most once.
    #[inline]
    pub(crate) fn value_ptr(&self) -> *mut V {
        self.value.get()
    }

    fn into_entry(self) -> (K, V) {
        (self.key, self.value.into_inner())
    }
}

impl<K: Clone, V: Clone> Clone for Node<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: UnsafeCell::new(self.value().clone()),
            parent: self.parent,
            left: self.left,
            right: self.right,
        }
    }
}

/// An arena slot. `generation` counts how many nodes the slot has held
/// before; a [`Position`] records it so that a position of an erased node
/// never resolves to a later occupant of the same slot.
#[derive(Clone)]
enum Slot<K, V> {
    Occupied { generation: u32, node: Node<K, V> },
    Vacant { generation: u32, next_free: Option<NodeId> },
}

/// Which child link of the parent a new node goes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

pub(crate) struct Tree<K, V, A: AllocStrategy> {
    id: TreeId,
    slots: Array<Slot<K, V>, A>,
    free: Option<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

// SAFETY: values are only written through their `UnsafeCell` while the tree
// is borrowed mutably, so sharing `&Tree` across threads is as safe as
// sharing the keys and values themselves.
unsafe impl<K: Sync, V: Sync, A: AllocStrategy + Sync> Sync for Tree<K, V, A> {}

impl<K, V, A: AllocStrategy> Tree<K, V, A> {
    pub(crate) fn new_in(alloc: A) -> Self {
        Self {
            id: TreeId::fresh(),
            slots: Array::new_in(alloc),
            free: None,
            root: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> TreeId {
        self.id
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn allocator(&self) -> &A {
        self.slots.allocator()
    }

    /// Largest node count the allocation strategy can represent.
    pub(crate) fn max_len(&self) -> usize {
        self.slots.max_len()
    }

    /// The node at `id`, or `None` for a vacant or out-of-range slot.
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied { node, .. }) => Some(node),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Occupied { node, .. }) => Some(node),
            _ => None,
        }
    }

    /// The node at `id`, which must be linked into the tree.
    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        match self.get(id) {
            Some(node) => node,
            None => panic!("tree link to vacant slot {}", id.0),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("tree link to vacant slot {}", id.0),
        }
    }

    /// A position naming `node` (or the end position for `None`).
    pub(crate) fn position(&self, node: Option<NodeId>) -> Position {
        let generation = match node.and_then(|id| self.slots.get(id.0)) {
            Some(Slot::Occupied { generation, .. }) => *generation,
            _ => 0,
        };
        Position {
            tree: self.id,
            node,
            generation,
        }
    }

    /// The node `pos` names, if `pos` belongs to this tree and that node is
    /// still linked. `Some(None)` is the end position.
    pub(crate) fn resolve(&self, pos: Position) -> Option<Option<NodeId>> {
        if pos.tree != self.id {
            return None;
        }
        let Some(id) = pos.node else {
            return Some(None);
        };
        match self.slots.get(id.0) {
            Some(Slot::Occupied { generation, .. }) if *generation == pos.generation => Some(Some(id)),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub(crate) fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    #[inline]
    pub(crate) fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    pub(crate) fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.left(id) {
            id = left;
        }
        id
    }

    pub(crate) fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.right(id) {
            id = right;
        }
        id
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.leftmost(root))
    }

    pub(crate) fn last(&self) -> Option<NodeId> {
        self.root.map(|root| self.rightmost(root))
    }

    /// In-order successor, `None` past the maximum.
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.right(id) {
            return Some(self.leftmost(right));
        }
        let mut cur = id;
        loop {
            let parent = self.parent(cur)?;
            if self.left(parent) == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
    }

    /// In-order predecessor, `None` before the minimum.
    pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(left) = self.left(id) {
            return Some(self.rightmost(left));
        }
        let mut cur = id;
        loop {
            let parent = self.parent(cur)?;
            if self.right(parent) == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
    }

    /// Links a new node as the `side` child of `parent` (or as the root of an
    /// empty tree when `parent` is `None`).
    ///
    /// The chosen child link must be empty.
    pub(crate) fn attach(&mut self, parent: Option<NodeId>, side: Side, key: K, value: V) -> Result<NodeId> {
        let node = Node {
            key,
            value: UnsafeCell::new(value),
            parent,
            left: None,
            right: None,
        };
        let id = match self.free {
            Some(id) => {
                let (generation, next_free) = match self.slots[id.0] {
                    Slot::Vacant { generation, next_free } => (generation, next_free),
                    Slot::Occupied { .. } => panic!("free list points at live slot {}", id.0),
                };
                self.slots[id.0] = Slot::Occupied { generation, node };
                self.free = next_free;
                id
            }
            None => {
                if self.slots.len() == self.slots.capacity() {
                    trace!(nodes = self.len, "tree node arena growing");
                }
                self.slots.push(Slot::Occupied { generation: 0, node })?;
                NodeId(self.slots.len() - 1)
            }
        };
        match parent {
            None => {
                debug_assert!(self.root.is_none());
                self.root = Some(id);
            }
            Some(p) => {
                let p = self.node_mut(p);
                let link = match side {
                    Side::Left => &mut p.left,
                    Side::Right => &mut p.right,
                };
                debug_assert!(link.is_none());
                *link = Some(id);
            }
        }
        self.len += 1;
        Ok(id)
    }

    /// Replaces the subtree rooted at `u` with the one rooted at `v` in
    /// `u`'s parent.
    fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
        let parent = self.parent(u);
        match parent {
            None => self.root = v,
            Some(p) => {
                if self.left(p) == Some(u) {
                    self.node_mut(p).left = v;
                } else {
                    self.node_mut(p).right = v;
                }
            }
        }
        if let Some(v) = v {
            self.node_mut(v).parent = parent;
        }
    }

    /// Unlinks `z` and frees its slot, returning its key and value.
    ///
    /// A node with two children is replaced by its in-order successor, which
    /// keeps its own slot; every other node keeps its index.
    pub(crate) fn unlink(&mut self, z: NodeId) -> (K, V) {
        let (left, right) = {
            let node = self.node(z);
            (node.left, node.right)
        };
        match (left, right) {
            (None, _) => self.transplant(z, right),
            (_, None) => self.transplant(z, left),
            (Some(l), Some(r)) => {
                let y = self.leftmost(r);
                if self.parent(y) != Some(z) {
                    let y_right = self.right(y);
                    self.transplant(y, y_right);
                    self.node_mut(y).right = Some(r);
                    self.node_mut(r).parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.node_mut(y).left = Some(l);
                self.node_mut(l).parent = Some(y);
            }
        }
        let generation = match self.slots[z.0] {
            Slot::Occupied { generation, .. } => generation,
            Slot::Vacant { .. } => panic!("unlinked vacant slot {}", z.0),
        };
        // Wraps after 2^32 reuses of one slot.
        let vacant = Slot::Vacant {
            generation: generation.wrapping_add(1),
            next_free: self.free,
        };
        let slot = std::mem::replace(&mut self.slots[z.0], vacant);
        self.free = Some(z);
        self.len -= 1;
        match slot {
            Slot::Occupied { node, .. } => node.into_entry(),
            Slot::Vacant { .. } => unreachable!(),
        }
    }

    /// Copies the arena slot for slot; node ids carry over, the tree id
    /// does not.
    pub(crate) fn try_clone(&self) -> Result<Self>
    where
        K: Clone,
        V: Clone,
    {
        Ok(Self {
            id: TreeId::fresh(),
            slots: self.slots.try_clone()?,
            free: self.free,
            root: self.root,
            len: self.len,
        })
    }

    /// Drops every node and releases the arena. The tree takes a new id, so
    /// positions taken before the clear no longer resolve.
    pub(crate) fn clear(&mut self) {
        let alloc = self.slots.allocator().clone();
        self.id = TreeId::fresh();
        self.slots = Array::new_in(alloc);
        self.free = None;
        self.root = None;
        self.len = 0;
    }

    /// Node ids in key order.
    #[cfg(test)]
    pub(crate) fn in_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len);
        let mut next = self.first();
        while let Some(id) = next {
            out.push(id);
            next = self.successor(id);
        }
        out
    }

    pub(crate) fn first_cursor(&self) -> TreeCursor<'_, K, V, A> {
        let first = self.first();
        TreeCursor {
            tree: self,
            node: first,
            last: first,
        }
    }

    pub(crate) fn end_cursor(&self) -> TreeCursor<'_, K, V, A> {
        TreeCursor {
            tree: self,
            node: None,
            last: self.last(),
        }
    }

    pub(crate) fn cursor(&self, node: Option<NodeId>) -> TreeCursor<'_, K, V, A> {
        match node {
            Some(id) => TreeCursor {
                tree: self,
                node: Some(id),
                last: Some(id),
            },
            None => self.end_cursor(),
        }
    }

    /// One forward step; see [`TreeCursor`].
    fn step_next(&self, node: &mut Option<NodeId>, last: &mut Option<NodeId>) {
        let Some(cur) = *node else {
            return;
        };
        *node = self.successor(cur);
        if node.is_some() {
            *last = *node;
        }
    }

    /// One backward step; see [`TreeCursor`].
    fn step_prev(&self, node: &mut Option<NodeId>, last: &mut Option<NodeId>) {
        let Some(cur) = *node else {
            *node = *last;
            return;
        };
        *node = self.predecessor(cur);
        if node.is_some() {
            *last = *node;
        }
    }

    #[cfg(test)]
    pub(crate) fn free_slots(&self) -> usize {
        self.slots.len() - self.len
    }
}

// =============================================================================
// Cursors
// =============================================================================

/// A map position that does not borrow the map.
///
/// Obtained from [`TreeCursor::position`] or returned by insertion, and
/// accepted by [`OrderedMap`](crate::OrderedMap) operations that take a
/// position. A position stays valid until the node it names is erased or the
/// map is cleared; after a swap it names the same node in the other map.
/// Positions from another map, and positions of erased nodes, are rejected
/// even when a later insertion reuses the node's storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub(crate) tree: TreeId,
    pub(crate) node: Option<NodeId>,
    generation: u32,
}

impl Position {
    /// Whether this is the one-past-the-end position.
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }
}

/// In-order bidirectional cursor over an [`OrderedMap`](crate::OrderedMap).
///
/// Besides the current node the cursor remembers the last node it stood on,
/// which lets it step back from the end position onto the maximum.
///
/// - Forward from the end position is a no-op.
/// - Backward from the end position lands on the remembered node.
/// - Stepping past either boundary yields the end position.
///
/// Two cursors are equal when they stand on the same node of the same map.
pub struct TreeCursor<'a, K, V, A: AllocStrategy> {
    tree: &'a Tree<K, V, A>,
    node: Option<NodeId>,
    last: Option<NodeId>,
}

impl<'a, K, V, A: AllocStrategy> TreeCursor<'a, K, V, A> {
    pub fn key(&self) -> Option<&'a K> {
        let tree: &'a Tree<K, V, A> = self.tree;
        self.node.map(|id| &tree.node(id).key)
    }

    pub fn value(&self) -> Option<&'a V> {
        let tree: &'a Tree<K, V, A> = self.tree;
        self.node.map(|id| tree.node(id).value())
    }

    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    pub fn position(&self) -> Position {
        self.tree.position(self.node)
    }
}

impl<K, V, A: AllocStrategy> Clone for TreeCursor<'_, K, V, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, A: AllocStrategy> Copy for TreeCursor<'_, K, V, A> {}

impl<K, V, A: AllocStrategy> PartialEq for TreeCursor<'_, K, V, A> {
    fn eq(&self, other: &Self) -> bool {
        self.tree.id() == other.tree.id() && self.node == other.node
    }
}

impl<K, V, A: AllocStrategy> Eq for TreeCursor<'_, K, V, A> {}

impl<K: fmt::Debug, V: fmt::Debug, A: AllocStrategy> fmt::Debug for TreeCursor<'_, K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeCursor")
            .field("entry", &self.get())
            .finish()
    }
}

impl<'a, K, V, A: AllocStrategy> Cursor for TreeCursor<'a, K, V, A> {
    type Item = (&'a K, &'a V);

    fn get(&self) -> Option<(&'a K, &'a V)> {
        let tree: &'a Tree<K, V, A> = self.tree;
        self.node.map(|id| {
            let node = tree.node(id);
            (&node.key, node.value())
        })
    }

    fn move_next(&mut self) {
        self.tree.step_next(&mut self.node, &mut self.last);
    }

    fn move_prev(&mut self) {
        self.tree.step_prev(&mut self.node, &mut self.last);
    }
}

/// In-order cursor with mutable access to the mapped values.
pub struct TreeCursorMut<'a, K, V, A: AllocStrategy> {
    tree: &'a mut Tree<K, V, A>,
    node: Option<NodeId>,
    last: Option<NodeId>,
}

impl<'a, K, V, A: AllocStrategy> TreeCursorMut<'a, K, V, A> {
    pub(crate) fn new(tree: &'a mut Tree<K, V, A>, node: Option<NodeId>) -> Self {
        let last = match node {
            Some(_) => node,
            None => tree.last(),
        };
        Self { tree, node, last }
    }

    pub fn key(&self) -> Option<&K> {
        self.node.map(|id| &self.tree.node(id).key)
    }

    pub fn value(&self) -> Option<&V> {
        self.node.map(|id| self.tree.node(id).value())
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        match self.node {
            Some(id) => Some(self.tree.node_mut(id).value_mut()),
            None => None,
        }
    }

    pub fn get(&self) -> Option<(&K, &V)> {
        self.node.map(|id| {
            let node = self.tree.node(id);
            (&node.key, node.value())
        })
    }

    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    pub fn position(&self) -> Position {
        self.tree.position(self.node)
    }

    pub fn move_next(&mut self) {
        self.tree.step_next(&mut self.node, &mut self.last);
    }

    pub fn move_prev(&mut self) {
        self.tree.step_prev(&mut self.node, &mut self.last);
    }

    /// Read-only cursor at the same position.
    pub fn as_cursor(&self) -> TreeCursor<'_, K, V, A> {
        TreeCursor {
            tree: &*self.tree,
            node: self.node,
            last: self.last,
        }
    }
}

// =============================================================================
// Structural validation (tests)
// =============================================================================

#[cfg(test)]
impl<K, V, A: AllocStrategy> Tree<K, V, A> {
    /// Checks parent/child symmetry, reachability and slot accounting, and
    /// that `less` orders every node's left subtree before it and right
    /// subtree after it. Returns the in-order node count.
    pub(crate) fn validate(&self, less: impl Fn(&K, &K) -> bool) -> usize {
        let mut count = 0usize;
        if let Some(root) = self.root {
            assert_eq!(self.parent(root), None, "root must have no parent");
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                count += 1;
                let node = self.node(id);
                for child in [node.left, node.right].into_iter().flatten() {
                    assert_eq!(self.parent(child), Some(id), "child must link back to parent");
                    stack.push(child);
                }
            }
        }
        assert_eq!(count, self.len, "reachable nodes must match len");
        let mut free = 0usize;
        let mut next = self.free;
        while let Some(id) = next {
            free += 1;
            next = match self.slots[id.0] {
                Slot::Vacant { next_free, .. } => next_free,
                Slot::Occupied { .. } => panic!("free list reaches live slot"),
            };
        }
        assert_eq!(free + self.len, self.slots.len(), "every slot is live or free");

        let order = self.in_order();
        assert_eq!(order.len(), self.len);
        for pair in order.windows(2) {
            let (a, b) = (&self.node(pair[0]).key, &self.node(pair[1]).key);
            assert!(less(a, b), "in-order keys must be strictly increasing");
        }
        count
    }
}
