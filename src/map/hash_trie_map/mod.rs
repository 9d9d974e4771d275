/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The HAMT engine and the public [`HashTrieMap`] facade over it.

use crate::map::entry::Entry;
use crate::map::small_map::{SmallMap, TryPut, MAX_ENTRIES};
use crate::utils::{hash32, DefaultBuildHasher};
use alloc::boxed::Box;
use alloc::vec::Vec;
use archery::{ArcK, RcK, SharedPointer, SharedPointerKind};
use core::borrow::Borrow;
use core::fmt::Display;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FromIterator;
use core::ops::Index;

/// Number of bits of the hash consumed per trie level (32-way branching).
const BITS_PER_LEVEL: u32 = 5;

/// A bitmap node holding this many occupied slots is promoted to a dense
/// node on its next insert (so a bitmap node has at most this many slots,
/// and a dense node has at least one more).
const DENSE_PROMOTE_AT: usize = 16;

/// A dense node is demoted back to a bitmap node once its child count drops
/// to this many or fewer. Kept below `DENSE_PROMOTE_AT` so a node sitting
/// right at the boundary cannot flap between shapes on alternating
/// insert/remove of the same key.
const DENSE_DEMOTE_AT: u8 = 8;

#[inline]
const fn fragment(hash: u32, shift: u32) -> u32 {
    (hash >> shift) & 0x1F
}

#[inline]
const fn mask(frag: u32) -> u32 {
    1 << frag
}

#[inline]
fn packed_index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

/// One populated slot of a [`Node::Bitmap`]: either an inline entry or a
/// link to a child subtree. An enum rather than a nullable cell, since Rust
/// generics have no null sentinel to distinguish "empty" from "entry".
enum Slot<K, V, P: SharedPointerKind> {
    Entry(u32, SharedPointer<Entry<K, V>, P>),
    Link(SharedPointer<Node<K, V, P>, P>),
}

impl<K, V, P: SharedPointerKind> Clone for Slot<K, V, P> {
    fn clone(&self) -> Slot<K, V, P> {
        match self {
            Slot::Entry(hash, entry) => Slot::Entry(*hash, SharedPointer::clone(entry)),
            Slot::Link(node) => Slot::Link(SharedPointer::clone(node)),
        }
    }
}

/// A node of the hash array mapped trie.
///
/// Three shapes cooperate to keep the tree canonical under arbitrary
/// insert/delete sequences:
///
///   * [`Bitmap`](Node::Bitmap) — up to 16 populated slots, compressed with
///     a 32-bit occupancy bitmap.
///   * [`Dense`](Node::Dense) — 17 or more children, stored in a full
///     32-slot array indexed directly by hash fragment.
///   * [`Collision`](Node::Collision) — two or more entries whose keys
///     share a full 32-bit hash; always a leaf.
enum Node<K, V, P: SharedPointerKind> {
    Bitmap { bitmap: u32, slots: Vec<Slot<K, V, P>> },
    Dense { children: Box<[Option<SharedPointer<Node<K, V, P>, P>>; 32]>, count: u8 },
    Collision { hash: u32, entries: Vec<SharedPointer<Entry<K, V>, P>> },
}

// Manual `Clone` impl — a node only ever owns shared pointers and
// primitives, never `K`/`V` directly, so it must not require `K: Clone, V:
// Clone` the way `#[derive(Clone)]` would.
impl<K, V, P: SharedPointerKind> Clone for Node<K, V, P> {
    fn clone(&self) -> Node<K, V, P> {
        match self {
            Node::Bitmap { bitmap, slots } => Node::Bitmap { bitmap: *bitmap, slots: slots.clone() },
            Node::Dense { children, count } => Node::Dense { children: children.clone(), count: *count },
            Node::Collision { hash, entries } => {
                Node::Collision { hash: *hash, entries: entries.clone() }
            }
        }
    }
}

/// Outcome of [`Node::remove`]: either the key was absent, or it was
/// removed and the parent must unlink (`None`) or relink (`Some`) this
/// position.
enum RemoveResult<K, V, P: SharedPointerKind> {
    NotFound,
    Removed(Option<Node<K, V, P>>),
}

impl<K, V, P> Node<K, V, P>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    fn get<Q: ?Sized>(&self, key: &Q, hash: u32, shift: u32) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq,
    {
        match self {
            Node::Bitmap { bitmap, slots } => {
                let bit = mask(fragment(hash, shift));

                if bitmap & bit == 0 {
                    return None;
                }

                match &slots[packed_index(*bitmap, bit)] {
                    Slot::Link(child) => child.get(key, hash, shift + BITS_PER_LEVEL),
                    Slot::Entry(_, entry) => {
                        if entry.key.borrow() == key {
                            Some(&entry.value)
                        } else {
                            None
                        }
                    }
                }
            }
            Node::Dense { children, .. } => {
                let frag = fragment(hash, shift) as usize;

                children[frag].as_ref().and_then(|child| child.get(key, hash, shift + BITS_PER_LEVEL))
            }
            Node::Collision { hash: node_hash, entries } => {
                if hash != *node_hash {
                    return None;
                }

                entries.iter().find(|e| e.key.borrow() == key).map(|e| &e.value)
            }
        }
    }
}

impl<K, V, P> Node<K, V, P>
where
    K: Eq + Hash + Clone,
    V: Clone,
    P: SharedPointerKind,
{
    /// The smallest node holding a single entry at the given depth.
    fn singleton(shift: u32, hash: u32, key: K, value: V) -> Node<K, V, P> {
        let frag = fragment(hash, shift);
        Node::Bitmap {
            bitmap: mask(frag),
            slots: alloc::vec![Slot::Entry(hash, SharedPointer::new(Entry::new(key, value)))],
        }
    }

    /// Builds the minimal subtree holding two entries that collided at
    /// `shift`. Keeps descending one level at a time until the fragments
    /// diverge, or produces a [`Node::Collision`] if the two hashes are
    /// fully equal.
    fn pair(
        hash1: u32,
        entry1: SharedPointer<Entry<K, V>, P>,
        hash2: u32,
        entry2: SharedPointer<Entry<K, V>, P>,
        shift: u32,
    ) -> Node<K, V, P> {
        if hash1 == hash2 {
            return Node::Collision { hash: hash1, entries: alloc::vec![entry1, entry2] };
        }

        let frag1 = fragment(hash1, shift);
        let frag2 = fragment(hash2, shift);

        if frag1 == frag2 {
            let child = Node::pair(hash1, entry1, hash2, entry2, shift + BITS_PER_LEVEL);
            Node::Bitmap { bitmap: mask(frag1), slots: alloc::vec![Slot::Link(SharedPointer::new(child))] }
        } else if frag1 < frag2 {
            Node::Bitmap {
                bitmap: mask(frag1) | mask(frag2),
                slots: alloc::vec![Slot::Entry(hash1, entry1), Slot::Entry(hash2, entry2)],
            }
        } else {
            Node::Bitmap {
                bitmap: mask(frag1) | mask(frag2),
                slots: alloc::vec![Slot::Entry(hash2, entry2), Slot::Entry(hash1, entry1)],
            }
        }
    }

    /// Inserts `(key, value)`, returning the new node and `true` if the key
    /// was new (a growth flag returned alongside the node, rather than
    /// threaded through a shared mutable out-parameter).
    fn insert(&self, shift: u32, hash: u32, key: K, value: V) -> (Node<K, V, P>, bool) {
        match self {
            Node::Bitmap { bitmap, slots } => {
                let frag = fragment(hash, shift);
                let bit = mask(frag);
                let index = packed_index(*bitmap, bit);

                if bitmap & bit == 0 {
                    if slots.len() < DENSE_PROMOTE_AT {
                        let mut new_slots = slots.clone();
                        new_slots.insert(index, Slot::Entry(hash, SharedPointer::new(Entry::new(key, value))));
                        (Node::Bitmap { bitmap: bitmap | bit, slots: new_slots }, true)
                    } else {
                        (self.promote_with(frag, hash, key, value, shift), true)
                    }
                } else {
                    match &slots[index] {
                        Slot::Link(child) => {
                            let (new_child, grew) = child.insert(shift + BITS_PER_LEVEL, hash, key, value);
                            let mut new_slots = slots.clone();
                            new_slots[index] = Slot::Link(SharedPointer::new(new_child));
                            (Node::Bitmap { bitmap: *bitmap, slots: new_slots }, grew)
                        }
                        Slot::Entry(other_hash, other_entry) => {
                            if other_entry.key == key {
                                let mut new_slots = slots.clone();
                                new_slots[index] = Slot::Entry(hash, SharedPointer::new(Entry::new(key, value)));
                                (Node::Bitmap { bitmap: *bitmap, slots: new_slots }, false)
                            } else {
                                let sub = Node::pair(
                                    *other_hash,
                                    SharedPointer::clone(other_entry),
                                    hash,
                                    SharedPointer::new(Entry::new(key, value)),
                                    shift + BITS_PER_LEVEL,
                                );
                                let mut new_slots = slots.clone();
                                new_slots[index] = Slot::Link(SharedPointer::new(sub));
                                (Node::Bitmap { bitmap: *bitmap, slots: new_slots }, true)
                            }
                        }
                    }
                }
            }
            Node::Dense { children, count } => {
                let frag = fragment(hash, shift) as usize;

                match &children[frag] {
                    None => {
                        let leaf = Node::singleton(shift + BITS_PER_LEVEL, hash, key, value);
                        let mut new_children = children.clone();
                        new_children[frag] = Some(SharedPointer::new(leaf));
                        (Node::Dense { children: new_children, count: count + 1 }, true)
                    }
                    Some(child) => {
                        let (new_child, grew) = child.insert(shift + BITS_PER_LEVEL, hash, key, value);
                        let mut new_children = children.clone();
                        new_children[frag] = Some(SharedPointer::new(new_child));
                        (Node::Dense { children: new_children, count: *count }, grew)
                    }
                }
            }
            Node::Collision { hash: node_hash, entries } => {
                if hash == *node_hash {
                    match entries.iter().position(|e| e.key == key) {
                        Some(i) => {
                            let mut new_entries = entries.clone();
                            new_entries[i] = SharedPointer::new(Entry::new(key, value));
                            (Node::Collision { hash: *node_hash, entries: new_entries }, false)
                        }
                        None => {
                            let mut new_entries = entries.clone();
                            new_entries.push(SharedPointer::new(Entry::new(key, value)));
                            (Node::Collision { hash: *node_hash, entries: new_entries }, true)
                        }
                    }
                } else {
                    let frag = fragment(*node_hash, shift);
                    let wrapper = Node::Bitmap {
                        bitmap: mask(frag),
                        slots: alloc::vec![Slot::Link(SharedPointer::new(self.clone()))],
                    };

                    wrapper.insert(shift, hash, key, value)
                }
            }
        }
    }

    /// Promotes a full (`>= 16`-slot) bitmap node to a dense node while
    /// inserting a new entry at `frag`.
    fn promote_with(&self, frag: u32, hash: u32, key: K, value: V, shift: u32) -> Node<K, V, P> {
        let (bitmap, slots) = match self {
            Node::Bitmap { bitmap, slots } => (*bitmap, slots),
            _ => unreachable!("promote_with is only called on bitmap nodes"),
        };

        let mut children: Box<[Option<SharedPointer<Node<K, V, P>, P>>; 32]> =
            Box::new(Default::default());
        let mut count = 0u8;

        for i in 0..32u32 {
            let bit = mask(i);
            if bitmap & bit == 0 {
                continue;
            }

            let slot = &slots[packed_index(bitmap, bit)];
            let child = match slot {
                Slot::Link(node) => SharedPointer::clone(node),
                Slot::Entry(slot_hash, entry) => SharedPointer::new(Node::Bitmap {
                    bitmap: mask(fragment(*slot_hash, shift + BITS_PER_LEVEL)),
                    slots: alloc::vec![Slot::Entry(*slot_hash, SharedPointer::clone(entry))],
                }),
            };

            children[i as usize] = Some(child);
            count += 1;
        }

        children[frag as usize] =
            Some(SharedPointer::new(Node::singleton(shift + BITS_PER_LEVEL, hash, key, value)));
        count += 1;

        Node::Dense { children, count }
    }

    fn remove<Q: ?Sized>(&self, key: &Q, hash: u32, shift: u32) -> RemoveResult<K, V, P>
    where
        K: Borrow<Q>,
        Q: Eq,
    {
        match self {
            Node::Bitmap { bitmap, slots } => {
                let bit = mask(fragment(hash, shift));

                if bitmap & bit == 0 {
                    return RemoveResult::NotFound;
                }

                let index = packed_index(*bitmap, bit);

                match &slots[index] {
                    Slot::Link(child) => match child.remove(key, hash, shift + BITS_PER_LEVEL) {
                        RemoveResult::NotFound => RemoveResult::NotFound,
                        RemoveResult::Removed(None) => {
                            if slots.len() == 1 {
                                RemoveResult::Removed(None)
                            } else {
                                let mut new_slots = slots.clone();
                                new_slots.remove(index);
                                RemoveResult::Removed(Some(Node::Bitmap {
                                    bitmap: bitmap & !bit,
                                    slots: new_slots,
                                }))
                            }
                        }
                        RemoveResult::Removed(Some(new_child)) => {
                            let mut new_slots = slots.clone();
                            new_slots[index] = Slot::Link(SharedPointer::new(new_child));
                            RemoveResult::Removed(Some(Node::Bitmap { bitmap: *bitmap, slots: new_slots }))
                        }
                    },
                    Slot::Entry(_, entry) => {
                        if entry.key.borrow() != key {
                            return RemoveResult::NotFound;
                        }

                        if slots.len() == 1 {
                            RemoveResult::Removed(None)
                        } else {
                            let mut new_slots = slots.clone();
                            new_slots.remove(index);
                            RemoveResult::Removed(Some(Node::Bitmap { bitmap: bitmap & !bit, slots: new_slots }))
                        }
                    }
                }
            }
            Node::Dense { children, count } => {
                let frag = fragment(hash, shift) as usize;

                match &children[frag] {
                    None => RemoveResult::NotFound,
                    Some(child) => match child.remove(key, hash, shift + BITS_PER_LEVEL) {
                        RemoveResult::NotFound => RemoveResult::NotFound,
                        RemoveResult::Removed(None) => {
                            let new_count = count - 1;

                            if new_count <= DENSE_DEMOTE_AT {
                                RemoveResult::Removed(Some(Self::demote(children, frag)))
                            } else {
                                let mut new_children = children.clone();
                                new_children[frag] = None;
                                RemoveResult::Removed(Some(Node::Dense {
                                    children: new_children,
                                    count: new_count,
                                }))
                            }
                        }
                        RemoveResult::Removed(Some(new_child)) => {
                            let mut new_children = children.clone();
                            new_children[frag] = Some(SharedPointer::new(new_child));
                            RemoveResult::Removed(Some(Node::Dense { children: new_children, count: *count }))
                        }
                    },
                }
            }
            Node::Collision { hash: node_hash, entries } => {
                if hash != *node_hash {
                    return RemoveResult::NotFound;
                }

                match entries.iter().position(|e| e.key.borrow() == key) {
                    None => RemoveResult::NotFound,
                    Some(i) => {
                        if entries.len() == 1 {
                            RemoveResult::Removed(None)
                        } else {
                            let mut new_entries = entries.clone();
                            new_entries.remove(i);
                            RemoveResult::Removed(Some(Node::Collision { hash: *node_hash, entries: new_entries }))
                        }
                    }
                }
            }
        }
    }

    /// Demotes a dense node (down to `DENSE_DEMOTE_AT` or fewer children,
    /// minus the one being unlinked at `removed_frag`) to a bitmap node.
    ///
    /// Every surviving child becomes a [`Slot::Link`] pushed in ascending
    /// fragment order, so its packed index always matches the bitmap's
    /// popcount invariant by construction, with no separate bookkeeping
    /// pass needed to keep slot order and bitmap bits in sync.
    fn demote(
        children: &[Option<SharedPointer<Node<K, V, P>, P>>; 32],
        removed_frag: usize,
    ) -> Node<K, V, P> {
        let mut bitmap = 0u32;
        let mut slots = Vec::new();

        for (i, child) in children.iter().enumerate() {
            if i == removed_frag {
                continue;
            }

            if let Some(child) = child {
                bitmap |= mask(i as u32);
                slots.push(Slot::Link(SharedPointer::clone(child)));
            }
        }

        Node::Bitmap { bitmap, slots }
    }
}

/// A depth-first iterator over a node's entries, using an explicit stack of
/// `(node, cursor)` frames rather than recursion so it can be resumed one
/// entry at a time from `Iterator::next`.
enum Frame<'a, K, V, P: SharedPointerKind> {
    Bitmap(core::slice::Iter<'a, Slot<K, V, P>>),
    Dense(core::slice::Iter<'a, Option<SharedPointer<Node<K, V, P>, P>>>),
    Collision(core::slice::Iter<'a, SharedPointer<Entry<K, V>, P>>),
}

struct HamtIter<'a, K, V, P: SharedPointerKind> {
    stack: Vec<Frame<'a, K, V, P>>,
}

impl<'a, K, V, P: SharedPointerKind> HamtIter<'a, K, V, P> {
    fn new(root: Option<&'a Node<K, V, P>>) -> HamtIter<'a, K, V, P> {
        let mut iter = HamtIter { stack: Vec::new() };

        if let Some(node) = root {
            iter.push(node);
        }

        iter
    }

    fn push(&mut self, node: &'a Node<K, V, P>) {
        let frame = match node {
            Node::Bitmap { slots, .. } => Frame::Bitmap(slots.iter()),
            Node::Dense { children, .. } => Frame::Dense(children.iter()),
            Node::Collision { entries, .. } => Frame::Collision(entries.iter()),
        };

        self.stack.push(frame);
    }
}

impl<'a, K, V, P: SharedPointerKind> Iterator for HamtIter<'a, K, V, P> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<&'a Entry<K, V>> {
        loop {
            let top = self.stack.last_mut()?;

            match top {
                Frame::Bitmap(iter) => match iter.next() {
                    None => {
                        self.stack.pop();
                    }
                    Some(Slot::Entry(_, entry)) => return Some(entry),
                    Some(Slot::Link(child)) => {
                        let child: &'a Node<K, V, P> = child;
                        self.push(child);
                    }
                },
                Frame::Dense(iter) => match iter.next() {
                    None => {
                        self.stack.pop();
                    }
                    Some(None) => {}
                    Some(Some(child)) => {
                        let child: &'a Node<K, V, P> = child;
                        self.push(child);
                    }
                },
                Frame::Collision(iter) => match iter.next() {
                    None => {
                        self.stack.pop();
                    }
                    Some(entry) => return Some(entry),
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public facade
// ---------------------------------------------------------------------------

enum Kind<K, V, P: SharedPointerKind> {
    Small(SmallMap<K, V>),
    Hamt { root: Option<SharedPointer<Node<K, V, P>, P>>, size: usize },
}

impl<K, V, P: SharedPointerKind> Clone for Kind<K, V, P>
where
    K: Clone,
    V: Clone,
{
    fn clone(&self) -> Kind<K, V, P> {
        match self {
            Kind::Small(sm) => Kind::Small(sm.clone()),
            Kind::Hamt { root, size } => Kind::Hamt { root: root.clone(), size: *size },
        }
    }
}

/// A persistent map with structural sharing, backed by a hash array mapped
/// trie, with an inline linear-scan representation for maps of up to nine
/// entries.
///
/// # Complexity
///
/// Let *n* be the number of elements in the map.
///
/// | Operation | Average | Worst case |
/// |---|---:|---:|
/// | `new()` | Θ(1) | Θ(1) |
/// | `get()` | Θ(1) | Θ(log₃₂ n) |
/// | `insert()` | Θ(1) | Θ(log₃₂ n) |
/// | `remove()` | Θ(1) | Θ(log₃₂ n) |
/// | `size()` | Θ(1) | Θ(1) |
/// | `clone()` | Θ(1) | Θ(1) |
/// | iterator creation | Θ(1) | Θ(1) |
/// | iterator full | Θ(n) | Θ(n) |
pub struct HashTrieMap<K, V, P = RcK, H = DefaultBuildHasher>
where
    P: SharedPointerKind,
{
    kind: Kind<K, V, P>,
    hasher_builder: H,
}

/// A [`HashTrieMap`] that can be shared across threads (backed by `Arc`
/// instead of `Rc`).
pub type HashTrieMapSync<K, V, H = DefaultBuildHasher> = HashTrieMap<K, V, ArcK, H>;

impl<K, V> HashTrieMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> HashTrieMap<K, V> {
        HashTrieMap::new_with_hasher(DefaultBuildHasher::default())
    }
}

impl<K, V> HashTrieMapSync<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map backed by `Arc`.
    #[must_use]
    pub fn new_sync() -> HashTrieMapSync<K, V> {
        HashTrieMap::new_with_hasher(DefaultBuildHasher::default())
    }
}

impl<K, V, P, H> HashTrieMap<K, V, P, H>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    /// Creates an empty map using the given hasher builder.
    #[must_use]
    pub fn new_with_hasher(hasher_builder: H) -> HashTrieMap<K, V, P, H> {
        HashTrieMap { kind: Kind::Small(SmallMap::new()), hasher_builder }
    }

    /// Returns the number of key-value pairs in the map.
    #[must_use]
    pub fn size(&self) -> usize {
        match &self.kind {
            Kind::Small(sm) => sm.size(),
            Kind::Hamt { size, .. } => *size,
        }
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<K, V, P, H> HashTrieMap<K, V, P, H>
where
    K: Eq + Hash,
    P: SharedPointerKind,
    H: BuildHasher,
{
    /// Returns a reference to the value associated with `key`, or `None` if
    /// the key is absent.
    #[must_use]
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        match &self.kind {
            Kind::Small(sm) => sm.get(key),
            Kind::Hamt { root, .. } => {
                let hash = hash32(key, &self.hasher_builder);
                root.as_ref().and_then(|node| node.get(key, hash, 0))
            }
        }
    }

    /// Returns `true` if the map contains `key`.
    #[must_use]
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.get(key).is_some()
    }
}

impl<K, V, P, H> HashTrieMap<K, V, P, H>
where
    K: Eq + Hash,
    P: SharedPointerKind,
    V: PartialEq,
{
    /// Returns `true` if some key maps to `value`.  Linear in the size of
    /// the map.
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool {
        match &self.kind {
            Kind::Small(sm) => sm.contains_value(value),
            Kind::Hamt { root, .. } => HamtIter::new(root.as_deref()).any(|entry| &entry.value == value),
        }
    }
}

impl<K, V, P, H> HashTrieMap<K, V, P, H>
where
    K: Eq + Hash + Clone,
    V: Clone,
    P: SharedPointerKind,
    H: BuildHasher + Clone,
{
    /// Returns a new map with `(key, value)` inserted, replacing any
    /// previous value for `key`.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> HashTrieMap<K, V, P, H> {
        let kind = match &self.kind {
            Kind::Small(small) => match small.try_put(key.clone(), value.clone()) {
                TryPut::Done(new_small) => Kind::Small(new_small),
                TryPut::Overflow => self.promote_and_insert(small, key, value),
            },
            Kind::Hamt { root, size } => {
                let hash = hash32(&key, &self.hasher_builder);
                let (new_root, grew) = match root {
                    None => (Node::singleton(0, hash, key, value), true),
                    Some(node) => node.insert(0, hash, key, value),
                };

                Kind::Hamt {
                    root: Some(SharedPointer::new(new_root)),
                    size: if grew { size + 1 } else { *size },
                }
            }
        };

        HashTrieMap { kind, hasher_builder: self.hasher_builder.clone() }
    }

    fn promote_and_insert(&self, small: &SmallMap<K, V>, key: K, value: V) -> Kind<K, V, P> {
        let mut root: Option<Node<K, V, P>> = None;

        for entry in small.entries() {
            let hash = hash32(&entry.key, &self.hasher_builder);

            root = Some(match root {
                None => Node::singleton(0, hash, entry.key.clone(), entry.value.clone()),
                Some(node) => node.insert(0, hash, entry.key.clone(), entry.value.clone()).0,
            });
        }

        let hash = hash32(&key, &self.hasher_builder);
        let final_root = match root {
            None => Node::singleton(0, hash, key, value),
            Some(node) => node.insert(0, hash, key, value).0,
        };

        Kind::Hamt { root: Some(SharedPointer::new(final_root)), size: MAX_ENTRIES + 1 }
    }

    /// Returns a new map with `key` removed, or an equivalent clone of
    /// `self` if `key` was absent.
    #[must_use]
    pub fn remove<Q: ?Sized>(&self, key: &Q) -> HashTrieMap<K, V, P, H>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let kind = match &self.kind {
            Kind::Small(small) => Kind::Small(small.remove(key)),
            Kind::Hamt { root, size } => match root {
                None => Kind::Hamt { root: None, size: 0 },
                Some(node) => {
                    let hash = hash32(key, &self.hasher_builder);

                    match node.remove(key, hash, 0) {
                        RemoveResult::NotFound => {
                            Kind::Hamt { root: Some(SharedPointer::clone(node)), size: *size }
                        }
                        RemoveResult::Removed(None) => Kind::Hamt { root: None, size: size - 1 },
                        RemoveResult::Removed(Some(new_node)) => {
                            Kind::Hamt { root: Some(SharedPointer::new(new_node)), size: size - 1 }
                        }
                    }
                }
            },
        };

        HashTrieMap { kind, hasher_builder: self.hasher_builder.clone() }
    }
}

impl<K, V, P, H> HashTrieMap<K, V, P, H>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    /// Returns an iterator over `(&K, &V)` pairs, in some deterministic but
    /// otherwise unspecified order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        match &self.kind {
            Kind::Small(sm) => Iter::Small(sm.iter()),
            Kind::Hamt { root, .. } => Iter::Hamt(HamtIter::new(root.as_deref())),
        }
    }

    /// Returns an iterator over the map's keys.
    #[must_use]
    pub fn keys(&self) -> IterKeys<'_, K, V, P> {
        self.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over the map's values.
    #[must_use]
    pub fn values(&self) -> IterValues<'_, K, V, P> {
        self.iter().map(|(_, v)| v)
    }
}

/// An iterator over `(&K, &V)` pairs of a [`HashTrieMap`].
pub enum Iter<'a, K, V, P: SharedPointerKind = RcK> {
    Small(core::slice::Iter<'a, Entry<K, V>>),
    Hamt(HamtIter<'a, K, V, P>),
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        match self {
            Iter::Small(iter) => iter.next().map(|e| (&e.key, &e.value)),
            Iter::Hamt(iter) => iter.next().map(|e| (&e.key, &e.value)),
        }
    }
}

/// An iterator over the keys of a [`HashTrieMap`].
pub type IterKeys<'a, K, V, P = RcK> = core::iter::Map<Iter<'a, K, V, P>, fn((&'a K, &'a V)) -> &'a K>;
/// An iterator over the values of a [`HashTrieMap`].
pub type IterValues<'a, K, V, P = RcK> = core::iter::Map<Iter<'a, K, V, P>, fn((&'a K, &'a V)) -> &'a V>;

impl<K, V, P, H> Clone for HashTrieMap<K, V, P, H>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
    H: Clone,
{
    fn clone(&self) -> HashTrieMap<K, V, P, H> {
        HashTrieMap { kind: self.kind.clone(), hasher_builder: self.hasher_builder.clone() }
    }
}

impl<K, V, P, H> Default for HashTrieMap<K, V, P, H>
where
    K: Eq + Hash,
    P: SharedPointerKind,
    H: Default,
{
    fn default() -> HashTrieMap<K, V, P, H> {
        HashTrieMap { kind: Kind::Small(SmallMap::new()), hasher_builder: H::default() }
    }
}

impl<'a, K, Q: ?Sized, V, P, H> Index<&'a Q> for HashTrieMap<K, V, P, H>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Hash + Eq,
    P: SharedPointerKind,
    H: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, P, H> PartialEq for HashTrieMap<K, V, P, H>
where
    K: Eq + Hash,
    V: PartialEq,
    P: SharedPointerKind,
    H: BuildHasher,
{
    fn eq(&self, other: &HashTrieMap<K, V, P, H>) -> bool {
        self.size() == other.size() && self.iter().all(|(k, v)| other.get(k).map_or(false, |v2| v == v2))
    }
}

impl<K, V, P, H> Eq for HashTrieMap<K, V, P, H>
where
    K: Eq + Hash,
    V: Eq,
    P: SharedPointerKind,
    H: BuildHasher,
{
}

impl<K, V, P, H> Display for HashTrieMap<K, V, P, H>
where
    K: Eq + Hash + Display,
    V: Display,
    P: SharedPointerKind,
{
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt.write_str("{")?;

        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                fmt.write_str(", ")?;
            }
            k.fmt(fmt)?;
            fmt.write_str(": ")?;
            v.fmt(fmt)?;
        }

        fmt.write_str("}")
    }
}

impl<K, V, P, H> core::fmt::Debug for HashTrieMap<K, V, P, H>
where
    K: Eq + Hash + core::fmt::Debug,
    V: core::fmt::Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, P, H> IntoIterator for &'a HashTrieMap<K, V, P, H>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Iter<'a, K, V, P> {
        self.iter()
    }
}

impl<K, V, P, H> FromIterator<(K, V)> for HashTrieMap<K, V, P, H>
where
    K: Eq + Hash + Clone,
    V: Clone,
    P: SharedPointerKind,
    H: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(into_iter: I) -> HashTrieMap<K, V, P, H> {
        let mut map = HashTrieMap::new_with_hasher(H::default());

        for (k, v) in into_iter {
            map = map.insert(k, v);
        }

        map
    }
}

impl<K, V, P, H> Extend<(K, V)> for HashTrieMap<K, V, P, H>
where
    K: Eq + Hash + Clone,
    V: Clone,
    P: SharedPointerKind,
    H: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            *self = self.insert(k, v);
        }
    }
}

/// Creates a [`HashTrieMap`] containing the given key-value pairs:
///
/// ```
/// use percolate::HashTrieMap;
/// # use percolate::map;
///
/// let m = map!{1 => "one", 2 => "two", 3 => "three"};
///
/// assert_eq!(m, HashTrieMap::new().insert(1, "one").insert(2, "two").insert(3, "three"));
/// ```
#[macro_export]
macro_rules! map {
    ($($k:expr => $v:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut m = $crate::HashTrieMap::new();
        $( m = m.insert($k, $v); )*
        m
    }};
}

/// Creates a [`HashTrieMapSync`] containing the given key-value pairs.
#[macro_export]
macro_rules! map_sync {
    ($($k:expr => $v:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut m = $crate::HashTrieMapSync::new_sync();
        $( m = m.insert($k, $v); )*
        m
    }};
}

#[cfg(feature = "serde")]
pub mod serde {
    use super::*;
    use ::serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use ::serde::ser::{Serialize, Serializer};
    use core::marker::PhantomData;

    impl<K, V, P, H> Serialize for HashTrieMap<K, V, P, H>
    where
        K: Eq + Hash + Serialize,
        V: Serialize,
        P: SharedPointerKind,
    {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_map(self.iter())
        }
    }

    impl<'de, K, V, P, H> Deserialize<'de> for HashTrieMap<K, V, P, H>
    where
        K: Eq + Hash + Clone + Deserialize<'de>,
        V: Clone + Deserialize<'de>,
        P: SharedPointerKind,
        H: BuildHasher + Clone + Default,
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<HashTrieMap<K, V, P, H>, D::Error> {
            deserializer.deserialize_map(HashTrieMapVisitor {
                _phantom_entry: PhantomData,
                _phantom_h: PhantomData,
                _phantom_p: PhantomData,
            })
        }
    }

    struct HashTrieMapVisitor<K, V, P, H> {
        _phantom_entry: PhantomData<(K, V)>,
        _phantom_h: PhantomData<H>,
        _phantom_p: PhantomData<P>,
    }

    impl<'de, K, V, P, H> Visitor<'de> for HashTrieMapVisitor<K, V, P, H>
    where
        K: Eq + Hash + Clone + Deserialize<'de>,
        V: Clone + Deserialize<'de>,
        P: SharedPointerKind,
        H: BuildHasher + Clone + Default,
    {
        type Value = HashTrieMap<K, V, P, H>;

        fn expecting(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            formatter.write_str("a map")
        }

        fn visit_map<A>(self, mut map: A) -> Result<HashTrieMap<K, V, P, H>, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut result = HashTrieMap::new_with_hasher(H::default());

            while let Some((k, v)) = map.next_entry()? {
                result = result.insert(k, v);
            }

            Ok(result)
        }
    }
}

#[cfg(test)]
mod test;
