/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Linear-probe fallback representation for maps of up to nine entries.
//!
//! Small maps are common, and a flat, linearly-scanned `Vec<Entry<K, V>>`
//! beats a hash-trie on both constant factors and memory for a handful of
//! entries. Once a tenth distinct key would be inserted, the caller
//! promotes to the trie instead.

use crate::map::entry::Entry;
use alloc::vec::Vec;

/// Maximum number of entries a [`SmallMap`] may hold before it must be
/// promoted to a hash-trie.
pub const MAX_ENTRIES: usize = 9;

/// Outcome of attempting to insert into a [`SmallMap`] that is already at
/// capacity with a brand new key: the caller (the `HashTrieMap` facade) is
/// responsible for promoting to the HAMT engine in that case.
pub enum TryPut<K, V> {
    /// The entry fit; here is the new map.
    Done(SmallMap<K, V>),
    /// The map was already at capacity and the key was new: promote.
    Overflow,
}

#[derive(Debug, Clone)]
pub struct SmallMap<K, V> {
    entries: Vec<Entry<K, V>>,
}

impl<K, V> SmallMap<K, V> {
    pub fn new() -> SmallMap<K, V> {
        SmallMap { entries: Vec::new() }
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry<K, V>] {
        &self.entries
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Entry<K, V>> {
        self.entries.iter()
    }
}

impl<K: Eq, V> SmallMap<K, V> {
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: core::borrow::Borrow<Q>,
        Q: Eq,
    {
        self.entries.iter().find(|e| e.key.borrow() == key).map(|e| &e.value)
    }

    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool
    where
        K: core::borrow::Borrow<Q>,
        Q: Eq,
    {
        self.get(key).is_some()
    }
}

impl<K: Eq, V: PartialEq> SmallMap<K, V> {
    pub fn contains_value(&self, value: &V) -> bool {
        self.entries.iter().any(|e| &e.value == value)
    }
}

impl<K: Eq + Clone, V: Clone> SmallMap<K, V> {
    /// Inserts `(key, value)`, returning `TryPut::Overflow` if the key is
    /// new and the map is already at [`MAX_ENTRIES`].
    pub fn try_put(&self, key: K, value: V) -> TryPut<K, V> {
        match self.entries.iter().position(|e| e.key == key) {
            Some(index) => {
                let mut entries = self.entries.clone();
                entries[index] = Entry::new(key, value);
                TryPut::Done(SmallMap { entries })
            }
            None if self.entries.len() < MAX_ENTRIES => {
                let mut entries = self.entries.clone();
                entries.push(Entry::new(key, value));
                TryPut::Done(SmallMap { entries })
            }
            None => TryPut::Overflow,
        }
    }

    /// Removes `key`, preserving the relative order of the remaining
    /// entries.  Returns `self` unchanged (a fresh clone) if `key` is
    /// absent.
    pub fn remove<Q: ?Sized>(&self, key: &Q) -> SmallMap<K, V>
    where
        K: core::borrow::Borrow<Q>,
        Q: Eq,
    {
        let entries: Vec<Entry<K, V>> =
            self.entries.iter().filter(|e| e.key.borrow() != key).cloned().collect();

        SmallMap { entries }
    }
}

impl<K, V> Default for SmallMap<K, V> {
    fn default() -> SmallMap<K, V> {
        SmallMap::new()
    }
}
