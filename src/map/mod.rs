/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

pub mod entry;
pub mod hash_trie_map;
mod small_map;

pub use self::hash_trie_map::{HashTrieMap, HashTrieMapSync, Iter, IterKeys, IterValues};
