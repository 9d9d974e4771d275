/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Persistent, immutable data structures with structural sharing.
//!
//! A "mutating" method on a value in this crate never mutates that value in
//! place.  It returns a new value that logically reflects the change, but
//! shares whatever internal structure it safely can with the value it was
//! called on.  Old references stay valid and keep observing what they
//! always observed — see the [`HashTrieMap`] and [`Vector`] documentation
//! for the precise sharing guarantees of each structure.
//!
//! # Data structures
//!
//! | Structure | Description |
//! |---|---|
//! | [`HashTrieMap`] | A map backed by a hash array mapped trie (HAMT). |
//! | [`Vector`] | An index sequence backed by a 32-way branching radix trie with a tail buffer. |
//!
//! Both structures are generic over the pointer kind used to share nodes
//! (see the [`archery`] crate): the default uses [`Rc`](alloc::rc::Rc), and
//! a `*Sync` type alias of each structure uses [`Arc`](alloc::sync::Arc) so
//! that values can be shared (read-only) across threads.
#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(any(test, feature = "serde"))]
extern crate std;

mod map;
mod utils;
mod vector;

pub use crate::map::entry::Entry;
pub use crate::map::{HashTrieMap, HashTrieMapSync, Iter as MapIter, IterKeys, IterValues};
pub use crate::vector::{Iter as VectorIter, Vector, VectorSync};

#[cfg(feature = "serde")]
pub mod serde {
    //! `serde` support, enabled by the `serde` feature.
    pub use crate::map::hash_trie_map::serde as map;
    pub use crate::vector::serde as vector;
}
