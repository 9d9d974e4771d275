/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

use core::fmt::Display;

/// A key-value pair stored in a map.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Entry<K, V> {
    /// The key.
    pub key: K,
    /// The value associated with the key.
    pub value: V,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: V) -> Entry<K, V> {
        Entry { key, value }
    }
}

impl<K: Display, V: Display> Display for Entry<K, V> {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(fmt, "{}: {}", self.key, self.value)
    }
}
