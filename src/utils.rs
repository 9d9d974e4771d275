/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Small helpers shared by the map and the vector.

use core::hash::{BuildHasher, Hash, Hasher};

/// The hash-builder used when the caller does not supply one.
///
/// `no_std` has no `std::collections::hash_map::RandomState`, so we fall
/// back to a fixed-seed [FNV-1a](https://en.wikipedia.org/wiki/Fowler%E2%80%93Noll%E2%80%93Vo_hash_function)
/// hasher.  This is not a security-sensitive hash: it only needs to be
/// deterministic and well-distributed.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultBuildHasher;

impl BuildHasher for DefaultBuildHasher {
    type Hasher = FnvHasher;

    fn build_hasher(&self) -> FnvHasher {
        FnvHasher(0xcbf2_9ce4_8422_2325)
    }
}

/// A minimal FNV-1a hasher.
#[derive(Debug)]
pub struct FnvHasher(u64);

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(PRIME);
        }
    }
}

/// Hashes `value` with `hasher_builder` and folds the result down to a
/// 32-bit hash, then applies the `31 + rawHash` bias so that `hash(null) ==
/// 0` maps to a stored hash of `31` (distinguishing it from an all-zero
/// chunk path produced by a non-null key).
///
/// The fold (`x ^ (x >> 32)`) keeps the low bits sensitive to the whole
/// 64-bit digest rather than silently truncating it.
#[inline]
pub fn hash32<T: ?Sized + Hash, H: BuildHasher>(value: &T, hasher_builder: &H) -> u32 {
    let mut hasher = hasher_builder.build_hasher();
    value.hash(&mut hasher);
    let raw = hasher.finish();
    let folded = (raw ^ (raw >> 32)) as u32;
    31u32.wrapping_add(folded)
}
