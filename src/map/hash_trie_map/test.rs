/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

use super::*;
use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::hash::Hasher;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[test]
fn new_map_is_empty() {
    let m: HashTrieMap<i32, i32> = HashTrieMap::new();

    assert_eq!(m.size(), 0);
    assert!(m.is_empty());
}

#[test]
fn get_after_put_returns_the_value() {
    let m = HashTrieMap::new().insert("a", 1).insert("b", 2);

    assert_eq!(m.get("a"), Some(&1));
    assert_eq!(m.get("b"), Some(&2));
    assert_eq!(m.get("c"), None);
}

#[test]
fn put_with_existing_key_replaces_the_value_without_changing_size() {
    let m = HashTrieMap::new().insert("a", 1);
    let m2 = m.insert("a", 2);

    assert_eq!(m2.size(), 1);
    assert_eq!(m2.get("a"), Some(&2));
    assert_eq!(m.get("a"), Some(&1), "the original map must be untouched");
}

#[test]
fn get_after_remove_returns_none() {
    let m = HashTrieMap::new().insert("a", 1).insert("b", 2);
    let m2 = m.remove("a");

    assert_eq!(m2.get("a"), None);
    assert_eq!(m2.get("b"), Some(&2));
    assert_eq!(m.get("a"), Some(&1), "removing from m2 must not affect m");
}

#[test]
fn remove_of_absent_key_is_a_no_op() {
    let m = HashTrieMap::new().insert("a", 1);
    let m2 = m.remove("z");

    assert_eq!(m2.size(), 1);
    assert_eq!(m2.get("a"), Some(&1));
}

#[test]
fn size_tracks_distinct_keys_only() {
    let m = HashTrieMap::new().insert(1, "a").insert(2, "b").insert(1, "c");

    assert_eq!(m.size(), 2);
}

// S1: small-map promotion. Nine inserts stay in the linear fallback; the
// tenth key promotes to the trie. Both representations must answer the
// same queries identically.
#[test]
fn s1_small_map_promotes_to_hamt_at_the_tenth_distinct_key() {
    let mut m = HashTrieMap::new();

    for i in 0..9 {
        m = m.insert(i, i * 10);
    }

    assert_eq!(m.size(), 9);

    for i in 0..9 {
        assert_eq!(m.get(&i), Some(&(i * 10)));
    }

    m = m.insert(9, 90);

    assert_eq!(m.size(), 10);

    for i in 0..10 {
        assert_eq!(m.get(&i), Some(&(i * 10)));
    }
}

// S2: HAMT stress test. 8192 odd keys inserted and removed in a fixed-seed
// shuffled order; every prefix of the sequence must be internally
// consistent.
#[test]
fn s2_hamt_survives_a_large_shuffled_insert_remove_sequence() {
    let keys: Vec<i64> = (0..8192i64).map(|i| 2 * i + 1).collect();

    let mut insert_order = keys.clone();
    let mut rng = StdRng::seed_from_u64(42);
    insert_order.shuffle(&mut rng);

    let mut m = HashTrieMap::new();
    for &k in &insert_order {
        m = m.insert(k, k * 3);
    }

    assert_eq!(m.size(), keys.len());
    for &k in &keys {
        assert_eq!(m.get(&k), Some(&(k * 3)));
    }

    let mut remove_order = keys.clone();
    remove_order.shuffle(&mut rng);

    let mut remaining: BTreeSet<i64> = keys.iter().copied().collect();
    for (i, &k) in remove_order.iter().enumerate() {
        m = m.remove(&k);
        remaining.remove(&k);

        if i % 512 == 0 {
            assert_eq!(m.size(), remaining.len());
            for r in &remaining {
                assert_eq!(m.get(r), Some(&(r * 3)));
            }
        }
    }

    assert_eq!(m.size(), 0);
    assert!(m.is_empty());
}

// A key type whose hash collides for every value, forcing every entry into
// a single collision chain regardless of branching factor.
#[derive(Clone, Eq, PartialEq, Debug)]
struct ConstantHash(i32);

impl core::hash::Hash for ConstantHash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(0);
    }
}

// S3: hash collision stress. All keys land in one collision node; get,
// insert and remove must still behave like an ordinary map.
#[test]
fn s3_hash_collisions_are_resolved_by_equality() {
    let mut m = HashTrieMap::new();

    for i in 0..64 {
        m = m.insert(ConstantHash(i), i);
    }

    assert_eq!(m.size(), 64);

    for i in 0..64 {
        assert_eq!(m.get(&ConstantHash(i)), Some(&i));
    }

    m = m.insert(ConstantHash(10), 1000);
    assert_eq!(m.size(), 64);
    assert_eq!(m.get(&ConstantHash(10)), Some(&1000));

    m = m.remove(&ConstantHash(10));
    assert_eq!(m.size(), 63);
    assert_eq!(m.get(&ConstantHash(10)), None);
    assert_eq!(m.get(&ConstantHash(11)), Some(&11));
}

#[test]
fn iteration_visits_every_entry_exactly_once() {
    let mut m = HashTrieMap::new();
    for i in 0..500 {
        m = m.insert(i, i.to_string());
    }

    let mut seen: Vec<i32> = m.keys().copied().collect();
    seen.sort_unstable();

    assert_eq!(seen, (0..500).collect::<Vec<_>>());
}

#[test]
fn clone_is_cheap_and_independent() {
    let m = HashTrieMap::new().insert(1, "a").insert(2, "b");
    let m2 = m.clone();
    let m3 = m2.insert(3, "c");

    assert_eq!(m.size(), 2);
    assert_eq!(m2.size(), 2);
    assert_eq!(m3.size(), 3);
}

#[test]
fn equality_compares_contents_not_representation() {
    let small = HashTrieMap::new().insert(1, "a".to_string()).insert(2, "b".to_string());

    let mut large = HashTrieMap::new();
    for i in 0..100 {
        large = large.insert(i, i.to_string());
    }
    let mut large_trimmed = large.clone();
    for i in (0..100).filter(|&i| i != 1 && i != 2) {
        large_trimmed = large_trimmed.remove(&i);
    }
    large_trimmed = large_trimmed.insert(1, String::from("a"));
    large_trimmed = large_trimmed.insert(2, String::from("b"));

    assert_eq!(small, large_trimmed);
}

#[test]
fn map_macro_builds_the_same_map_as_repeated_insert() {
    let m = crate::map! {1 => "one", 2 => "two", 3 => "three"};

    assert_eq!(m, HashTrieMap::new().insert(1, "one").insert(2, "two").insert(3, "three"));
}

#[test]
fn index_returns_the_value_for_a_present_key() {
    let m = HashTrieMap::new().insert("a", 1);

    assert_eq!(m["a"], 1);
}

#[test]
#[should_panic(expected = "no entry found for key")]
fn index_panics_on_missing_key() {
    let m: HashTrieMap<&str, i32> = HashTrieMap::new();
    let _ = m["missing"];
}

#[cfg(feature = "serde")]
#[test]
fn serde_round_trip_preserves_contents() {
    let m = HashTrieMap::new().insert("a".to_string(), 1).insert("b".to_string(), 2).insert("c".to_string(), 3);

    let json = serde_json::to_string(&m).unwrap();
    let deserialized: HashTrieMap<String, i32> = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized, m);
}
