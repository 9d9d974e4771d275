/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

use super::*;
use alloc::vec::Vec;

#[test]
fn new_vector_is_empty() {
    let v: Vector<i32> = Vector::new();

    assert_eq!(v.size(), 0);
    assert!(v.is_empty());
    assert_eq!(v.get(0), None);
}

#[test]
fn push_back_appends_in_order() {
    let v = Vector::new().push_back(1).push_back(2).push_back(3);

    assert_eq!(v.size(), 3);
    assert_eq!(v.get(0), Some(&1));
    assert_eq!(v.get(1), Some(&2));
    assert_eq!(v.get(2), Some(&3));
    assert_eq!(v.get(3), None);
    assert_eq!(v.first(), Some(&1));
    assert_eq!(v.last(), Some(&3));
}

#[test]
fn push_back_does_not_mutate_the_original() {
    let v = Vector::new().push_back(1).push_back(2);
    let v2 = v.push_back(3);

    assert_eq!(v.size(), 2);
    assert_eq!(v2.size(), 3);
    assert_eq!(v.get(2), None);
    assert_eq!(v2.get(2), Some(&3));
}

// S4: vector boundary. Filling the tail exactly to a leaf boundary and one
// past it must preserve order and random access at the edges.
#[test]
fn s4_vector_survives_a_leaf_boundary_crossing() {
    let v: Vector<i32> = (1..33).collect();

    assert_eq!(v.size(), 32);

    let seen: Vec<i32> = v.iter().copied().collect();
    assert_eq!(seen, (1..33).collect::<Vec<_>>());

    let v2 = v.push_back(33);
    assert_eq!(v2.size(), 33);
    assert_eq!(v2.get(31), Some(&32));
    assert_eq!(v2.get(32), Some(&33));
}

// S5: vector overwrite. Setting a single index must leave every other
// index untouched and leave the original vector unchanged.
#[test]
fn s5_set_replaces_a_single_index_in_place() {
    let v: Vector<i32> = (1..64).collect();

    let v2 = v.set(60, 100).unwrap();

    assert_eq!(v2.size(), v.size());
    assert_eq!(v2.get(60), Some(&100));
    assert_eq!(v.get(60), Some(&60));

    for i in 0..63 {
        if i != 60 {
            assert_eq!(v2.get(i), v.get(i), "index {i} must be unchanged");
        }
    }
}

#[test]
fn set_out_of_bounds_returns_none() {
    let v: Vector<i32> = (0..5).collect();

    assert_eq!(v.set(5, 99), None);
    assert_eq!(v.set(100, 99), None);
}

// S6: vector grow across roots. Appending one element at a time past
// several root-growth boundaries must keep every previously-appended
// element addressable at its original index.
#[test]
fn s6_vector_grows_across_multiple_root_levels() {
    let mut v: Vector<i64> = Vector::new();

    for i in 0..1024i64 {
        v = v.push_back(i + 1);

        for j in 0..=i {
            assert_eq!(v.get(j as usize), Some(&(j + 1)), "prefix length {} broke index {j}", i + 1);
        }
    }

    assert_eq!(v.size(), 1024);
}

#[test]
fn pop_back_shrinks_and_mirrors_push_back() {
    let v: Vector<i32> = (0..1024).collect();
    let mut shrinking = v.clone();

    for expected_size in (0..1024).rev() {
        shrinking = shrinking.pop_back().unwrap();
        assert_eq!(shrinking.size(), expected_size);

        for i in 0..expected_size {
            assert_eq!(shrinking.get(i), Some(&(i as i32)));
        }
    }

    assert!(shrinking.is_empty());
    assert_eq!(shrinking.pop_back(), None);
}

#[test]
fn pop_back_across_the_single_leaf_root_boundary() {
    let v: Vector<i32> = (0..33).collect();
    assert_eq!(v.size(), 33);

    let v2 = v.pop_back().unwrap();
    assert_eq!(v2.size(), 32);
    for i in 0..32 {
        assert_eq!(v2.get(i), Some(&(i as i32)));
    }

    let v3 = v2.pop_back().unwrap();
    assert_eq!(v3.size(), 31);
    assert_eq!(v3.last(), Some(&30));
}

#[test]
fn push_and_pop_interleaved_round_trips() {
    let mut v: Vector<i32> = Vector::new();

    for i in 0..200 {
        v = v.push_back(i);
    }
    for _ in 0..50 {
        v = v.pop_back().unwrap();
    }
    for i in 150..180 {
        v = v.push_back(i);
    }

    assert_eq!(v.size(), 180);
    for i in 0..150 {
        assert_eq!(v.get(i), Some(&(i as i32)));
    }
    for i in 150..180 {
        assert_eq!(v.get(i), Some(&(i as i32)));
    }
}

#[test]
fn iteration_visits_elements_exactly_once_in_order() {
    let v: Vector<i32> = (0..500).collect();

    let collected: Vec<i32> = v.iter().copied().collect();
    assert_eq!(collected, (0..500).collect::<Vec<_>>());
    assert_eq!(collected.len(), v.size());
}

#[test]
fn clone_is_cheap_and_independent() {
    let v = Vector::new().push_back(1).push_back(2);
    let v2 = v.clone();
    let v3 = v2.push_back(3);

    assert_eq!(v.size(), 2);
    assert_eq!(v2.size(), 2);
    assert_eq!(v3.size(), 3);
}

#[test]
fn equality_compares_contents_not_representation() {
    let small = Vector::new().push_back(1).push_back(2).push_back(3);

    let mut built: Vector<i32> = (1..100).collect();
    for _ in 0..97 {
        built = built.pop_back().unwrap();
    }

    assert_eq!(small, built);
}

#[test]
fn contains_and_contains_all() {
    let v: Vector<i32> = (0..10).collect();
    let subset = crate::vector![2, 4, 6];
    let not_subset = crate::vector![2, 4, 99];

    assert!(v.contains(&5));
    assert!(!v.contains(&50));
    assert!(v.contains_all(&subset));
    assert!(!v.contains_all(&not_subset));
}

#[test]
fn vector_macro_builds_the_same_vector_as_repeated_push() {
    let v = crate::vector![1, 2, 3];

    assert_eq!(v, Vector::new().push_back(1).push_back(2).push_back(3));
}

#[test]
fn index_returns_the_element_for_an_in_bounds_index() {
    let v = crate::vector!["a", "b", "c"];

    assert_eq!(v[1], "b");
}

#[test]
#[should_panic(expected = "index out of bounds")]
fn index_panics_on_out_of_bounds_index() {
    let v: Vector<i32> = Vector::new();
    let _ = v[0];
}

#[cfg(feature = "serde")]
#[test]
fn serde_round_trip_preserves_order() {
    let v: Vector<i32> = (0..50).collect();

    let json = serde_json::to_string(&v).unwrap();
    let deserialized: Vector<i32> = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized, v);
}
