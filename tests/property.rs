//! Property-based tests against the public API.

use std::collections::HashMap;

use quickcheck_macros::quickcheck;
use rhmap::Map;

/// Maps arbitrary quickcheck bytes to a key that is still dedupable (so
/// random operation sequences actually exercise collisions, overwrites, and
/// duplicate-key inserts) but varies in length from 1 to 20 bytes, crossing
/// the inline/owned SSO boundary (`Key::copy_from`, `src/key.rs:44`) in both
/// directions instead of only ever generating a one-byte key.
fn normalize_key(raw: &[u8]) -> Vec<u8> {
    if raw.is_empty() {
        return vec![b'a'];
    }
    let len = 1 + (raw[0] as usize % 20);
    (0..len).map(|i| b'a' + (raw[i % raw.len()] % 8)).collect()
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>, i32),
    Remove(Vec<u8>),
}

impl quickcheck::Arbitrary for Op {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let key = normalize_key(&Vec::<u8>::arbitrary(g));
        if bool::arbitrary(g) {
            Op::Insert(key, i32::arbitrary(g))
        } else {
            Op::Remove(key)
        }
    }
}

#[quickcheck]
fn matches_a_reference_hash_map(ops: Vec<Op>) -> bool {
    let mut map = Map::new();
    let mut reference = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let outcome = map.insert(&k, v).expect("non-empty key never fails here");
                if outcome.is_inserted() {
                    reference.entry(k).or_insert(v);
                } else {
                    assert_eq!(outcome.duplicate(), reference.get(&k));
                }
            }
            Op::Remove(k) => {
                assert_eq!(map.remove(&k), reference.remove(&k));
            }
        }
    }

    if map.len() != reference.len() {
        return false;
    }
    reference
        .iter()
        .all(|(k, v)| map.get(k) == Some(v))
}

#[quickcheck]
fn insert_then_get_round_trips(raw: Vec<u8>, value: i32) -> bool {
    let key = normalize_key(&raw);
    let mut map = Map::new();
    map.insert(&key, value).unwrap();
    map.get(&key) == Some(&value)
}

#[quickcheck]
fn insert_then_remove_returns_the_value(raw: Vec<u8>, value: i32) -> bool {
    let key = normalize_key(&raw);
    let mut map = Map::new();
    map.insert(&key, value).unwrap();
    map.remove(&key) == Some(value) && map.get(&key).is_none()
}

#[quickcheck]
fn remove_of_absent_key_is_none(raw: Vec<u8>) -> bool {
    let key = normalize_key(&raw);
    let mut map: Map<i32> = Map::new();
    map.remove(&key).is_none()
}

#[quickcheck]
fn duplicate_insert_never_changes_the_stored_value(raw: Vec<u8>, first: i32, second: i32) -> bool {
    let key = normalize_key(&raw);
    let mut map = Map::new();
    map.insert(&key, first).unwrap();
    let outcome = map.insert(&key, second).unwrap();
    !outcome.is_inserted() && map.get(&key) == Some(&first)
}

/// Distinct keys of varying length (1 to 12 bytes, crossing the inline/owned
/// boundary) built from the loop index, so grow/shrink cycles below also
/// exercise owned-key storage under resize instead of only one-byte keys.
fn distinct_key(i: u8) -> Vec<u8> {
    vec![i; 1 + (i as usize % 12)]
}

#[quickcheck]
fn capacity_never_drops_below_min_capacity(count: u8) -> bool {
    let mut map = Map::new();
    let min_capacity = map.min_capacity();
    for i in 0..count {
        map.insert(&distinct_key(i), i as i32).unwrap();
    }
    for i in 0..count {
        map.remove(&distinct_key(i));
    }
    map.capacity() >= min_capacity
}

#[quickcheck]
fn iteration_visits_every_live_entry_exactly_once(count: u8) -> bool {
    let mut map = Map::new();
    for i in 0..count {
        map.insert(&distinct_key(i), i as i32).unwrap();
    }
    let mut seen: Vec<u8> = map.keys().map(|k| k[0]).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len() == count as usize && map.iter().count() == count as usize
}
