// Randomized session-table scenarios over HandleMap with 32-byte keys and
// values, driven by a fixed seed.
//
// Scenario 1: put a run of pairs where some later pairs reuse earlier keys
// (a session being refreshed); every key must resolve to its last value;
// drain from the highest logical index down to an empty map.
//
// Scenario 2: put a run of distinct pairs, remove a random contiguous range
// of them (the map shrinks by exactly that many), put that range back, verify every key and every untouched handle, then
// drain to empty.
//
// The quick variant runs on every `cargo test`. The slow variant is ignored
// by default; run it with `cargo test --test map_fuzz -- --ignored`, and set
// `DENSE_MAP_FUZZ_CYCLES` to change how many cycles it runs.
mod common;

use common::{random_bytes, seeded_rng, Key, Value};
use dense_handle_map::{Handle, HandleMap};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::debug;

const QUICK_CYCLES: usize = 4;
const SLOW_CYCLES: usize = 3000;
const MAX_SIZE: u32 = 4096;

/// Random pairs; roughly one in eight reuses an earlier key with a new
/// value. Earlier pairs with the same key are updated so `vals[i]` is always
/// the value that key should end up holding.
fn generate(rng: &mut StdRng, size: usize) -> (Vec<Key>, Vec<Value>) {
    let mut keys: Vec<Key> = Vec::with_capacity(size);
    let mut vals: Vec<Value> = Vec::with_capacity(size);
    for i in 0..size {
        let key = if i > 0 && rng.gen_ratio(1, 8) {
            keys[rng.gen_range(0..i)]
        } else {
            random_bytes(rng)
        };
        let val = random_bytes(rng);
        for j in 0..i {
            if keys[j] == key {
                vals[j] = val;
            }
        }
        keys.push(key);
        vals.push(val);
    }
    (keys, vals)
}

/// Random pairs with every key distinct.
fn generate_distinct(rng: &mut StdRng, size: usize) -> (Vec<Key>, Vec<Value>) {
    let mut seen: HashSet<Key> = HashSet::with_capacity(size);
    let mut keys: Vec<Key> = Vec::with_capacity(size);
    while keys.len() < size {
        let key = random_bytes(rng);
        if seen.insert(key) {
            keys.push(key);
        }
    }
    let vals = (0..size).map(|_| random_bytes(rng)).collect();
    (keys, vals)
}

fn put_all(map: &mut HandleMap<Key, Value>, keys: &[Key], vals: &[Value]) {
    for (k, v) in keys.iter().zip(vals) {
        map.put(*k, *v);
    }
}

/// Check every key holds its last value, removing each as it is found.
fn verify_and_drain(map: &mut HandleMap<Key, Value>, keys: &[Key], vals: &[Value]) {
    for i in (0..keys.len()).rev() {
        match map.index_for_key(&keys[i]) {
            Some(index) => {
                assert_eq!(map.value_at(index), Some(&vals[i]), "wrong value for key {i}");
                map.remove(index);
            }
            // Already drained through a later duplicate.
            None => assert!(keys[i + 1..].contains(&keys[i]), "key {i} went missing"),
        }
    }
    assert_eq!(map.len(), 0);
    map.check_invariants().unwrap();
}

fn overwrite_then_drain(rng: &mut StdRng, cycle: usize, size: usize) {
    let (keys, vals) = generate(rng, size);
    let mut map: HandleMap<Key, Value> = HandleMap::new();

    let begin = Instant::now();
    put_all(&mut map, &keys, &vals);
    debug!(
        cycle,
        size,
        distinct = map.len(),
        elapsed_ms = begin.elapsed().as_millis() as u64,
        "map put"
    );

    let distinct: HashSet<Key> = keys.iter().copied().collect();
    assert_eq!(map.len(), distinct.len());
    verify_and_drain(&mut map, &keys, &vals);
}

fn remove_range_then_reinsert(rng: &mut StdRng, size: usize) {
    let (keys, vals) = generate_distinct(rng, size);
    let mut map: HandleMap<Key, Value> = HandleMap::new();
    put_all(&mut map, &keys, &vals);
    assert_eq!(map.len(), size);

    if !keys.is_empty() {
        let removed = rng.gen::<u32>() as usize % keys.len();
        let pos = rng.gen::<u32>() as usize % (keys.len() - removed);
        let range = pos..pos + removed;

        let untouched: HashMap<Handle, Key> = keys[..range.start]
            .iter()
            .chain(&keys[range.end..])
            .map(|k| (map.handle_for_key(k).expect("present"), *k))
            .collect();

        for k in &keys[range.clone()] {
            let index = map.index_for_key(k).expect("distinct key still present");
            map.remove(index);
        }
        assert_eq!(map.len(), size - removed);
        for k in &keys[range.clone()] {
            assert_eq!(map.index_for_key(k), None);
        }

        for (k, v) in keys[range.clone()].iter().zip(&vals[range]) {
            assert!(map.put(*k, *v).is_inserted());
        }
        assert_eq!(map.len(), size);

        for (h, k) in &untouched {
            assert_eq!(h.key(&map), Some(k), "handle {h} lost its entry");
        }
        map.check_invariants().unwrap();
    }

    verify_and_drain(&mut map, &keys, &vals);
}

fn run_cycles(cycles: usize, max_size: u32) {
    common::init_tracing();
    let mut rng = seeded_rng();
    let begin = Instant::now();
    for cycle in 0..cycles {
        let size = (rng.gen::<u32>() % max_size) as usize;
        overwrite_then_drain(&mut rng, cycle, size);
        remove_range_then_reinsert(&mut rng, size);
    }
    debug!(
        cycles,
        elapsed_ms = begin.elapsed().as_millis() as u64,
        "completed ok"
    );
}

#[test]
fn fuzz_quick() {
    run_cycles(QUICK_CYCLES, MAX_SIZE / 4);
}

#[test]
#[ignore = "slow; run with --ignored"]
fn fuzz_slow() {
    let cycles = std::env::var("DENSE_MAP_FUZZ_CYCLES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(SLOW_CYCLES);
    run_cycles(cycles, MAX_SIZE);
}

// Edge sizes the random draw rarely produces.
#[test]
fn fuzz_edge_sizes() {
    common::init_tracing();
    let mut rng = seeded_rng();
    for size in [0, 1, 2, 7, 8, 9] {
        overwrite_then_drain(&mut rng, 0, size);
        remove_range_then_reinsert(&mut rng, size);
    }
}

// Test: the distinct generator never repeats a key.
// Verifies: scenario 2 can rely on every put inserting a new entry.
#[test]
fn distinct_generator_has_no_repeats() {
    let mut rng = seeded_rng();
    let (keys, vals) = generate_distinct(&mut rng, 2_000);
    let unique: HashSet<Key> = keys.iter().copied().collect();
    assert_eq!(unique.len(), keys.len());
    assert_eq!(vals.len(), keys.len());
}
