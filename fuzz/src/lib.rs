//! Operation runners shared by the fuzz targets.
//!
//! The first input byte selects a runner from [`RUNNERS`], modulo its
//! length, so every non-empty input exercises a map. The rest of the input
//! is read in three-byte records: opcode, key byte, value byte. Keys are 32
//! bytes with only the first and last byte varying, so `PrefixOrder` sees
//! many order-value collisions.

use dense_handle_map::{Handle, HandleMap, PrefixOrder, SortedMap};

pub type Runner = fn(&[u8]);

pub static RUNNERS: &[(&str, Runner)] = &[
    ("sorted_map_ops", sorted_map_ops),
    ("handle_map_ops", handle_map_ops),
    ("sorted_map_prefix_ops", sorted_map_prefix_ops),
];

/// Pick the runner for `data` and the bytes it should consume.
pub fn select(data: &[u8]) -> Option<(&'static str, Runner, &[u8])> {
    let (&first, rest) = data.split_first()?;
    let (name, run) = RUNNERS[first as usize % RUNNERS.len()];
    Some((name, run, rest))
}

fn key(b: u8) -> [u8; 32] {
    let mut k = [0u8; 32];
    k[0] = b & 0x0f;
    k[31] = b;
    k
}

pub fn sorted_map_ops(data: &[u8]) {
    run_sorted(SortedMap::new(), data);
}

pub fn sorted_map_prefix_ops(data: &[u8]) {
    run_sorted(SortedMap::with_order(PrefixOrder), data);
}

fn run_sorted<S: std::hash::BuildHasher>(mut map: SortedMap<[u8; 32], u8, S>, data: &[u8]) {
    let mut model = std::collections::BTreeMap::new();
    for rec in data.chunks_exact(3) {
        let (op, k, v) = (rec[0] % 4, key(rec[1]), rec[2]);
        match op {
            0 => {
                let p = map.put(k, v);
                assert_eq!(p.into_old(), model.insert(k, v));
            }
            1 => {
                // remove by looked-up index
                if let Some(i) = map.index_for_key(&k) {
                    let (kk, vv) = map.remove(i);
                    assert_eq!(kk, k);
                    assert_eq!(Some(vv), model.remove(&k));
                } else {
                    assert!(!model.contains_key(&k));
                }
            }
            2 => {
                assert_eq!(map.get(&k), model.get(&k));
            }
            _ => {
                if let Some(i) = map.index_for_key(&k) {
                    assert_eq!(map.key_at(i), Some(&k));
                }
            }
        }
        assert_eq!(map.len(), model.len());
    }
    if let Err(e) = map.check_invariants() {
        panic!("{e}");
    }
}

pub fn handle_map_ops(data: &[u8]) {
    let mut map: HandleMap<[u8; 32], u8> = HandleMap::new();
    let mut live: Vec<(Handle, [u8; 32])> = Vec::new();
    let mut stale: Vec<Handle> = Vec::new();

    for rec in data.chunks_exact(3) {
        let (op, k, v) = (rec[0] % 4, key(rec[1]), rec[2]);
        match op {
            0 => {
                let p = map.put(k, v);
                if p.is_inserted() {
                    let h = map.handle_for_index(p.index()).unwrap();
                    assert_eq!(h.get(), map.last_handle());
                    live.push((h, k));
                }
            }
            1 => {
                if !live.is_empty() {
                    let (h, kk) = live.swap_remove(rec[2] as usize % live.len());
                    let (removed, _) = map.remove_handle(h).unwrap();
                    assert_eq!(removed, kk);
                    stale.push(h);
                }
            }
            2 => {
                if let Some(i) = map.index_for_key(&k) {
                    let h = map.handle_for_index(i).unwrap();
                    assert_eq!(map.index_for_handle(h), Some(i));
                    map.remove(i);
                    live.retain(|(lh, _)| *lh != h);
                    stale.push(h);
                }
            }
            _ => {
                if let Some(&(h, _)) = live.get(rec[2] as usize % live.len().max(1)) {
                    if let Some(val) = h.value_mut(&mut map) {
                        *val = v;
                    }
                    assert_eq!(h.value(&map), Some(&v));
                }
            }
        }
    }

    for (h, k) in &live {
        assert_eq!(h.key(&map), Some(k));
    }
    for h in &stale {
        assert_eq!(map.index_for_handle(*h), None);
    }
    if let Err(e) = map.check_invariants() {
        panic!("{e}");
    }
}
