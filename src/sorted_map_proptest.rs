#![cfg(test)]

// Property tests for SortedMap kept inside the crate so they can reach
// `pub(crate)` helpers.

use crate::order::PrefixOrder;
use crate::sorted_map::{Put, SortedMap};
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::BTreeMap;

type Key = [u8; 12];

// Pool-indexed operations: indices shrink to earlier keys, the pool
// shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    RemoveAt(usize),
    RemoveKey(usize),
    Find(usize),
    Mutate(usize, i32),
    Iterate,
}

// Keys in a pool share their first eight bytes often, so under
// `PrefixOrder` they collide on order value.
fn arb_key() -> impl Strategy<Value = Key> {
    (0u8..3, any::<[u8; 4]>()).prop_map(|(p, tail)| {
        let mut k = [p; 12];
        k[8..].copy_from_slice(&tail);
        k
    })
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Key>, Vec<Op>)> {
    proptest::collection::vec(arb_key(), 1..=12).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            1 => idx.clone().prop_map(Op::RemoveAt),
            1 => idx.clone().prop_map(Op::RemoveKey),
            1 => idx.clone().prop_map(Op::Find),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run<S: BuildHasher>(
    mut sut: SortedMap<Key, i32, S>,
    pool: &[Key],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: BTreeMap<Key, i32> = BTreeMap::new();
    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = pool[i];
                let prev = model.insert(k, v);
                match sut.put(k, v) {
                    Put::Inserted { index } => {
                        prop_assert!(prev.is_none(), "fresh insert of a present key");
                        prop_assert_eq!(sut.key_at(index), Some(&k));
                    }
                    Put::Replaced { index, old } => {
                        prop_assert_eq!(Some(old), prev);
                        prop_assert_eq!(sut.value_at(index), Some(&v));
                    }
                }
            }
            Op::RemoveAt(i) => {
                let k = pool[i];
                match sut.index_for_key(&k) {
                    Some(index) => {
                        let (kk, vv) = sut.remove(index);
                        prop_assert_eq!(kk, k);
                        prop_assert_eq!(Some(vv), model.remove(&k));
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
            }
            Op::RemoveKey(i) => {
                let k = pool[i];
                let got = sut.remove_key(&k).map(|(_, v)| v);
                prop_assert_eq!(got, model.remove(&k));
            }
            Op::Find(i) => {
                let k = pool[i];
                let found = sut.index_for_key(&k).and_then(|ix| sut.value_at(ix));
                prop_assert_eq!(found, model.get(&k));
            }
            Op::Mutate(i, d) => {
                let k = pool[i];
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
                if let Some(v) = model.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
            }
            Op::Iterate => {
                let mut seen: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                seen.sort();
                let expected: Vec<(Key, i32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(seen, expected);
            }
        }

        // Post-conditions after each op
        if let Err(e) = sut.check_invariants() {
            prop_assert!(false, "{}", e);
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.len() <= sut.capacity());
    }
    Ok(())
}

// Property: state-machine equivalence against BTreeMap.
// - put overwrites present keys and inserts absent ones.
// - index_for_key resolves exactly the live keys.
// - remove by index returns the entry at that index.
// - ordering and column alignment hold after every operation.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(SortedMap::new(), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_prefix_collisions((pool, ops) in arb_scenario()) {
        run(SortedMap::with_order(PrefixOrder), &pool, ops)?;
    }
}

#[derive(Clone, Default)]
struct ConstOrder;
struct ConstHasher;
impl BuildHasher for ConstOrder {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants when every key shares one order value, so all
// lookups go through the byte tie-break.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_all_collide((pool, ops) in arb_scenario()) {
        run(SortedMap::with_order(ConstOrder), &pool, ops)?;
    }
}
