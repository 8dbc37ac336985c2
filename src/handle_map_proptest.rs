#![cfg(test)]

// Property tests for HandleMap kept inside the crate so they can poke at
// handle bookkeeping directly.

use crate::handle_map::{Handle, HandleMap};
use crate::order::PrefixOrder;
use crate::sorted_map::Put;
use core::hash::BuildHasher;
use proptest::prelude::*;
use std::collections::HashMap;

type Key = [u8; 10];

#[derive(Clone, Debug)]
enum OpI {
    Put(usize, u32),
    RemoveAt(usize),
    RemoveHandle(usize),
    Find(usize),
    Mutate(usize, u32),
    Iterate,
}

fn arb_key() -> impl Strategy<Value = Key> {
    (0u8..2, any::<[u8; 2]>()).prop_map(|(p, tail)| {
        let mut k = [p; 10];
        k[8..].copy_from_slice(&tail);
        k
    })
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Key>, Vec<OpI>)> {
    proptest::collection::vec(arb_key(), 1..=10).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            3 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            1 => idx.clone().prop_map(OpI::RemoveAt),
            1 => idx.clone().prop_map(OpI::RemoveHandle),
            1 => idx.clone().prop_map(OpI::Find),
            1 => (idx.clone(), any::<u32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run<S: BuildHasher>(
    mut sut: HandleMap<Key, u32, S>,
    pool: &[Key],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, u32> = HashMap::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();
    let mut last_issued = 0u32;

    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = pool[i];
                let p = sut.put(k, v);
                let h = sut.handle_for_index(p.index()).expect("slot just written");
                match p {
                    Put::Inserted { .. } => {
                        prop_assert!(!model.contains_key(&k));
                        prop_assert_eq!(h.get(), last_issued + 1, "handles issue in order");
                        last_issued = h.get();
                        live.insert(k, h);
                    }
                    Put::Replaced { old, .. } => {
                        prop_assert_eq!(Some(&old), model.get(&k));
                        prop_assert_eq!(Some(&h), live.get(&k), "overwrite keeps handle");
                    }
                }
                model.insert(k, v);
            }
            OpI::RemoveAt(i) => {
                let k = pool[i];
                if let Some(index) = sut.index_for_key(&k) {
                    let h = sut.handle_for_index(index).expect("live index");
                    let (kk, vv) = sut.remove(index);
                    prop_assert_eq!(kk, k);
                    prop_assert_eq!(Some(vv), model.remove(&k));
                    prop_assert_eq!(live.remove(&k), Some(h));
                    stale.push(h);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            OpI::RemoveHandle(i) => {
                let k = pool[i];
                if let Some(h) = live.remove(&k) {
                    let (kk, vv) = sut.remove_handle(h).expect("live handle removes");
                    prop_assert_eq!(kk, k);
                    prop_assert_eq!(Some(vv), model.remove(&k));
                    stale.push(h);
                }
            }
            OpI::Find(i) => {
                let k = pool[i];
                prop_assert_eq!(sut.handle_for_key(&k), live.get(&k).copied());
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Mutate(i, d) => {
                let k = pool[i];
                if let Some(&h) = live.get(&k) {
                    let v = h.value_mut(&mut sut).expect("live handle should resolve");
                    *v = v.wrapping_add(d);
                    if let Some(mv) = model.get_mut(&k) {
                        *mv = mv.wrapping_add(d);
                    }
                }
            }
            OpI::Iterate => {
                let mut seen: Vec<(Handle, Key)> = sut.iter().map(|(h, k, _)| (h, *k)).collect();
                seen.sort();
                let mut expected: Vec<(Handle, Key)> = live.iter().map(|(k, h)| (*h, *k)).collect();
                expected.sort();
                prop_assert_eq!(seen, expected);
            }
        }

        // Post-conditions after each op
        // 1) Retired handles never resolve.
        for &h in &stale {
            prop_assert!(sut.index_for_handle(h).is_none());
        }
        // 2) Live handles resolve to the key they were issued for.
        for (k, &h) in &live {
            prop_assert_eq!(h.key(&sut), Some(k));
            prop_assert_eq!(h.value(&sut), model.get(k));
        }
        // 3) Structure and size parity.
        if let Err(e) = sut.check_invariants() {
            prop_assert!(false, "{}", e);
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.last_handle(), last_issued);
    }
    Ok(())
}

// Property: handle stability under arbitrary put/remove interleavings.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_handles_stay_resolvable((pool, ops) in arb_scenario()) {
        run(HandleMap::new(), &pool, ops)?;
    }

    #[test]
    fn prop_handles_stay_resolvable_with_collisions((pool, ops) in arb_scenario()) {
        run(HandleMap::with_order(PrefixOrder), &pool, ops)?;
    }
}
