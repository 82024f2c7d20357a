#![cfg(test)]

// Property tests for InternStore kept inside the crate so they can drive
// the structural layer directly.

use crate::store::{Identity, InternStore, Probe};
use crate::traits::Interning;
use core::hash::{BuildHasher, Hash, Hasher};
use core::marker::PhantomData;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;

// String bundle generic over the hasher so the same scenario runs with a
// real hasher and with a constant one.
struct Strs<S>(PhantomData<S>);

impl<S: BuildHasher + Default> Interning<str> for Strs<S> {
    type Stored = Box<str>;
    type BuildHasher = S;

    fn hash_value<H: Hasher>(value: &str, state: &mut H) {
        value.hash(state);
    }

    fn equal(a: &str, b: &str) -> bool {
        a == b
    }

    fn view(stored: &Box<str>) -> &str {
        stored
    }
}

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
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

// Pool-indexed operations so shrinking moves toward earlier values.
#[derive(Clone, Debug)]
enum OpI {
    Acquire(usize),
    Release(usize),
    Find(usize),
    Contains(String),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            idx.clone().prop_map(OpI::Acquire),
            idx.clone().prop_map(OpI::Release),
            idx.clone().prop_map(OpI::Find),
            "[a-z]{0,4}".prop_map(OpI::Contains),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Model: value -> (identity, outstanding references).
//
// Invariants after each op:
// - `len` equals the number of modeled values; `total_refs` the sum of
//   modeled counts.
// - A value is findable iff it is modeled, under the modeled identity.
// - Identities of purged records never resolve and are never reissued.
fn run<S: BuildHasher + Default>(pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError> {
    let mut sut: InternStore<str, Strs<S>> = InternStore::with_capacity_and_hasher(0, S::default());
    let mut model: HashMap<String, (Identity, usize)> = HashMap::new();
    let mut retired: Vec<Identity> = Vec::new();
    let mut issued: Vec<Identity> = Vec::new();

    for op in ops {
        match op {
            OpI::Acquire(i) => {
                let v = pool[i].as_str();
                match sut.acquire(v) {
                    Probe::Hit(id) => {
                        let entry = model.get_mut(v);
                        prop_assert!(entry.is_some(), "hit only for a live value");
                        let (mid, n) = entry.unwrap();
                        prop_assert_eq!(*mid, id);
                        *n += 1;
                    }
                    Probe::Miss(h) => {
                        prop_assert!(!model.contains_key(v), "miss only for an absent value");
                        let id = sut.insert_new(h, v.into());
                        prop_assert!(!issued.contains(&id), "identity reissued");
                        issued.push(id);
                        model.insert(v.to_string(), (id, 1));
                    }
                }
            }
            OpI::Release(i) => {
                let v = pool[i].as_str();
                if let Some(&(id, _)) = model.get(v) {
                    let zero = sut.get(id).and_then(|r| r.refs.put());
                    prop_assert!(zero.is_some());
                    let n = &mut model.get_mut(v).unwrap().1;
                    *n -= 1;
                    prop_assert_eq!(zero, Some(*n == 0));
                    if *n == 0 {
                        let rec = sut.unlink(id);
                        prop_assert!(rec.is_some());
                        model.remove(v);
                        retired.push(id);
                    }
                }
            }
            OpI::Find(i) => {
                let v = pool[i].as_str();
                let found = sut.find(v).map(|r| r.id);
                prop_assert_eq!(found, model.get(v).map(|&(id, _)| id));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.find(&s).is_some(), model.contains_key(&s));
            }
        }

        for id in &retired {
            prop_assert!(sut.get(*id).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.total_refs(), model.values().map(|&(_, n)| n).sum::<usize>());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run::<RandomState>(&pool, ops)?;
    }

    // Worst-case collisions: every value lands in one bucket, so equality
    // alone resolves probes and removals.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run::<ConstBuildHasher>(&pool, ops)?;
    }
}
