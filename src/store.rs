//! InternStore: structural layer holding deduplicated, counted records.
//!
//! Records live in two tables that always agree:
//! - `buckets`: hash-keyed table probed by value equality (collision chains
//!   resolve by `Interning::equal`, first match wins);
//! - `index`: identity-keyed map for O(1) access from a handle.
//!
//! Each record is pinned in its own `Rc` allocation shared by both tables,
//! so references into a stored value stay put while the tables grow.

use crate::count::RefCount;
use crate::traits::{hash_with, Interning};
use core::fmt;
use core::marker::PhantomData;
use hashbrown::{HashMap, HashTable};
use std::rc::Rc;

/// Factory-scoped record identifier. Assigned from a counter that only
/// increments, so an identity is never reused after its record is purged.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Identity(u64);

impl Identity {
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct Interned<S> {
    pub(crate) id: Identity,
    pub(crate) hash: u64,
    pub(crate) refs: RefCount,
    pub(crate) stored: S,
}

/// Outcome of probing the buckets for a value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Probe {
    /// An equal record exists; its count was incremented.
    Hit(Identity),
    /// No equal record; carries the hash to insert under.
    Miss(u64),
}

pub(crate) struct InternStore<T: ?Sized, Tr: Interning<T>> {
    hasher: Tr::BuildHasher,
    buckets: HashTable<Rc<Interned<Tr::Stored>>>,
    index: HashMap<Identity, Rc<Interned<Tr::Stored>>>,
    next_id: u64,
    _pd: PhantomData<fn(&T)>,
}

impl<T: ?Sized, Tr: Interning<T>> InternStore<T, Tr> {
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: Tr::BuildHasher) -> Self {
        Self {
            hasher,
            buckets: HashTable::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            next_id: 0,
            _pd: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn make_hash(&self, value: &T) -> u64 {
        hash_with::<T, Tr>(&self.hasher, value)
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Sum of reference counts over all live records.
    pub(crate) fn total_refs(&self) -> usize {
        self.index.values().map(|r| r.refs.current()).sum()
    }

    #[inline]
    pub(crate) fn hasher(&self) -> &Tr::BuildHasher {
        &self.hasher
    }

    pub(crate) fn find(&self, value: &T) -> Option<&Rc<Interned<Tr::Stored>>> {
        let hash = self.make_hash(value);
        self.find_by(hash, |v| Tr::equal(v, value))
    }

    /// Probe the bucket for `hash` with a caller-supplied match. `hash` must
    /// agree with the bundle's hash for any value `matches` accepts.
    pub(crate) fn find_by(
        &self,
        hash: u64,
        mut matches: impl FnMut(&T) -> bool,
    ) -> Option<&Rc<Interned<Tr::Stored>>> {
        self.buckets.find(hash, |r| matches(Tr::view(&r.stored)))
    }

    /// Look for a record equal to `value`, acquiring a reference on a hit.
    pub(crate) fn acquire(&self, value: &T) -> Probe {
        let hash = self.make_hash(value);
        self.acquire_by(hash, |v| Tr::equal(v, value))
    }

    pub(crate) fn acquire_by(&self, hash: u64, matches: impl FnMut(&T) -> bool) -> Probe {
        match self.find_by(hash, matches) {
            Some(r) => {
                r.refs.get();
                Probe::Hit(r.id)
            }
            None => Probe::Miss(hash),
        }
    }

    /// Store a new record with a count of one. `hash` must come from a
    /// `Probe::Miss` for an equal value with no insert in between.
    pub(crate) fn insert_new(&mut self, hash: u64, stored: Tr::Stored) -> Identity {
        let id = Identity(self.next_id);
        self.next_id += 1;
        let record = Rc::new(Interned {
            id,
            hash,
            refs: RefCount::new(1),
            stored,
        });
        self.buckets
            .insert_unique(hash, Rc::clone(&record), |r| r.hash);
        self.index.insert(id, record);
        id
    }

    #[inline]
    pub(crate) fn get(&self, id: Identity) -> Option<&Rc<Interned<Tr::Stored>>> {
        self.index.get(&id)
    }

    /// Unlink a record from both tables using its cached hash. The stored
    /// value is handed back undropped.
    pub(crate) fn unlink(&mut self, id: Identity) -> Option<Rc<Interned<Tr::Stored>>> {
        let record = self.index.remove(&id)?;
        match self.buckets.find_entry(record.hash, |r| r.id == id) {
            Ok(entry) => {
                entry.remove();
            }
            Err(_) => debug_assert!(false, "identity {id} indexed but missing from its bucket"),
        }
        Some(record)
    }
}
