//! Factory: reference-counted interning atop `InternStore`.
//!
//! The factory owns every stored value. Handles borrow the factory and name
//! a record by identity; cloning a handle increments the record's count,
//! dropping it decrements, and the record is purged when the count reaches
//! zero.

use crate::error::FlyweightError;
use crate::handle::Handle;
use crate::store::{Identity, InternStore, Interned, Probe};
use crate::traits::{DefaultTraits, Interning};
use core::any::{Any, TypeId};
use core::borrow::Borrow;
use core::cell::RefCell;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashMap;

pub struct Factory<T: ?Sized, Tr: Interning<T> = DefaultTraits> {
    // User Hash/Eq only ever run under a shared borrow; mutation takes a
    // short exclusive borrow with no user code inside it.
    state: RefCell<InternStore<T, Tr>>,
}

impl<T: ?Sized, Tr: Interning<T>> Factory<T, Tr> {
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(0, Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    pub fn with_hasher(hasher: Tr::BuildHasher) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: Tr::BuildHasher) -> Self {
        Self {
            state: RefCell::new(InternStore::with_capacity_and_hasher(capacity, hasher)),
        }
    }

    /// Intern an owned value. On a miss the value is moved into the store;
    /// on a hit it is dropped and the existing record is shared.
    pub fn intern(&self, value: Tr::Stored) -> Handle<'_, T, Tr> {
        let probe = self.state.borrow().acquire(Tr::view(&value));
        let id = match probe {
            Probe::Hit(id) => {
                // Dropped outside any borrow: its Drop may release handles
                // into this factory.
                drop(value);
                id
            }
            Probe::Miss(hash) => self.insert_new(hash, value),
        };
        Handle::bound(self, id)
    }

    /// Intern a borrowed value. The value is converted into its stored form
    /// only when no equal record exists; the caller's value is untouched.
    pub fn intern_ref(&self, value: &T) -> Handle<'_, T, Tr>
    where
        T: ToOwned,
        T::Owned: Into<Tr::Stored>,
    {
        let probe = self.state.borrow().acquire(value);
        let id = match probe {
            Probe::Hit(id) => id,
            Probe::Miss(hash) => {
                let stored: Tr::Stored = value.to_owned().into();
                self.insert_new(hash, stored)
            }
        };
        Handle::bound(self, id)
    }

    fn insert_new(&self, hash: u64, stored: Tr::Stored) -> Identity {
        let mut state = self.state.borrow_mut();
        let id = state.insert_new(hash, stored);
        tracing::trace!(identity = id.as_u64(), hash, unique = state.len(), "interned new record");
        id
    }

    /// Whether a live record equal to `value` exists. Counts are unchanged.
    pub fn contains(&self, value: &T) -> bool {
        self.state.borrow().find(value).is_some()
    }

    /// Outstanding references to the record equal to `value`, or 0.
    pub fn ref_count(&self, value: &T) -> usize {
        self.state
            .borrow()
            .find(value)
            .map_or(0, |r| r.refs.current())
    }

    /// Number of distinct live records.
    pub fn count_unique(&self) -> usize {
        self.state.borrow().len()
    }

    /// Total outstanding references across all records.
    pub fn count_all(&self) -> usize {
        self.state.borrow().total_refs()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    fn with_record<R>(&self, id: Identity, f: impl FnOnce(&Interned<Tr::Stored>) -> R) -> R {
        let state = self.state.borrow();
        match state.get(id) {
            Some(r) => f(r.as_ref()),
            None => panic!("{}", FlyweightError::UnknownIdentity(id)),
        }
    }

    /// Pointer to the stored value for `id`.
    ///
    /// The pointee lives in the record's `Rc` allocation and stays valid
    /// until the record is purged.
    pub(crate) fn lookup(&self, id: Identity) -> *const T {
        self.with_record(id, |r| Tr::view(&r.stored) as *const T)
    }

    pub(crate) fn ref_count_of(&self, id: Identity) -> usize {
        self.with_record(id, |r| r.refs.current())
    }

    pub(crate) fn increment(&self, id: Identity) {
        self.with_record(id, |r| r.refs.get())
    }

    /// Release one reference; purge the record when it was the last.
    pub(crate) fn decrement(&self, id: Identity) {
        match self.ref_count_of(id) {
            0 => panic!("{}", FlyweightError::RefCountUnderflow(id)),
            1 => self.purge(id),
            _ => self.with_record(id, |r| {
                r.refs.put();
            }),
        }
    }

    fn purge(&self, id: Identity) {
        // The exclusive borrow is taken before the count moves, so a release
        // from inside user Hash/Eq panics with the record still counted.
        let Ok(mut state) = self.state.try_borrow_mut() else {
            panic!("{}", FlyweightError::ReentrantRelease(id));
        };
        let unlinked = state.unlink(id);
        if let Some(r) = &unlinked {
            r.refs.put();
        }
        tracing::trace!(identity = id.as_u64(), unique = state.len(), "purged record");
        drop(state);
        // Unlink before drop: the stored value may hold handles into this
        // factory and release them while being dropped.
        drop(unlinked);
    }
}

impl<T: Hash + Eq> Factory<T, DefaultTraits> {
    fn hash_borrowed<Q: ?Sized + Hash>(state: &InternStore<T, DefaultTraits>, key: &Q) -> u64 {
        // `T: Borrow<Q>` requires `Q` to hash like `T`.
        state.hasher().hash_one(key)
    }

    /// Whether a live record equal to the borrowed `key` exists, e.g.
    /// `contains_borrowed("abc")` on a `Factory<String>`.
    pub fn contains_borrowed<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let state = self.state.borrow();
        let hash = Self::hash_borrowed(&state, key);
        state
            .find_by(hash, |v| <T as Borrow<Q>>::borrow(v) == key)
            .is_some()
    }

    /// Outstanding references to the record equal to the borrowed `key`,
    /// or 0.
    pub fn ref_count_borrowed<Q>(&self, key: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let state = self.state.borrow();
        let hash = Self::hash_borrowed(&state, key);
        state
            .find_by(hash, |v| <T as Borrow<Q>>::borrow(v) == key)
            .map_or(0, |r| r.refs.current())
    }

    /// Intern by borrowed form. `key` is converted into `T` only on a miss.
    pub fn intern_borrowed<Q>(&self, key: &Q) -> Handle<'_, T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned,
        Q::Owned: Into<T>,
    {
        let probe = {
            let state = self.state.borrow();
            let hash = Self::hash_borrowed(&state, key);
            state.acquire_by(hash, |v| <T as Borrow<Q>>::borrow(v) == key)
        };
        let id = match probe {
            Probe::Hit(id) => id,
            Probe::Miss(hash) => self.insert_new(hash, key.to_owned().into()),
        };
        Handle::bound(self, id)
    }
}

impl<T, Tr> Factory<T, Tr>
where
    T: ?Sized + 'static,
    Tr: Interning<T> + 'static,
{
    /// The calling thread's factory for this `(T, Tr)` pair.
    ///
    /// Created on first use and leaked: it lives until the thread exits and
    /// is never torn down.
    pub fn global() -> &'static Self {
        thread_local! {
            static GLOBALS: RefCell<HashMap<TypeId, &'static dyn Any>> =
                RefCell::new(HashMap::new());
        }

        GLOBALS.with(|globals| {
            let key = TypeId::of::<Self>();
            let existing = globals
                .borrow()
                .get(&key)
                .copied()
                .and_then(|f| f.downcast_ref::<Self>());
            if let Some(factory) = existing {
                return factory;
            }
            let factory: &'static Self = Box::leak(Box::new(Self::new()));
            globals.borrow_mut().insert(key, factory);
            tracing::debug!(value_type = core::any::type_name::<T>(), "created global factory");
            factory
        })
    }
}

impl<T: ?Sized, Tr: Interning<T>> Default for Factory<T, Tr> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, Tr: Interning<T>> fmt::Debug for Factory<T, Tr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Factory")
                .field("unique", &state.len())
                .field("all", &state.total_refs())
                .finish(),
            Err(_) => f.debug_struct("Factory").finish_non_exhaustive(),
        }
    }
}

impl<T: ?Sized, Tr: Interning<T>> Drop for Factory<T, Tr> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.is_empty() {
            return;
        }
        let err = FlyweightError::OutstandingReferences {
            unique: state.len(),
            total: state.total_refs(),
        };
        tracing::error!("{err}");
        if cfg!(debug_assertions) && !std::thread::panicking() {
            panic!("{err}");
        }
    }
}
