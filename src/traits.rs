//! Per-type interning configuration.
//!
//! An [`Interning`] bundle tells a [`Factory`](crate::Factory) how to hash
//! and compare values, and what representation to keep in the store. The
//! stored representation may differ from the type handles expose: `StrView`
//! keeps an owned `Box<str>` while handles hand out `&str`.

use core::hash::{BuildHasher, Hash, Hasher};
use std::collections::hash_map::RandomState;

/// Hash, equality and storage policy for values of type `T`.
///
/// `hash_value` and `equal` must agree: values that compare equal must hash
/// identically, otherwise deduplication silently misses.
pub trait Interning<T: ?Sized> {
    /// Representation owned by the factory.
    type Stored;

    /// Hasher family used for bucketing.
    type BuildHasher: BuildHasher + Default;

    fn hash_value<H: Hasher>(value: &T, state: &mut H);

    fn equal(a: &T, b: &T) -> bool;

    /// Borrow the apparent value out of its stored representation.
    fn view(stored: &Self::Stored) -> &T;
}

/// Uses `T`'s own `Hash`/`Eq` and stores `T` as is.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultTraits;

impl<T: Hash + Eq> Interning<T> for DefaultTraits {
    type Stored = T;
    type BuildHasher = RandomState;

    #[inline]
    fn hash_value<H: Hasher>(value: &T, state: &mut H) {
        value.hash(state);
    }

    #[inline]
    fn equal(a: &T, b: &T) -> bool {
        a == b
    }

    #[inline]
    fn view(stored: &T) -> &T {
        stored
    }
}

/// Handles expose `str`; the store keeps a `Box<str>`.
#[derive(Copy, Clone, Debug, Default)]
pub struct StrView;

impl Interning<str> for StrView {
    type Stored = Box<str>;
    type BuildHasher = RandomState;

    #[inline]
    fn hash_value<H: Hasher>(value: &str, state: &mut H) {
        value.hash(state);
    }

    #[inline]
    fn equal(a: &str, b: &str) -> bool {
        a == b
    }

    #[inline]
    fn view(stored: &Box<str>) -> &str {
        stored
    }
}

/// Handles expose `[E]`; the store keeps a `Box<[E]>`.
#[derive(Copy, Clone, Debug, Default)]
pub struct SliceView;

impl<E: Hash + Eq> Interning<[E]> for SliceView {
    type Stored = Box<[E]>;
    type BuildHasher = RandomState;

    #[inline]
    fn hash_value<H: Hasher>(value: &[E], state: &mut H) {
        value.hash(state);
    }

    #[inline]
    fn equal(a: &[E], b: &[E]) -> bool {
        a == b
    }

    #[inline]
    fn view(stored: &Box<[E]>) -> &[E] {
        stored
    }
}

/// Hash a value with a bundle's hash function under `hasher`.
#[inline]
pub(crate) fn hash_with<T, Tr>(hasher: &Tr::BuildHasher, value: &T) -> u64
where
    T: ?Sized,
    Tr: Interning<T>,
{
    let mut state = hasher.build_hasher();
    Tr::hash_value(value, &mut state);
    state.finish()
}
