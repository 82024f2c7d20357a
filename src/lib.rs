//! rc-flyweight: single-threaded value interning with reference-counted
//! handles that purge their record when the last one is dropped.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep at most one stored copy of each distinct value while client
//!   code holds small handles that behave like the value.
//! - Layers:
//!   - InternStore<T, Tr>: structural layer. A hash table probed by value
//!     equality plus an identity index, both pointing at the same
//!     `Rc`-pinned records. Each record caches its hash.
//!   - Factory<T, Tr>: wraps the store in a `RefCell` and adds per-record
//!     reference counting (increment on clone, decrement on drop, purge at
//!     zero).
//!   - Handle<'f, T, Tr>: public accessor borrowing its factory; clone,
//!     move, drop and reassignment drive the counts.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by construction (`Rc`, `RefCell`).
//! - Identities come from a counter that only increments; a purged
//!   identity is never reissued.
//! - A handle borrows its factory, so a factory cannot be dropped while
//!   handles are alive. Leaked handles are caught when the factory drops
//!   (logged, and a panic in debug builds).
//! - Stored values are never mutated after interning; handles only get
//!   shared references.
//!
//! Reentrancy
//! - User `Hash`/`Eq` and stored-value conversions run only under a shared
//!   borrow of the store or outside any borrow. A user impl that re-enters
//!   the factory to intern panics on the `RefCell` instead of corrupting it.
//! - On purge the record is unlinked from both tables before it is dropped,
//!   so a stored value whose `Drop` releases other handles into the same
//!   factory cascades safely.
//!
//! Hashing
//! - The hash is computed once at intern time and stored on the record;
//!   purge never calls the hash function on a stored value.
//!
//! Overflow semantics
//! - Reference-count overflow aborts, matching `Rc`.
//!
//! Customization
//! - An [`Interning`] bundle chooses the hash function, the equality
//!   relation and the stored representation. [`DefaultTraits`] uses the
//!   value's own `Hash`/`Eq`; [`StrView`] and [`SliceView`] store boxed
//!   buffers while handles expose `str`/`[E]`.
//!
//! ```
//! use rc_flyweight::Factory;
//!
//! let cities: Factory<String> = Factory::new();
//! let a = cities.intern("London".to_string());
//! let b = cities.intern("London".to_string());
//! assert_eq!(a, b);
//! assert_eq!(cities.count_unique(), 1);
//! assert_eq!(cities.count_all(), 2);
//! ```

mod count;
pub mod error;
mod factory;
mod handle;
mod store;
#[cfg(test)]
mod store_proptest;
pub mod traits;

// Public surface
pub use error::FlyweightError;
pub use factory::Factory;
pub use handle::{GlobalHandle, Handle};
pub use store::Identity;
pub use traits::{DefaultTraits, Interning, SliceView, StrView};
