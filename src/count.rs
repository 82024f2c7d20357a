//! Per-record reference counter.
//!
//! Counts live in a `Cell` so they can be bumped through a shared borrow of
//! the record; no `&mut` to a record is ever formed while handles may hold
//! references into it.

use core::cell::Cell;

/// Single-threaded reference counter for interned records.
#[derive(Debug)]
pub(crate) struct RefCount {
    count: Cell<usize>,
}

impl RefCount {
    pub(crate) fn new(initial: usize) -> Self {
        Self {
            count: Cell::new(initial),
        }
    }

    #[inline]
    pub(crate) fn current(&self) -> usize {
        self.count.get()
    }

    /// Acquire one reference.
    #[inline]
    pub(crate) fn get(&self) {
        let n = self.count.get().wrapping_add(1);
        self.count.set(n);
        if n == 0 {
            // Follow Rc semantics: abort on overflow rather than continue unsafely.
            std::process::abort();
        }
    }

    /// Release one reference. Returns true if the count is now zero, and
    /// `None` if it was already zero.
    #[inline]
    pub(crate) fn put(&self) -> Option<bool> {
        let c = self.count.get();
        let n = c.checked_sub(1)?;
        self.count.set(n);
        Some(n == 0)
    }
}
