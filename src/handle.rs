//! Handle: a reference-counted stand-in for an interned value.

use crate::error::FlyweightError;
use crate::factory::Factory;
use crate::store::Identity;
use crate::traits::{DefaultTraits, Interning};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;

/// A handle to a value interned in a [`Factory`].
///
/// Cloning increments the record's count; dropping decrements it and purges
/// the record when the count reaches zero. A handle is either bound to a
/// live record or empty (default-constructed, taken from, or cleared).
/// Dereferencing an empty handle panics.
///
/// Equality compares values under the factory's configured equality, so
/// handles from different factories holding equal values compare equal.
pub struct Handle<'f, T: ?Sized, Tr: Interning<T> = DefaultTraits> {
    bound: Option<(&'f Factory<T, Tr>, Identity)>,
}

/// A handle into a thread's global factory.
pub type GlobalHandle<T, Tr = DefaultTraits> = Handle<'static, T, Tr>;

impl<'f, T: ?Sized, Tr: Interning<T>> Handle<'f, T, Tr> {
    /// Wrap an identity whose reference was already acquired.
    pub(crate) fn bound(factory: &'f Factory<T, Tr>, id: Identity) -> Self {
        Self {
            bound: Some((factory, id)),
        }
    }

    pub const fn empty() -> Self {
        Self { bound: None }
    }

    pub fn is_valid(&self) -> bool {
        self.bound.is_some()
    }

    /// The interned value. Panics if the handle is empty.
    pub fn get(&self) -> &T {
        match self.try_get() {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_get(&self) -> Result<&T, FlyweightError> {
        let (factory, id) = self.bound.ok_or(FlyweightError::EmptyHandle)?;
        let ptr = factory.lookup(id);
        // SAFETY: this handle holds one of the record's references, so the
        // record cannot be purged while `self` is borrowed. The value sits in
        // the record's own `Rc` allocation, which table growth never moves,
        // and the factory never hands out `&mut` access to stored values.
        Ok(unsafe { &*ptr })
    }

    pub fn identity(&self) -> Option<Identity> {
        self.bound.map(|(_, id)| id)
    }

    pub fn factory(&self) -> Option<&'f Factory<T, Tr>> {
        self.bound.map(|(f, _)| f)
    }

    /// Outstanding references to this handle's record; 0 when empty.
    pub fn ref_count(&self) -> usize {
        self.bound.map_or(0, |(f, id)| f.ref_count_of(id))
    }

    /// Move the reference out, leaving this handle empty. Counts are
    /// unchanged.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Release the reference, leaving this handle empty.
    pub fn clear(&mut self) {
        if let Some((factory, id)) = self.bound.take() {
            factory.decrement(id);
        }
    }
}

impl<T, Tr> Handle<'static, T, Tr>
where
    T: ?Sized + 'static,
    Tr: Interning<T> + 'static,
{
    /// Intern an owned value in the calling thread's global factory.
    pub fn new(value: Tr::Stored) -> Self {
        Factory::<T, Tr>::global().intern(value)
    }

    /// Intern a borrowed value in the calling thread's global factory.
    pub fn from_ref(value: &T) -> Self
    where
        T: ToOwned,
        T::Owned: Into<Tr::Stored>,
    {
        Factory::<T, Tr>::global().intern_ref(value)
    }
}

impl<'f, T: ?Sized, Tr: Interning<T>> Default for Handle<'f, T, Tr> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'f, T: ?Sized, Tr: Interning<T>> Clone for Handle<'f, T, Tr> {
    fn clone(&self) -> Self {
        if let Some((factory, id)) = self.bound {
            factory.increment(id);
        }
        Self { bound: self.bound }
    }
}

impl<'f, T: ?Sized, Tr: Interning<T>> Drop for Handle<'f, T, Tr> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<'f, T: ?Sized, Tr: Interning<T>> Deref for Handle<'f, T, Tr> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get()
    }
}

impl<'f, T: ?Sized, Tr: Interning<T>> AsRef<T> for Handle<'f, T, Tr> {
    fn as_ref(&self) -> &T {
        self.get()
    }
}

impl<'f, 'g, T: ?Sized, Tr: Interning<T>> PartialEq<Handle<'g, T, Tr>> for Handle<'f, T, Tr> {
    fn eq(&self, other: &Handle<'g, T, Tr>) -> bool {
        match (self.bound, other.bound) {
            (Some((fa, a)), Some((fb, b))) => {
                (core::ptr::eq(fa, fb) && a == b) || Tr::equal(self.get(), other.get())
            }
            (None, None) => true,
            _ => false,
        }
    }
}

impl<'f, T: ?Sized, Tr: Interning<T>> Eq for Handle<'f, T, Tr> {}

impl<'f, T: ?Sized, Tr: Interning<T>> Hash for Handle<'f, T, Tr> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.bound {
            Some(_) => {
                state.write_u8(1);
                Tr::hash_value(self.get(), state);
            }
            None => state.write_u8(0),
        }
    }
}

impl<'f, T: ?Sized + fmt::Debug, Tr: Interning<T>> fmt::Debug for Handle<'f, T, Tr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_get() {
            Ok(v) => f.debug_tuple("Handle").field(&v).finish(),
            Err(_) => f.write_str("Handle(<empty>)"),
        }
    }
}

/// Forwards to the value; an empty handle prints `<empty>`.
impl<'f, T: ?Sized + fmt::Display, Tr: Interning<T>> fmt::Display for Handle<'f, T, Tr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_get() {
            Ok(v) => fmt::Display::fmt(v, f),
            Err(_) => f.write_str("<empty>"),
        }
    }
}
