//! Owning, covariant wrapper around a raw non-null pointer.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

/// A `*mut T` that asserts unique ownership of its referent.
///
/// Behaves "as if" it were an instance of `T`: it is `Send`/`Sync` whenever
/// `T` is, and is covariant over `T`. The pointer is always non-null, though
/// it may dangle when it stands for an empty allocation.
#[repr(transparent)]
pub struct Unique<T: ?Sized> {
    pointer: *const T,
    // Tells dropck we logically own a `T`.
    _marker: PhantomData<T>,
}

unsafe impl<T: Send + ?Sized> Send for Unique<T> {}

unsafe impl<T: Sync + ?Sized> Sync for Unique<T> {}

impl<T: Sized> Unique<T> {
    /// Creates a dangling but well-aligned `Unique`.
    ///
    /// Used by types that allocate lazily; the value must not be dereferenced
    /// until a real allocation replaces it.
    #[inline]
    pub const fn empty() -> Self {
        unsafe { Unique::new_unchecked(mem::align_of::<T>() as *mut T) }
    }
}

impl<T: ?Sized> Unique<T> {
    /// Creates a new `Unique`.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null.
    #[inline]
    pub const unsafe fn new_unchecked(ptr: *mut T) -> Self {
        Unique {
            pointer: ptr as _,
            _marker: PhantomData,
        }
    }

    /// Acquires the underlying `*mut` pointer.
    #[inline]
    pub const fn as_ptr(self) -> *mut T {
        self.pointer as *mut T
    }

    /// Casts to a pointer of another type.
    #[inline]
    pub const fn cast<U>(self) -> Unique<U> {
        unsafe { Unique::new_unchecked(self.as_ptr() as *mut U) }
    }
}

impl<T: ?Sized> Clone for Unique<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Unique<T> {}

impl<T: ?Sized> fmt::Debug for Unique<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}

impl<T: ?Sized> From<NonNull<T>> for Unique<T> {
    #[inline]
    fn from(p: NonNull<T>) -> Self {
        unsafe { Unique::new_unchecked(p.as_ptr()) }
    }
}

impl<T: ?Sized> From<Unique<T>> for NonNull<T> {
    #[inline]
    fn from(p: Unique<T>) -> Self {
        unsafe { NonNull::new_unchecked(p.as_ptr()) }
    }
}
