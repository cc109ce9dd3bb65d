//! Raw growable buffer underlying the containers.

use core::{cmp, mem};
use std::alloc::Layout;
use std::ptr::NonNull;

use crate::{
    alloc::{Alloc, Global},
    unique::Unique,
};
use snafu::{ensure, OptionExt, ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Capacity overflow"))]
    CapacityOverflow,

    #[snafu(display("Allocation failed for: {}", source))]
    Allocation { source: crate::alloc::Error },
}

/// A pointer-and-capacity pair managing a heap buffer of `T` slots.
///
/// `RawBuf` owns the allocation but never inspects or drops its contents; the
/// containers built on top are responsible for tracking which slots hold live
/// values. It takes care of the corner cases so they don't have to:
///
/// * zero-sized types and zero-length allocations never touch the allocator
///   and use a dangling, well-aligned pointer instead;
/// * capacity computations are checked and promoted to
///   [`Error::CapacityOverflow`];
/// * allocations above `isize::MAX` bytes are rejected on small-pointer
///   targets;
/// * reallocation either succeeds or leaves the old buffer intact — the old
///   block is never leaked on failure;
/// * for zero-sized `T` the reported capacity is `usize::MAX`, so growth
///   logic can run unchanged and catch length overflows.
pub struct RawBuf<T, A: Alloc = Global> {
    ptr: Unique<T>,
    cap: usize,
    a: A,
}

impl<T> RawBuf<T, Global> {
    /// Creates an empty buffer on the global allocator without allocating.
    pub const fn new() -> Self {
        RawBuf {
            ptr: Unique::empty(),
            cap: [0, !0][(mem::size_of::<T>() == 0) as usize],
            a: Global,
        }
    }

    /// Creates a buffer with exactly `capacity` slots on the global
    /// allocator. Equivalent to `new` when `capacity == 0` or `T` is
    /// zero-sized.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        RawBuf::allocate_in(capacity, Global)
    }
}

impl<T, A: Alloc> RawBuf<T, A> {
    /// Like `new`, but parameterized over the choice of allocator.
    pub fn new_in(a: A) -> Self {
        // `Unique::empty()` doubles as "unallocated" and "zero-sized
        // allocation".
        RawBuf {
            ptr: Unique::empty(),
            cap: [0, !0][(mem::size_of::<T>() == 0) as usize],
            a,
        }
    }

    /// Like `with_capacity`, but parameterized over the choice of allocator.
    #[inline]
    pub fn with_capacity_in(capacity: usize, a: A) -> Result<Self, Error> {
        RawBuf::allocate_in(capacity, a)
    }

    fn allocate_in(capacity: usize, mut a: A) -> Result<Self, Error> {
        unsafe {
            let elem_size = mem::size_of::<T>();

            let alloc_size = capacity.checked_mul(elem_size).context(CapacityOverflow)?;
            alloc_guard(alloc_size)?;

            // Handles ZSTs and `capacity == 0` alike.
            let ptr = if alloc_size == 0 {
                NonNull::<T>::dangling()
            } else {
                let align = mem::align_of::<T>();
                let layout = Layout::from_size_align_unchecked(alloc_size, align);
                a.alloc(layout).context(Allocation)?.cast()
            };

            Ok(RawBuf {
                ptr: ptr.into(),
                cap: capacity,
                a,
            })
        }
    }

    /// Gets a raw pointer to the start of the allocation. Dangling if
    /// `capacity == 0` or `T` is zero-sized.
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Gets the capacity of the allocation.
    ///
    /// This will always be `usize::MAX` if `T` is zero-sized.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        if mem::size_of::<T>() == 0 {
            !0
        } else {
            self.cap
        }
    }

    /// Returns a shared reference to the backing allocator.
    pub fn alloc(&self) -> &A {
        &self.a
    }

    fn current_layout(&self) -> Option<Layout> {
        if self.cap == 0 {
            None
        } else {
            // We have an allocated chunk of memory, so we can bypass runtime
            // checks to get our current layout.
            unsafe {
                let align = mem::align_of::<T>();
                let size = mem::size_of::<T>() * self.cap;
                Some(Layout::from_size_align_unchecked(size, align))
            }
        }
    }

    /// Doubles the size of the backing allocation.
    ///
    /// Ideal for pushing elements one at a time: the caller only has to check
    /// `len == capacity` before calling. A fresh buffer starts at 4 slots;
    /// every subsequent call multiplies the capacity by two, which is what
    /// gives `push` its amortized O(1) bound.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized on the assumption that all `usize::MAX`
    /// slots of the imaginary buffer have been exhausted.
    #[inline(never)]
    #[cold]
    pub fn double(&mut self) -> Result<(), Error> {
        unsafe {
            let elem_size = mem::size_of::<T>();

            // Since we set the capacity to `usize::MAX` when `elem_size` is
            // 0, getting to here necessarily means the buffer is overfull.
            assert!(elem_size != 0, "capacity overflow");

            let (new_cap, uniq) = match self.current_layout() {
                Some(cur) => {
                    // `elem_size * self.cap <= isize::MAX` holds as a
                    // precondition, so the multiplication can't overflow.
                    let new_cap = 2 * self.cap;
                    let new_size = new_cap * elem_size;
                    alloc_guard(new_size)?;
                    let ptr = self
                        .a
                        .realloc(NonNull::from(self.ptr).cast(), cur, new_size)
                        .context(Allocation)?;
                    (new_cap, ptr.cast().into())
                }
                None => {
                    // Skip to 4 because tiny buffers are dumb; but not if
                    // that would cause overflow.
                    let new_cap = if elem_size > (!0) / 8 { 1 } else { 4 };
                    let ptr = self.a.alloc_array::<T>(new_cap).context(Allocation)?;
                    (new_cap, ptr.into())
                }
            };
            self.ptr = uniq;
            self.cap = new_cap;
        }
        Ok(())
    }

    /// Calculates the buffer's new size given that it'll hold
    /// `used_capacity + needed_extra_capacity` elements. At least doubles the
    /// current capacity to keep growth amortized.
    fn amortized_new_size(
        &self,
        used_capacity: usize,
        needed_extra_capacity: usize,
    ) -> Result<usize, Error> {
        let required_cap = used_capacity
            .checked_add(needed_extra_capacity)
            .context(CapacityOverflow)?;
        // Cannot overflow, because `cap <= isize::MAX`, and type of `cap` is `usize`.
        let double_cap = self.cap * 2;
        Ok(cmp::max(double_cap, required_cap))
    }

    /// Ensures the buffer can hold `used_capacity + needed_extra_capacity`
    /// elements, reallocating with amortized growth if it can't already.
    pub fn try_reserve(
        &mut self,
        used_capacity: usize,
        needed_extra_capacity: usize,
    ) -> Result<(), Error> {
        unsafe {
            // Don't actually need any more capacity.
            // Wrapping in case they gave a bad `used_capacity`.
            if self.capacity().wrapping_sub(used_capacity) >= needed_extra_capacity {
                return Ok(());
            }

            let new_cap = self.amortized_new_size(used_capacity, needed_extra_capacity)?;
            let new_layout = Layout::array::<T>(new_cap)
                .ok()
                .context(CapacityOverflow)?;

            alloc_guard(new_layout.size())?;

            let res = match self.current_layout() {
                Some(layout) => {
                    debug_assert!(new_layout.align() == layout.align());
                    self.a
                        .realloc(NonNull::from(self.ptr).cast(), layout, new_layout.size())
                }
                None => self.a.alloc(new_layout),
            };

            let ptr = res.context(Allocation)?;

            self.ptr = ptr.cast().into();
            self.cap = new_cap;

            Ok(())
        }
    }

    /// Frees the memory owned by the `RawBuf` *without* trying to drop its
    /// contents.
    pub unsafe fn dealloc_buffer(&mut self) {
        let elem_size = mem::size_of::<T>();
        if elem_size != 0 {
            if let Some(layout) = self.current_layout() {
                self.a.dealloc(NonNull::from(self.ptr).cast(), layout);
            }
        }
    }
}

impl<T, A: Alloc> Drop for RawBuf<T, A> {
    /// Frees the memory owned by the `RawBuf` *without* trying to drop its
    /// contents.
    fn drop(&mut self) {
        unsafe {
            self.dealloc_buffer();
        }
    }
}

// We never allocate `> isize::MAX` byte-size objects and never overflow
// `usize::MAX` to allocate too little. On 64-bit the overflow checks above
// suffice; on smaller targets an explicit guard is needed since all 4GB may
// be addressable in user space.
#[inline]
fn alloc_guard(alloc_size: usize) -> Result<(), Error> {
    ensure!(
        !(mem::size_of::<usize>() < 8 && alloc_size > core::isize::MAX as usize),
        CapacityOverflow
    );
    Ok(())
}
