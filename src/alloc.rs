//! Memory allocation interface and a handful of allocators.

use snafu::{OptionExt, Snafu};
use std::{
    alloc::Layout,
    cmp,
    ptr::{self, NonNull},
};

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub")]
pub enum Error {
    #[snafu(display("Allocation of {:?} failed", layout))]
    AllocationError { layout: Layout },

    #[snafu(display("Allocation of {} items of {:?} has failed", items, layout))]
    ArrayAllocationError { layout: Layout, items: usize },

    #[snafu(display("Reallocation of {:?} to size {} failed", layout, new_size))]
    ReallocationError { layout: Layout, new_size: usize },
}

/// An allocator of raw memory blocks.
///
/// Unlike `std::alloc::GlobalAlloc`, every fallible method reports exhaustion
/// as a recoverable [`Error`] rather than returning null or aborting, so
/// containers built on top of it can surface allocation failures to their
/// callers.
pub unsafe trait Alloc {
    /// Allocates a block of memory fitting `layout`.
    ///
    /// # Safety
    ///
    /// `layout` must have a non-zero size.
    unsafe fn alloc(&mut self, layout: Layout) -> Result<NonNull<u8>, Error>;

    /// Deallocates a block previously obtained from this allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must denote a block currently allocated via this allocator, and
    /// `layout` must be the layout it was allocated with.
    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout);

    /// Grows or shrinks a block to `new_size` bytes, preserving its contents
    /// up to the smaller of the old and new sizes.
    ///
    /// On failure the original block is left untouched and still owned by the
    /// caller.
    ///
    /// # Safety
    ///
    /// `ptr` must be currently allocated via this allocator with `layout`,
    /// and `new_size` must be non-zero and must not overflow when rounded up
    /// to `layout.align()`.
    unsafe fn realloc(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, Error> {
        let new_layout = Layout::from_size_align_unchecked(new_size, layout.align());
        let new_ptr = self.alloc(new_layout)?;
        ptr::copy_nonoverlapping(
            ptr.as_ptr(),
            new_ptr.as_ptr(),
            cmp::min(layout.size(), new_size),
        );
        self.dealloc(ptr, layout);
        Ok(new_ptr)
    }

    /// Allocates a block suitable for holding `n` instances of `T`.
    ///
    /// Returns an error for zero-sized requests and on arithmetic overflow.
    fn alloc_array<T>(&mut self, n: usize) -> Result<NonNull<T>, Error>
    where
        Self: Sized,
    {
        match Layout::array::<T>(n) {
            Ok(layout) if layout.size() > 0 => unsafe { self.alloc(layout).map(|p| p.cast()) },
            _ => Err(Error::ArrayAllocationError {
                layout: Layout::new::<T>(),
                items: n,
            }),
        }
    }
}

unsafe impl<A: Alloc> Alloc for &mut A {
    unsafe fn alloc(&mut self, layout: Layout) -> Result<NonNull<u8>, Error> {
        A::alloc(self, layout)
    }

    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        A::dealloc(self, ptr, layout)
    }

    unsafe fn realloc(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, Error> {
        A::realloc(self, ptr, layout, new_size)
    }

    fn alloc_array<T>(&mut self, n: usize) -> Result<NonNull<T>, Error> {
        A::alloc_array(self, n)
    }
}

/// Adapter that exposes any `std::alloc::GlobalAlloc` as an [`Alloc`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalAlloc<A>(A);

use ::std::alloc::GlobalAlloc as StdGlobalAlloc;

unsafe impl<A: StdGlobalAlloc> Alloc for GlobalAlloc<A> {
    unsafe fn alloc(&mut self, layout: Layout) -> Result<NonNull<u8>, Error> {
        let ptr = StdGlobalAlloc::alloc(&mut self.0, layout);
        NonNull::new(ptr).context(AllocationError { layout })
    }

    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        StdGlobalAlloc::dealloc(&mut self.0, ptr.as_ptr(), layout)
    }

    unsafe fn realloc(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, Error> {
        let ptr = StdGlobalAlloc::realloc(&mut self.0, ptr.as_ptr(), layout, new_size);
        NonNull::new(ptr).context(ReallocationError { layout, new_size })
    }
}

/// The registered global allocator.
#[derive(Debug, Default, Clone)]
pub struct Global;

unsafe impl Alloc for Global {
    unsafe fn alloc(&mut self, layout: Layout) -> Result<NonNull<u8>, Error> {
        let ptr = std::alloc::alloc(layout);
        NonNull::new(ptr).context(AllocationError { layout })
    }

    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout)
    }

    unsafe fn realloc(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, Error> {
        let ptr = std::alloc::realloc(ptr.as_ptr(), layout, new_size);
        NonNull::new(ptr).context(ReallocationError { layout, new_size })
    }
}

unsafe impl Alloc for &Global {
    unsafe fn alloc(&mut self, layout: Layout) -> Result<NonNull<u8>, Error> {
        Global.alloc(layout)
    }

    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        Global.dealloc(ptr, layout)
    }

    unsafe fn realloc(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, Error> {
        Global.realloc(ptr, layout, new_size)
    }
}

/// The operating system allocator.
pub type System = GlobalAlloc<::std::alloc::System>;

unsafe impl Alloc for &System {
    unsafe fn alloc(&mut self, layout: Layout) -> Result<NonNull<u8>, Error> {
        GlobalAlloc(::std::alloc::System).alloc(layout)
    }

    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        GlobalAlloc(::std::alloc::System).dealloc(ptr, layout)
    }

    unsafe fn realloc(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, Error> {
        GlobalAlloc(::std::alloc::System).realloc(ptr, layout, new_size)
    }
}

/// An allocator that refuses every request. Handy for exercising
/// allocation-failure paths in tests.
#[derive(Debug, Clone, Copy)]
pub struct NoOp;

unsafe impl Alloc for NoOp {
    unsafe fn alloc(&mut self, layout: Layout) -> Result<NonNull<u8>, Error> {
        Err(Error::AllocationError { layout })
    }

    unsafe fn dealloc(&mut self, _ptr: NonNull<u8>, _layout: Layout) {
        /* No op */
    }
}

unsafe impl Alloc for &NoOp {
    unsafe fn alloc(&mut self, layout: Layout) -> Result<NonNull<u8>, Error> {
        NoOp.alloc(layout)
    }

    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        NoOp.dealloc(ptr, layout)
    }
}
