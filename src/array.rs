//! Growable array with doubling capacity.

use crate::{
    alloc::Global,
    raw_buf::{self, RawBuf},
    Alloc,
};
use core::{fmt, mem, ptr, slice};
use snafu::{ensure, ResultExt, Snafu};

pub mod macros;

/// Number of slots a freshly created array reserves.
pub const INITIAL_CAPACITY: usize = 16;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Index {} is out of bounds (length = {})", index, len))]
    OutOfRange { index: usize, len: usize },

    #[snafu(display("Failed to grow the backing buffer: {}", source))]
    Grow { source: raw_buf::Error },
}

/// Growable array of `T` over a contiguous heap buffer.
///
/// Elements are stored in the first `len` slots of the buffer; the capacity
/// doubles whenever an append or insert finds the buffer full, which keeps
/// [`push`](DynArray::push) at amortized O(1). Random access is O(1),
/// [`insert`](DynArray::insert) shifts the tail and is O(n).
///
/// The array owns its elements: [`pop`](DynArray::pop) hands ownership back
/// to the caller, while dropping the array (or calling
/// [`clear`](DynArray::clear)) drops every remaining element before the
/// buffer is released.
pub struct DynArray<T, A: Alloc = Global> {
    buf: RawBuf<T, A>,
    len: usize,
}

unsafe impl<T: Send, A: Alloc + Send> Send for DynArray<T, A> {}
unsafe impl<T: Sync, A: Alloc + Sync> Sync for DynArray<T, A> {}

impl<T> DynArray<T> {
    /// Creates an array with [`INITIAL_CAPACITY`] slots reserved.
    pub fn new() -> Result<Self, Error> {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates an array with a given capacity. A capacity of zero does not
    /// allocate.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_capacity_in(capacity, <_>::default())
    }

    /// Tries to construct an array from a given iterator.
    pub fn try_from_iter<I>(i: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
    {
        Self::try_from_iter_in(i, <_>::default())
    }
}

impl<T, A: Alloc> DynArray<T, A> {
    /// Creates an array with [`INITIAL_CAPACITY`] slots reserved from a given
    /// allocator.
    pub fn new_in(alloc: A) -> Result<Self, Error> {
        Self::with_capacity_in(INITIAL_CAPACITY, alloc)
    }

    /// Creates an array with a given capacity using a given allocator.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, Error> {
        let buf = RawBuf::with_capacity_in(capacity, alloc).context(Grow)?;
        Ok(Self { buf, len: 0 })
    }

    /// Tries to construct an array from a given iterator.
    pub fn try_from_iter_in<I>(i: I, allocator: A) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
    {
        let mut array = DynArray::with_capacity_in(0, allocator)?;
        array.try_extend(i)?;
        Ok(array)
    }

    /// Tries to extend the array with a given iterator.
    pub fn try_extend<I>(&mut self, i: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
    {
        let iter = i.into_iter();
        self.buf
            .try_reserve(self.len, estimation(&iter))
            .context(Grow)?;
        for item in iter {
            self.push(item)?;
        }
        Ok(())
    }

    /// Appends an element at the next free slot, doubling the capacity first
    /// if the buffer is full.
    pub fn push(&mut self, item: T) -> Result<(), Error> {
        if self.len == self.buf.capacity() {
            self.buf.double().context(Grow)?;
        }
        unsafe { self.buf.as_ptr().add(self.len).write(item) };
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the last element, or `None` if the array is
    /// empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            Some(unsafe { self.buf.as_ptr().add(self.len).read() })
        }
    }

    /// Returns a reference to the `n`th element, or `None` if `n` is out of
    /// bounds.
    pub fn get(&self, n: usize) -> Option<&T> {
        self.as_slice().get(n)
    }

    /// Returns a mutable reference to the `n`th element, or `None` if `n` is
    /// out of bounds.
    pub fn get_mut(&mut self, n: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(n)
    }

    /// Inserts an element so it becomes the one at `index`, shifting every
    /// element at and after `index` one slot to the right.
    ///
    /// `index == len` behaves as an append; `index > len` fails with
    /// [`Error::OutOfRange`].
    pub fn insert(&mut self, index: usize, item: T) -> Result<(), Error> {
        ensure!(
            index <= self.len,
            OutOfRange {
                index,
                len: self.len
            }
        );
        if self.len == self.buf.capacity() {
            self.buf.double().context(Grow)?;
        }
        unsafe {
            let p = self.buf.as_ptr().add(index);
            ptr::copy(p, p.add(1), self.len - index);
            p.write(item);
        }
        self.len += 1;
        Ok(())
    }

    /// Replaces the element at `index`, returning the previous value.
    ///
    /// Fails with [`Error::OutOfRange`] if `index >= len`. Unlike
    /// [`insert`](DynArray::insert) this never shifts or grows.
    pub fn set(&mut self, index: usize, item: T) -> Result<T, Error> {
        ensure!(
            index < self.len,
            OutOfRange {
                index,
                len: self.len
            }
        );
        Ok(mem::replace(&mut self.as_mut_slice()[index], item))
    }

    /// Returns the number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots the buffer can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns a shared reference to the backing allocator.
    pub fn alloc(&self) -> &A {
        self.buf.alloc()
    }

    /// Shortens the array to `len` elements, dropping the tail. No-op when
    /// `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            self.pop();
        }
    }

    /// Resizes the array to `new_len` elements, filling with clones of
    /// `value` when growing.
    pub fn resize(&mut self, new_len: usize, value: T) -> Result<(), Error>
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }
        self.buf
            .try_reserve(self.len, new_len - self.len)
            .context(Grow)?;
        while self.len < new_len {
            self.push(value.clone())?;
        }
        Ok(())
    }

    /// Drops all the elements, keeping the buffer.
    pub fn clear(&mut self) {
        let elements = self.as_mut_slice() as *mut [T];
        self.len = 0;
        unsafe {
            // use drop for [T]
            ptr::drop_in_place(elements);
        }
    }

    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.buf.as_ptr(), self.len) }
    }

    /// Returns iterator over stored items.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Returns iterator over stored items.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Tries to clone the array.
    pub fn try_clone(&self) -> Result<Self, Error>
    where
        A: Clone,
        T: Clone,
    {
        let alloc = A::clone(self.buf.alloc());
        self.try_clone_in(alloc)
    }

    /// Tries to clone the array into a given allocator.
    pub fn try_clone_in<NewAlloc>(&self, alloc: NewAlloc) -> Result<DynArray<T, NewAlloc>, Error>
    where
        NewAlloc: Alloc,
        T: Clone,
    {
        let mut new_array = DynArray::with_capacity_in(self.len, alloc)?;
        for item in self.iter() {
            new_array.push(T::clone(item))?;
        }
        Ok(new_array)
    }
}

impl<T, A: Alloc> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A: Alloc> std::ops::Deref for DynArray<T, A> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, A: Alloc> std::ops::DerefMut for DynArray<T, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, A: Alloc> std::ops::Index<usize> for DynArray<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index)
            .unwrap_or_else(|| panic!("Index {} is out of bounds (length = {})", index, self.len))
    }
}

impl<T, A: Alloc> std::ops::Index<std::ops::RangeFull> for DynArray<T, A> {
    type Output = [T];

    fn index(&self, _index: std::ops::RangeFull) -> &Self::Output {
        self.as_slice()
    }
}

impl<'a, T, A: Alloc> IntoIterator for &'a DynArray<T, A> {
    type IntoIter = slice::Iter<'a, T>;
    type Item = &'a T;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Alloc> IntoIterator for &'a mut DynArray<T, A> {
    type IntoIter = slice::IterMut<'a, T>;
    type Item = &'a mut T;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: fmt::Debug, A: Alloc> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T1, T2, A> PartialEq<[T1]> for DynArray<T2, A>
where
    T2: PartialEq<T1>,
    A: Alloc,
{
    fn eq(&self, other: &[T1]) -> bool {
        self.as_slice() == other
    }
}

impl<T1, T2, A> PartialEq<DynArray<T2, A>> for [T1]
where
    T2: PartialEq<T1>,
    A: Alloc,
{
    fn eq(&self, other: &DynArray<T2, A>) -> bool {
        PartialEq::eq(other, self)
    }
}

impl<T1, T2, A1, A2> PartialEq<DynArray<T1, A1>> for DynArray<T2, A2>
where
    T2: PartialEq<T1>,
    A1: Alloc,
    A2: Alloc,
{
    fn eq(&self, other: &DynArray<T1, A1>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Clone, A: Alloc + Clone> Clone for DynArray<T, A> {
    fn clone(&self) -> Self {
        self.try_clone().expect("Unable to clone an array")
    }
}

fn estimation<I: Iterator>(iter: &I) -> usize {
    let (lower, maybe_upper) = iter.size_hint();
    if let Some(upper) = maybe_upper {
        upper
    } else {
        lower
    }
}
