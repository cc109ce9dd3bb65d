//! LinkedList iterators.

use super::{LinkedList, Node, Slot};
use crate::Alloc;
use core::iter::ExactSizeIterator;
use std::marker::PhantomData;

fn node_at<T>(slots: &[Slot<T>], idx: usize) -> &Node<T> {
    match slots.get(idx) {
        Some(Slot::Occupied(node)) => node,
        _ => unreachable!("slot {} is not part of the chain", idx),
    }
}

/// Double-ended borrowing iterator; walks the chain from both ends toward
/// the middle.
pub struct Iter<'a, T> {
    slots: &'a [Slot<T>],
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new<A: Alloc>(list: &'a LinkedList<T, A>) -> Self {
        Self {
            slots: list.slots.as_slice(),
            front: list.head,
            back: list.tail,
            remaining: list.len,
        }
    }
}

impl<'a, T: 'a> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            None
        } else {
            let node = node_at(self.slots, self.front);
            self.front = node.next;
            self.remaining -= 1;
            Some(&node.value)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl<'a, T: 'a> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            None
        } else {
            let node = node_at(self.slots, self.back);
            self.back = node.prev;
            self.remaining -= 1;
            Some(&node.value)
        }
    }
}

impl<'a, T: 'a> ExactSizeIterator for Iter<'a, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// Double-ended mutable iterator over the chain.
pub struct IterMut<'a, T> {
    slots: *mut Slot<T>,
    front: usize,
    back: usize,
    remaining: usize,
    _pd: PhantomData<&'a mut T>,
}

impl<'a, T> IterMut<'a, T> {
    pub(super) fn new<A: Alloc>(list: &'a mut LinkedList<T, A>) -> Self {
        Self {
            slots: list.slots.as_mut_slice().as_mut_ptr(),
            front: list.head,
            back: list.tail,
            remaining: list.len,
            _pd: PhantomData,
        }
    }

    /// # Safety
    ///
    /// `idx` must be a live chain index; the returned borrow must not alias
    /// any other item handed out by this iterator. The chain structure
    /// guarantees each slot is visited at most once.
    unsafe fn node_at_mut(&mut self, idx: usize) -> &'a mut Node<T> {
        match &mut *self.slots.add(idx) {
            Slot::Occupied(node) => node,
            Slot::Free { .. } => unreachable!("slot {} is not part of the chain", idx),
        }
    }
}

impl<'a, T: 'a> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = unsafe { self.node_at_mut(self.front) };
        self.front = node.next;
        self.remaining -= 1;
        Some(&mut node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl<'a, T: 'a> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = unsafe { self.node_at_mut(self.back) };
        self.back = node.prev;
        self.remaining -= 1;
        Some(&mut node.value)
    }
}

impl<'a, T: 'a> ExactSizeIterator for IterMut<'a, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// Consuming iterator; pops values off the list front to back.
pub struct IntoIter<T, A: Alloc> {
    inner: LinkedList<T, A>,
}

impl<T, A: Alloc> IntoIter<T, A> {
    pub(super) fn new(list: LinkedList<T, A>) -> Self {
        Self { inner: list }
    }
}

impl<T, A: Alloc> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.pop_front().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl<T, A: Alloc> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.pop_back().ok()
    }
}

impl<T, A: Alloc> ExactSizeIterator for IntoIter<T, A> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn check() {
        let mut l = LinkedList::<u16>::new();
        for i in 0..10 {
            l.push_back(i).unwrap();
        }

        assert_eq!(l.iter().len(), 10);
        for (idx, value) in l.iter().enumerate() {
            assert_eq!(idx, usize::from(*value));
        }

        assert_eq!(l.iter_mut().len(), 10);
        for (idx, value) in l.iter_mut().enumerate() {
            assert_eq!(idx, usize::from(*value));
        }

        let backward: Vec<u16> = l.iter().rev().cloned().collect();
        assert_eq!(backward, (0..10).rev().collect::<Vec<u16>>());
    }

    #[test]
    fn check_meet_in_the_middle() {
        let mut l = LinkedList::<u16>::new();
        l.try_extend(vec![1, 2, 3]).unwrap();

        let mut iter = l.iter();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&3));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }
}
