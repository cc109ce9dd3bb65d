//! Doubly-linked list over an index-keyed node arena.

use crate::{
    alloc::Global,
    array::{self, DynArray},
    Alloc,
};
use core::{fmt, mem};
use snafu::{ensure, ResultExt, Snafu};

pub mod iter;

/// Null link value; marks the ends of the chain and the end of the free
/// list.
const NONE: usize = usize::MAX;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("List is empty"))]
    Empty,

    #[snafu(display("Index {} is out of bounds (length = {})", index, len))]
    OutOfRange { index: usize, len: usize },

    #[snafu(display("Failed to grow the node arena: {}", source))]
    Storage { source: array::Error },
}

struct Node<T> {
    value: T,
    prev: usize,
    next: usize,
}

enum Slot<T> {
    Occupied(Node<T>),
    Free { next_free: usize },
}

/// Doubly-linked list whose nodes live in a contiguous arena.
///
/// Instead of heap-allocating every node, nodes are slots in a growable
/// arena and the `prev`/`next` links are stable slot indices. Removing a node
/// pushes its slot onto an internal free list for reuse, so the chain never
/// holds a dangling link and individual operations never call the allocator
/// except when the arena itself has to grow.
///
/// Pushing and popping at either end is O(1) (amortized for pushes);
/// indexed access, insertion and removal traverse the chain from the head
/// and are O(n).
///
/// The list owns its values: `pop_front`/`pop_back`/`remove` transfer
/// ownership back to the caller, and dropping the list drops every value
/// still linked in.
pub struct LinkedList<T, A: Alloc = Global> {
    slots: DynArray<Slot<T>, A>,
    head: usize,
    tail: usize,
    /// Head of the free list threaded through vacant slots.
    free: usize,
    len: usize,
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LinkedList<T> {
    /// Creates an empty list. Does not allocate.
    pub fn new() -> Self {
        Self::new_in(<_>::default())
    }

    /// Tries to construct a list from a given iterator, appending at the
    /// tail.
    pub fn try_from_iter<I>(i: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
    {
        Self::try_from_iter_in(i, <_>::default())
    }
}

impl<T, A: Alloc> LinkedList<T, A> {
    /// Creates an empty list using a given allocator. Does not allocate.
    pub fn new_in(alloc: A) -> Self {
        Self {
            slots: DynArray::with_capacity_in(0, alloc).expect("Should not allocate"),
            head: NONE,
            tail: NONE,
            free: NONE,
            len: 0,
        }
    }

    /// Tries to construct a list from a given iterator using a given
    /// allocator.
    pub fn try_from_iter_in<I>(i: I, allocator: A) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
    {
        let mut list = LinkedList::new_in(allocator);
        list.try_extend(i)?;
        Ok(list)
    }

    /// Tries to append every item of the iterator at the tail.
    pub fn try_extend<I>(&mut self, i: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
    {
        for item in i {
            self.push_back(item)?;
        }
        Ok(())
    }

    /// Appends a value at the tail. O(1); updates the head too when the list
    /// was empty.
    pub fn push_back(&mut self, value: T) -> Result<(), Error> {
        let tail = self.tail;
        let idx = self.alloc_slot(Node {
            value,
            prev: tail,
            next: NONE,
        })?;
        if tail == NONE {
            self.head = idx;
        } else {
            self.node_mut(tail).next = idx;
        }
        self.tail = idx;
        self.len += 1;
        Ok(())
    }

    /// Prepends a value at the head. O(1).
    pub fn push_front(&mut self, value: T) -> Result<(), Error> {
        let head = self.head;
        let idx = self.alloc_slot(Node {
            value,
            prev: NONE,
            next: head,
        })?;
        if head == NONE {
            self.tail = idx;
        } else {
            self.node_mut(head).prev = idx;
        }
        self.head = idx;
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the value at the head.
    ///
    /// Fails with [`Error::Empty`] on an empty list.
    pub fn pop_front(&mut self) -> Result<T, Error> {
        ensure!(self.len != 0, Empty);
        let node = self.free_slot(self.head);
        self.head = node.next;
        if self.head == NONE {
            self.tail = NONE;
        } else {
            let head = self.head;
            self.node_mut(head).prev = NONE;
        }
        self.len -= 1;
        Ok(node.value)
    }

    /// Removes and returns the value at the tail.
    ///
    /// Fails with [`Error::Empty`] on an empty list.
    pub fn pop_back(&mut self) -> Result<T, Error> {
        ensure!(self.len != 0, Empty);
        let node = self.free_slot(self.tail);
        self.tail = node.prev;
        if self.tail == NONE {
            self.head = NONE;
        } else {
            let tail = self.tail;
            self.node_mut(tail).next = NONE;
        }
        self.len -= 1;
        Ok(node.value)
    }

    /// Inserts a value so it becomes the element at `index`.
    ///
    /// The valid range is `0..=len`; `index == len` appends at the tail.
    /// Both ends are O(1); the general case traverses from the head.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), Error> {
        ensure!(
            index <= self.len,
            OutOfRange {
                index,
                len: self.len
            }
        );
        if index == 0 {
            return self.push_front(value);
        }
        if index == self.len {
            return self.push_back(value);
        }

        let at = self.index_of(index);
        let prev = self.node(at).prev;
        let idx = self.alloc_slot(Node {
            value,
            prev,
            next: at,
        })?;
        self.node_mut(prev).next = idx;
        self.node_mut(at).prev = idx;
        self.len += 1;
        Ok(())
    }

    /// Removes the node at `index` and returns its value.
    ///
    /// Fails with [`Error::Empty`] on an empty list and
    /// [`Error::OutOfRange`] when `index >= len`. Boundary indices delegate
    /// to [`pop_front`](LinkedList::pop_front) /
    /// [`pop_back`](LinkedList::pop_back).
    pub fn remove(&mut self, index: usize) -> Result<T, Error> {
        ensure!(self.len != 0, Empty);
        ensure!(
            index < self.len,
            OutOfRange {
                index,
                len: self.len
            }
        );
        if index == 0 {
            return self.pop_front();
        }
        if index == self.len - 1 {
            return self.pop_back();
        }

        let at = self.index_of(index);
        let node = self.free_slot(at);
        self.node_mut(node.prev).next = node.next;
        self.node_mut(node.next).prev = node.prev;
        self.len -= 1;
        Ok(node.value)
    }

    /// Returns a reference to the value at `index`.
    ///
    /// Fails with [`Error::Empty`] on an empty list and
    /// [`Error::OutOfRange`] when `index >= len`.
    pub fn get(&self, index: usize) -> Result<&T, Error> {
        ensure!(self.len != 0, Empty);
        ensure!(
            index < self.len,
            OutOfRange {
                index,
                len: self.len
            }
        );
        Ok(&self.node(self.index_of(index)).value)
    }

    /// Returns a mutable reference to the value at `index`.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, Error> {
        ensure!(self.len != 0, Empty);
        ensure!(
            index < self.len,
            OutOfRange {
                index,
                len: self.len
            }
        );
        let at = self.index_of(index);
        Ok(&mut self.node_mut(at).value)
    }

    /// Returns a reference to the head value, if any.
    pub fn front(&self) -> Option<&T> {
        if self.head == NONE {
            None
        } else {
            Some(&self.node(self.head).value)
        }
    }

    /// Returns a reference to the tail value, if any.
    pub fn back(&self) -> Option<&T> {
        if self.tail == NONE {
            None
        } else {
            Some(&self.node(self.tail).value)
        }
    }

    /// Returns the number of linked-in values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every value and resets the arena.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = NONE;
        self.tail = NONE;
        self.free = NONE;
        self.len = 0;
    }

    /// Returns an iterator from head to tail. Reversible.
    pub fn iter(&self) -> iter::Iter<'_, T> {
        iter::Iter::new(self)
    }

    /// Returns a mutable iterator from head to tail. Reversible.
    pub fn iter_mut(&mut self) -> iter::IterMut<'_, T> {
        iter::IterMut::new(self)
    }

    /// Tries to clone the list.
    pub fn try_clone(&self) -> Result<Self, Error>
    where
        A: Clone,
        T: Clone,
    {
        let alloc = A::clone(self.slots.alloc());
        self.try_clone_in(alloc)
    }

    /// Tries to clone the list into a given allocator.
    pub fn try_clone_in<NewAlloc>(&self, alloc: NewAlloc) -> Result<LinkedList<T, NewAlloc>, Error>
    where
        NewAlloc: Alloc,
        T: Clone,
    {
        let mut new_list = LinkedList::new_in(alloc);
        for item in self.iter() {
            new_list.push_back(T::clone(item))?;
        }
        Ok(new_list)
    }

    /// Walks the chain from the head to the slot holding the `index`th
    /// value.
    fn index_of(&self, index: usize) -> usize {
        debug_assert!(index < self.len);
        let mut at = self.head;
        for _ in 0..index {
            at = self.node(at).next;
        }
        at
    }

    fn node(&self, idx: usize) -> &Node<T> {
        match self.slots.get(idx) {
            Some(Slot::Occupied(node)) => node,
            _ => unreachable!("slot {} is not part of the chain", idx),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<T> {
        match self.slots.get_mut(idx) {
            Some(Slot::Occupied(node)) => node,
            _ => unreachable!("slot {} is not part of the chain", idx),
        }
    }

    /// Places a node into a vacant slot, growing the arena only when the
    /// free list is exhausted.
    fn alloc_slot(&mut self, node: Node<T>) -> Result<usize, Error> {
        if self.free == NONE {
            let idx = self.slots.len();
            self.slots.push(Slot::Occupied(node)).context(Storage)?;
            return Ok(idx);
        }
        let idx = self.free;
        let slot = match self.slots.get_mut(idx) {
            Some(slot) => slot,
            None => unreachable!("free list points outside the arena"),
        };
        let next_free = match *slot {
            Slot::Free { next_free } => next_free,
            Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
        };
        *slot = Slot::Occupied(node);
        self.free = next_free;
        Ok(idx)
    }

    /// Unlinks a node from its slot and threads the slot onto the free
    /// list.
    fn free_slot(&mut self, idx: usize) -> Node<T> {
        let next_free = self.free;
        let slot = match self.slots.get_mut(idx) {
            Some(slot) => slot,
            None => unreachable!("slot {} is out of arena bounds", idx),
        };
        match mem::replace(slot, Slot::Free { next_free }) {
            Slot::Occupied(node) => {
                self.free = idx;
                node
            }
            Slot::Free { .. } => unreachable!("slot {} freed twice", idx),
        }
    }
}

unsafe impl<T: Send, A: Alloc + Send> Send for LinkedList<T, A> {}
unsafe impl<T: Sync, A: Alloc + Sync> Sync for LinkedList<T, A> {}

impl<'a, T, A: Alloc> IntoIterator for &'a LinkedList<T, A> {
    type IntoIter = iter::Iter<'a, T>;
    type Item = &'a T;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Alloc> IntoIterator for &'a mut LinkedList<T, A> {
    type IntoIter = iter::IterMut<'a, T>;
    type Item = &'a mut T;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A: Alloc> IntoIterator for LinkedList<T, A> {
    type Item = T;
    type IntoIter = iter::IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        iter::IntoIter::new(self)
    }
}

impl<T: fmt::Debug, A: Alloc> fmt::Debug for LinkedList<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut iter = self.iter();
        if let Some(first) = iter.next() {
            write!(f, "{:?}", first)?;
        }
        for item in iter {
            write!(f, ", {:?}", item)?;
        }
        write!(f, "]")?;
        Ok(())
    }
}

impl<T1, T2, A> PartialEq<[T1]> for LinkedList<T2, A>
where
    T2: PartialEq<T1>,
    A: Alloc,
{
    fn eq(&self, other: &[T1]) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T1, T2, A> PartialEq<LinkedList<T2, A>> for [T1]
where
    T2: PartialEq<T1>,
    A: Alloc,
{
    fn eq(&self, other: &LinkedList<T2, A>) -> bool {
        PartialEq::eq(other, self)
    }
}

impl<T1, T2, A1, A2> PartialEq<LinkedList<T1, A1>> for LinkedList<T2, A2>
where
    T2: PartialEq<T1>,
    A1: Alloc,
    A2: Alloc,
{
    fn eq(&self, other: &LinkedList<T1, A1>) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Clone, A: Alloc + Clone> Clone for LinkedList<T, A> {
    fn clone(&self) -> Self {
        self.try_clone().expect("Unable to clone a list")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::alloc::NoOp;
    use core::fmt::Debug;
    use quickcheck::{Arbitrary, TestResult};
    use quickcheck_macros::quickcheck;
    use rand::Rng;
    use std::rc::Rc;

    #[test]
    fn check_len() {
        let mut l = LinkedList::new();
        assert!(l.is_empty());
        assert_eq!(l.len(), 0);

        l.push_back(5).unwrap();
        assert_eq!(l.len(), 1);
        assert_eq!(l.front(), Some(&5));
        assert_eq!(l.back(), Some(&5));
    }

    #[test]
    fn check_spec_scenario() {
        let mut l = LinkedList::new();
        l.try_extend(vec![1, 2, 3]).unwrap();
        assert_eq!(*l.get(0).unwrap(), 1);
        assert_eq!(*l.get(1).unwrap(), 2);
        assert_eq!(*l.get(2).unwrap(), 3);

        assert_eq!(l.remove(1).unwrap(), 2);
        assert_eq!(*l.get(0).unwrap(), 1);
        assert_eq!(*l.get(1).unwrap(), 3);
        assert_eq!(l.len(), 2);

        assert_eq!(l.pop_back().unwrap(), 3);
        assert_eq!(l.pop_back().unwrap(), 1);
        assert_eq!(l.len(), 0);
    }

    #[test]
    fn check_positional_order() {
        let mut l = LinkedList::new();
        for i in 0..1000usize {
            l.push_back(i).unwrap();
        }
        assert_eq!(l.len(), 1000);
        for i in 0..1000usize {
            assert_eq!(*l.get(i).unwrap(), i);
        }
        for i in 0..1000usize {
            assert_eq!(l.pop_front().unwrap(), i);
        }
        assert!(l.is_empty());
    }

    #[test]
    fn check_pop_back_order() {
        let mut l = LinkedList::new();
        for i in 0..100usize {
            l.push_back(i).unwrap();
        }
        for i in (0..100usize).rev() {
            assert_eq!(l.pop_back().unwrap(), i);
        }
        assert!(matches!(l.pop_back(), Err(Error::Empty)));
    }

    #[test]
    fn check_empty_access() {
        let mut l = LinkedList::<u8>::new();
        assert!(matches!(l.pop_front(), Err(Error::Empty)));
        assert!(matches!(l.pop_back(), Err(Error::Empty)));
        assert!(matches!(l.get(0), Err(Error::Empty)));
        assert!(matches!(l.remove(0), Err(Error::Empty)));
        // Inserting anywhere but the front of an empty list fails.
        assert!(matches!(
            l.insert(1, 7),
            Err(Error::OutOfRange { index: 1, len: 0 })
        ));
        assert!(l.is_empty());

        l.insert(0, 7).unwrap();
        assert_eq!(l.front(), Some(&7));
    }

    #[test]
    fn check_insert_boundaries() {
        let mut l = LinkedList::new();
        l.try_extend(vec![1, 2, 4]).unwrap();

        // `index == len` appends.
        l.insert(3, 5).unwrap();
        assert_eq!(l.back(), Some(&5));

        // General case relinks neighbors.
        l.insert(2, 3).unwrap();
        assert_eq!(&l, &[1, 2, 3, 4, 5][..]);

        assert!(matches!(
            l.insert(6, 0),
            Err(Error::OutOfRange { index: 6, len: 5 })
        ));
    }

    #[test]
    fn check_slot_reuse() {
        let mut l = LinkedList::new();
        l.try_extend(0..8usize).unwrap();
        let slots = l.slots.len();

        l.remove(3).unwrap();
        l.remove(3).unwrap();
        l.insert(2, 100).unwrap();
        l.insert(5, 101).unwrap();

        // Vacant slots are recycled before the arena grows.
        assert_eq!(l.slots.len(), slots);
        assert_eq!(&l, &[0, 1, 100, 2, 3, 101, 6, 7][..]);
    }

    #[test]
    fn check_allocation_failure() {
        let mut l = LinkedList::new_in(NoOp);
        match l.push_back(1u32) {
            Err(Error::Storage { .. }) => {}
            other => panic!("Unexpected result: {:?}", other),
        }
        assert!(l.is_empty());
    }

    #[test]
    fn check_iter_both_ways() {
        let mut l = LinkedList::new();
        l.try_extend(vec![1, 2, 3, 4, 5]).unwrap();

        let forward: std::vec::Vec<i32> = l.iter().cloned().collect();
        let mut backward: std::vec::Vec<i32> = l.iter().rev().cloned().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(l.iter().len(), l.len());

        for item in l.iter_mut() {
            *item *= 10;
        }
        assert_eq!(&l, &[10, 20, 30, 40, 50][..]);

        let consumed: std::vec::Vec<i32> = l.into_iter().collect();
        assert_eq!(consumed, &[10, 20, 30, 40, 50]);
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Action<T> {
        PushBack(T),
        PushFront(T),
        PopBack,
        PopFront,
        Insert(usize, T),
        Remove(usize),
        Get(usize),
        Clear,
    }

    impl<T: Arbitrary> Arbitrary for Action<T> {
        fn arbitrary<G: quickcheck::Gen>(g: &mut G) -> Self {
            match g.gen_range(0, 8) {
                0 => Action::PushBack(T::arbitrary(g)),
                1 => Action::PushFront(T::arbitrary(g)),
                2 => Action::PopBack,
                3 => Action::PopFront,
                4 => {
                    let n = g.gen_range(0, 1000);
                    Action::Insert(n, T::arbitrary(g))
                }
                5 => {
                    let n = g.gen_range(0, 1000);
                    Action::Remove(n)
                }
                6 => {
                    let n = g.gen_range(0, 1000);
                    Action::Get(n)
                }
                7 => Action::Clear,
                _ => unreachable!(),
            }
        }
    }

    fn check_integrity<T: Clone + Debug + PartialEq, A: Alloc>(list: &LinkedList<T, A>) {
        let forward: std::vec::Vec<T> = list.iter().cloned().collect();
        let mut backward: std::vec::Vec<T> = list.iter().rev().cloned().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), list.len());
    }

    fn check_actions<T, I>(initial: &[T], actions: I)
    where
        T: Clone + Debug + PartialEq,
        I: IntoIterator<Item = Action<T>>,
    {
        let mut result = LinkedList::try_from_iter(initial.iter().cloned()).expect("Unable to init");
        let mut reference: std::vec::Vec<T> = initial.to_vec();

        for action in actions {
            match action {
                Action::PushBack(item) => {
                    result.push_back(item.clone()).expect("Push back failed");
                    reference.push(item);
                }
                Action::PushFront(item) => {
                    result.push_front(item.clone()).expect("Push front failed");
                    reference.insert(0, item);
                }
                Action::PopBack => {
                    if reference.is_empty() {
                        assert!(matches!(result.pop_back(), Err(Error::Empty)));
                    } else {
                        assert_eq!(result.pop_back().expect("Pop back failed"), reference.pop().unwrap());
                    }
                }
                Action::PopFront => {
                    if reference.is_empty() {
                        assert!(matches!(result.pop_front(), Err(Error::Empty)));
                    } else {
                        assert_eq!(result.pop_front().expect("Pop front failed"), reference.remove(0));
                    }
                }
                Action::Insert(idx, item) => {
                    if idx <= reference.len() {
                        result.insert(idx, item.clone()).expect("Insert failed");
                        reference.insert(idx, item);
                    } else {
                        assert!(matches!(
                            result.insert(idx, item),
                            Err(Error::OutOfRange { .. })
                        ));
                    }
                }
                Action::Remove(idx) => {
                    if reference.is_empty() {
                        assert!(matches!(result.remove(idx), Err(Error::Empty)));
                    } else if idx < reference.len() {
                        assert_eq!(result.remove(idx).expect("Remove failed"), reference.remove(idx));
                    } else {
                        assert!(matches!(
                            result.remove(idx),
                            Err(Error::OutOfRange { .. })
                        ));
                    }
                }
                Action::Get(idx) => {
                    assert_eq!(result.get(idx).ok(), reference.get(idx));
                }
                Action::Clear => {
                    result.clear();
                    reference.clear();
                }
            }
            assert_eq!(result.len(), reference.len());
        }

        check_integrity(&result);
        let result: std::vec::Vec<T> = result.iter().cloned().collect();
        assert_eq!(result, reference);
    }

    #[quickcheck]
    fn check_actions_u8(initial: Vec<u8>, actions: Vec<Action<u8>>) {
        check_actions(&initial, actions)
    }

    #[quickcheck]
    fn check_actions_usize(initial: Vec<usize>, actions: Vec<Action<usize>>) {
        check_actions(&initial, actions)
    }

    #[quickcheck]
    fn check_actions_string(initial: Vec<String>, actions: Vec<Action<String>>) {
        check_actions(&initial, actions)
    }

    #[quickcheck]
    fn check_insert_remove_round_trip(original: Vec<u16>, idx: usize, value: u16) -> TestResult {
        let mut l = match LinkedList::try_from_iter(original.iter().cloned()) {
            Ok(l) => l,
            Err(e) => panic!("Unable to init: {}", e),
        };
        let idx = if original.is_empty() {
            0
        } else {
            idx % (original.len() + 1)
        };

        l.insert(idx, value).unwrap();
        assert_eq!(*l.get(idx).unwrap(), value);
        assert_eq!(l.remove(idx).unwrap(), value);

        check_integrity(&l);
        assert_eq!(&l, &original[..]);
        TestResult::passed()
    }

    #[test]
    fn check_drops() {
        let r1 = Rc::new(123);
        let r2 = Rc::new(456);

        {
            let mut l = LinkedList::new();
            l.push_back(Rc::clone(&r1)).unwrap();
            l.push_front(Rc::clone(&r2)).unwrap();

            let popped = l.pop_front().unwrap();
            assert!(Rc::ptr_eq(&popped, &r2));
            drop(popped);

            assert_eq!(Rc::strong_count(&r1), 2);
            assert_eq!(Rc::strong_count(&r2), 1);
        }

        assert_eq!(Rc::strong_count(&r1), 1);
        assert_eq!(Rc::strong_count(&r2), 1);
    }

    #[quickcheck]
    fn check_clone(original: Vec<String>) {
        let l = LinkedList::try_from_iter(original.iter().cloned()).unwrap();
        let clone = l.clone();
        assert_eq!(l, clone);
    }
}
