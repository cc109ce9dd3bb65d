//! Sequence containers built directly over raw allocated memory.
//!
//! Two containers are provided: [`DynArray`], a growable array with doubling
//! capacity, and [`LinkedList`], a doubly-linked list whose nodes live in an
//! index-keyed arena. Both are parameterized over an [`Alloc`] allocator and
//! report allocation failures as recoverable errors instead of aborting.

pub mod alloc;
pub mod array;
pub mod list;
pub mod raw_buf;
pub mod unique;

pub use alloc::Alloc;
pub use array::DynArray;
pub use list::LinkedList;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_works() {
        let alloc = crate::alloc::System::default();
        let mut a = DynArray::new_in(alloc).unwrap();
        a.push("Wow!").unwrap();
        assert_eq!(&a[..], &["Wow!"]);
        a.pop();
        assert!(a.is_empty());
    }

    #[test]
    fn list_works() {
        let alloc = crate::alloc::System::default();
        let mut l = LinkedList::new_in(alloc);
        l.push_back("Wow!").unwrap();
        assert_eq!(l.front(), Some(&"Wow!"));
        l.pop_back().unwrap();
        assert!(l.is_empty());
    }
}
