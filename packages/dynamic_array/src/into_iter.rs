use std::fmt;
use std::iter::FusedIterator;
use std::ptr;
use std::slice;

use crate::RawBlock;

/// An iterator that moves the items out of a [`DynamicArray`][crate::DynamicArray].
///
/// Created by the `into_iter()` method on `DynamicArray` (provided by the [`IntoIterator`]
/// trait). Items not consumed by the time the iterator is dropped are dropped with it.
pub struct IntoIter<T> {
    block: RawBlock<T>,

    /// Slots `[front, back)` still hold live items. Everything outside that range has either
    /// been moved out already or was never initialized.
    front: usize,
    back: usize,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(block: RawBlock<T>, len: usize) -> Self {
        debug_assert!(len <= block.capacity());

        Self {
            block,
            front: 0,
            back: len,
        }
    }

    /// Returns the remaining items as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: Slots `[front, back)` are live and the block outlives the returned slice.
        unsafe { slice::from_raw_parts(self.block.address_of(self.front).as_ptr(), self.len()) }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        let slot = self.block.address_of(self.front);

        // Will not wrap because front is strictly below back.
        self.front = self.front.wrapping_add(1);

        // SAFETY: The slot was live and we just moved it out of the live range, so it will never
        // be read or dropped again.
        Some(unsafe { slot.read() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len();
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        // Will not wrap because back is strictly above front.
        self.back = self.back.wrapping_sub(1);

        // SAFETY: The slot was live and we just moved it out of the live range, so it will never
        // be read or dropped again.
        Some(unsafe { self.block.address_of(self.back).read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {
    fn len(&self) -> usize {
        // Will not wrap because front never passes back.
        self.back.wrapping_sub(self.front)
    }
}

// Once we return None, we will keep returning None.
impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let remaining = ptr::slice_from_raw_parts_mut(
            self.block.address_of(self.front).as_ptr(),
            self.len(),
        );

        // Nothing is live anymore as far as the iterator is concerned, even if a destructor panics.
        self.front = self.back;

        // SAFETY: The range held live items that nobody else owns. The block itself is dropped
        // after this, releasing the memory.
        unsafe {
            ptr::drop_in_place(remaining);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::DynamicArray;

    assert_impl_all!(IntoIter<u32>: Send, Sync);
    assert_not_impl_any!(IntoIter<Rc<u32>>: Send, Sync);

    struct Droppable {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Droppable {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn yields_in_order() {
        let array = DynamicArray::from([1, 2, 3]);

        let items: Vec<_> = array.into_iter().collect();

        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn yields_from_both_ends() {
        let array = DynamicArray::from([1, 2, 3, 4]);
        let mut iter = array.into_iter();

        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.as_slice(), &[2, 3]);
        assert_eq!(iter.next_back(), Some(3));
        assert_eq!(iter.next(), Some(2));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn drops_unconsumed_items_once() {
        let drops = Rc::new(Cell::new(0));

        let mut array = DynamicArray::new();
        for _ in 0..5 {
            array.push(Droppable {
                drops: Rc::clone(&drops),
            });
        }

        let mut iter = array.into_iter();
        drop(iter.next());
        assert_eq!(drops.get(), 1);

        drop(iter);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn empty_array_yields_nothing() {
        let array = DynamicArray::<String>::new();

        assert_eq!(array.into_iter().next(), None);
    }

    #[test]
    fn debug_shows_remaining() {
        let array = DynamicArray::from([7, 8]);
        let mut iter = array.into_iter();
        _ = iter.next();

        assert_eq!(format!("{iter:?}"), "IntoIter([8])");
    }
}
