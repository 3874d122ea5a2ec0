use std::any::type_name;
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice::{self, SliceIndex};

use scopeguard::ScopeGuard;
use tracing::trace;

use crate::{DynamicArrayBuilder, Error, IntoIter, RawBlock, Result};

/// A growable array that stores its items contiguously in a single heap block.
///
/// The array separates allocated capacity from live items: slots `[0, len)` of its
/// [`RawBlock`] hold live items and slots `[len, capacity)` are uninitialized. Items are
/// constructed and dropped individually, so the array never creates more items than it holds.
///
/// # Growth
///
/// When an item is appended or inserted into a full array, the capacity doubles (or becomes 1 if
/// it was 0). [`reserve()`][Self::reserve] and [`resize()`][Self::resize] grow to exactly the
/// requested capacity instead. Growth is transactional: the new item is constructed and all
/// existing items are moved into a new block before the new block replaces the old one. If
/// constructing the new item panics or the allocation fails, the array is left exactly as it was.
///
/// # Access
///
/// The array dereferences to a slice, so all read-only and in-place slice methods are available.
/// Indexing out of bounds is a programming error and panics.
///
/// # Example
///
/// ```
/// use dynamic_array::DynamicArray;
///
/// let mut array = DynamicArray::new();
///
/// array.push(1);
/// array.push(2);
/// array.push(3);
/// assert_eq!(array.capacity(), 4);
///
/// array.insert(1, 9);
/// assert_eq!(array, [1, 9, 2, 3]);
///
/// array.erase(0);
/// assert_eq!(array, [9, 2, 3]);
/// ```
pub struct DynamicArray<T> {
    block: RawBlock<T>,

    /// Number of live items, at the start of the block. Never exceeds the block capacity.
    len: usize,
}

impl<T> DynamicArray<T> {
    pub(crate) fn from_block(block: RawBlock<T>) -> Self {
        Self { block, len: 0 }
    }

    /// Creates an empty array. Nothing is allocated until the first item is added.
    ///
    /// # Example
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let array = DynamicArray::<String>::new();
    ///
    /// assert_eq!(array.len(), 0);
    /// assert_eq!(array.capacity(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`DynamicArray`].
    ///
    /// Use this when you want to customize the array configuration beyond the defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let array = DynamicArray::<u32>::builder().capacity(100).build();
    ///
    /// assert_eq!(array.capacity(), 100);
    /// ```
    pub fn builder() -> DynamicArrayBuilder<T> {
        DynamicArrayBuilder::new()
    }

    /// Creates an empty array with room for exactly `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be allocated.
    #[must_use]
    #[track_caller]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::builder().capacity(capacity).build()
    }

    /// Creates an array of `len` default-constructed items, with capacity equal to `len`.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be allocated. If `T::default()` panics, the items constructed
    /// so far are dropped before the panic continues.
    ///
    /// # Example
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let array = DynamicArray::<u8>::with_len(3);
    ///
    /// assert_eq!(array, [0, 0, 0]);
    /// assert_eq!(array.capacity(), 3);
    /// ```
    #[must_use]
    #[track_caller]
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        let mut array = Self::with_capacity(len);
        array.resize_with(len, T::default);
        array
    }

    /// The number of live items in the array.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of items the array can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    /// Returns a pointer to the first item.
    ///
    /// The pointer is invalidated by any operation that reallocates the storage.
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        self.block.as_ptr()
    }

    /// Returns the live items as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: Slots `[0, len)` are live and properly aligned; the slice borrows `self`,
        // so the storage cannot be replaced while the slice exists.
        unsafe { slice::from_raw_parts(self.block.as_ptr(), self.len) }
    }

    /// Returns the live items as a mutable slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: Slots `[0, len)` are live and properly aligned; the slice exclusively borrows
        // `self`, so nothing else can observe the items while the slice exists.
        unsafe { slice::from_raw_parts_mut(self.block.as_mut_ptr(), self.len) }
    }

    /// Returns an iterator over the items, from first to last.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Returns an iterator over exclusive references to the items, from first to last.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Ensures the capacity is at least `new_capacity`, reallocating to exactly `new_capacity`
    /// if the current capacity is smaller.
    ///
    /// If the current capacity is already sufficient, this does nothing and item addresses
    /// remain unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be allocated, leaving the array unchanged.
    #[track_caller]
    pub fn reserve(&mut self, new_capacity: usize) {
        if new_capacity <= self.capacity() {
            return;
        }

        let new_block = RawBlock::acquire(new_capacity);
        self.relocate_into(new_block);
    }

    /// Ensures the capacity is at least `new_capacity`, reallocating to exactly `new_capacity`
    /// if the current capacity is smaller.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be allocated, leaving the array unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let mut array = DynamicArray::from([1_u64, 2]);
    ///
    /// array.try_reserve(10)?;
    /// assert_eq!(array.capacity(), 10);
    ///
    /// assert!(array.try_reserve(usize::MAX).is_err());
    /// assert_eq!(array.capacity(), 10);
    /// assert_eq!(array, [1, 2]);
    /// # Ok::<(), dynamic_array::Error>(())
    /// ```
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity <= self.capacity() {
            return Ok(());
        }

        let new_block = RawBlock::try_acquire(new_capacity)?;
        self.relocate_into(new_block);

        Ok(())
    }

    /// Reallocates the storage so that the capacity equals the length, releasing all storage
    /// if the array is empty.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be allocated, leaving the array unchanged.
    #[track_caller]
    pub fn shrink_to_fit(&mut self) {
        if self.capacity() == self.len {
            return;
        }

        let new_block = RawBlock::acquire(self.len);
        self.relocate_into(new_block);
    }

    /// Changes the length to `new_len`, dropping excess items or appending default-constructed
    /// ones.
    ///
    /// When growing beyond the capacity, the capacity becomes exactly `new_len`.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be allocated. If `T::default()` panics, the items constructed
    /// so far are dropped and the array keeps its previous length, capacity and contents.
    ///
    /// # Example
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let mut array = DynamicArray::from([1, 2, 3]);
    ///
    /// array.resize(5);
    /// assert_eq!(array, [1, 2, 3, 0, 0]);
    ///
    /// array.resize(2);
    /// assert_eq!(array, [1, 2]);
    /// ```
    #[track_caller]
    pub fn resize(&mut self, new_len: usize)
    where
        T: Default,
    {
        self.resize_with(new_len, T::default);
    }

    /// Changes the length to `new_len`, dropping excess items or appending items produced by `f`.
    ///
    /// When growing beyond the capacity, the capacity becomes exactly `new_len`.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be allocated. If `f` panics, the items it produced so far are
    /// dropped and the array keeps its previous length, capacity and contents.
    #[track_caller]
    pub fn resize_with(&mut self, new_len: usize, f: impl FnMut() -> T) {
        let Some(added) = new_len.checked_sub(self.len) else {
            self.truncate(new_len);
            return;
        };

        if added == 0 {
            return;
        }

        if new_len > self.capacity() {
            let mut new_block = RawBlock::acquire(new_len);

            // SAFETY: The new block has room for `new_len` items, so the `added` slots after the
            // first `len` ones exist and are uninitialized. The old block is not touched.
            unsafe {
                construct_run(new_block.address_of(self.len), added, f);
            }

            // SAFETY: Slots `[0, len)` are live in the old block and uninitialized in the new one.
            // The two blocks are distinct allocations, so they cannot overlap.
            unsafe {
                ptr::copy_nonoverlapping(self.block.as_ptr(), new_block.as_mut_ptr(), self.len);
            }

            self.commit(new_block);
        } else {
            // SAFETY: `new_len` fits in the capacity, so the `added` slots after the first `len`
            // ones exist and are uninitialized.
            unsafe {
                construct_run(self.block.address_of(self.len), added, f);
            }
        }

        self.len = new_len;
    }

    /// Appends an item to the end of the array, growing the storage if it is full.
    ///
    /// Returns an exclusive reference to the new item.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be allocated, leaving the array unchanged.
    #[track_caller]
    pub fn push(&mut self, value: T) -> &mut T {
        self.emplace_back_with(move || value)
    }

    /// Appends the item produced by `f` to the end of the array, growing the storage if it is
    /// full.
    ///
    /// Returns an exclusive reference to the new item.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be allocated, in which case `f` is not called. If `f`
    /// panics, the array is left unchanged.
    #[track_caller]
    pub fn emplace_back_with(&mut self, f: impl FnOnce() -> T) -> &mut T {
        self.emplace_with(self.len, f)
    }

    /// Appends the item produced by `f` to the end of the array, growing the storage if it is
    /// full.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be allocated. In that case `f` is not called and
    /// the array is left unchanged.
    pub fn try_emplace_back_with(&mut self, f: impl FnOnce() -> T) -> Result<&mut T> {
        self.try_emplace_with(self.len, f)
    }

    /// Inserts an item at `index`, shifting all items after it one slot towards the end.
    ///
    /// Returns an exclusive reference to the new item.
    ///
    /// # Panics
    ///
    /// Panics if `index > len` or if the storage cannot be allocated.
    #[track_caller]
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        self.emplace_with(index, move || value)
    }

    /// Inserts the item produced by `f` at `index`, shifting all items after it one slot
    /// towards the end.
    ///
    /// Returns an exclusive reference to the new item.
    ///
    /// # Panics
    ///
    /// Panics if `index > len` or if the storage cannot be allocated. If `f` panics, the array
    /// is left unchanged.
    #[track_caller]
    pub fn emplace_with(&mut self, index: usize, f: impl FnOnce() -> T) -> &mut T {
        self.assert_insert_position(index);

        if self.len < self.capacity() {
            return self.emplace_in_place(index, f);
        }

        let new_capacity = match self.grown_capacity() {
            Ok(new_capacity) => new_capacity,
            Err(error) => panic!("{error} (DynamicArray of {})", type_name::<T>()),
        };

        let new_block = RawBlock::acquire(new_capacity);
        self.emplace_into_new_block(new_block, index, f)
    }

    /// Inserts the item produced by `f` at `index`, shifting all items after it one slot
    /// towards the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be allocated. In that case `f` is not called and
    /// the array is left unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn try_emplace_with(&mut self, index: usize, f: impl FnOnce() -> T) -> Result<&mut T> {
        self.assert_insert_position(index);

        if self.len < self.capacity() {
            return Ok(self.emplace_in_place(index, f));
        }

        let new_block = RawBlock::try_acquire(self.grown_capacity()?)?;
        Ok(self.emplace_into_new_block(new_block, index, f))
    }

    /// Drops the last item.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    #[track_caller]
    pub fn pop_back(&mut self) {
        let Some(value) = self.pop() else {
            panic!("pop_back() called on an empty DynamicArray of {}", type_name::<T>());
        };

        drop(value);
    }

    /// Removes the last item and returns it, or `None` if the array is empty.
    pub fn pop(&mut self) -> Option<T> {
        let last = self.len.checked_sub(1)?;

        self.len = last;

        // SAFETY: The slot was live and is now outside the live range, so ownership of the item
        // moves to the caller and the array will never read or drop it again.
        Some(unsafe { self.block.address_of(last).read() })
    }

    /// Drops the item at `index`, shifting all items after it one slot towards the start.
    ///
    /// Returns the index of the item that followed the removed one, which is `index` itself
    /// (equal to the new length if the last item was removed).
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn erase(&mut self, index: usize) -> usize {
        drop(self.remove(index));
        index
    }

    /// Removes the item at `index` and returns it, shifting all items after it one slot towards
    /// the start.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "remove({index}) is out of bounds in DynamicArray of {} with length {}",
            type_name::<T>(),
            self.len
        );

        let slot = self.block.address_of(index).as_ptr();

        // SAFETY: The slot is live (checked above). Its bits are overwritten below, so ownership
        // of the item moves to the caller.
        let value = unsafe { slot.read() };

        // Will not wrap because index < len.
        let tail = self.len.wrapping_sub(index).wrapping_sub(1);

        // SAFETY: index < len <= capacity, so the next slot is at most one past the end.
        let next = unsafe { slot.add(1) };

        // SAFETY: Slots `[index + 1, len)` are live and move down by one. `ptr::copy` permits the
        // source and destination to overlap.
        unsafe {
            ptr::copy(next, slot, tail);
        }

        // Will not wrap because index < len.
        self.len = self.len.wrapping_sub(1);

        value
    }

    /// Drops all items beyond the first `new_len`. Does nothing if `new_len >= len`.
    ///
    /// The capacity is not affected.
    pub fn truncate(&mut self, new_len: usize) {
        let Some(excess) = self.len.checked_sub(new_len) else {
            return;
        };

        let excess_items =
            ptr::slice_from_raw_parts_mut(self.block.address_of(new_len).as_ptr(), excess);

        // Shrink first, so a panicking destructor cannot make us drop an item twice.
        self.len = new_len;

        // SAFETY: The excess items were live and are now outside the live range.
        unsafe {
            ptr::drop_in_place(excess_items);
        }
    }

    /// Drops all items. The capacity is not affected.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Exchanges the contents of two arrays without touching any items.
    pub fn swap(&mut self, other: &mut Self) {
        self.block.swap(&mut other.block);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Makes room for `additional` more items up front, growing at least geometrically so that
    /// repeated small extensions stay amortized.
    #[cfg_attr(test, mutants::skip)] // Only an optimization, pushing grows the storage anyway.
    fn reserve_for_extend(&mut self, additional: usize) {
        let needed = self.len.saturating_add(additional);

        if needed > self.capacity() {
            self.reserve(needed.max(self.capacity().saturating_mul(2)));
        }
    }

    #[track_caller]
    fn assert_insert_position(&self, index: usize) {
        assert!(
            index <= self.len,
            "insert position {index} is out of bounds in DynamicArray of {} with length {}",
            type_name::<T>(),
            self.len
        );
    }

    fn grown_capacity(&self) -> Result<usize> {
        match self.capacity() {
            0 => Ok(1),
            capacity => capacity
                .checked_mul(2)
                .ok_or(Error::GrowthOverflow { capacity }),
        }
    }

    /// Inserts into the current block, which must have at least one vacant slot.
    fn emplace_in_place(&mut self, index: usize, f: impl FnOnce() -> T) -> &mut T {
        debug_assert!(self.len < self.capacity());
        debug_assert!(index <= self.len);

        // Nothing has been touched yet if this panics.
        let value = f();

        let hole = self.block.address_of(index).as_ptr();

        // Will not wrap because index <= len.
        let tail = self.len.wrapping_sub(index);

        // SAFETY: index <= len < capacity, so the slot after the hole is within the block.
        let after_hole = unsafe { hole.add(1) };

        // SAFETY: Slots `[index, len)` are live and move up by one into `[index + 1, len + 1)`,
        // which fits because len < capacity. `ptr::copy` permits overlapping ranges.
        unsafe {
            ptr::copy(hole, after_hole, tail);
        }

        // SAFETY: The hole now holds a stale bitwise duplicate of the item that moved up, so we
        // overwrite it without dropping.
        unsafe {
            hole.write(value);
        }

        // Will not wrap because len < capacity.
        self.len = self.len.wrapping_add(1);

        // SAFETY: The slot holds the live item we just wrote and the returned reference borrows
        // `self` exclusively.
        unsafe { &mut *hole }
    }

    /// Inserts into a freshly acquired larger block and makes it the array's storage.
    fn emplace_into_new_block(
        &mut self,
        mut new_block: RawBlock<T>,
        index: usize,
        f: impl FnOnce() -> T,
    ) -> &mut T {
        debug_assert!(new_block.capacity() > self.len);
        debug_assert!(index <= self.len);

        // If this panics, the new block is released as raw bytes and the array is untouched.
        let value = f();

        let new_slot = new_block.address_of(index);

        // SAFETY: index <= len < new capacity, so the slot exists and is uninitialized.
        unsafe {
            new_slot.write(value);
        }

        // SAFETY: Slots `[0, index)` are live in the old block and uninitialized in the new one.
        // The blocks are distinct allocations, so they cannot overlap.
        unsafe {
            ptr::copy_nonoverlapping(self.block.as_ptr(), new_block.as_mut_ptr(), index);
        }

        // Will not wrap because index <= len.
        let tail = self.len.wrapping_sub(index);

        // Will not wrap because index < new capacity.
        let after_new_slot = new_block.address_of(index.wrapping_add(1));

        // SAFETY: Slots `[index, len)` are live in the old block and land in `[index + 1, len + 1)`
        // of the new block, which fits because len < new capacity. The blocks cannot overlap.
        unsafe {
            ptr::copy_nonoverlapping(
                self.block.address_of(index).as_ptr(),
                after_new_slot.as_ptr(),
                tail,
            );
        }

        self.commit(new_block);

        // Will not wrap because len < new capacity.
        self.len = self.len.wrapping_add(1);

        let mut new_slot = self.block.address_of(index);

        // SAFETY: The slot holds the live item we wrote above and the returned reference borrows
        // `self` exclusively.
        unsafe { new_slot.as_mut() }
    }

    /// Moves all live items into `new_block` and makes it the array's storage.
    fn relocate_into(&mut self, mut new_block: RawBlock<T>) {
        debug_assert!(new_block.capacity() >= self.len);

        // SAFETY: Slots `[0, len)` are live in the old block and uninitialized in the new one,
        // which has room for them. The blocks are distinct allocations, so they cannot overlap.
        unsafe {
            ptr::copy_nonoverlapping(self.block.as_ptr(), new_block.as_mut_ptr(), self.len);
        }

        self.commit(new_block);
    }

    /// Replaces the storage with `new_block`, which must already hold the live items.
    ///
    /// The old block only holds moved-from bits at this point, so it is released as raw bytes
    /// without dropping anything.
    fn commit(&mut self, mut new_block: RawBlock<T>) {
        trace!(
            item_type = type_name::<T>(),
            len = self.len,
            old_capacity = self.block.capacity(),
            new_capacity = new_block.capacity(),
            "replacing storage block"
        );

        self.block.swap(&mut new_block);
    }
}

/// Writes `count` items produced by `f` into consecutive slots starting at `first`.
///
/// If `f` panics, the items written so far are dropped before the panic continues, leaving the
/// slots uninitialized again.
///
/// # Safety
///
/// `first` must be valid for writes of `count` consecutive uninitialized slots of `T`.
unsafe fn construct_run<T>(first: NonNull<T>, count: usize, mut f: impl FnMut() -> T) {
    let mut constructed = scopeguard::guard(0_usize, move |constructed| {
        // SAFETY: Exactly `constructed` slots starting at `first` have been written and nobody
        // else considers them live.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first.as_ptr(), constructed));
        }
    });

    while *constructed < count {
        // SAFETY: The caller guarantees `count` slots starting at `first`.
        let slot = unsafe { first.add(*constructed) };

        let value = f();

        // SAFETY: The slot is within the range guaranteed by the caller and uninitialized.
        unsafe {
            slot.write(value);
        }

        // Will not wrap because constructed < count.
        *constructed = constructed.wrapping_add(1);
    }

    // All slots are populated, so the caller takes over responsibility for them.
    _ = ScopeGuard::into_inner(constructed);
}

impl<T: Clone> Clone for DynamicArray<T> {
    /// Clones every item into a new block with capacity equal to the length.
    ///
    /// If cloning an item panics, the clones made so far are dropped and the storage is released.
    fn clone(&self) -> Self {
        let block = RawBlock::acquire(self.len);
        let mut items = self.iter();

        // SAFETY: The block has room for exactly `len` items, all uninitialized.
        unsafe {
            construct_run(block.address_of(0), self.len, || {
                items
                    .next()
                    .expect("construct_run requests exactly len items")
                    .clone()
            });
        }

        Self {
            block,
            len: self.len,
        }
    }

    /// Makes `self` a clone of `source`, reusing the existing storage if it is large enough.
    ///
    /// Items present in both arrays are updated via [`Clone::clone_from`], excess items are
    /// dropped and missing items are cloned into the vacant slots.
    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            let mut fresh = source.clone();
            self.swap(&mut fresh);
            return;
        }

        for (target, item) in self.iter_mut().zip(source.iter()) {
            target.clone_from(item);
        }

        let Some(missing) = source.len.checked_sub(self.len) else {
            self.truncate(source.len);
            return;
        };

        let mut items = source.iter().skip(self.len);

        // SAFETY: source.len <= capacity, so the `missing` slots after the first `len` ones exist
        // and are uninitialized.
        unsafe {
            construct_run(self.block.address_of(self.len), missing, || {
                items
                    .next()
                    .expect("construct_run requests exactly the missing items")
                    .clone()
            });
        }

        self.len = source.len;
    }
}

impl<T> Drop for DynamicArray<T> {
    fn drop(&mut self) {
        // The block releases the memory when it is dropped after this.
        self.clear();
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for DynamicArray<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> DerefMut for DynamicArray<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, I: SliceIndex<[T]>> Index<I> for DynamicArray<T> {
    type Output = I::Output;

    #[track_caller]
    fn index(&self, index: I) -> &Self::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T, I: SliceIndex<[T]>> IndexMut<I> for DynamicArray<T> {
    #[track_caller]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<T> AsRef<[T]> for DynamicArray<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsMut<[T]> for DynamicArray<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for DynamicArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for DynamicArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynamicArray<T> {}

impl<T: PartialEq> PartialEq<[T]> for DynamicArray<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for DynamicArray<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T> Extend<T> for DynamicArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();

        let (lower_bound, _) = iter.size_hint();
        self.reserve_for_extend(lower_bound);

        for item in iter {
            self.push(item);
        }
    }
}

impl<T> FromIterator<T> for DynamicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<T, const N: usize> From<[T; N]> for DynamicArray<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<T> IntoIterator for DynamicArray<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> Self::IntoIter {
        // Leave `self` empty, so its drop does nothing.
        let len = mem::replace(&mut self.len, 0);
        IntoIter::new(self.block.take(), len)
    }
}

impl<'a, T> IntoIterator for &'a DynamicArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynamicArray<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::thread;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(DynamicArray<u32>: Send, Sync, Default, Clone);
    assert_not_impl_any!(DynamicArray<Rc<u32>>: Send, Sync);

    struct Droppable {
        drops: Rc<Cell<usize>>,
    }

    impl Droppable {
        fn new(drops: &Rc<Cell<usize>>) -> Self {
            Self {
                drops: Rc::clone(drops),
            }
        }
    }

    impl Drop for Droppable {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn smoke_test() {
        let mut array = DynamicArray::new();

        assert!(array.is_empty());

        array.push(1);
        array.push(2);
        array.push(3);

        assert_eq!(array.len(), 3);
        assert!(array.capacity() >= 3);
        assert_eq!(array[0], 1);
        assert_eq!(array[1], 2);
        assert_eq!(array[2], 3);

        array[1] = 20;
        assert_eq!(array, [1, 20, 3]);
    }

    #[test]
    fn push_doubles_capacity() {
        let mut array = DynamicArray::new();
        let mut observed = vec![array.capacity()];

        for value in 0..9 {
            array.push(value);
            observed.push(array.capacity());
        }

        assert_eq!(observed, vec![0, 1, 2, 4, 4, 8, 8, 8, 8, 16]);
    }

    #[test]
    fn push_returns_reference_to_new_item() {
        let mut array = DynamicArray::new();

        let item = array.push(String::from("hello"));
        item.push_str(", world");

        assert_eq!(array[0], "hello, world");
    }

    #[test]
    fn appended_items_keep_insertion_order() {
        let mut array = DynamicArray::new();

        for value in 0..100 {
            array.push(value);
            assert_eq!(array.len(), value + 1);
            assert!(array.capacity() >= array.len());
        }

        assert!(array.iter().copied().eq(0..100));
    }

    #[test]
    fn reserve_grows_to_exact_capacity() {
        let mut array = DynamicArray::from([1, 2, 3]);

        array.reserve(10);

        assert_eq!(array.capacity(), 10);
        assert_eq!(array, [1, 2, 3]);
    }

    #[test]
    fn reserve_smaller_is_noop() {
        let mut array = DynamicArray::with_capacity(8);
        array.push(1);
        array.push(2);
        let base = array.as_ptr();

        array.reserve(4);
        array.reserve(8);

        assert_eq!(array.capacity(), 8);
        assert_eq!(array.len(), 2);
        assert_eq!(array.as_ptr(), base);
    }

    #[test]
    fn try_reserve_failure_leaves_array_unchanged() {
        let mut array = DynamicArray::<u64>::from([1, 2, 3]);
        let capacity = array.capacity();
        let base = array.as_ptr();

        let result = array.try_reserve(usize::MAX);

        assert!(matches!(result, Err(Error::CapacityOverflow { .. })));
        assert_eq!(array.capacity(), capacity);
        assert_eq!(array.as_ptr(), base);
        assert_eq!(array, [1, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn reserve_overflow_panics() {
        let mut array = DynamicArray::<u64>::new();
        array.reserve(usize::MAX);
    }

    #[test]
    fn resize_grows_with_defaults() {
        let mut array = DynamicArray::from([1, 2, 3]);

        array.resize(5);

        assert_eq!(array, [1, 2, 3, 0, 0]);
        assert_eq!(array.capacity(), 5);
    }

    #[test]
    fn resize_within_capacity_does_not_reallocate() {
        let mut array = DynamicArray::with_capacity(10);
        array.push(7);
        let base = array.as_ptr();

        array.resize(6);

        assert_eq!(array, [7, 0, 0, 0, 0, 0]);
        assert_eq!(array.as_ptr(), base);
        assert_eq!(array.capacity(), 10);
    }

    #[test]
    fn resize_shrinks_and_drops_each_excess_item_once() {
        let drops = Rc::new(Cell::new(0));
        let mut array = DynamicArray::new();
        for _ in 0..5 {
            array.push(Droppable::new(&drops));
        }

        array.resize_with(2, || Droppable::new(&drops));

        assert_eq!(array.len(), 2);
        assert_eq!(drops.get(), 3);

        drop(array);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn resize_to_same_len_is_noop() {
        let mut array = DynamicArray::from([1, 2]);
        let capacity = array.capacity();

        array.resize(2);

        assert_eq!(array, [1, 2]);
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    fn with_len_default_constructs() {
        let array = DynamicArray::<String>::with_len(3);

        assert_eq!(array.len(), 3);
        assert_eq!(array.capacity(), 3);
        assert!(array.iter().all(String::is_empty));
    }

    #[test]
    fn pop_back_drops_last() {
        let drops = Rc::new(Cell::new(0));
        let mut array = DynamicArray::new();
        array.push(Droppable::new(&drops));
        array.push(Droppable::new(&drops));

        array.pop_back();

        assert_eq!(array.len(), 1);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    #[should_panic]
    fn pop_back_empty_panics() {
        let mut array = DynamicArray::<u32>::new();
        array.pop_back();
    }

    #[test]
    fn pop_returns_items_in_reverse() {
        let mut array = DynamicArray::from([1, 2, 3]);

        assert_eq!(array.pop(), Some(3));
        assert_eq!(array.pop(), Some(2));
        assert_eq!(array.pop(), Some(1));
        assert_eq!(array.pop(), None);
        assert_eq!(array.capacity(), 3);
    }

    #[test]
    #[should_panic]
    fn index_out_of_bounds_panics() {
        let array = DynamicArray::from([1, 2, 3]);
        _ = array[3];
    }

    #[test]
    #[should_panic]
    fn index_into_slack_panics() {
        let array = DynamicArray::<u32>::with_capacity(4);
        _ = array[0];
    }

    #[test]
    fn insert_in_middle_shifts_tail() {
        let mut array = DynamicArray::from([1, 2, 3]);
        array.reserve(4);
        let base = array.as_ptr();

        let item = array.insert(1, 9);
        assert_eq!(*item, 9);

        assert_eq!(array, [1, 9, 2, 3]);
        assert_eq!(array.as_ptr(), base);
    }

    #[test]
    fn insert_into_full_array_grows() {
        let mut array = DynamicArray::from([1, 2, 3]);
        assert_eq!(array.capacity(), 3);

        array.insert(2, 9);

        assert_eq!(array, [1, 2, 9, 3]);
        assert_eq!(array.capacity(), 6);
    }

    #[test]
    fn insert_at_ends() {
        let mut array = DynamicArray::from([2]);

        array.insert(0, 1);
        array.insert(2, 3);

        assert_eq!(array, [1, 2, 3]);
    }

    #[test]
    fn insert_into_empty() {
        let mut array = DynamicArray::new();

        array.insert(0, "only");

        assert_eq!(array, ["only"]);
        assert_eq!(array.capacity(), 1);
    }

    #[test]
    #[should_panic]
    fn insert_beyond_end_panics() {
        let mut array = DynamicArray::from([1, 2, 3]);
        array.insert(4, 0);
    }

    #[test]
    fn insert_then_read_yields_value() {
        for index in 0..=5 {
            let mut array = DynamicArray::from([0, 1, 2, 3, 4]);

            array.insert(index, 99);

            assert_eq!(array[index], 99);
            assert_eq!(array.len(), 6);
        }
    }

    #[test]
    fn erase_shifts_remaining_items() {
        let mut array = DynamicArray::from([1, 9, 2, 3]);

        let next = array.erase(0);

        assert_eq!(next, 0);
        assert_eq!(array, [9, 2, 3]);
    }

    #[test]
    fn erase_last_returns_end() {
        let mut array = DynamicArray::from([1, 2, 3]);

        let next = array.erase(2);

        assert_eq!(next, array.len());
        assert_eq!(array, [1, 2]);
    }

    #[test]
    fn erase_drops_exactly_the_erased_item() {
        let drops = Rc::new(Cell::new(0));
        let mut array = DynamicArray::new();
        for _ in 0..4 {
            array.push(Droppable::new(&drops));
        }

        array.erase(1);

        assert_eq!(drops.get(), 1);
        assert_eq!(array.len(), 3);
    }

    #[test]
    #[should_panic]
    fn erase_out_of_bounds_panics() {
        let mut array = DynamicArray::from([1, 2, 3]);
        array.erase(3);
    }

    #[test]
    fn remove_returns_item() {
        let mut array = DynamicArray::from([String::from("a"), String::from("b")]);

        assert_eq!(array.remove(0), "a");
        assert_eq!(array, [String::from("b")]);
    }

    #[test]
    fn truncate_and_clear_keep_capacity() {
        let mut array = DynamicArray::from([1, 2, 3, 4]);

        array.truncate(10);
        assert_eq!(array.len(), 4);

        array.truncate(1);
        assert_eq!(array, [1]);

        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn shrink_to_fit_matches_len() {
        let mut array = DynamicArray::with_capacity(10);
        array.push(1);
        array.push(2);

        array.shrink_to_fit();
        assert_eq!(array.capacity(), 2);
        assert_eq!(array, [1, 2]);

        array.clear();
        array.shrink_to_fit();
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = DynamicArray::from([1, 2]);
        let mut b = DynamicArray::from([3, 4, 5]);

        a.swap(&mut b);

        assert_eq!(a, [3, 4, 5]);
        assert_eq!(b, [1, 2]);
    }

    #[test]
    fn take_transfers_storage_without_touching_items() {
        let drops = Rc::new(Cell::new(0));
        let mut source = DynamicArray::new();
        source.push(Droppable::new(&drops));
        source.push(Droppable::new(&drops));
        let base = source.as_ptr();

        let target = std::mem::take(&mut source);

        assert_eq!(drops.get(), 0);
        assert_eq!(source.len(), 0);
        assert_eq!(source.capacity(), 0);
        assert_eq!(target.len(), 2);
        assert_eq!(target.as_ptr(), base);
    }

    #[test]
    fn clone_copies_items_into_exact_capacity() {
        let mut array = DynamicArray::with_capacity(10);
        array.push(String::from("a"));
        array.push(String::from("b"));

        let copy = array.clone();

        assert_eq!(copy, array);
        assert_eq!(copy.capacity(), 2);
        assert_ne!(copy.as_ptr(), array.as_ptr());
    }

    #[test]
    fn clone_from_reuses_storage_when_shrinking() {
        let mut target = DynamicArray::from([1, 2, 3, 4]);
        let base = target.as_ptr();
        let source = DynamicArray::from([7, 8]);

        target.clone_from(&source);

        assert_eq!(target, [7, 8]);
        assert_eq!(target.as_ptr(), base);
    }

    #[test]
    fn clone_from_reuses_storage_when_growing_within_capacity() {
        let mut target = DynamicArray::with_capacity(5);
        target.push(1);
        let base = target.as_ptr();
        let source = DynamicArray::from([7, 8, 9]);

        target.clone_from(&source);

        assert_eq!(target, [7, 8, 9]);
        assert_eq!(target.as_ptr(), base);
    }

    #[test]
    fn clone_from_reallocates_when_too_small() {
        let mut target = DynamicArray::from([1]);
        let source = DynamicArray::from([7, 8, 9]);

        target.clone_from(&source);

        assert_eq!(target, [7, 8, 9]);
        assert_eq!(target.capacity(), 3);
    }

    #[test]
    fn zero_sized_items() {
        let mut array = DynamicArray::new();

        for _ in 0..10 {
            array.push(());
        }
        array.insert(3, ());
        array.erase(0);

        assert_eq!(array.len(), 10);
        assert!(array.capacity() >= 10);
    }

    #[test]
    fn drop_destroys_live_items_only() {
        let drops = Rc::new(Cell::new(0));
        let mut array = DynamicArray::with_capacity(8);
        array.push(Droppable::new(&drops));
        array.push(Droppable::new(&drops));
        array.push(Droppable::new(&drops));

        drop(array);

        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn iterates_by_reference() {
        let mut array = DynamicArray::from([1, 2, 3]);

        for item in &mut array {
            *item *= 10;
        }

        let collected: Vec<_> = (&array).into_iter().copied().collect();
        assert_eq!(collected, vec![10, 20, 30]);
    }

    #[test]
    fn extend_and_collect() {
        let mut array: DynamicArray<_> = (0..3).collect();

        array.extend(3..6);

        assert_eq!(array, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn debug_is_list() {
        let array = DynamicArray::from([1, 2]);

        assert_eq!(format!("{array:?}"), "[1, 2]");
    }

    #[test]
    fn try_emplace_back_within_capacity() {
        let mut array = DynamicArray::with_capacity(1);

        let item = array.try_emplace_back_with(|| 5).unwrap();
        assert_eq!(*item, 5);

        array.try_emplace_with(0, || 4).unwrap();
        assert_eq!(array, [4, 5]);
    }

    #[test]
    fn growth_overflow_reports_the_full_capacity() {
        let array = DynamicArray::from_block(RawBlock::<()>::acquire(usize::MAX));

        assert!(matches!(
            array.grown_capacity(),
            Err(Error::GrowthOverflow {
                capacity: usize::MAX
            })
        ));
    }

    #[test]
    fn growth_of_empty_array_starts_at_one() {
        let array = DynamicArray::<u64>::new();

        assert_eq!(array.grown_capacity().unwrap(), 1);
    }

    // 64 TiB, a valid layout that the allocator refuses.
    type Huge = [u8; 1 << 46];

    #[test]
    #[cfg_attr(miri, ignore)] // Miri rejects the oversized allocation instead of returning null.
    fn refused_allocation_does_not_call_constructor() {
        let called = Cell::new(false);
        let mut array = DynamicArray::<Huge>::new();

        let result = array.try_emplace_back_with(|| {
            called.set(true);
            panic!("constructor must not run when storage cannot be acquired");
        });

        assert!(matches!(result, Err(Error::AllocationFailed { .. })));
        assert!(!called.get());
        assert_eq!(array.capacity(), 0);
        assert!(array.is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri rejects the oversized allocation instead of returning null.
    fn refused_allocation_on_insert_does_not_call_constructor() {
        let called = Cell::new(false);
        let mut array = DynamicArray::<Huge>::new();

        let result = array.try_emplace_with(0, || {
            called.set(true);
            panic!("constructor must not run when storage cannot be acquired");
        });

        assert!(matches!(result, Err(Error::AllocationFailed { .. })));
        assert!(!called.get());
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri rejects the oversized allocation instead of returning null.
    #[should_panic(expected = "allocation of")]
    fn refused_allocation_panics_in_emplace_back() {
        let mut array = DynamicArray::<Huge>::new();

        _ = array.emplace_back_with(|| {
            panic!("constructor must not run when storage cannot be acquired");
        });
    }

    #[test]
    fn moves_between_threads() {
        let mut array = DynamicArray::new();
        array.push(Arc::new(1));
        array.push(Arc::new(2));

        let array = thread::spawn(move || {
            array.push(Arc::new(3));
            array
        })
        .join()
        .unwrap();

        assert_eq!(array.len(), 3);
        assert_eq!(*array[2], 3);
    }
}
