use std::alloc::{Layout, alloc, dealloc};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use tracing::debug;

use crate::{Error, Result};

/// An owned, contiguous heap region with room for `capacity` values of `T`.
///
/// The block only manages bytes. It never constructs or drops a `T` and has no idea which of its
/// slots hold live values - that bookkeeping belongs to the owner of the block, typically a
/// [`DynamicArray`][crate::DynamicArray]. Dropping a block releases the memory without running
/// any destructors, so the owner must drop any live values first.
///
/// A block with zero capacity, or any block for a zero-sized `T`, has no backing allocation and
/// uses a dangling (but well-aligned) base pointer.
///
/// Blocks cannot be cloned or copied. Ownership of the storage moves with the block; use
/// [`take()`][Self::take] to move the storage out of a block you only have a reference to.
///
/// # Example
///
/// ```
/// use dynamic_array::RawBlock;
///
/// let block = RawBlock::<u64>::acquire(4);
/// assert_eq!(block.capacity(), 4);
///
/// let slot = block.address_of(2);
///
/// // SAFETY: The slot is within capacity and we never read uninitialized memory.
/// unsafe {
///     slot.write(42);
///     assert_eq!(slot.read(), 42);
/// }
/// ```
pub struct RawBlock<T> {
    ptr: NonNull<T>,

    /// Number of `T` slots the region can hold. For non-zero-sized `T`, a non-zero capacity
    /// means `ptr` refers to a live allocation with the layout returned by `layout(capacity)`.
    capacity: usize,

    _owns: PhantomData<T>,
}

impl<T> RawBlock<T> {
    /// Creates an empty block without allocating.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            _owns: PhantomData,
        }
    }

    /// Acquires storage for exactly `capacity` values of `T`.
    ///
    /// A capacity of zero yields an empty block without allocating.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityOverflow`] if the total size does not fit a memory layout and
    /// [`Error::AllocationFailed`] if the memory allocator refuses the request.
    pub fn try_acquire(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Ok(Self::new());
        }

        let layout = Self::layout(capacity)?;

        if layout.size() == 0 {
            // Zero-sized items need no memory, the dangling pointer is valid for them.
            return Ok(Self {
                ptr: NonNull::dangling(),
                capacity,
                _owns: PhantomData,
            });
        }

        // SAFETY: The layout is not zero-sized (checked above) and was calculated for `T`.
        let ptr = unsafe { alloc(layout) };

        let Some(ptr) = NonNull::new(ptr.cast::<T>()) else {
            debug!(
                item_type = type_name::<T>(),
                capacity,
                size = layout.size(),
                align = layout.align(),
                "storage allocation failed"
            );

            return Err(Error::AllocationFailed {
                size: layout.size(),
                align: layout.align(),
            });
        };

        Ok(Self {
            ptr,
            capacity,
            _owns: PhantomData,
        })
    }

    /// Acquires storage for exactly `capacity` values of `T`.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be acquired. See [`try_acquire()`][Self::try_acquire] for
    /// the fallible variant.
    #[must_use]
    #[track_caller]
    pub fn acquire(capacity: usize) -> Self {
        match Self::try_acquire(capacity) {
            Ok(block) => block,
            Err(error) => panic!("{error} (RawBlock of {})", type_name::<T>()),
        }
    }

    /// Releases the storage, leaving the block empty.
    ///
    /// This only frees bytes and never drops values, so it is safe to call whether or not any
    /// values were ever written into the block. Calling it on an empty block does nothing.
    pub fn release(&mut self) {
        if self.is_allocated() {
            let layout = Self::layout(self.capacity)
                .expect("layout was calculable when the block was acquired, so it still is");

            // SAFETY: The pointer came from `alloc()` with this exact layout, which we recalculated
            // from the same capacity, and we reset the block below so it cannot be freed twice.
            unsafe {
                dealloc(self.ptr.as_ptr().cast(), layout);
            }
        }

        self.ptr = NonNull::dangling();
        self.capacity = 0;
    }

    /// The number of `T` slots the block can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the address of slot `offset`.
    ///
    /// An offset equal to the capacity is allowed and yields the one-past-the-end address, which
    /// must not be read from or written to.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is greater than the capacity.
    #[must_use]
    #[track_caller]
    pub fn address_of(&self, offset: usize) -> NonNull<T> {
        assert!(
            offset <= self.capacity,
            "address_of({offset}) is out of bounds in RawBlock of {} with capacity {}",
            type_name::<T>(),
            self.capacity
        );

        // SAFETY: Guarded by the bounds check above, the result is either inside the allocation
        // or one past its end, both of which are valid offsets. Unallocated blocks either have
        // zero capacity (offset is 0) or zero-sized items (offset is 0 bytes).
        unsafe { self.ptr.add(offset) }
    }

    /// Returns a pointer to the first slot.
    ///
    /// The pointer is dangling if the block has no backing allocation.
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns a mutable pointer to the first slot.
    ///
    /// The pointer is dangling if the block has no backing allocation.
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Moves the storage out of this block, leaving it empty.
    #[must_use]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Exchanges the storage of two blocks.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    fn is_allocated(&self) -> bool {
        self.capacity != 0 && size_of::<T>() != 0
    }

    fn layout(capacity: usize) -> Result<Layout> {
        let Ok(layout) = Layout::array::<T>(capacity) else {
            return Err(Error::CapacityOverflow {
                requested: capacity,
                item_size: size_of::<T>(),
            });
        };

        Ok(layout)
    }
}

impl<T> Default for RawBlock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RawBlock<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> fmt::Debug for RawBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBlock")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .finish()
    }
}

// SAFETY: The block exclusively owns its storage, so it can move between threads whenever the
// values stored in it could.
unsafe impl<T: Send> Send for RawBlock<T> {}

// SAFETY: Shared access to the block only hands out raw pointers and the capacity, so it is as
// thread-safe as shared access to the stored values.
unsafe impl<T: Sync> Sync for RawBlock<T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(RawBlock<u32>: Send, Sync, Default);
    assert_not_impl_any!(RawBlock<u32>: Clone, Copy);
    assert_not_impl_any!(RawBlock<Rc<u32>>: Send, Sync);
    assert_impl_all!(RawBlock<Cell<u32>>: Send);
    assert_not_impl_any!(RawBlock<Cell<u32>>: Sync);

    #[test]
    fn zero_capacity_is_empty() {
        let block = RawBlock::<u64>::acquire(0);

        assert_eq!(block.capacity(), 0);
        assert!(!block.is_allocated());
        assert_eq!(block.as_ptr(), NonNull::<u64>::dangling().as_ptr());
    }

    #[test]
    fn acquire_sets_exact_capacity() {
        let block = RawBlock::<u64>::acquire(7);

        assert_eq!(block.capacity(), 7);
        assert!(block.is_allocated());
        assert!(block.as_ptr().is_aligned());
    }

    #[test]
    fn slots_are_writable_and_readable() {
        let block = RawBlock::<String>::acquire(3);

        for index in 0..3 {
            unsafe { block.address_of(index).write(format!("item {index}")) };
        }

        for index in 0..3 {
            let value = unsafe { block.address_of(index).read() };
            assert_eq!(value, format!("item {index}"));
        }
    }

    #[test]
    fn address_of_end_is_sentinel() {
        let block = RawBlock::<u32>::acquire(4);

        let first = block.address_of(0).as_ptr() as usize;
        let end = block.address_of(4).as_ptr() as usize;

        assert_eq!(end - first, 4 * size_of::<u32>());
    }

    #[test]
    fn address_of_empty_block_start_is_allowed() {
        let block = RawBlock::<u32>::new();

        _ = block.address_of(0);
    }

    #[test]
    #[should_panic]
    fn address_of_beyond_capacity_panics() {
        let block = RawBlock::<u32>::acquire(4);

        _ = block.address_of(5);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut source = RawBlock::<u32>::acquire(8);
        let base = source.as_ptr();

        let target = source.take();

        assert_eq!(target.capacity(), 8);
        assert_eq!(target.as_ptr(), base);
        assert_eq!(source.capacity(), 0);
        assert!(!source.is_allocated());
    }

    #[test]
    fn swap_exchanges_storage() {
        let mut a = RawBlock::<u32>::acquire(2);
        let mut b = RawBlock::<u32>::acquire(5);
        let a_base = a.as_ptr();
        let b_base = b.as_ptr();

        a.swap(&mut b);

        assert_eq!(a.capacity(), 5);
        assert_eq!(a.as_ptr(), b_base);
        assert_eq!(b.capacity(), 2);
        assert_eq!(b.as_ptr(), a_base);
    }

    #[test]
    fn release_is_idempotent() {
        let mut block = RawBlock::<u32>::acquire(16);

        block.release();
        assert_eq!(block.capacity(), 0);

        block.release();
        assert_eq!(block.capacity(), 0);
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Deliberately leaks the value, which Miri reports as an error.
    fn release_does_not_drop_values() {
        let marker = Rc::new(());
        let mut block = RawBlock::<Rc<()>>::acquire(1);

        unsafe { block.address_of(0).write(Rc::clone(&marker)) };
        assert_eq!(Rc::strong_count(&marker), 2);

        // The block forgets the value, so its reference count is never decremented.
        block.release();
        assert_eq!(Rc::strong_count(&marker), 2);
    }

    #[test]
    fn zero_sized_items_do_not_allocate() {
        let block = RawBlock::<()>::acquire(1000);

        assert_eq!(block.capacity(), 1000);
        assert!(!block.is_allocated());

        unsafe { block.address_of(999).write(()) };
    }

    #[test]
    fn oversized_request_is_capacity_overflow() {
        let result = RawBlock::<u64>::try_acquire(usize::MAX);

        assert!(matches!(
            result,
            Err(Error::CapacityOverflow {
                requested: usize::MAX,
                item_size: 8
            })
        ));
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri rejects the oversized allocation instead of returning null.
    fn refused_allocation_is_allocation_failed() {
        // 64 TiB, a valid layout that the allocator refuses.
        let result = RawBlock::<[u8; 1 << 46]>::try_acquire(1);

        assert!(matches!(
            result,
            Err(Error::AllocationFailed {
                size: 0x4000_0000_0000,
                align: 1
            })
        ));
    }

    #[test]
    #[should_panic]
    fn acquire_oversized_panics() {
        drop(RawBlock::<u64>::acquire(usize::MAX));
    }
}
