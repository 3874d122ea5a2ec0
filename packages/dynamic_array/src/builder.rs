use std::marker::PhantomData;

use crate::{DynamicArray, RawBlock, Result};

/// Builder for creating an instance of [`DynamicArray`].
///
/// You only need to use this builder if you want to customize the initial configuration.
/// [`DynamicArray::new()`][1] starts with no storage and grows on demand, which is sufficient for
/// most use cases.
///
/// # Examples
///
/// ```
/// use dynamic_array::DynamicArray;
///
/// let array = DynamicArray::<u32>::builder().capacity(16).build();
///
/// assert!(array.is_empty());
/// assert_eq!(array.capacity(), 16);
/// ```
///
/// [1]: DynamicArray::new
#[must_use]
pub struct DynamicArrayBuilder<T> {
    capacity: usize,

    _item: PhantomData<T>,
}

impl<T> std::fmt::Debug for DynamicArrayBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicArrayBuilder")
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T> DynamicArrayBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            capacity: 0,
            _item: PhantomData,
        }
    }

    /// Sets the number of item slots to allocate up front. Defaults to zero, in which case
    /// nothing is allocated until the first item is added.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let mut array = DynamicArray::<u32>::builder().capacity(4).build();
    ///
    /// // No reallocation is needed until the initial capacity is exhausted.
    /// array.push(1);
    /// array.push(2);
    /// assert_eq!(array.capacity(), 4);
    /// ```
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds the array with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if the initial storage cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let array = DynamicArray::<String>::builder().build();
    /// assert_eq!(array.capacity(), 0);
    /// ```
    #[must_use]
    #[track_caller]
    pub fn build(self) -> DynamicArray<T> {
        DynamicArray::from_block(RawBlock::acquire(self.capacity))
    }

    /// Builds the array with the specified configuration, reporting allocation failure
    /// as an error instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial storage cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let array = DynamicArray::<u64>::builder().capacity(8).try_build()?;
    /// assert_eq!(array.capacity(), 8);
    ///
    /// let too_big = DynamicArray::<u64>::builder().capacity(usize::MAX).try_build();
    /// assert!(too_big.is_err());
    /// # Ok::<(), dynamic_array::Error>(())
    /// ```
    pub fn try_build(self) -> Result<DynamicArray<T>> {
        Ok(DynamicArray::from_block(RawBlock::try_acquire(
            self.capacity,
        )?))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_builder_does_not_allocate() {
        let array = DynamicArray::<u64>::builder().build();

        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn capacity_is_reserved_up_front() {
        let array = DynamicArray::<u64>::builder().capacity(10).build();

        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 10);
    }

    #[test]
    fn try_build_reports_overflow() {
        let result = DynamicArray::<u64>::builder()
            .capacity(usize::MAX)
            .try_build();

        assert!(matches!(result, Err(crate::Error::CapacityOverflow { .. })));
    }

    #[test]
    fn debug_names_item_type() {
        let builder = DynamicArray::<u16>::builder().capacity(3);

        let output = format!("{builder:?}");
        assert!(output.contains("u16"));
        assert!(output.contains('3'));
    }
}
