use thiserror::Error;

/// Errors that can occur when acquiring storage for a [`DynamicArray`][crate::DynamicArray]
/// or a [`RawBlock`][crate::RawBlock].
///
/// Only resource failures are reported through this type. Contract violations by the caller,
/// such as indexing out of bounds, are programming errors and panic instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested capacity cannot be expressed as a valid memory layout, typically because
    /// the total size in bytes would exceed `isize::MAX`.
    #[error("capacity overflow: {requested} items of {item_size} bytes cannot be laid out in memory")]
    CapacityOverflow {
        /// The number of item slots that was requested.
        requested: usize,

        /// The size of a single item in bytes.
        item_size: usize,
    },

    /// Doubling the capacity of a full array does not fit in `usize`. Only reachable for
    /// zero-sized items, whose capacity is not limited by the address space.
    #[error("capacity overflow: doubling the capacity of {capacity} items does not fit in usize")]
    GrowthOverflow {
        /// The capacity of the full array that could not be doubled.
        capacity: usize,
    },

    /// The memory allocator could not satisfy the request.
    #[error("allocation of {size} bytes with alignment {align} failed")]
    AllocationFailed {
        /// The size of the requested allocation in bytes.
        size: usize,

        /// The alignment of the requested allocation in bytes.
        align: usize,
    },
}

/// A specialized `Result` type for storage operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn capacity_overflow_message_names_the_request() {
        let error = Error::CapacityOverflow {
            requested: 42,
            item_size: 8,
        };

        let message = error.to_string();
        assert!(message.contains("42"));
        assert!(message.contains("8 bytes"));
    }

    #[test]
    fn growth_overflow_message_names_the_capacity() {
        let error = Error::GrowthOverflow { capacity: 12345 };

        let message = error.to_string();
        assert!(message.contains("12345"));
        assert!(message.contains("doubling"));
    }

    #[test]
    fn allocation_failed_message_names_the_layout() {
        let error = Error::AllocationFailed {
            size: 1024,
            align: 16,
        };

        let message = error.to_string();
        assert!(message.contains("1024"));
        assert!(message.contains("16"));
    }
}
