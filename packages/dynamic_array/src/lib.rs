#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A growable contiguous array built directly on raw heap blocks.
//!
//! This crate provides [`DynamicArray`], a resizable array whose storage is a single
//! [`RawBlock`] of uninitialized memory. The two layers have strictly separated duties:
//!
//! - [`RawBlock`] owns the bytes. It acquires and releases a region sized for a number of items
//!   and hands out typed slot addresses, but never constructs or drops an item.
//! - [`DynamicArray`] owns a block plus the count of live items. It constructs, moves and drops
//!   items one by one, so only the first `len` slots ever hold live values and the reserved
//!   slack beyond them stays uninitialized.
//!
//! This is part of the [Folo project](https://github.com/folo-rs/folo) that provides mechanisms for
//! high-performance hardware-aware programming in Rust.
//!
//! # Growth
//!
//! Appending to or inserting into a full array doubles its capacity (starting from 1). Growth is
//! transactional: the new item is constructed in the new block and all existing items are moved
//! over before the new block replaces the old one. If the allocation fails or constructing the new
//! item panics, the array is left exactly as it was.
//!
//! # Errors and panics
//!
//! Caller bugs - indexing out of bounds, popping an empty array, inserting or erasing at an
//! invalid position - panic. Storage allocation failures panic in the regular methods and are
//! reported as [`Error`] by the `try_` variants such as [`DynamicArray::try_reserve()`].
//!
//! # Example
//!
//! ```
//! use dynamic_array::DynamicArray;
//!
//! let mut array = DynamicArray::new();
//!
//! array.push(1);
//! array.push(2);
//! array.push(3);
//! assert_eq!(array.len(), 3);
//! assert_eq!(array.capacity(), 4);
//!
//! array.insert(1, 9);
//! assert_eq!(array, [1, 9, 2, 3]);
//!
//! array.erase(0);
//! assert_eq!(array, [9, 2, 3]);
//!
//! array.resize(5);
//! assert_eq!(array, [9, 2, 3, 0, 0]);
//! ```
//!
//! # Fallible allocation
//!
//! ```
//! use dynamic_array::{DynamicArray, Error};
//!
//! let mut array = DynamicArray::<u64>::new();
//!
//! match array.try_reserve(usize::MAX) {
//!     Err(Error::CapacityOverflow { requested, .. }) => assert_eq!(requested, usize::MAX),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//!
//! // The array is untouched by the failed attempt.
//! assert_eq!(array.capacity(), 0);
//! ```

mod builder;
mod dynamic_array;
mod error;
mod into_iter;
mod raw_block;

pub use builder::*;
pub use dynamic_array::DynamicArray;
pub use error::Error;
pub(crate) use error::Result;
pub use into_iter::IntoIter;
pub use raw_block::RawBlock;
