//! Demonstrates fallible storage acquisition with `DynamicArray`.
//!
//! The `try_` methods report allocation failures as errors instead of panicking, and a failed
//! attempt leaves the array exactly as it was.

use dynamic_array::{DynamicArray, Error};

fn main() {
    let mut array = DynamicArray::<u64>::builder()
        .capacity(4)
        .try_build()
        .expect("a small allocation must succeed");

    for value in 0..4 {
        array
            .try_emplace_back_with(|| value * 10)
            .expect("the array has room for four items");
    }

    println!("Array before the failed reservation: {array:?}");

    match array.try_reserve(usize::MAX) {
        Ok(()) => println!("Unexpectedly reserved all of memory"),
        Err(Error::CapacityOverflow {
            requested,
            item_size,
        }) => println!("Cannot reserve {requested} items of {item_size} bytes"),
        Err(error) => println!("Reservation failed: {error}"),
    }

    println!(
        "Array after the failed reservation: {array:?}, capacity = {}",
        array.capacity()
    );
    assert_eq!(array, [0, 10, 20, 30]);
    assert_eq!(array.capacity(), 4);

    println!("Example completed successfully!");
}
