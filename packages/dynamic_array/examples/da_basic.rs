//! Basic usage example for `DynamicArray`.
//!
//! This example demonstrates how the array grows as items are appended, how items are shifted
//! by insertion and removal, and how resizing constructs and drops items.

use dynamic_array::DynamicArray;

fn main() {
    let mut array = DynamicArray::new();

    println!("Created DynamicArray with capacity: {}", array.capacity());

    // Every time the array is full, the capacity doubles.
    for value in 1..=5 {
        array.push(value);
        println!(
            "Pushed {value}: len = {}, capacity = {}",
            array.len(),
            array.capacity()
        );
    }

    // Insertion shifts all later items one slot towards the end.
    array.insert(1, 9);
    println!("After inserting 9 at index 1: {array:?}");

    // Erasing shifts all later items one slot towards the start.
    let next = array.erase(0);
    println!("After erasing index 0: {array:?} (next item is now at index {next})");

    // Growing by resize appends default-constructed items.
    array.resize(8);
    println!("After resize(8): {array:?}");

    // Shrinking by resize drops the trailing items but keeps the capacity.
    array.resize(3);
    println!(
        "After resize(3): {array:?}, capacity = {}",
        array.capacity()
    );

    array.shrink_to_fit();
    println!("After shrink_to_fit(): capacity = {}", array.capacity());

    // The array dereferences to a slice, so slice methods are available.
    let sum: i32 = array.iter().sum();
    println!("Sum of items: {sum}");
    assert_eq!(sum, 9 + 2 + 3);

    println!("Example completed successfully!");
}
