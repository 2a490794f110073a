#![cfg(feature = "serde")]

use palisade::{ConcurrentCell, SerializedCell};

#[test]
fn concurrent_cell_serializes_as_snapshot() {
    let cell = ConcurrentCell::new(vec![1u32, 2, 3]);
    let json = serde_json::to_string(&cell).unwrap();
    assert_eq!(json, "[1,2,3]");

    let back: ConcurrentCell<Vec<u32>> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.into_inner(), vec![1, 2, 3]);
}

#[test]
fn serialized_cell_serializes_as_snapshot() {
    let cell = SerializedCell::new(String::from("queued"));
    let json = serde_json::to_string(&cell).unwrap();
    assert_eq!(json, "\"queued\"");

    let back: SerializedCell<String> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.into_inner(), "queued");
}
