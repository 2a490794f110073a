use palisade::{ConcurrentCell, SerializedCell};

fn assert_send<T: Send>() {}
fn assert_sync<T: Sync>() {}

#[test]
fn concurrent_cell_is_send_and_sync_for_send_payloads() {
    // `u64` is Send, so the cell is shareable across threads.
    assert_send::<ConcurrentCell<u64>>();
    assert_sync::<ConcurrentCell<u64>>();

    // The payload does not need to be Sync itself; the lock serializes.
    assert_sync::<ConcurrentCell<std::cell::Cell<u64>>>();
}

#[test]
fn serialized_cell_is_send_and_sync() {
    assert_send::<SerializedCell<u64>>();
    assert_sync::<SerializedCell<u64>>();
    assert_sync::<SerializedCell<Vec<String>>>();
}
