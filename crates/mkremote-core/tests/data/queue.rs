use mkremote_core::{FileQueue, ValidationError};
use proptest::prelude::*;

fn files(names: &[&str]) -> FileQueue {
    FileQueue::from(names.iter().map(|n| n.to_string()).collect::<Vec<_>>())
}

#[test]
fn test_dequeue_twice_past_end_is_validation_error() {
    let mut queue = files(&["a.nc", "b.nc"]);

    assert_eq!(queue.remove(1).unwrap(), "b.nc");
    assert_eq!(
        queue.remove(1),
        Err(ValidationError::IndexOutOfRange { index: 1, len: 1 })
    );
    assert_eq!(queue.as_slice(), &["a.nc".to_string()]);
}

#[test]
fn test_pop_head_on_empty_queue() {
    let mut queue = FileQueue::new();
    assert_eq!(queue.pop_head(), None);
    assert!(queue.head().is_none());
}

#[test]
fn test_queue_serializes_as_plain_list() {
    let queue = files(&["a.nc", "b.nc"]);
    assert_eq!(
        serde_json::to_value(&queue).unwrap(),
        serde_json::json!(["a.nc", "b.nc"])
    );
}

proptest! {
    #[test]
    fn prop_remove_never_panics(names in prop::collection::vec("[a-z]{1,6}\\.nc", 0..8), index in 0usize..12) {
        let mut queue = FileQueue::from(names.clone());
        let result = queue.remove(index);
        if index < names.len() {
            prop_assert_eq!(result.unwrap(), names[index].clone());
            prop_assert_eq!(queue.len(), names.len() - 1);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(queue.len(), names.len());
        }
    }

    #[test]
    fn prop_reversed_order_is_permutation(names in prop::collection::vec("[a-z]{1,6}\\.nc", 0..8)) {
        let mut queue = FileQueue::from(names.clone());
        let mut reversed = names.clone();
        reversed.reverse();
        prop_assert!(queue.reorder(reversed.clone()).is_ok());
        prop_assert_eq!(queue.as_slice(), reversed.as_slice());
    }
}
