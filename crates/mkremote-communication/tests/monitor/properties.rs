use std::time::Duration;

use mkremote_communication::{classify_message, PollIntervals};
use mkremote_core::OperationalCondition;
use proptest::prelude::*;

use crate::mock::{harness, status, MockApi};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[derive(Debug, Clone)]
enum Edit {
    Enqueue(String),
    Dequeue(usize),
    Reverse,
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        "[a-e]\\.nc".prop_map(Edit::Enqueue),
        (0usize..6).prop_map(Edit::Dequeue),
        Just(Edit::Reverse),
    ]
}

proptest! {
    #[test]
    fn prop_classify_is_total(status in proptest::option::of(any::<u16>()), message in ".*") {
        let condition = classify_message(status, &message);
        let lower = message.to_lowercase();
        if lower.contains("not running") || lower.contains("emcstatusbuffer invalid") {
            prop_assert_eq!(condition, OperationalCondition::ControllerOffline);
        } else if lower.contains("failed to fetch") {
            prop_assert_eq!(condition, OperationalCondition::ServiceDown);
        } else if status == Some(403) {
            prop_assert_eq!(condition, OperationalCondition::Unauthorized);
        } else {
            prop_assert_eq!(condition, OperationalCondition::UnknownError(message.clone()));
        }
    }

    #[test]
    fn prop_interval_follows_axis_motion(x in -500i32..500, dx in prop_oneof![Just(0i32), -50i32..50]) {
        let intervals = PollIntervals::default();
        let (first, second) = runtime().block_on(async {
            let mut h = harness(MockApi::new());
            h.api.script([
                status(f64::from(x), "EXECUTING", "a.nc"),
                status(f64::from(x + dx), "EXECUTING", "a.nc"),
            ]);
            (h.poller.tick().await, h.poller.tick().await)
        });

        prop_assert_eq!(first, intervals.slow);
        let expected: Duration = if dx == 0 { intervals.slow } else { intervals.fast };
        prop_assert_eq!(second, expected);
    }

    #[test]
    fn prop_queue_converges_after_successful_push(
        initial in prop::collection::vec("[a-e]\\.nc", 0..4),
        edits in prop::collection::vec(edit(), 1..10),
        failures in 0usize..3,
    ) {
        let (local, server, in_sync) = runtime().block_on(async {
            let names: Vec<&str> = initial.iter().map(String::as_str).collect();
            let h = harness(MockApi::with_queue(&names));
            h.queue.bootstrap().await.unwrap();
            h.api.fail_next_pushes(failures);

            for edit in edits {
                let _ = match edit {
                    Edit::Enqueue(name) => h.queue.enqueue(name).await,
                    Edit::Dequeue(index) => h.queue.dequeue(index).await.map(|_| ()),
                    Edit::Reverse => {
                        let mut order = h.queue.view().await.local.as_slice().to_vec();
                        order.reverse();
                        h.queue.reorder(order).await
                    }
                };
            }
            h.api.fail_next_pushes(0);
            h.queue.enqueue("final.nc").await.unwrap();

            let view = h.queue.view().await;
            (view.local.as_slice().to_vec(), h.api.server_queue(), view.in_sync())
        });

        prop_assert!(in_sync);
        prop_assert_eq!(local, server);
    }
}
