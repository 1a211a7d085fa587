//! Timeline audit guarantees: append-only, one row per operation, replay

use super::*;
use shared::order::{RefundType, ReturnItemInput, TimelineEvent, TimelineEventType};

/// Hash the serialized form of existing rows so any later mutation shows up
fn fingerprint(events: &[TimelineEvent]) -> Vec<String> {
    use sha2::{Digest, Sha256};
    events
        .iter()
        .map(|e| {
            let mut hasher = Sha256::new();
            hasher.update(serde_json::to_vec(e).unwrap());
            hex::encode(hasher.finalize())
        })
        .collect()
}

#[tokio::test]
async fn test_existing_rows_never_change() {
    let manager = manager();
    let order = place_order(&manager, &[("item-1", "product-1", 3, 100.0)], 300.0);
    deliver(&manager, &order.id).await;

    let before = manager.get_timeline_for_order(&order.id).unwrap();
    let before_hashes = fingerprint(&before);

    // Unrelated operations on the same order
    manager
        .create_return_request(
            &order.id,
            vec![ReturnItemInput {
                order_item_id: "item-1".to_string(),
                quantity: 1,
                reason: None,
                condition: None,
            }],
            "damaged",
            None,
            None,
            customer(),
        )
        .await
        .unwrap();
    manager
        .create_refund(
            &order.id,
            10.0,
            RefundType::Partial,
            "goodwill",
            None,
            None,
            admin(),
        )
        .await
        .unwrap();

    let after = manager.get_timeline_for_order(&order.id).unwrap();
    assert_eq!(after.len(), before.len() + 2);

    // The prior rows are byte-identical
    assert_eq!(fingerprint(&after[..before.len()]), before_hashes);
}

#[tokio::test]
async fn test_exactly_one_row_per_operation() {
    let manager = manager();
    let order = place_order(&manager, &[("item-1", "product-1", 3, 100.0)], 300.0);

    let mut expected = 0usize;
    deliver(&manager, &order.id).await;
    expected += 4;
    assert_eq!(
        manager.get_timeline_for_order(&order.id).unwrap().len(),
        expected
    );

    let ret = manager
        .create_return_request(
            &order.id,
            vec![ReturnItemInput {
                order_item_id: "item-1".to_string(),
                quantity: 2,
                reason: None,
                condition: None,
            }],
            "damaged",
            None,
            None,
            customer(),
        )
        .await
        .unwrap();
    expected += 1;

    manager
        .process_return_request(&ret.id, true, None, admin())
        .await
        .unwrap();
    expected += 1;

    manager
        .create_refund(
            &order.id,
            200.0,
            RefundType::Partial,
            "approved return",
            None,
            Some(ret.id),
            admin(),
        )
        .await
        .unwrap();
    expected += 1;

    let timeline = manager.get_timeline_for_order(&order.id).unwrap();
    assert_eq!(timeline.len(), expected);

    // Sequences are strictly increasing, one per operation
    for pair in timeline.windows(2) {
        assert!(pair[0].sequence < pair[1].sequence);
    }
}

#[tokio::test]
async fn test_replay_reconstructs_order_after_any_sequence() {
    let manager = manager();
    let storage = manager.storage();
    storage.set_stock("product-1", 0).unwrap();

    // Lifecycle with returns and refunds
    let order = place_order(&manager, &[("item-1", "product-1", 3, 100.0)], 300.0);
    assert!(manager.verify_order(&order.id).unwrap());

    deliver(&manager, &order.id).await;
    assert!(manager.verify_order(&order.id).unwrap());

    let ret = manager
        .create_return_request(
            &order.id,
            vec![ReturnItemInput {
                order_item_id: "item-1".to_string(),
                quantity: 1,
                reason: None,
                condition: None,
            }],
            "damaged",
            None,
            None,
            customer(),
        )
        .await
        .unwrap();
    manager
        .process_return_request(&ret.id, false, Some("outside window".to_string()), admin())
        .await
        .unwrap();
    manager
        .create_refund(
            &order.id,
            150.0,
            RefundType::Partial,
            "goodwill",
            None,
            None,
            admin(),
        )
        .await
        .unwrap();

    let stored = manager.get_order(&order.id).unwrap();
    let rebuilt = manager.rebuild_order(&order.id).unwrap();
    assert_eq!(rebuilt.status, stored.status);
    assert_eq!(rebuilt.actual_delivery, stored.actual_delivery);
    assert_eq!(rebuilt.last_sequence, stored.last_sequence);
    assert_eq!(rebuilt.state_checksum, stored.state_checksum);
    assert!(manager.verify_order(&order.id).unwrap());

    // A cancelled order replays too
    let order2 = place_order(&manager, &[("item-2", "product-1", 2, 40.0)], 80.0);
    manager
        .cancel_order(&order2.id, "changed mind", Some("note".to_string()), admin())
        .await
        .unwrap();
    assert!(manager.verify_order(&order2.id).unwrap());
}

#[tokio::test]
async fn test_refund_invariant_holds_against_timeline() {
    let manager = manager();
    let order = place_order(&manager, &[("item-1", "product-1", 1, 100.0)], 100.0);

    for amount in [30.0, 30.0, 40.0] {
        manager
            .create_refund(
                &order.id,
                amount,
                RefundType::Partial,
                "installment",
                None,
                None,
                admin(),
            )
            .await
            .unwrap();
    }
    let _ = manager
        .create_refund(
            &order.id,
            5.0,
            RefundType::Partial,
            "overflow",
            None,
            None,
            admin(),
        )
        .await;

    // Sum of refund amounts recorded on the timeline never exceeds the total
    let timeline = manager.get_timeline_for_order(&order.id).unwrap();
    let refunded: f64 = timeline
        .iter()
        .filter_map(|e| match &e.payload {
            shared::order::TimelinePayload::RefundInitiated { amount, .. } => Some(*amount),
            _ => None,
        })
        .sum();
    assert!(refunded <= order.total);
}

#[tokio::test]
async fn test_subscribers_receive_committed_events() {
    let manager = manager();
    let mut rx = manager.subscribe();

    let order = place_order(&manager, &[("item-1", "product-1", 1, 50.0)], 50.0);
    manager
        .update_status(&order.id, OrderStatus::Confirmed, None, admin())
        .await
        .unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.order_id, order.id);
    assert_eq!(event.event_type, TimelineEventType::StatusChanged);
    assert_eq!(event.sequence, 1);
}

#[tokio::test]
async fn test_events_since_spans_orders() {
    let manager = manager();
    let order_a = place_order(&manager, &[("item-1", "product-1", 1, 50.0)], 50.0);
    let order_b = place_order(&manager, &[("item-1", "product-1", 1, 50.0)], 50.0);

    manager
        .update_status(&order_a.id, OrderStatus::Confirmed, None, admin())
        .await
        .unwrap();
    manager
        .update_status(&order_b.id, OrderStatus::Confirmed, None, admin())
        .await
        .unwrap();
    manager
        .update_status(&order_a.id, OrderStatus::Processing, None, admin())
        .await
        .unwrap();

    let all = manager.get_events_since(0).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(
        all.iter().map(|e| e.sequence).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let tail = manager.get_events_since(2).unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].order_id, order_a.id);

    let stats = manager.get_stats().unwrap();
    assert_eq!(stats.order_count, 2);
    assert_eq!(stats.timeline_count, 3);
    assert_eq!(stats.current_sequence, 3);
}
