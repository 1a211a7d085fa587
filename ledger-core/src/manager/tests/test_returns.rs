//! Return request and review flows

use super::*;
use crate::manager::ManagerError;
use crate::traits::OrderError;
use shared::order::{ReturnItemInput, ReturnStatus, TimelineEventType};

fn one_item(quantity: i32) -> Vec<ReturnItemInput> {
    vec![ReturnItemInput {
        order_item_id: "item-1".to_string(),
        quantity,
        reason: Some("damaged".to_string()),
        condition: Some("opened".to_string()),
    }]
}

#[tokio::test]
async fn test_request_and_approve_return() {
    let manager = manager();
    let order = place_order(&manager, &[("item-1", "product-1", 3, 100.0)], 300.0);
    deliver(&manager, &order.id).await;

    let ret = manager
        .create_return_request(
            &order.id,
            one_item(2),
            "damaged on arrival",
            Some("box was crushed".to_string()),
            Some(vec!["img://damage.jpg".to_string()]),
            customer(),
        )
        .await
        .unwrap();

    assert_eq!(ret.status, ReturnStatus::Requested);
    assert_eq!(ret.order_id, order.id);
    assert!(ret.return_number.starts_with("RT"));
    assert_eq!(ret.items.len(), 1);

    let timeline = manager.get_timeline_for_order(&order.id).unwrap();
    let requested = timeline.last().unwrap();
    assert_eq!(requested.event_type, TimelineEventType::ReturnRequested);
    assert_eq!(requested.actor_type, shared::order::ActorType::Customer);

    let reviewed = manager
        .process_return_request(&ret.id, true, Some("ok".to_string()), admin())
        .await
        .unwrap();

    assert_eq!(reviewed.status, ReturnStatus::Approved);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some("admin-1"));
    assert!(reviewed.reviewed_at.is_some());

    let timeline = manager.get_timeline_for_order(&order.id).unwrap();
    let approved = timeline.last().unwrap();
    assert_eq!(approved.event_type, TimelineEventType::ReturnApproved);
    assert_eq!(approved.actor_type, shared::order::ActorType::Admin);
}

#[tokio::test]
async fn test_reject_return() {
    let manager = manager();
    let order = place_order(&manager, &[("item-1", "product-1", 1, 100.0)], 100.0);
    deliver(&manager, &order.id).await;

    let ret = manager
        .create_return_request(&order.id, one_item(1), "unwanted", None, None, customer())
        .await
        .unwrap();

    let reviewed = manager
        .process_return_request(&ret.id, false, Some("outside window".to_string()), admin())
        .await
        .unwrap();
    assert_eq!(reviewed.status, ReturnStatus::Rejected);

    let timeline = manager.get_timeline_for_order(&order.id).unwrap();
    assert_eq!(
        timeline.last().unwrap().event_type,
        TimelineEventType::ReturnRejected
    );
}

#[tokio::test]
async fn test_return_requires_delivered_status() {
    let manager = manager();
    let order = place_order(&manager, &[("item-1", "product-1", 1, 100.0)], 100.0);
    manager
        .update_status(&order.id, OrderStatus::Processing, None, admin())
        .await
        .unwrap();

    let result = manager
        .create_return_request(&order.id, one_item(1), "too early", None, None, customer())
        .await;
    assert!(matches!(
        result,
        Err(ManagerError::Order(OrderError::InvalidStateForReturn(
            OrderStatus::Processing
        )))
    ));
    assert!(manager.get_returns_for_order(&order.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_return_quantity_over_ordered_creates_nothing() {
    let manager = manager();
    let order = place_order(&manager, &[("item-1", "product-1", 3, 100.0)], 300.0);
    deliver(&manager, &order.id).await;
    let timeline_before = manager.get_timeline_for_order(&order.id).unwrap().len();

    let result = manager
        .create_return_request(&order.id, one_item(4), "too many", None, None, customer())
        .await;
    assert!(matches!(
        result,
        Err(ManagerError::Order(OrderError::QuantityExceedsOrdered {
            requested: 4,
            available: 3,
            ..
        }))
    ));

    assert!(manager.get_returns_for_order(&order.id).unwrap().is_empty());
    assert_eq!(
        manager.get_timeline_for_order(&order.id).unwrap().len(),
        timeline_before
    );
}

#[tokio::test]
async fn test_second_review_fails() {
    let manager = manager();
    let order = place_order(&manager, &[("item-1", "product-1", 1, 100.0)], 100.0);
    deliver(&manager, &order.id).await;

    let ret = manager
        .create_return_request(&order.id, one_item(1), "damaged", None, None, customer())
        .await
        .unwrap();
    manager
        .process_return_request(&ret.id, true, None, admin())
        .await
        .unwrap();

    let result = manager
        .process_return_request(&ret.id, false, None, admin())
        .await;
    assert!(matches!(
        result,
        Err(ManagerError::Order(OrderError::InvalidReturnState(
            ReturnStatus::Approved
        )))
    ));

    // The review stamp of the first decision survives untouched
    let stored = manager.get_return(&ret.id).unwrap();
    assert_eq!(stored.status, ReturnStatus::Approved);
}

#[tokio::test]
async fn test_aggregate_over_return_across_requests() {
    let manager = manager();
    let order = place_order(&manager, &[("item-1", "product-1", 3, 100.0)], 300.0);
    deliver(&manager, &order.id).await;

    manager
        .create_return_request(&order.id, one_item(2), "first", None, None, customer())
        .await
        .unwrap();

    // 2 of 3 already claimed; another 2 would overshoot
    let result = manager
        .create_return_request(&order.id, one_item(2), "second", None, None, customer())
        .await;
    assert!(matches!(
        result,
        Err(ManagerError::Order(OrderError::QuantityExceedsOrdered {
            requested: 2,
            available: 1,
            ..
        }))
    ));

    // The remaining single unit is still returnable
    let ret = manager
        .create_return_request(&order.id, one_item(1), "second", None, None, customer())
        .await
        .unwrap();
    assert_eq!(ret.items[0].quantity, 1);
}
