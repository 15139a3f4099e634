//! Guest cart behavior through the cart reconciler.
//!
//! Guest state lives in the local store only; no request ever leaves the
//! process (the harness configures no backend).

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use keepsake_core::{Cart, CartLineItem, ProductId, SessionMode};
use keepsake_integration_tests::{HarnessBuilder, line, price};
use keepsake_storefront::store::{FileStorage, Storage, keys};
use keepsake_storefront::view::messages;
use keepsake_storefront::{BadgeScope, CartOutcome, ReconcileError, StoreError};
use rust_decimal::Decimal;

fn stored_cart(storage: &dyn Storage) -> Cart {
    storage
        .get_item(keys::CART)
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_add_to_empty_cart() {
    let h = HarnessBuilder::new().build();
    assert_eq!(h.mode, SessionMode::Guest);

    let mug = CartLineItem::new(ProductId::new(7), "Mug", price("500"), Some(String::new()), 2);
    let outcome = h.cart.add_item(h.mode, mug).await.unwrap();

    assert_eq!(outcome, CartOutcome::Updated { count: 2 });
    assert_eq!(h.view.badge(BadgeScope::Cart), Some(2));
    assert_eq!(h.view.toasts(), vec![messages::CART_ADDED.to_string()]);

    let cart = stored_cart(h.storage.as_ref());
    assert_eq!(cart.len(), 1);
    let stored = cart.get(ProductId::new(7)).unwrap();
    assert_eq!(stored.quantity, 2);
    assert_eq!(stored.image, None);
}

#[tokio::test]
async fn test_add_existing_line_accumulates() {
    let h = HarnessBuilder::new().build();

    h.cart.add_item(h.mode, line(7, "500", 2)).await.unwrap();
    let outcome = h.cart.add_item(h.mode, line(7, "500", 3)).await.unwrap();

    assert_eq!(outcome, CartOutcome::Updated { count: 5 });
    let cart = stored_cart(h.storage.as_ref());
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.get(ProductId::new(7)).unwrap().quantity, 5);
}

#[tokio::test]
async fn test_add_sequence_sums_per_product() {
    let h = HarnessBuilder::new().build();
    let adds = [(1, 2), (2, 1), (1, 4), (3, 1), (2, 6)];

    for (id, quantity) in adds {
        h.cart.add_item(h.mode, line(id, "10", quantity)).await.unwrap();
    }

    let cart = stored_cart(h.storage.as_ref());
    assert_eq!(cart.len(), 3);
    assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 6);
    assert_eq!(cart.get(ProductId::new(2)).unwrap().quantity, 7);
    assert_eq!(cart.get(ProductId::new(3)).unwrap().quantity, 1);
    assert_eq!(h.cart.get_count(h.mode).await.unwrap(), 14);

    // First-added order is kept.
    let ids: Vec<i32> = cart.lines().iter().map(|l| l.id.as_i32()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_zero_quantity_add_is_refused() {
    let h = HarnessBuilder::new().build();

    let err = h.cart.add_item(h.mode, line(7, "500", 0)).await.unwrap_err();

    assert!(matches!(err, ReconcileError::ZeroQuantity(id) if id == ProductId::new(7)));
    assert!(h.view.toasts().is_empty());
    assert_eq!(h.view.badge(BadgeScope::Cart), None);
    assert_eq!(h.storage.get_item(keys::CART).unwrap(), None);
}

#[tokio::test]
async fn test_set_quantity_zero_matches_remove() {
    let removed = HarnessBuilder::new().build();
    let zeroed = HarnessBuilder::new().build();

    for h in [&removed, &zeroed] {
        h.cart.add_item(h.mode, line(1, "10", 2)).await.unwrap();
        h.cart.add_item(h.mode, line(2, "20", 1)).await.unwrap();
    }

    let a = removed.cart.remove_item(removed.mode, ProductId::new(1)).await.unwrap();
    let b = zeroed
        .cart
        .set_quantity(zeroed.mode, ProductId::new(1), 0)
        .await
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(a, CartOutcome::Updated { count: 1 });
    assert_eq!(
        removed.storage.get_item(keys::CART).unwrap(),
        zeroed.storage.get_item(keys::CART).unwrap()
    );
}

#[tokio::test]
async fn test_set_quantity_negative_removes() {
    let h = HarnessBuilder::new().build();
    h.cart.add_item(h.mode, line(4, "10", 3)).await.unwrap();

    h.cart.set_quantity(h.mode, ProductId::new(4), -2).await.unwrap();

    assert!(stored_cart(h.storage.as_ref()).is_empty());
    assert_eq!(h.view.badge(BadgeScope::Cart), Some(0));
}

#[tokio::test]
async fn test_set_quantity_overwrites() {
    let h = HarnessBuilder::new().build();
    h.cart.add_item(h.mode, line(4, "10", 3)).await.unwrap();

    let outcome = h.cart.set_quantity(h.mode, ProductId::new(4), 8).await.unwrap();

    assert_eq!(outcome, CartOutcome::Updated { count: 8 });
}

#[tokio::test]
async fn test_guest_remove_needs_no_confirmation() {
    let h = HarnessBuilder::new().confirm(false).build();
    h.cart.add_item(h.mode, line(4, "10", 1)).await.unwrap();

    let outcome = h.cart.remove_item(h.mode, ProductId::new(4)).await.unwrap();

    assert_eq!(outcome, CartOutcome::Updated { count: 0 });
    assert!(h.host.questions().is_empty());
    assert!(h.host.transitions().is_empty());
}

#[tokio::test]
async fn test_cart_view_renders_lines_and_total() {
    let h = HarnessBuilder::new().path("/cart/").build();

    h.cart.add_item(h.mode, line(1, "19.99", 2)).await.unwrap();
    h.cart.add_item(h.mode, line(2, "5.50", 1)).await.unwrap();

    let (items, total) = h.view.last_cart_view().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(total, Decimal::new(4548, 2));
}

#[tokio::test]
async fn test_other_pages_do_not_render_cart_view() {
    let h = HarnessBuilder::new().path("/product/mug/").build();
    h.cart.add_item(h.mode, line(1, "10", 1)).await.unwrap();
    assert!(h.view.last_cart_view().is_none());
}

#[tokio::test]
async fn test_count_of_absent_cart_is_zero() {
    let h = HarnessBuilder::new().build();
    assert_eq!(h.cart.get_count(h.mode).await.unwrap(), 0);
    assert_eq!(h.view.badge(BadgeScope::Cart), Some(0));
}

#[tokio::test]
async fn test_corrupt_blob_reads_as_empty() {
    let h = HarnessBuilder::new().build();
    h.storage.set_item(keys::CART, "{oops").unwrap();

    assert_eq!(h.cart.get_count(h.mode).await.unwrap(), 0);
    h.cart.add_item(h.mode, line(1, "10", 1)).await.unwrap();
    assert_eq!(stored_cart(h.storage.as_ref()).item_count(), 1);
}

#[tokio::test]
async fn test_unreadable_line_does_not_cost_the_others() {
    let h = HarnessBuilder::new().build();
    h.storage
        .set_item(
            keys::CART,
            r#"[{"id":1,"name":"A","price":null,"image":"","quantity":1},{"id":2,"name":"B","price":5,"quantity":3}]"#,
        )
        .unwrap();

    let outcome = h.cart.add_item(h.mode, line(3, "10", 1)).await.unwrap();

    assert_eq!(outcome, CartOutcome::Updated { count: 4 });
    let cart = stored_cart(h.storage.as_ref());
    let ids: Vec<i32> = cart.lines().iter().map(|l| l.id.as_i32()).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(cart.get(ProductId::new(2)).unwrap().quantity, 3);
}

#[tokio::test]
async fn test_sync_on_load_renders_cart_page() {
    let h = HarnessBuilder::new().path("/cart/").build();
    h.storage
        .set_item(
            keys::CART,
            r#"[{"id":7,"name":"Mug","price":500,"image":"","quantity":2}]"#,
        )
        .unwrap();

    h.cart.sync_on_load().await;

    assert_eq!(h.view.badge(BadgeScope::Cart), Some(2));
    let (items, total) = h.view.last_cart_view().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(total, Decimal::from(1000));
}

#[tokio::test]
async fn test_authenticated_call_without_backend_fails_cleanly() {
    let h = HarnessBuilder::new().build();

    let err = h
        .cart
        .add_item(SessionMode::Authenticated, line(1, "10", 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::ActionFailed(StoreError::Unavailable(SessionMode::Authenticated))
    ));
    assert_eq!(h.storage.get_item(keys::CART).unwrap(), None);
    assert!(h.view.toasts().is_empty());
}

#[tokio::test]
async fn test_file_storage_survives_page_loads() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()));

    let first = HarnessBuilder::new().storage(storage.clone()).build();
    first.cart.add_item(first.mode, line(9, "250", 3)).await.unwrap();

    let second = HarnessBuilder::new().storage(storage).build();
    assert_eq!(second.cart.get_count(second.mode).await.unwrap(), 3);
    assert!(dir.path().join("cart.json").exists());
}
