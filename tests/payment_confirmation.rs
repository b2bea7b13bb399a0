//! Payment confirmation end-to-end: the atomic stock commit, token
//! single-use semantics, expiry and the pre-mutation validation chain.

mod common;

use common::*;
use mercado_server::db::models::{OrderStatus, ProductStatus};
use mercado_server::db::repository::{self, RepoError};
use mercado_server::payment::ConfirmError;

async fn place_order(
    store: &TestStore,
    items: &[(i64, i64)],
) -> mercado_server::checkout::CheckoutReceipt {
    let checkout = checkout_service(&store.pool, RecordingMailer::new());
    for (product_id, quantity) in items {
        repository::cart::add_item(&store.pool, 1, *product_id, *quantity)
            .await
            .unwrap();
    }
    checkout.place_order(&checkout_request(1)).await.unwrap()
}

#[tokio::test]
async fn confirmation_commits_stock_status_and_token_atomically() {
    let store = store().await;
    let product_a = seed_product(&store.pool, "Camiseta", 10.0, 5).await;
    let product_b = seed_product(&store.pool, "Caneca", 20.0, 1).await;

    let receipt = place_order(&store, &[(product_a, 2), (product_b, 1)]).await;
    let token = token_for_order(&store.pool, receipt.order_id).await;

    let confirmation = confirmation_service(&store.pool);
    let result = confirmation.confirm(&token).await.unwrap();
    assert_eq!(result.order_number, receipt.order_number);
    assert_eq!(result.total_amount, 40.0);

    // Stock moved exactly by the ordered quantities
    assert_eq!(product_stock(&store.pool, product_a).await, 3);
    assert_eq!(product_stock(&store.pool, product_b).await, 0);

    // Product B hit zero and was flipped to OUT_OF_STOCK
    let mut conn = store.pool.acquire().await.unwrap();
    let status_b = repository::product::find_by_id(&store.pool, product_b)
        .await
        .unwrap()
        .unwrap()
        .status;
    assert_eq!(status_b, ProductStatus::OutOfStock);

    let order = repository::order::find_by_id(&mut conn, receipt.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::PaymentConfirmed);
    assert!(order.paid_at.is_some());
}

#[tokio::test]
async fn second_confirmation_is_rejected_and_stock_moves_once() {
    let store = store().await;
    let product = seed_product(&store.pool, "Livro", 50.0, 10).await;

    let receipt = place_order(&store, &[(product, 2)]).await;
    let token = token_for_order(&store.pool, receipt.order_id).await;

    let confirmation = confirmation_service(&store.pool);
    confirmation.confirm(&token).await.unwrap();

    let err = confirmation.confirm(&token).await.unwrap_err();
    match err {
        ConfirmError::AlreadyUsed { order_number, .. } => {
            assert_eq!(order_number, receipt.order_number);
        }
        other => panic!("unexpected error: {other}"),
    }

    // No double decrement
    assert_eq!(product_stock(&store.pool, product).await, 8);
}

#[tokio::test]
async fn racing_confirmations_resolve_to_one_success_and_one_already_used() {
    let store = store().await;
    let product = seed_product(&store.pool, "Camiseta", 10.0, 5).await;

    let receipt = place_order(&store, &[(product, 2)]).await;
    let token = token_for_order(&store.pool, receipt.order_id).await;

    let first = confirmation_service(&store.pool);
    let second = confirmation_service(&store.pool);
    let (r1, r2) = tokio::join!(first.confirm(&token), second.confirm(&token));

    let mut successes = 0;
    let mut already_used = 0;
    for result in [r1, r2] {
        match result {
            Ok(_) => successes += 1,
            Err(ConfirmError::AlreadyUsed { .. }) => already_used += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(already_used, 1);

    // The winner decremented exactly once
    assert_eq!(product_stock(&store.pool, product).await, 3);
}

#[tokio::test]
async fn multibyte_token_is_rejected_not_a_panic() {
    // A subscriber must be active for the warn-path log fields to be
    // evaluated at all.
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();

    let store = store().await;
    let confirmation = confirmation_service(&store.pool);

    let err = confirmation.confirm("€€€").await.unwrap_err();
    assert!(matches!(err, ConfirmError::TokenNotFound));
}

#[tokio::test]
async fn stock_ledger_rejects_underflow_without_clamping() {
    let store = store().await;
    let product = seed_product(&store.pool, "Caneca", 20.0, 2).await;

    let mut conn = store.pool.acquire().await.unwrap();
    let err = repository::product::decrement_stock(&mut conn, product, 3)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    drop(conn);

    assert_eq!(product_stock(&store.pool, product).await, 2);
}

#[tokio::test]
async fn missing_and_unknown_tokens_are_distinct_errors() {
    let store = store().await;
    let confirmation = confirmation_service(&store.pool);

    let err = confirmation.confirm("").await.unwrap_err();
    assert!(matches!(err, ConfirmError::TokenMissing));

    let err = confirmation.confirm("   ").await.unwrap_err();
    assert!(matches!(err, ConfirmError::TokenMissing));

    let err = confirmation
        .confirm("ffffffffffffffffffffffffffffffff")
        .await
        .unwrap_err();
    assert!(matches!(err, ConfirmError::TokenNotFound));
}

#[tokio::test]
async fn expired_token_is_rejected_without_mutation() {
    let store = store().await;
    let product = seed_product(&store.pool, "Caderno", 15.0, 10).await;

    let receipt = place_order(&store, &[(product, 1)]).await;
    let token = token_for_order(&store.pool, receipt.order_id).await;

    // Age the token past its deadline
    sqlx::query("UPDATE payment_confirmation_token SET expires_at = ? WHERE order_id = ?")
        .bind(mercado_server::utils::now_millis() - 1000)
        .bind(receipt.order_id)
        .execute(&store.pool)
        .await
        .unwrap();

    let confirmation = confirmation_service(&store.pool);
    let err = confirmation.confirm(&token).await.unwrap_err();
    match err {
        ConfirmError::Expired { order_number, .. } => {
            assert_eq!(order_number, receipt.order_number);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Nothing moved
    assert_eq!(product_stock(&store.pool, product).await, 10);
    let mut conn = store.pool.acquire().await.unwrap();
    let order = repository::order::find_by_id(&mut conn, receipt.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn token_near_the_deadline_still_confirms() {
    let store = store().await;
    let product = seed_product(&store.pool, "Agenda", 25.0, 10).await;

    let receipt = place_order(&store, &[(product, 1)]).await;
    let token = token_for_order(&store.pool, receipt.order_id).await;

    // Two seconds from expiry is still within the window
    sqlx::query("UPDATE payment_confirmation_token SET expires_at = ? WHERE order_id = ?")
        .bind(mercado_server::utils::now_millis() + 2000)
        .bind(receipt.order_id)
        .execute(&store.pool)
        .await
        .unwrap();

    let confirmation = confirmation_service(&store.pool);
    confirmation.confirm(&token).await.unwrap();
    assert_eq!(product_stock(&store.pool, product).await, 9);
}

#[tokio::test]
async fn stock_consumed_after_checkout_blocks_confirmation_atomically() {
    let store = store().await;
    let product_a = seed_product(&store.pool, "Camiseta", 10.0, 5).await;
    let product_b = seed_product(&store.pool, "Caneca", 20.0, 3).await;

    let receipt = place_order(&store, &[(product_a, 2), (product_b, 3)]).await;
    let token = token_for_order(&store.pool, receipt.order_id).await;

    // Another confirmed order drains product B in the meantime
    let mut conn = store.pool.acquire().await.unwrap();
    repository::product::decrement_stock(&mut conn, product_b, 2)
        .await
        .unwrap();
    drop(conn);

    let confirmation = confirmation_service(&store.pool);
    let err = confirmation.confirm(&token).await.unwrap_err();
    match err {
        ConfirmError::InsufficientStock {
            order_number,
            problems,
        } => {
            assert_eq!(order_number, receipt.order_number);
            assert_eq!(problems.len(), 1);
            assert_eq!(problems[0].product_name, "Caneca");
            assert_eq!(problems[0].available, 1);
            assert_eq!(problems[0].ordered, 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Rejection mutates nothing: no partial decrement of product A, the
    // order stays pending and the token stays unused (retry is possible
    // once stock returns).
    assert_eq!(product_stock(&store.pool, product_a).await, 5);
    assert_eq!(product_stock(&store.pool, product_b).await, 1);
    let mut conn = store.pool.acquire().await.unwrap();
    let order = repository::order::find_by_id(&mut conn, receipt.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    let used = sqlx::query_scalar::<_, bool>(
        "SELECT used FROM payment_confirmation_token WHERE order_id = ?",
    )
    .bind(receipt.order_id)
    .fetch_one(&store.pool)
    .await
    .unwrap();
    assert!(!used);
}
