//! HTTP surface tests: the router is driven directly as a tower service,
//! no network stack involved.

mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::*;
use mercado_server::api;
use mercado_server::core::{Config, ServerState};
use mercado_server::db::repository;

fn app(store: &TestStore) -> Router {
    let config = Config::with_overrides("./target/test-data", 0);
    let state = ServerState::new(config, store.pool.clone(), RecordingMailer::new());
    api::build_app(state)
}

async fn body_json(response: http::Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let store = store().await;
    let response = app(&store)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn checkout_then_confirm_over_http() {
    let store = store().await;
    let router = app(&store);

    let product = seed_product(&store.pool, "Caneca", 20.0, 3).await;
    repository::cart::add_item(&store.pool, 1, product, 2).await.unwrap();

    let payload = json!({
        "customer_id": 1,
        "full_name": "Maria Silva",
        "email": "maria@example.com",
        "address": {
            "zip_code": "01310-100",
            "street": "Avenida Paulista",
            "number": "1000",
            "complement": null,
            "neighborhood": "Bela Vista",
            "city": "São Paulo",
            "state": "SP"
        },
        "payment_method": "PIX"
    });

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E0000");
    let order_id = body["data"]["order_id"].as_i64().unwrap();
    let order_number = body["data"]["order_number"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["total_amount"], 40.0);

    let token = token_for_order(&store.pool, order_id).await;
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/confirm?token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["order_number"], order_number.as_str());

    // The confirmation page detail carries items and the shipping address
    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/orders/number/{order_number}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "PAYMENT_CONFIRMED");
    assert_eq!(body["data"]["items"][0]["product_name"], "Caneca");
    assert_eq!(body["data"]["shipping_address"]["city"], "São Paulo");
}

#[tokio::test]
async fn confirm_without_token_is_a_bad_request() {
    let store = store().await;
    let response = app(&store)
        .oneshot(Request::builder().uri("/confirm").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E0006");
}

#[tokio::test]
async fn unknown_order_is_a_not_found() {
    let store = store().await;
    let response = app(&store)
        .oneshot(
            Request::builder()
                .uri("/api/orders/12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E0003");
}

#[tokio::test]
async fn invalid_checkout_payload_reports_every_field() {
    let store = store().await;

    let product = seed_product(&store.pool, "Caderno", 15.0, 5).await;
    repository::cart::add_item(&store.pool, 1, product, 1).await.unwrap();

    let payload = json!({
        "customer_id": 1,
        "full_name": "",
        "email": "not-an-email",
        "address": {
            "zip_code": "123",
            "street": "Rua A",
            "number": "1",
            "complement": null,
            "neighborhood": "Centro",
            "city": "São Paulo",
            "state": "SP"
        },
        "payment_method": "PIX"
    });

    let response = app(&store)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E0002");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("CEP inválido"));
    assert!(message.contains("Email inválido"));
    assert!(message.contains("Nome é obrigatório"));
}
