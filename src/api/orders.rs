//! Order query endpoints

use axum::{Json, Router, extract::Path, extract::State, routing::get};

use crate::core::ServerState;
use crate::db::models::OrderDetail;
use crate::db::repository;
use crate::utils::{AppError, AppResponse, AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/number/{order_number}", get(get_order_by_number))
}

async fn get_order(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    let detail = repository::order::find_detail(&state.pool, id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found(format!("Pedido {id} não encontrado")))?;
    Ok(ok(detail))
}

async fn get_order_by_number(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    let detail = repository::order::find_detail_by_number(&state.pool, &order_number)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::not_found(format!("Pedido {order_number} não encontrado"))
        })?;
    Ok(ok(detail))
}
