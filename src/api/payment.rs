//! Payment confirmation endpoint
//!
//! The link mailed at checkout lands here. Every rejection carries its own
//! user-facing message; the full token never reaches the logs.

use axum::{Json, Router, extract::Query, extract::State, routing::get};
use serde::Deserialize;

use crate::core::ServerState;
use crate::payment::{ConfirmError, ConfirmationReceipt};
use crate::utils::{AppError, AppResponse, AppResult, fmt_datetime, ok_with_message};

pub fn router() -> Router<ServerState> {
    Router::new().route("/confirm", get(confirm_payment))
}

#[derive(Debug, Deserialize)]
struct ConfirmParams {
    token: Option<String>,
}

async fn confirm_payment(
    State(state): State<ServerState>,
    Query(params): Query<ConfirmParams>,
) -> AppResult<Json<AppResponse<ConfirmationReceipt>>> {
    let token = params.token.unwrap_or_default();

    let receipt = state
        .confirmation_service()
        .confirm(&token)
        .await
        .map_err(map_confirm_error)?;

    Ok(ok_with_message(
        receipt,
        "Pagamento confirmado! Seu pedido está sendo processado.",
    ))
}

fn map_confirm_error(err: ConfirmError) -> AppError {
    match err {
        ConfirmError::TokenMissing => {
            AppError::invalid("Token de confirmação não informado")
        }
        ConfirmError::TokenNotFound => {
            AppError::not_found("Token de confirmação inválido ou inexistente")
        }
        ConfirmError::AlreadyUsed {
            order_number,
            used_at,
        } => AppError::business_rule(format!(
            "O pagamento do pedido {} já foi confirmado em {}",
            order_number,
            fmt_datetime(used_at)
        )),
        ConfirmError::Expired {
            order_number,
            expires_at,
        } => AppError::business_rule(format!(
            "O link de confirmação do pedido {} expirou em {}. Realize uma nova compra.",
            order_number,
            fmt_datetime(expires_at)
        )),
        ConfirmError::OrderAlreadyProcessed { order_number, .. } => {
            AppError::business_rule(format!(
                "O pedido {order_number} já foi processado e não pode ser confirmado novamente"
            ))
        }
        ConfirmError::InsufficientStock {
            order_number,
            problems,
        } => {
            let detail: Vec<String> = problems.iter().map(|p| p.to_string()).collect();
            AppError::business_rule(format!(
                "Não foi possível confirmar o pedido {}: {}",
                order_number,
                detail.join("; ")
            ))
        }
        ConfirmError::Repo(repo) => repo.into(),
    }
}
