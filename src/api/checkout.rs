//! Checkout endpoint

use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::checkout::{CheckoutError, CheckoutReceipt, CheckoutRequest};
use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok_with_message};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/checkout", post(place_order))
}

async fn place_order(
    State(state): State<ServerState>,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<Json<AppResponse<CheckoutReceipt>>> {
    if let Err(errors) = req.validate() {
        return Err(AppError::validation(flatten_validation(&errors)));
    }

    let receipt = state
        .checkout_service()
        .place_order(&req)
        .await
        .map_err(map_checkout_error)?;

    Ok(ok_with_message(
        receipt,
        "Pedido criado. Verifique seu email para confirmar o pagamento.",
    ))
}

fn map_checkout_error(err: CheckoutError) -> AppError {
    match err {
        CheckoutError::EmptyCart => {
            AppError::business_rule("Seu carrinho está vazio")
        }
        CheckoutError::MissingFields(fields) => AppError::validation(format!(
            "Campos obrigatórios ausentes: {}",
            fields.join(", ")
        )),
        CheckoutError::Validation(msg) => AppError::validation(msg),
        CheckoutError::InsufficientStock(problems) => {
            AppError::business_rule(problems.join("; "))
        }
        CheckoutError::Repo(repo) => repo.into(),
    }
}

/// Collect every field message from a validator report into one line
fn flatten_validation(errors: &validator::ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    messages.sort();
    messages.join("; ")
}

fn collect_messages(errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    for kind in errors.errors().values() {
        match kind {
            validator::ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    let msg = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "campo inválido".to_string());
                    out.push(msg);
                }
            }
            validator::ValidationErrorsKind::Struct(nested) => {
                collect_messages(nested, out);
            }
            validator::ValidationErrorsKind::List(map) => {
                for nested in map.values() {
                    collect_messages(nested, out);
                }
            }
        }
    }
}
