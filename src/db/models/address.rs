//! Shipping address model
//!
//! Addresses are content-addressed: an existing row with an identical
//! field tuple is reused instead of duplicated.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Shipping address entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub id: i64,
    pub zip_code: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Address fields as submitted at checkout
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(length(min = 8, max = 9, message = "CEP inválido"))]
    pub zip_code: String,
    #[validate(length(min = 1, message = "Rua é obrigatória"))]
    pub street: String,
    #[validate(length(min = 1, message = "Número é obrigatório"))]
    pub number: String,
    pub complement: Option<String>,
    #[validate(length(min = 1, message = "Bairro é obrigatório"))]
    pub neighborhood: String,
    #[validate(length(min = 1, message = "Cidade é obrigatória"))]
    pub city: String,
    #[validate(length(equal = 2, message = "UF deve ter 2 letras"))]
    pub state: String,
}
