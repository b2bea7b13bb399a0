//! Mercado server
//!
//! Marketplace order backend: cart checkout creates a `PENDING` order and
//! mails a single-use 24h confirmation link; following the link commits
//! the payment and the stock movement atomically.

pub mod api;
pub mod checkout;
pub mod core;
pub mod db;
pub mod money;
pub mod payment;
pub mod services;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};
