//! Utility module - shared helpers and types
//!
//! - [`AppError`] / [`AppResult`] - application error handling
//! - [`logger`] - tracing setup
//! - id/time helpers in [`util`]

pub mod error;
pub mod logger;
pub mod result;
pub mod util;

pub use error::{AppError, AppResponse, ok, ok_with_message};
pub use result::AppResult;
pub use util::{fmt_datetime, now_millis, snowflake_id};
