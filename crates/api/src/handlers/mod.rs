//! Request handlers.
//!
//! Handlers stay thin: they extract and validate input, delegate to the
//! session service or the stores in [`AppState`](crate::state::AppState),
//! and map errors via [`AppError`](crate::error::AppError).

pub mod auth;
pub mod chats;
pub mod users;
