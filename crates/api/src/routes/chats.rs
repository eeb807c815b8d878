//! Route definitions for the `/chats` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::chats;
use crate::state::AppState;

/// Routes mounted at `/chats`.
///
/// ```text
/// POST   /                  -> create
/// GET    /                  -> list
/// GET    /find              -> find
/// POST   /join/{chat_id}    -> join
/// DELETE /leave/{chat_id}   -> leave
/// DELETE /{chat_id}         -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(chats::create).get(chats::list))
        .route("/find", get(chats::find))
        .route("/join/{chat_id}", post(chats::join))
        .route("/leave/{chat_id}", delete(chats::leave))
        .route("/{chat_id}", delete(chats::delete))
}
