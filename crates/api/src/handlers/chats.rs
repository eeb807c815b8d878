//! Handlers for the `/chats` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use parley_core::error::CoreError;
use parley_core::types::DbId;
use parley_core::validation::{validate_chat_description, validate_chat_title};
use parley_db::models::chat::{Chat, CreateChat};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::{ChatSearchParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /chats`.
#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    /// `false` when the caller was already a member.
    pub joined: bool,
}

/// Load a chat or fail with 404.
async fn ensure_chat(state: &AppState, chat_id: DbId) -> AppResult<Chat> {
    state
        .chats
        .find_by_id(chat_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Chat",
                id: chat_id,
            })
        })
}

/// POST /api/chats
///
/// The caller becomes the chat's admin and first member.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(input), _): WithRejection<Json<CreateChatRequest>, AppError>,
) -> AppResult<(StatusCode, Json<DataResponse<Chat>>)> {
    validate_chat_title(&input.title)?;
    if let Some(description) = &input.description {
        validate_chat_description(description)?;
    }

    let chat = state
        .chats
        .create(&CreateChat {
            title: input.title,
            description: input.description,
            admin_id: user.user_id,
        })
        .await?;

    tracing::info!(chat_id = chat.id, user_id = user.user_id, "Chat created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: chat })))
}

/// GET /api/chats?page=&limit=
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    WithRejection(Query(params), _): WithRejection<Query<PaginationParams>, AppError>,
) -> AppResult<Json<DataResponse<Vec<Chat>>>> {
    let page = params.resolve()?;
    let chats = state.chats.list(page).await?;
    Ok(Json(DataResponse { data: chats }))
}

/// GET /api/chats/find?q=&page=&limit=
///
/// Case-insensitive substring match on the title.
pub async fn find(
    State(state): State<AppState>,
    _user: AuthUser,
    WithRejection(Query(params), _): WithRejection<Query<ChatSearchParams>, AppError>,
) -> AppResult<Json<DataResponse<Vec<Chat>>>> {
    let page = params.resolve_page()?;
    let term = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Core(CoreError::Validation("q must not be empty".into())))?;

    let chats = state.chats.search_by_title(term, page).await?;
    Ok(Json(DataResponse { data: chats }))
}

/// POST /api/chats/join/{chat_id}
pub async fn join(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(chat_id), _): WithRejection<Path<DbId>, AppError>,
) -> AppResult<Json<DataResponse<JoinResponse>>> {
    ensure_chat(&state, chat_id).await?;
    let joined = state.chats.add_member(chat_id, user.user_id).await?;

    tracing::info!(chat_id, user_id = user.user_id, joined, "Chat join");

    Ok(Json(DataResponse {
        data: JoinResponse { joined },
    }))
}

/// DELETE /api/chats/leave/{chat_id}
pub async fn leave(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(chat_id), _): WithRejection<Path<DbId>, AppError>,
) -> AppResult<StatusCode> {
    ensure_chat(&state, chat_id).await?;
    if !state.chats.remove_member(chat_id, user.user_id).await? {
        return Err(AppError::BadRequest(
            "You are not a member of this chat".into(),
        ));
    }

    tracing::info!(chat_id, user_id = user.user_id, "Chat left");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/chats/{chat_id}
///
/// Only the chat's admin may delete it.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(chat_id), _): WithRejection<Path<DbId>, AppError>,
) -> AppResult<StatusCode> {
    let chat = ensure_chat(&state, chat_id).await?;
    if chat.admin_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the chat admin can delete this chat".into(),
        )));
    }

    if state.chats.delete(chat_id).await? {
        tracing::info!(chat_id, user_id = user.user_id, "Chat deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Chat",
            id: chat_id,
        }))
    }
}
