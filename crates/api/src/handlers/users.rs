//! Handlers for the `/users` resource.

use axum::extract::{Query, State};
use axum::Json;
use axum_extra::extract::WithRejection;
use parley_core::error::CoreError;
use parley_db::models::user::UserProfile;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<UserProfile>>> {
    let found = state
        .users
        .find_by_id(user.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        })?;

    Ok(Json(DataResponse {
        data: UserProfile::from(&found),
    }))
}

/// GET /api/users?page=&limit=
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    WithRejection(Query(params), _): WithRejection<Query<PaginationParams>, AppError>,
) -> AppResult<Json<DataResponse<Vec<UserProfile>>>> {
    let page = params.resolve()?;
    let users = state.users.list(page).await?;

    Ok(Json(DataResponse {
        data: users.iter().map(UserProfile::from).collect(),
    }))
}
