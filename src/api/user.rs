//! User administration API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::{CreateUserInput, SetGlobalRolesInput, UpdateUserInput};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::policy::{self, Permission};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// List users (platform-level visibility)
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    policy::authorize(&state, &auth, Some(Permission::UserList)).await?;

    let (users, total) = state
        .user_service
        .list(pagination.page, pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        users,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get user by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    policy::authorize(&state, &auth, Some(Permission::UserList)).await?;

    let user = state.user_service.get(id).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Create user
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateUserInput>,
) -> Result<impl IntoResponse> {
    policy::authorize(&state, &auth, Some(Permission::UserManage)).await?;

    let user = state.user_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(user))))
}

/// Update user
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> Result<impl IntoResponse> {
    policy::authorize(&state, &auth, Some(Permission::UserManage)).await?;

    let user = state.user_service.update(id, input).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Delete user
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    policy::authorize(&state, &auth, Some(Permission::UserManage)).await?;

    state.user_service.delete(id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Replace a user's global role set
pub async fn set_global_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<SetGlobalRolesInput>,
) -> Result<impl IntoResponse> {
    policy::authorize(&state, &auth, Some(Permission::UserManage)).await?;

    let roles = state
        .user_service
        .set_global_roles(id, input.global_roles)
        .await?;
    Ok(Json(SuccessResponse::new(roles)))
}
