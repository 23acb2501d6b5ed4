//! Bug API handlers

use crate::api::{MessageResponse, PaginatedResponse, SuccessResponse};
use crate::domain::{BugStatus, CreateBugInput, UpdateBugInput};
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
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct BugListQuery {
    pub status: Option<BugStatus>,
    #[serde(
        default = "crate::api::default_page",
        deserialize_with = "crate::api::deserialize_page"
    )]
    pub page: i64,
    #[serde(
        default = "crate::api::default_per_page",
        deserialize_with = "crate::api::deserialize_per_page",
        alias = "limit"
    )]
    pub per_page: i64,
}

/// Report a bug in a project
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateBugInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(project_id, auth.active_organization_id)
        .await?;

    policy::require(&state, &ctx.for_project(*project.id), Permission::BugCreate).await?;

    let bug = state
        .bug_service
        .create(project_id, auth.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(bug))))
}

/// List a project's bugs, optionally filtered by status
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(query): Query<BugListQuery>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(project_id, auth.active_organization_id)
        .await?;

    policy::require(&state, &ctx.for_project(*project.id), Permission::BugRead).await?;

    let (bugs, total) = state
        .bug_service
        .list(project_id, query.status, query.page, query.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(
        bugs,
        query.page,
        query.per_page,
        total,
    )))
}

/// Get bug by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let bug = state
        .bug_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(&state, &ctx.for_project(*bug.project_id), Permission::BugRead).await?;

    Ok(Json(SuccessResponse::new(bug)))
}

/// Update bug
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBugInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let bug = state
        .bug_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(&state, &ctx.for_project(*bug.project_id), Permission::BugUpdate).await?;

    let bug = state
        .bug_service
        .update(id, auth.active_organization_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(bug)))
}

/// Delete bug
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let bug = state
        .bug_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(&state, &ctx.for_project(*bug.project_id), Permission::BugDelete).await?;

    state
        .bug_service
        .delete(id, auth.active_organization_id)
        .await?;
    Ok(Json(MessageResponse::new("Bug deleted successfully")))
}
