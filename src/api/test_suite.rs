//! Test suite API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::{CreateTestSuiteInput, UpdateTestSuiteInput};
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

/// Create a test suite in a project
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateTestSuiteInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(project_id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::TestSuiteManage,
    )
    .await?;

    let suite = state.test_suite_service.create(project_id, input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(suite))))
}

/// List a project's test suites
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(project_id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::TestSuiteRead,
    )
    .await?;

    let (suites, total) = state
        .test_suite_service
        .list(project_id, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(
        suites,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get test suite by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let suite = state
        .test_suite_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*suite.project_id),
        Permission::TestSuiteRead,
    )
    .await?;

    Ok(Json(SuccessResponse::new(suite)))
}

/// Update test suite
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTestSuiteInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let suite = state
        .test_suite_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*suite.project_id),
        Permission::TestSuiteManage,
    )
    .await?;

    let suite = state
        .test_suite_service
        .update(id, auth.active_organization_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(suite)))
}

/// Delete test suite (its cases go with it)
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let suite = state
        .test_suite_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*suite.project_id),
        Permission::TestSuiteManage,
    )
    .await?;

    state
        .test_suite_service
        .delete(id, auth.active_organization_id)
        .await?;
    Ok(Json(MessageResponse::new("Test suite deleted successfully")))
}
