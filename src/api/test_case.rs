//! Test case API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::{CreateTestCaseInput, UpdateTestCaseInput};
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

/// Create a test case in a suite
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(suite_id): Path<Uuid>,
    Json(input): Json<CreateTestCaseInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let suite = state
        .test_suite_service
        .get_scoped(suite_id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*suite.project_id),
        Permission::TestCaseManage,
    )
    .await?;

    let case = state.test_case_service.create(suite_id, input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(case))))
}

/// List a suite's test cases
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(suite_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let suite = state
        .test_suite_service
        .get_scoped(suite_id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*suite.project_id),
        Permission::TestCaseRead,
    )
    .await?;

    let (cases, total) = state
        .test_case_service
        .list(suite_id, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(
        cases,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get test case by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let case = state
        .test_case_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*case.project_id),
        Permission::TestCaseRead,
    )
    .await?;

    Ok(Json(SuccessResponse::new(case)))
}

/// Update test case
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTestCaseInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let case = state
        .test_case_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*case.project_id),
        Permission::TestCaseManage,
    )
    .await?;

    let case = state
        .test_case_service
        .update(id, auth.active_organization_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(case)))
}

/// Delete test case
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let case = state
        .test_case_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*case.project_id),
        Permission::TestCaseManage,
    )
    .await?;

    state
        .test_case_service
        .delete(id, auth.active_organization_id)
        .await?;
    Ok(Json(MessageResponse::new("Test case deleted successfully")))
}
