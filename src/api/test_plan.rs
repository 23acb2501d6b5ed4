//! Test plan API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::{CreateTestPlanInput, UpdateTestPlanInput};
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

/// Create a test plan in a project
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateTestPlanInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(project_id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::TestPlanManage,
    )
    .await?;

    let plan = state
        .test_plan_service
        .create(project_id, auth.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(plan))))
}

/// List a project's test plans
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
        Permission::TestPlanRead,
    )
    .await?;

    let (plans, total) = state
        .test_plan_service
        .list(project_id, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(
        plans,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get test plan by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let plan = state
        .test_plan_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*plan.project_id),
        Permission::TestPlanRead,
    )
    .await?;

    Ok(Json(SuccessResponse::new(plan)))
}

/// Update test plan
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTestPlanInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let plan = state
        .test_plan_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*plan.project_id),
        Permission::TestPlanManage,
    )
    .await?;

    let plan = state
        .test_plan_service
        .update(id, auth.active_organization_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(plan)))
}

/// Delete test plan
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let plan = state
        .test_plan_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*plan.project_id),
        Permission::TestPlanManage,
    )
    .await?;

    state
        .test_plan_service
        .delete(id, auth.active_organization_id)
        .await?;
    Ok(Json(MessageResponse::new("Test plan deleted successfully")))
}
