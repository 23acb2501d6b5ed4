//! Project API handlers

use crate::api::{MessageResponse, SuccessResponse};
use crate::domain::{
    CreateProjectInput, OrgRole, UpdateProjectInput, UpsertProjectMemberInput,
};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::policy::{self, resolver, Permission};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Create a project inside an organization
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(organization_id): Path<Uuid>,
    Json(input): Json<CreateProjectInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None)
        .await?
        .for_organization(organization_id);
    policy::require(&state, &ctx, Permission::ProjectCreate).await?;

    let project = state
        .project_service
        .create(organization_id, ctx.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(project))))
}

/// List the organization's projects. Organization admins and platform read
/// roles see every project; plain members only those they belong to.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(organization_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None)
        .await?
        .for_organization(organization_id);
    policy::require(&state, &ctx, Permission::OrganizationRead).await?;

    let sees_all = if policy::can(&state, &ctx, Permission::OrganizationListAll).await? {
        true
    } else {
        let role = match ctx.organization_role {
            Some(role) => Some(role),
            None => {
                resolver::resolve_organization_role(&state, ctx.user_id, organization_id).await?
            }
        };
        role.is_some_and(|role| role.at_least(OrgRole::Admin))
    };

    let projects = if sees_all {
        state
            .project_service
            .list_all_in_organization(organization_id)
            .await?
    } else {
        state
            .project_service
            .list_for_member(organization_id, ctx.user_id)
            .await?
    };

    Ok(Json(SuccessResponse::new(projects)))
}

/// Get project by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::ProjectRead,
    )
    .await?;

    Ok(Json(SuccessResponse::new(project)))
}

/// Update project
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProjectInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::ProjectUpdate,
    )
    .await?;

    let project = state
        .project_service
        .update(id, auth.active_organization_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(project)))
}

/// Delete project
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::ProjectDelete,
    )
    .await?;

    state
        .project_service
        .delete(id, auth.active_organization_id)
        .await?;
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

/// List project members
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::ProjectRead,
    )
    .await?;

    let members = state.project_service.list_members(id).await?;
    Ok(Json(SuccessResponse::new(members)))
}

/// Add or update a project member
pub async fn upsert_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpsertProjectMemberInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::ProjectMemberManage,
    )
    .await?;

    let member = state
        .project_service
        .upsert_member(id, input.user_id, input.role)
        .await?;
    Ok(Json(SuccessResponse::new(member)))
}

/// Remove a project member
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::ProjectMemberManage,
    )
    .await?;

    state.project_service.remove_member(id, user_id).await?;
    Ok(Json(MessageResponse::new("Member removed successfully")))
}
