//! Organization API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::{
    AddMemberInput, CreateOrganizationInput, UpdateMemberRoleInput, UpdateOrganizationInput,
};
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

/// Create organization; the caller becomes its first owner.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateOrganizationInput>,
) -> Result<impl IntoResponse> {
    // Any authenticated user may open an organization.
    let ctx = policy::authorize(&state, &auth, None).await?;

    let organization = state
        .organization_service
        .create(ctx.user_id, input)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(organization)),
    ))
}

/// List organizations: platform roles see all, everyone else their own.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;

    if policy::can(&state, &ctx, Permission::OrganizationListAll).await? {
        let (organizations, total) = state
            .organization_service
            .list(pagination.page, pagination.per_page)
            .await?;
        return Ok(Json(PaginatedResponse::new(
            organizations,
            pagination.page,
            pagination.per_page,
            total,
        )));
    }

    let organizations = state
        .organization_service
        .list_for_user(ctx.user_id)
        .await?;
    let total = organizations.len() as i64;
    Ok(Json(PaginatedResponse::new(
        organizations,
        1,
        total.max(1),
        total,
    )))
}

/// Get organization by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?.for_organization(id);
    policy::require(&state, &ctx, Permission::OrganizationRead).await?;

    let organization = state.organization_service.get(id).await?;
    Ok(Json(SuccessResponse::new(organization)))
}

/// Update organization
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateOrganizationInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?.for_organization(id);
    policy::require(&state, &ctx, Permission::OrganizationUpdate).await?;

    let organization = state.organization_service.update(id, input).await?;
    Ok(Json(SuccessResponse::new(organization)))
}

/// Delete organization (owner only)
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?.for_organization(id);
    policy::require(&state, &ctx, Permission::OrganizationDelete).await?;

    state.organization_service.delete(id).await?;
    Ok(Json(MessageResponse::new(
        "Organization deleted successfully",
    )))
}

/// List organization members
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?.for_organization(id);
    policy::require(&state, &ctx, Permission::OrganizationMemberRead).await?;

    let (members, total) = state
        .organization_service
        .list_members(id, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(
        members,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Add a member to the organization
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<AddMemberInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?.for_organization(id);
    policy::require(&state, &ctx, Permission::OrganizationMemberManage).await?;

    let member = state
        .organization_service
        .add_member(id, input.user_id, input.role)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(member))))
}

/// Change a member's role; demoting the last owner is rejected.
pub async fn update_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateMemberRoleInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?.for_organization(id);
    policy::require(&state, &ctx, Permission::OrganizationMemberManage).await?;

    let member = state
        .organization_service
        .change_member_role(id, user_id, input.role)
        .await?;
    Ok(Json(SuccessResponse::new(member)))
}

/// Remove a member; removing the last owner is rejected.
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?.for_organization(id);
    policy::require(&state, &ctx, Permission::OrganizationMemberManage).await?;

    state
        .organization_service
        .remove_member(id, user_id)
        .await?;
    Ok(Json(MessageResponse::new("Member removed successfully")))
}
