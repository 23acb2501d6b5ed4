//! Session endpoints: current principal and active-organization switching

use crate::api::SuccessResponse;
use crate::domain::{GlobalRole, OrgRole};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::server::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session view of the authenticated principal
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub user_id: Uuid,
    pub email: String,
    pub global_roles: Vec<GlobalRole>,
    pub active_organization_id: Option<Uuid>,
    pub organization_role: Option<OrgRole>,
}

/// Current principal, as the session token describes it
pub async fn me(auth: AuthUser) -> impl IntoResponse {
    Json(SuccessResponse::new(SessionView {
        user_id: auth.user_id,
        email: auth.email,
        global_roles: auth.global_roles,
        active_organization_id: auth.active_organization_id,
        organization_role: auth.organization_role,
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchOrganizationInput {
    pub organization_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchOrganizationResponse {
    pub active_organization_id: Uuid,
    pub organization_role: OrgRole,
    /// Re-signed session token carrying the new active organization
    pub token: String,
}

/// Switch the active organization. Membership is validated; the response
/// carries the pair the client persists into its session.
pub async fn switch_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SwitchOrganizationInput>,
) -> Result<impl IntoResponse> {
    let membership = state
        .organization_service
        .membership_for_switch(input.organization_id, auth.user_id)
        .await?;

    let token = state.token_manager.create_session_token(
        auth.user_id,
        &auth.email,
        &auth.global_roles,
        Some((input.organization_id, membership.role)),
    )?;

    Ok(Json(SuccessResponse::new(SwitchOrganizationResponse {
        active_organization_id: input.organization_id,
        organization_role: membership.role,
        token,
    })))
}
