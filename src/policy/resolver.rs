//! Role resolver
//!
//! Answers "what role does this user hold at this scope" from membership
//! storage. `None` means no membership row exists; there is no implicit
//! default role. Storage failures propagate unchanged so callers never
//! mistake an outage for a denial.

use crate::domain::{OrgRole, ProjectRole};
use crate::error::Result;
use crate::repository::{OrganizationRepository, ProjectRepository};
use crate::state::HasAuthz;
use uuid::Uuid;

/// Effective organization role of a user, if any.
pub async fn resolve_organization_role<S: HasAuthz>(
    state: &S,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<Option<OrgRole>> {
    let member = state
        .organization_repo()
        .find_member(organization_id, user_id)
        .await?;
    Ok(member.map(|m| m.role))
}

/// Effective project role of a user, if any. Independent of any organization
/// role the same user holds.
pub async fn resolve_project_role<S: HasAuthz>(
    state: &S,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<Option<ProjectRole>> {
    let member = state.project_repo().find_member(project_id, user_id).await?;
    Ok(member.map(|m| m.role))
}
