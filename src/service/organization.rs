//! Organization business logic

use crate::domain::{
    CreateOrganizationInput, Organization, OrganizationMember, OrgRole, UpdateOrganizationInput,
};
use crate::error::{AppError, Result};
use crate::policy::guards;
use crate::repository::OrganizationRepository;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct OrganizationService<O: OrganizationRepository> {
    repo: Arc<O>,
}

impl<O: OrganizationRepository> OrganizationService<O> {
    pub fn new(repo: Arc<O>) -> Self {
        Self { repo }
    }

    /// Create an organization; the creator becomes its first owner.
    pub async fn create(
        &self,
        creator_id: Uuid,
        input: CreateOrganizationInput,
    ) -> Result<Organization> {
        input.validate()?;

        if self.repo.find_by_slug(&input.slug).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Organization slug '{}' is already taken",
                input.slug
            )));
        }

        let organization = self.repo.create(&input).await?;
        self.repo
            .add_member(*organization.id, creator_id, OrgRole::Owner)
            .await?;

        Ok(organization)
    }

    pub async fn get(&self, id: Uuid) -> Result<Organization> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organization {} not found", id)))
    }

    pub async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Organization>, i64)> {
        let offset = (page - 1) * per_page;
        let organizations = self.repo.list(offset, per_page).await?;
        let total = self.repo.count().await?;
        Ok((organizations, total))
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Organization>> {
        self.repo.list_for_user(user_id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateOrganizationInput,
    ) -> Result<Organization> {
        input.validate()?;
        let _ = self.get(id).await?;
        self.repo.update(id, &input).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let _ = self.get(id).await?;
        self.repo.delete(id).await
    }

    // ==================== Memberships ====================

    pub async fn list_members(
        &self,
        organization_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<OrganizationMember>, i64)> {
        let offset = (page - 1) * per_page;
        let members = self
            .repo
            .list_members(organization_id, offset, per_page)
            .await?;
        let total = self.repo.count_members(organization_id).await?;
        Ok((members, total))
    }

    pub async fn add_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<OrganizationMember> {
        let _ = self.get(organization_id).await?;

        if self
            .repo
            .find_member(organization_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User is already a member of this organization".to_string(),
            ));
        }

        self.repo.add_member(organization_id, user_id, role).await
    }

    /// Change a member's role. Demoting the last owner is rejected.
    pub async fn change_member_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<OrganizationMember> {
        let member = self
            .repo
            .find_member(organization_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership not found".to_string()))?;

        guards::ensure_owner_retained(&*self.repo, &member, Some(role)).await?;

        self.repo
            .update_member_role(organization_id, user_id, role)
            .await
    }

    /// Remove a member. Removing the last owner is rejected.
    pub async fn remove_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<()> {
        let member = self
            .repo
            .find_member(organization_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership not found".to_string()))?;

        guards::ensure_owner_retained(&*self.repo, &member, None).await?;

        self.repo.remove_member(organization_id, user_id).await
    }

    /// Resolve the membership pair used when switching the active
    /// organization; non-members are rejected.
    pub async fn membership_for_switch(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrganizationMember> {
        let _ = self.get(organization_id).await?;

        self.repo
            .find_member(organization_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("You are not a member of this organization".to_string())
            })
    }
}
