//! Organization repository

use crate::domain::{
    CreateOrganizationInput, Organization, OrganizationMember, OrgRole, UpdateOrganizationInput,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(&self, input: &CreateOrganizationInput) -> Result<Organization>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>>;
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Organization>>;
    async fn count(&self) -> Result<i64>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Organization>>;
    async fn update(&self, id: Uuid, input: &UpdateOrganizationInput) -> Result<Organization>;
    async fn delete(&self, id: Uuid) -> Result<()>;

    // Memberships
    async fn add_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<OrganizationMember>;
    async fn find_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationMember>>;
    async fn list_members(
        &self,
        organization_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<OrganizationMember>>;
    async fn count_members(&self, organization_id: Uuid) -> Result<i64>;
    async fn count_owners(&self, organization_id: Uuid) -> Result<i64>;
    /// Change a member's role. Runs the owner count and the update in one
    /// transaction so concurrent demotions cannot drop the last owner.
    async fn update_member_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<OrganizationMember>;
    /// Remove a membership, with the same transactional owner protection.
    async fn remove_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<()>;
}

const MEMBER_COLUMNS: &str = "id, organization_id, user_id, role, joined_at";

pub struct OrganizationRepositoryImpl {
    pool: MySqlPool,
}

impl OrganizationRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for OrganizationRepositoryImpl {
    async fn create(&self, input: &CreateOrganizationInput) -> Result<Organization> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, slug, created_at, updated_at)
            VALUES (?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id.to_string())
        .bind(&input.name)
        .bind(&input.slug)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create organization")))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>> {
        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, name, slug, created_at, updated_at FROM organizations WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, name, slug, created_at, updated_at FROM organizations WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Organization>> {
        let organizations = sqlx::query_as::<_, Organization>(
            "SELECT id, name, slug, created_at, updated_at FROM organizations \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(organizations)
    }

    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM organizations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Organization>> {
        let organizations = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.id, o.name, o.slug, o.created_at, o.updated_at
            FROM organizations o
            INNER JOIN organization_members om ON o.id = om.organization_id
            WHERE om.user_id = ?
            ORDER BY om.joined_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(organizations)
    }

    async fn update(&self, id: Uuid, input: &UpdateOrganizationInput) -> Result<Organization> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organization {} not found", id)))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);

        sqlx::query("UPDATE organizations SET name = ?, updated_at = NOW() WHERE id = ?")
            .bind(name)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update organization")))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM organization_members WHERE organization_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Organization {} not found", id)));
        }

        Ok(())
    }

    async fn add_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<OrganizationMember> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO organization_members (id, organization_id, user_id, role, joined_at)
            VALUES (?, ?, ?, ?, NOW())
            "#,
        )
        .bind(id.to_string())
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .bind(role)
        .execute(&self.pool)
        .await?;

        let member = sqlx::query_as::<_, OrganizationMember>(&format!(
            "SELECT {} FROM organization_members WHERE id = ?",
            MEMBER_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    async fn find_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationMember>> {
        let member = sqlx::query_as::<_, OrganizationMember>(&format!(
            "SELECT {} FROM organization_members WHERE organization_id = ? AND user_id = ?",
            MEMBER_COLUMNS
        ))
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn list_members(
        &self,
        organization_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<OrganizationMember>> {
        let members = sqlx::query_as::<_, OrganizationMember>(&format!(
            "SELECT {} FROM organization_members WHERE organization_id = ? \
             ORDER BY joined_at ASC LIMIT ? OFFSET ?",
            MEMBER_COLUMNS
        ))
        .bind(organization_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn count_members(&self, organization_id: Uuid) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM organization_members WHERE organization_id = ?")
                .bind(organization_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn count_owners(&self, organization_id: Uuid) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM organization_members \
             WHERE organization_id = ? AND role = 'owner'",
        )
        .bind(organization_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn update_member_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<OrganizationMember> {
        let mut tx = self.pool.begin().await?;

        let member = sqlx::query_as::<_, OrganizationMember>(&format!(
            "SELECT {} FROM organization_members \
             WHERE organization_id = ? AND user_id = ? FOR UPDATE",
            MEMBER_COLUMNS
        ))
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Membership not found".to_string()))?;

        if member.role == OrgRole::Owner && role != OrgRole::Owner {
            let (owners,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM organization_members \
                 WHERE organization_id = ? AND role = 'owner' FOR UPDATE",
            )
            .bind(organization_id.to_string())
            .fetch_one(&mut *tx)
            .await?;

            if owners <= 1 {
                return Err(AppError::Validation(
                    "Organization must retain at least one owner".to_string(),
                ));
            }
        }

        sqlx::query("UPDATE organization_members SET role = ? WHERE id = ?")
            .bind(role)
            .bind(member.id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let updated = sqlx::query_as::<_, OrganizationMember>(&format!(
            "SELECT {} FROM organization_members WHERE id = ?",
            MEMBER_COLUMNS
        ))
        .bind(member.id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn remove_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let member = sqlx::query_as::<_, OrganizationMember>(&format!(
            "SELECT {} FROM organization_members \
             WHERE organization_id = ? AND user_id = ? FOR UPDATE",
            MEMBER_COLUMNS
        ))
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Membership not found".to_string()))?;

        if member.role == OrgRole::Owner {
            let (owners,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM organization_members \
                 WHERE organization_id = ? AND role = 'owner' FOR UPDATE",
            )
            .bind(organization_id.to_string())
            .fetch_one(&mut *tx)
            .await?;

            if owners <= 1 {
                return Err(AppError::Validation(
                    "Organization must retain at least one owner".to_string(),
                ));
            }
        }

        sqlx::query("DELETE FROM organization_members WHERE id = ?")
            .bind(member.id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
