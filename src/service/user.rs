//! User business logic

use crate::domain::{CreateUserInput, GlobalRole, UpdateUserInput, User};
use crate::error::{AppError, Result};
use crate::repository::UserRepository;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct UserService<U: UserRepository> {
    repo: Arc<U>,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: Arc<U>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateUserInput) -> Result<User> {
        input.validate()?;

        if self.repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "User with email '{}' already exists",
                input.email
            )));
        }

        self.repo.create(&input).await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<User>, i64)> {
        let offset = (page - 1) * per_page;
        let users = self.repo.list(offset, per_page).await?;
        let total = self.repo.count().await?;
        Ok((users, total))
    }

    pub async fn update(&self, id: Uuid, input: UpdateUserInput) -> Result<User> {
        input.validate()?;
        let _ = self.get(id).await?;
        self.repo.update(id, &input).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let _ = self.get(id).await?;
        self.repo.delete(id).await
    }

    pub async fn global_roles(&self, id: Uuid) -> Result<Vec<GlobalRole>> {
        let _ = self.get(id).await?;
        self.repo.find_global_roles(id).await
    }

    pub async fn set_global_roles(&self, id: Uuid, roles: Vec<GlobalRole>) -> Result<Vec<GlobalRole>> {
        let _ = self.get(id).await?;

        let mut deduped = roles;
        deduped.sort_by_key(|role| role.to_string());
        deduped.dedup();

        self.repo.set_global_roles(id, &deduped).await?;
        Ok(deduped)
    }
}
