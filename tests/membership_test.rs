//! Organization membership integration tests
//!
//! Exercises the last-owner invariant against real rows.

use testdeck_core::domain::{CreateOrganizationInput, CreateUserInput, OrgRole};
use testdeck_core::error::AppError;
use testdeck_core::repository::organization::OrganizationRepositoryImpl;
use testdeck_core::repository::user::UserRepositoryImpl;
use testdeck_core::repository::{OrganizationRepository, UserRepository};
use testdeck_core::service::OrganizationService;
use std::sync::Arc;
use uuid::Uuid;

mod common;

async fn create_user(pool: &sqlx::MySqlPool, tag: &str) -> testdeck_core::domain::User {
    let repo = UserRepositoryImpl::new(pool.clone());
    repo.create(&CreateUserInput {
        email: format!("{}-{}@example.com", tag, Uuid::new_v4()),
        display_name: Some(tag.to_string()),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_creator_becomes_owner() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };

    common::setup_database(&pool).await.unwrap();
    common::cleanup_database(&pool).await.unwrap();

    let user = create_user(&pool, "founder").await;
    let repo = Arc::new(OrganizationRepositoryImpl::new(pool.clone()));
    let service = OrganizationService::new(repo.clone());

    let organization = service
        .create(
            *user.id,
            CreateOrganizationInput {
                name: "Acme QA".to_string(),
                slug: format!("acme-{}", Uuid::new_v4()),
            },
        )
        .await
        .unwrap();

    let member = repo
        .find_member(*organization.id, *user.id)
        .await
        .unwrap()
        .expect("creator membership missing");
    assert_eq!(member.role, OrgRole::Owner);
    assert_eq!(repo.count_owners(*organization.id).await.unwrap(), 1);

    common::cleanup_database(&pool).await.unwrap();
}

#[tokio::test]
async fn test_sole_owner_cannot_be_demoted_or_removed() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };

    common::setup_database(&pool).await.unwrap();
    common::cleanup_database(&pool).await.unwrap();

    let owner = create_user(&pool, "owner").await;
    let repo = Arc::new(OrganizationRepositoryImpl::new(pool.clone()));
    let service = OrganizationService::new(repo.clone());

    let organization = service
        .create(
            *owner.id,
            CreateOrganizationInput {
                name: "Solo Org".to_string(),
                slug: format!("solo-{}", Uuid::new_v4()),
            },
        )
        .await
        .unwrap();

    let demote = service
        .change_member_role(*organization.id, *owner.id, OrgRole::Admin)
        .await;
    assert!(matches!(demote, Err(AppError::Validation(_))));

    let remove = service.remove_member(*organization.id, *owner.id).await;
    assert!(matches!(remove, Err(AppError::Validation(_))));

    // The row is untouched
    let member = repo
        .find_member(*organization.id, *owner.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.role, OrgRole::Owner);

    common::cleanup_database(&pool).await.unwrap();
}

#[tokio::test]
async fn test_owner_demotion_succeeds_with_second_owner() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };

    common::setup_database(&pool).await.unwrap();
    common::cleanup_database(&pool).await.unwrap();

    let first = create_user(&pool, "first-owner").await;
    let second = create_user(&pool, "second-owner").await;
    let repo = Arc::new(OrganizationRepositoryImpl::new(pool.clone()));
    let service = OrganizationService::new(repo.clone());

    let organization = service
        .create(
            *first.id,
            CreateOrganizationInput {
                name: "Paired Org".to_string(),
                slug: format!("paired-{}", Uuid::new_v4()),
            },
        )
        .await
        .unwrap();

    service
        .add_member(*organization.id, *second.id, OrgRole::Owner)
        .await
        .unwrap();
    assert_eq!(repo.count_owners(*organization.id).await.unwrap(), 2);

    let demoted = service
        .change_member_role(*organization.id, *first.id, OrgRole::Member)
        .await
        .unwrap();
    assert_eq!(demoted.role, OrgRole::Member);

    // The invariant re-evaluates: the remaining owner is now protected.
    let remove_last = service.remove_member(*organization.id, *second.id).await;
    assert!(matches!(remove_last, Err(AppError::Validation(_))));

    common::cleanup_database(&pool).await.unwrap();
}

#[tokio::test]
async fn test_member_roles_round_trip_through_storage() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };

    common::setup_database(&pool).await.unwrap();
    common::cleanup_database(&pool).await.unwrap();

    let owner = create_user(&pool, "owner").await;
    let billing = create_user(&pool, "billing").await;
    let repo = Arc::new(OrganizationRepositoryImpl::new(pool.clone()));
    let service = OrganizationService::new(repo.clone());

    let organization = service
        .create(
            *owner.id,
            CreateOrganizationInput {
                name: "Billing Org".to_string(),
                slug: format!("billing-{}", Uuid::new_v4()),
            },
        )
        .await
        .unwrap();

    service
        .add_member(*organization.id, *billing.id, OrgRole::Billing)
        .await
        .unwrap();

    let member = repo
        .find_member(*organization.id, *billing.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.role, OrgRole::Billing);

    let (members, total) = service.list_members(*organization.id, 1, 20).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(members.len(), 2);

    common::cleanup_database(&pool).await.unwrap();
}
