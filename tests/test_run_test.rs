//! Test run integration tests: item seeding and metrics aggregation.

use testdeck_core::domain::{
    CreateOrganizationInput, CreateProjectInput, CreateTestCaseInput, CreateTestRunInput,
    CreateTestSuiteInput, CreateUserInput, RunItemStatus, RunStatus, UpdateRunItemInput,
};
use testdeck_core::server::AppState;
use uuid::Uuid;

mod common;

async fn seed_project_with_cases(state: &AppState, case_count: usize) -> (Uuid, Uuid) {
    let user = state
        .user_service
        .create(CreateUserInput {
            email: format!("runner-{}@example.com", Uuid::new_v4()),
            display_name: None,
        })
        .await
        .unwrap();

    let organization = state
        .organization_service
        .create(
            *user.id,
            CreateOrganizationInput {
                name: "Run Org".to_string(),
                slug: format!("run-{}", Uuid::new_v4()),
            },
        )
        .await
        .unwrap();

    let project = state
        .project_service
        .create(
            *organization.id,
            *user.id,
            CreateProjectInput {
                name: "Runner".to_string(),
                slug: format!("runner-{}", Uuid::new_v4()),
                description: None,
            },
        )
        .await
        .unwrap();

    let suite = state
        .test_suite_service
        .create(
            *project.id,
            CreateTestSuiteInput {
                name: "Smoke".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

    for i in 0..case_count {
        state
            .test_case_service
            .create(
                *suite.id,
                CreateTestCaseInput {
                    title: format!("Case {}", i),
                    steps: vec![],
                    priority: Default::default(),
                },
            )
            .await
            .unwrap();
    }

    (*project.id, *user.id)
}

#[tokio::test]
async fn test_run_seeds_items_and_aggregates_metrics() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };

    common::setup_database(&pool).await.unwrap();
    common::cleanup_database(&pool).await.unwrap();

    let state = AppState::new(common::test_config(), pool.clone());
    let (project_id, user_id) = seed_project_with_cases(&state, 3).await;

    // Empty selection: every case in the project becomes a run item.
    let run = state
        .test_run_service
        .create(
            project_id,
            user_id,
            CreateTestRunInput {
                name: "Nightly".to_string(),
                plan_id: None,
                case_ids: vec![],
            },
        )
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Pending);

    let items = state.test_run_service.list_items(*run.id).await.unwrap();
    assert_eq!(items.len(), 3);
    assert!(items
        .iter()
        .all(|item| item.status == RunItemStatus::Untested));

    // Record results: one pass, one fail.
    state
        .test_run_service
        .update_item(
            *items[0].id,
            None,
            UpdateRunItemInput {
                status: Some(RunItemStatus::Passed),
                assignee_id: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    state
        .test_run_service
        .update_item(
            *items[1].id,
            None,
            UpdateRunItemInput {
                status: Some(RunItemStatus::Failed),
                assignee_id: None,
                notes: Some("timeout on step 2".to_string()),
            },
        )
        .await
        .unwrap();

    // First result flipped the run into progress.
    let run = state.test_run_service.get_scoped(*run.id, None).await.unwrap();
    assert_eq!(run.status, RunStatus::InProgress);

    let metrics = state.test_run_service.metrics(*run.id).await.unwrap();
    assert_eq!(metrics.total, 3);
    assert_eq!(metrics.passed, 1);
    assert_eq!(metrics.failed, 1);
    assert_eq!(metrics.untested, 1);

    // Refresh persists the snapshot and returns the same numbers.
    let refreshed = state
        .test_run_service
        .refresh_metrics(*run.id)
        .await
        .unwrap();
    assert_eq!(refreshed, metrics);

    common::cleanup_database(&pool).await.unwrap();
}

#[tokio::test]
async fn test_closed_run_freezes_items() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };

    common::setup_database(&pool).await.unwrap();
    common::cleanup_database(&pool).await.unwrap();

    let state = AppState::new(common::test_config(), pool.clone());
    let (project_id, user_id) = seed_project_with_cases(&state, 1).await;

    let run = state
        .test_run_service
        .create(
            project_id,
            user_id,
            CreateTestRunInput {
                name: "Short run".to_string(),
                plan_id: None,
                case_ids: vec![],
            },
        )
        .await
        .unwrap();

    let closed = state.test_run_service.close(*run.id, None).await.unwrap();
    assert_eq!(closed.status, RunStatus::Completed);
    assert!(closed.completed_at.is_some());

    let items = state.test_run_service.list_items(*run.id).await.unwrap();
    let frozen = state
        .test_run_service
        .update_item(
            *items[0].id,
            None,
            UpdateRunItemInput {
                status: Some(RunItemStatus::Passed),
                assignee_id: None,
                notes: None,
            },
        )
        .await;
    assert!(frozen.is_err());

    common::cleanup_database(&pool).await.unwrap();
}
