//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::TokenManager;
use crate::repository::{
    bug::BugRepositoryImpl, organization::OrganizationRepositoryImpl,
    project::ProjectRepositoryImpl, test_case::TestCaseRepositoryImpl,
    test_plan::TestPlanRepositoryImpl, test_run::TestRunRepositoryImpl,
    test_suite::TestSuiteRepositoryImpl, user::UserRepositoryImpl,
};
use crate::service::{
    BugService, OrganizationService, ProjectService, TestCaseService, TestPlanService,
    TestRunService, TestSuiteService, UserService,
};
use crate::state::HasAuthz;
use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub token_manager: TokenManager,
    pub organization_repo: Arc<OrganizationRepositoryImpl>,
    pub project_repo: Arc<ProjectRepositoryImpl>,
    pub user_service: Arc<UserService<UserRepositoryImpl>>,
    pub organization_service: Arc<OrganizationService<OrganizationRepositoryImpl>>,
    pub project_service: Arc<ProjectService<ProjectRepositoryImpl>>,
    pub test_plan_service: Arc<TestPlanService<TestPlanRepositoryImpl, ProjectRepositoryImpl>>,
    pub test_suite_service: Arc<TestSuiteService<TestSuiteRepositoryImpl, ProjectRepositoryImpl>>,
    pub test_case_service: Arc<
        TestCaseService<TestCaseRepositoryImpl, TestSuiteRepositoryImpl, ProjectRepositoryImpl>,
    >,
    pub test_run_service:
        Arc<TestRunService<TestRunRepositoryImpl, TestCaseRepositoryImpl, ProjectRepositoryImpl>>,
    pub bug_service: Arc<BugService<BugRepositoryImpl, ProjectRepositoryImpl>>,
}

impl AppState {
    pub fn new(config: Config, db_pool: MySqlPool) -> Self {
        let token_manager = TokenManager::new(config.session.clone());

        let organization_repo = Arc::new(OrganizationRepositoryImpl::new(db_pool.clone()));
        let project_repo = Arc::new(ProjectRepositoryImpl::new(db_pool.clone()));
        let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
        let test_plan_repo = Arc::new(TestPlanRepositoryImpl::new(db_pool.clone()));
        let test_suite_repo = Arc::new(TestSuiteRepositoryImpl::new(db_pool.clone()));
        let test_case_repo = Arc::new(TestCaseRepositoryImpl::new(db_pool.clone()));
        let test_run_repo = Arc::new(TestRunRepositoryImpl::new(db_pool.clone()));
        let bug_repo = Arc::new(BugRepositoryImpl::new(db_pool.clone()));

        Self {
            config: Arc::new(config),
            db_pool,
            token_manager,
            organization_repo: organization_repo.clone(),
            project_repo: project_repo.clone(),
            user_service: Arc::new(UserService::new(user_repo)),
            organization_service: Arc::new(OrganizationService::new(organization_repo)),
            project_service: Arc::new(ProjectService::new(project_repo.clone())),
            test_plan_service: Arc::new(TestPlanService::new(
                test_plan_repo,
                project_repo.clone(),
            )),
            test_suite_service: Arc::new(TestSuiteService::new(
                test_suite_repo.clone(),
                project_repo.clone(),
            )),
            test_case_service: Arc::new(TestCaseService::new(
                test_case_repo.clone(),
                test_suite_repo,
                project_repo.clone(),
            )),
            test_run_service: Arc::new(TestRunService::new(
                test_run_repo,
                test_case_repo,
                project_repo.clone(),
            )),
            bug_service: Arc::new(BugService::new(bug_repo, project_repo)),
        }
    }
}

impl HasAuthz for AppState {
    type OrgRepo = OrganizationRepositoryImpl;
    type ProjectRepo = ProjectRepositoryImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }

    fn organization_repo(&self) -> &Self::OrgRepo {
        &self.organization_repo
    }

    fn project_repo(&self) -> &Self::ProjectRepo {
        &self.project_repo
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready))
        // Session
        .route("/api/v1/auth/me", get(api::auth::me))
        .route(
            "/api/v1/auth/switch-organization",
            post(api::auth::switch_organization),
        )
        // Users (platform administration)
        .route("/api/v1/users", get(api::user::list).post(api::user::create))
        .route(
            "/api/v1/users/{id}",
            get(api::user::get)
                .put(api::user::update)
                .delete(api::user::delete),
        )
        .route(
            "/api/v1/users/{id}/global-roles",
            put(api::user::set_global_roles),
        )
        // Organizations
        .route(
            "/api/v1/organizations",
            get(api::organization::list).post(api::organization::create),
        )
        .route(
            "/api/v1/organizations/{id}",
            get(api::organization::get)
                .put(api::organization::update)
                .delete(api::organization::delete),
        )
        .route(
            "/api/v1/organizations/{id}/members",
            get(api::organization::list_members).post(api::organization::add_member),
        )
        .route(
            "/api/v1/organizations/{id}/members/{user_id}",
            put(api::organization::update_member).delete(api::organization::remove_member),
        )
        // Projects
        .route(
            "/api/v1/organizations/{id}/projects",
            get(api::project::list).post(api::project::create),
        )
        .route(
            "/api/v1/projects/{id}",
            get(api::project::get)
                .put(api::project::update)
                .delete(api::project::delete),
        )
        .route(
            "/api/v1/projects/{id}/members",
            get(api::project::list_members).post(api::project::upsert_member),
        )
        .route(
            "/api/v1/projects/{id}/members/{user_id}",
            axum::routing::delete(api::project::remove_member),
        )
        // Test plans
        .route(
            "/api/v1/projects/{id}/test-plans",
            get(api::test_plan::list).post(api::test_plan::create),
        )
        .route(
            "/api/v1/test-plans/{id}",
            get(api::test_plan::get)
                .put(api::test_plan::update)
                .delete(api::test_plan::delete),
        )
        // Test suites
        .route(
            "/api/v1/projects/{id}/test-suites",
            get(api::test_suite::list).post(api::test_suite::create),
        )
        .route(
            "/api/v1/test-suites/{id}",
            get(api::test_suite::get)
                .put(api::test_suite::update)
                .delete(api::test_suite::delete),
        )
        // Test cases
        .route(
            "/api/v1/test-suites/{id}/test-cases",
            get(api::test_case::list).post(api::test_case::create),
        )
        .route(
            "/api/v1/test-cases/{id}",
            get(api::test_case::get)
                .put(api::test_case::update)
                .delete(api::test_case::delete),
        )
        // Test runs
        .route(
            "/api/v1/projects/{id}/test-runs",
            get(api::test_run::list).post(api::test_run::create),
        )
        .route(
            "/api/v1/test-runs/{id}",
            get(api::test_run::get)
                .put(api::test_run::update)
                .delete(api::test_run::delete),
        )
        .route("/api/v1/test-runs/{id}/close", post(api::test_run::close))
        .route("/api/v1/test-runs/{id}/items", get(api::test_run::list_items))
        .route("/api/v1/run-items/{id}", put(api::test_run::update_item))
        .route(
            "/api/v1/test-runs/{id}/metrics",
            get(api::test_run::metrics),
        )
        .route(
            "/api/v1/test-runs/{id}/metrics/refresh",
            post(api::test_run::refresh_metrics),
        )
        // Bugs
        .route(
            "/api/v1/projects/{id}/bugs",
            get(api::bug::list).post(api::bug::create),
        )
        .route(
            "/api/v1/bugs/{id}",
            get(api::bug::get).put(api::bug::update).delete(api::bug::delete),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Connect to the database and serve the API until shutdown.
pub async fn run(config: Config) -> Result<()> {
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    let addr = config.http_addr();
    let state = AppState::new(config, db_pool);
    let router = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
