//! Centralized authorization policy engine.
//!
//! The single authority answering "may this principal perform this permission
//! in this scope". Handlers call [`can`] for conditional logic and [`require`]
//! at mutation boundaries; both consult the permission registry and the role
//! resolver and never write anything.

pub mod guards;
pub mod registry;
pub mod resolver;

pub use registry::{ActionKind, Permission, PermissionSpec, ScopeRequirement};

use crate::domain::{GlobalRole, OrgRole};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::state::HasAuthz;
use uuid::Uuid;

/// Scope-resolved view of a principal for one policy check.
///
/// Built fresh per call and never cached beyond the request's principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzContext {
    pub user_id: Uuid,
    pub global_roles: Vec<GlobalRole>,
    pub organization_id: Option<Uuid>,
    pub organization_role: Option<OrgRole>,
    pub project_id: Option<Uuid>,
}

impl AuthzContext {
    pub fn new(user_id: Uuid, global_roles: Vec<GlobalRole>) -> Self {
        Self {
            user_id,
            global_roles,
            organization_id: None,
            organization_role: None,
            project_id: None,
        }
    }

    /// Narrow the context to an organization scope. The session-supplied role
    /// only describes the session's own organization; targeting a different
    /// one drops it so the role is resolved from storage.
    pub fn for_organization(mut self, organization_id: Uuid) -> Self {
        if self.organization_id != Some(organization_id) {
            self.organization_role = None;
        }
        self.organization_id = Some(organization_id);
        self
    }

    /// Narrow the context to a project scope.
    pub fn for_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn has_global(&self, role: GlobalRole) -> bool {
        self.global_roles.contains(&role)
    }

    fn has_read_only_global(&self) -> bool {
        self.global_roles.iter().any(|role| role.is_read_only())
    }
}

/// Non-throwing predicate: may the principal perform `permission`?
///
/// Infrastructure failures and missing scope fields surface as errors, never
/// as `Ok(false)`; a denial is always an explicit policy outcome.
pub async fn can<S: HasAuthz>(
    state: &S,
    ctx: &AuthzContext,
    permission: Permission,
) -> Result<bool> {
    // Super admin passes everything, before any scope is even looked at.
    if ctx.has_global(GlobalRole::SuperAdmin) {
        return Ok(true);
    }

    let spec = registry::spec(permission);

    // Read-only global roles veto every mutation, whatever the scoped roles say.
    if spec.kind == ActionKind::Mutate && ctx.has_read_only_global() {
        return Ok(false);
    }

    if ctx
        .global_roles
        .iter()
        .any(|role| spec.global_grants.contains(role))
    {
        return Ok(true);
    }

    match spec.scope {
        ScopeRequirement::Global => Ok(false),
        ScopeRequirement::Organization { min_role } => {
            let organization_id = ctx.organization_id.ok_or_else(|| {
                AppError::InvalidScope(format!(
                    "Permission {} requires an organization in the context",
                    spec.key
                ))
            })?;
            let role = match ctx.organization_role {
                Some(role) => Some(role),
                None => {
                    resolver::resolve_organization_role(state, ctx.user_id, organization_id)
                        .await?
                }
            };
            Ok(role.is_some_and(|role| role.at_least(min_role)))
        }
        ScopeRequirement::Project { min_role } => {
            let project_id = ctx.project_id.ok_or_else(|| {
                AppError::InvalidScope(format!(
                    "Permission {} requires a project in the context",
                    spec.key
                ))
            })?;

            // Project role is always re-resolved; a context-supplied
            // organization role says nothing about project membership.
            let role = resolver::resolve_project_role(state, ctx.user_id, project_id).await?;
            if role.is_some_and(|role| role.at_least(min_role)) {
                return Ok(true);
            }

            // Organization owners/admins get read-level visibility into every
            // project of their organization without a membership row. Writes
            // still require explicit project membership.
            if spec.kind == ActionKind::Read {
                if let Some(organization_id) = ctx.organization_id {
                    let org_role = match ctx.organization_role {
                        Some(role) => Some(role),
                        None => {
                            resolver::resolve_organization_role(
                                state,
                                ctx.user_id,
                                organization_id,
                            )
                            .await?
                        }
                    };
                    if org_role.is_some_and(|role| role.at_least(OrgRole::Admin)) {
                        return Ok(true);
                    }
                }
            }

            Ok(false)
        }
    }
}

/// Throwing variant of [`can`] for enforcement at mutation boundaries.
pub async fn require<S: HasAuthz>(
    state: &S,
    ctx: &AuthzContext,
    permission: Permission,
) -> Result<()> {
    if can(state, ctx, permission).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Missing permission: {}",
            permission.key()
        )))
    }
}

/// Request authorization adapter: build the authorization context for an
/// authenticated principal, optionally enforcing a coarse permission first.
///
/// `required: None` means the handler takes over and runs its own checks once
/// it knows the resource's project or organization.
pub async fn authorize<S: HasAuthz>(
    state: &S,
    auth: &AuthUser,
    required: Option<Permission>,
) -> Result<AuthzContext> {
    let ctx = auth.authz_context();
    if let Some(permission) = required {
        require(state, &ctx, permission).await?;
    }
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DatabaseConfig, SessionConfig};
    use crate::domain::{OrganizationMember, ProjectMember, ProjectRole, StringUuid};
    use crate::jwt::TokenManager;
    use crate::repository::organization::MockOrganizationRepository;
    use crate::repository::project::MockProjectRepository;
    use chrono::Utc;
    use std::sync::Arc;

    #[derive(Clone)]
    struct TestState {
        config: Arc<Config>,
        token_manager: TokenManager,
        organizations: Arc<MockOrganizationRepository>,
        projects: Arc<MockProjectRepository>,
    }

    impl TestState {
        fn new(
            organizations: MockOrganizationRepository,
            projects: MockProjectRepository,
        ) -> Self {
            let config = Config {
                environment: "test".to_string(),
                http_host: "127.0.0.1".to_string(),
                http_port: 0,
                database: DatabaseConfig {
                    url: "mysql://test".to_string(),
                    max_connections: 1,
                    min_connections: 1,
                    acquire_timeout_secs: 5,
                },
                session: SessionConfig {
                    secret: "policy-test-secret".to_string(),
                    issuer: "https://id.testdeck.test".to_string(),
                    token_ttl_secs: 3600,
                },
            };
            let token_manager = TokenManager::new(config.session.clone());
            Self {
                config: Arc::new(config),
                token_manager,
                organizations: Arc::new(organizations),
                projects: Arc::new(projects),
            }
        }
    }

    impl HasAuthz for TestState {
        type OrgRepo = MockOrganizationRepository;
        type ProjectRepo = MockProjectRepository;

        fn config(&self) -> &Config {
            &self.config
        }

        fn token_manager(&self) -> &TokenManager {
            &self.token_manager
        }

        fn organization_repo(&self) -> &Self::OrgRepo {
            &self.organizations
        }

        fn project_repo(&self) -> &Self::ProjectRepo {
            &self.projects
        }
    }

    fn org_member(organization_id: Uuid, user_id: Uuid, role: OrgRole) -> OrganizationMember {
        OrganizationMember {
            id: StringUuid::new_v4(),
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            role,
            joined_at: Utc::now(),
        }
    }

    fn project_member(project_id: Uuid, user_id: Uuid, role: ProjectRole) -> ProjectMember {
        ProjectMember {
            id: StringUuid::new_v4(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            role,
            added_at: Utc::now(),
        }
    }

    fn empty_state() -> TestState {
        TestState::new(
            MockOrganizationRepository::new(),
            MockProjectRepository::new(),
        )
    }

    #[tokio::test]
    async fn test_super_admin_passes_everything_without_scope() {
        let state = empty_state();
        let ctx = AuthzContext::new(Uuid::new_v4(), vec![GlobalRole::SuperAdmin]);

        for permission in Permission::ALL {
            assert!(
                can(&state, &ctx, *permission).await.unwrap(),
                "super_admin denied {}",
                permission.key()
            );
        }
    }

    #[tokio::test]
    async fn test_read_only_globals_never_mutate() {
        for global in [GlobalRole::Support, GlobalRole::Auditor] {
            let state = empty_state();
            let org_id = Uuid::new_v4();
            // Even an organization owner is vetoed while holding a read-only
            // global role.
            let ctx = AuthzContext::new(Uuid::new_v4(), vec![global])
                .for_organization(org_id);
            let ctx = AuthzContext {
                organization_role: Some(OrgRole::Owner),
                ..ctx
            };

            assert!(!can(&state, &ctx, Permission::OrganizationUpdate)
                .await
                .unwrap());
            assert!(!can(&state, &ctx, Permission::OrganizationMemberManage)
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn test_read_only_globals_see_org_resources() {
        let state = empty_state();
        let ctx = AuthzContext::new(Uuid::new_v4(), vec![GlobalRole::Auditor])
            .for_organization(Uuid::new_v4());

        assert!(can(&state, &ctx, Permission::OrganizationRead).await.unwrap());
        assert!(can(&state, &ctx, Permission::OrganizationListAll)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_org_member_manage_requires_admin() {
        let state = empty_state();
        let org_id = Uuid::new_v4();

        for (role, expected) in [
            (OrgRole::Member, false),
            (OrgRole::Billing, false),
            (OrgRole::Admin, true),
            (OrgRole::Owner, true),
        ] {
            let ctx = AuthzContext {
                organization_role: Some(role),
                ..AuthzContext::new(Uuid::new_v4(), vec![]).for_organization(org_id)
            };
            assert_eq!(
                can(&state, &ctx, Permission::OrganizationMemberManage)
                    .await
                    .unwrap(),
                expected,
                "role {:?}",
                role
            );
        }
    }

    #[tokio::test]
    async fn test_org_role_resolved_when_not_in_context() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let mut orgs = MockOrganizationRepository::new();
        orgs.expect_find_member()
            .returning(move |org, user| Ok(Some(org_member(org, user, OrgRole::Admin))));
        let state = TestState::new(orgs, MockProjectRepository::new());

        let ctx = AuthzContext::new(user_id, vec![]).for_organization(org_id);
        assert!(can(&state, &ctx, Permission::OrganizationUpdate)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_session_role_not_trusted_for_other_organization() {
        // The session says "owner of org A"; checking against org B must
        // consult storage, which knows nothing about this user.
        let mut orgs = MockOrganizationRepository::new();
        orgs.expect_find_member().returning(|_, _| Ok(None));
        let state = TestState::new(orgs, MockProjectRepository::new());

        let org_a = Uuid::new_v4();
        let org_b = Uuid::new_v4();
        let ctx = AuthzContext {
            organization_role: Some(OrgRole::Owner),
            ..AuthzContext::new(Uuid::new_v4(), vec![]).for_organization(org_a)
        };
        let ctx = ctx.for_organization(org_b);

        assert!(ctx.organization_role.is_none());
        assert!(!can(&state, &ctx, Permission::OrganizationUpdate)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_no_membership_is_denied_not_defaulted() {
        let mut orgs = MockOrganizationRepository::new();
        orgs.expect_find_member().returning(|_, _| Ok(None));
        let state = TestState::new(orgs, MockProjectRepository::new());

        let ctx = AuthzContext::new(Uuid::new_v4(), vec![]).for_organization(Uuid::new_v4());
        assert!(!can(&state, &ctx, Permission::OrganizationRead).await.unwrap());
    }

    #[tokio::test]
    async fn test_project_role_ordering_for_editor_permission() {
        let project_id = Uuid::new_v4();

        for (role, expected) in [
            (ProjectRole::Viewer, false),
            (ProjectRole::Editor, true),
            (ProjectRole::Admin, true),
        ] {
            let mut projects = MockProjectRepository::new();
            projects
                .expect_find_member()
                .returning(move |project, user| {
                    Ok(Some(project_member(project, user, role)))
                });
            let state = TestState::new(MockOrganizationRepository::new(), projects);

            let ctx = AuthzContext::new(Uuid::new_v4(), vec![]).for_project(project_id);
            assert_eq!(
                can(&state, &ctx, Permission::TestRunItemUpdate).await.unwrap(),
                expected,
                "role {:?}",
                role
            );
        }
    }

    #[tokio::test]
    async fn test_org_admin_reads_projects_without_membership() {
        let mut projects = MockProjectRepository::new();
        projects.expect_find_member().returning(|_, _| Ok(None));
        let state = TestState::new(MockOrganizationRepository::new(), projects);

        let ctx = AuthzContext {
            organization_role: Some(OrgRole::Admin),
            ..AuthzContext::new(Uuid::new_v4(), vec![])
                .for_organization(Uuid::new_v4())
                .for_project(Uuid::new_v4())
        };

        assert!(can(&state, &ctx, Permission::ProjectRead).await.unwrap());
        assert!(can(&state, &ctx, Permission::BugRead).await.unwrap());
    }

    #[tokio::test]
    async fn test_org_admin_cannot_write_projects_without_membership() {
        let mut projects = MockProjectRepository::new();
        projects.expect_find_member().returning(|_, _| Ok(None));
        let state = TestState::new(MockOrganizationRepository::new(), projects);

        let ctx = AuthzContext {
            organization_role: Some(OrgRole::Owner),
            ..AuthzContext::new(Uuid::new_v4(), vec![])
                .for_organization(Uuid::new_v4())
                .for_project(Uuid::new_v4())
        };

        assert!(!can(&state, &ctx, Permission::BugCreate).await.unwrap());
        assert!(!can(&state, &ctx, Permission::TestCaseManage).await.unwrap());
    }

    #[tokio::test]
    async fn test_org_member_without_project_membership_denied() {
        let mut projects = MockProjectRepository::new();
        projects.expect_find_member().returning(|_, _| Ok(None));
        let state = TestState::new(MockOrganizationRepository::new(), projects);

        let ctx = AuthzContext {
            organization_role: Some(OrgRole::Member),
            ..AuthzContext::new(Uuid::new_v4(), vec![])
                .for_organization(Uuid::new_v4())
                .for_project(Uuid::new_v4())
        };

        assert!(!can(&state, &ctx, Permission::ProjectRead).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_scope_is_invalid_scope_not_denial() {
        let state = empty_state();
        let ctx = AuthzContext::new(Uuid::new_v4(), vec![]);

        let err = can(&state, &ctx, Permission::OrganizationUpdate)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidScope(_)));

        let err = can(&state, &ctx, Permission::BugCreate).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidScope(_)));
    }

    #[tokio::test]
    async fn test_global_mutation_denied_for_plain_user() {
        let state = empty_state();
        let ctx = AuthzContext::new(Uuid::new_v4(), vec![]);

        assert!(!can(&state, &ctx, Permission::UserManage).await.unwrap());
        assert!(!can(&state, &ctx, Permission::UserList).await.unwrap());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates_not_denies() {
        let mut projects = MockProjectRepository::new();
        projects
            .expect_find_member()
            .returning(|_, _| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        let state = TestState::new(MockOrganizationRepository::new(), projects);

        let ctx = AuthzContext::new(Uuid::new_v4(), vec![]).for_project(Uuid::new_v4());
        let err = can(&state, &ctx, Permission::BugRead).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_can_is_idempotent() {
        let project_id = Uuid::new_v4();
        let mut projects = MockProjectRepository::new();
        projects
            .expect_find_member()
            .times(2)
            .returning(|project, user| {
                Ok(Some(project_member(project, user, ProjectRole::Editor)))
            });
        let state = TestState::new(MockOrganizationRepository::new(), projects);

        let ctx = AuthzContext::new(Uuid::new_v4(), vec![]).for_project(project_id);
        let first = can(&state, &ctx, Permission::BugCreate).await.unwrap();
        let second = can(&state, &ctx, Permission::BugCreate).await.unwrap();
        assert_eq!(first, second);
        assert!(first);
    }

    #[tokio::test]
    async fn test_require_maps_denial_to_forbidden() {
        let state = empty_state();
        let ctx = AuthzContext {
            organization_role: Some(OrgRole::Member),
            ..AuthzContext::new(Uuid::new_v4(), vec![]).for_organization(Uuid::new_v4())
        };

        let err = require(&state, &ctx, Permission::OrganizationMemberManage)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_spec_scenario_member_cannot_manage_members() {
        // { userId: u1, globalRoles: [], organizationRole: member, org: o1 }
        // requesting org.member.manage -> false
        let state = empty_state();
        let ctx = AuthzContext {
            organization_role: Some(OrgRole::Member),
            ..AuthzContext::new(Uuid::new_v4(), vec![]).for_organization(Uuid::new_v4())
        };

        assert!(!can(&state, &ctx, Permission::OrganizationMemberManage)
            .await
            .unwrap());
    }
}
