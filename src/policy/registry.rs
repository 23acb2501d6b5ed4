//! Permission registry
//!
//! Every permission the product knows is declared here, once, with the scope
//! it is evaluated at, whether it mutates state, and which global roles grant
//! it outright. The registry is built into an immutable map at startup and is
//! the only place a permission's requirements are defined; the engine resolves
//! all of them uniformly from this table.

use crate::domain::{GlobalRole, OrgRole, ProjectRole};
use std::collections::HashMap;

/// Closed set of permissions, one per resource and action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    // Global scope
    UserList,
    UserManage,
    OrganizationListAll,
    // Organization scope
    OrganizationRead,
    OrganizationUpdate,
    OrganizationDelete,
    OrganizationMemberRead,
    OrganizationMemberManage,
    ProjectCreate,
    // Project scope
    ProjectRead,
    ProjectUpdate,
    ProjectDelete,
    ProjectMemberManage,
    TestPlanRead,
    TestPlanManage,
    TestSuiteRead,
    TestSuiteManage,
    TestCaseRead,
    TestCaseManage,
    TestRunRead,
    TestRunManage,
    TestRunDelete,
    TestRunItemUpdate,
    TestRunMetricsUpdate,
    BugRead,
    BugCreate,
    BugUpdate,
    BugDelete,
}

/// Scope a permission is evaluated at, with the minimum role it demands there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRequirement {
    Global,
    Organization { min_role: OrgRole },
    Project { min_role: ProjectRole },
}

/// Whether a permission reads or mutates state. Read-only global roles deny
/// every `Mutate` permission regardless of scoped grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Read,
    Mutate,
}

/// Declarative requirements of one permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSpec {
    pub key: &'static str,
    pub scope: ScopeRequirement,
    pub kind: ActionKind,
    /// Global roles that satisfy this permission without a scoped membership.
    /// `super_admin` is implicit everywhere and never listed.
    pub global_grants: &'static [GlobalRole],
}

/// Read-only global roles see everything
const READ_ONLY_GLOBALS: &[GlobalRole] = &[GlobalRole::Support, GlobalRole::Auditor];
const NO_GLOBALS: &[GlobalRole] = &[];

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::UserList,
        Permission::UserManage,
        Permission::OrganizationListAll,
        Permission::OrganizationRead,
        Permission::OrganizationUpdate,
        Permission::OrganizationDelete,
        Permission::OrganizationMemberRead,
        Permission::OrganizationMemberManage,
        Permission::ProjectCreate,
        Permission::ProjectRead,
        Permission::ProjectUpdate,
        Permission::ProjectDelete,
        Permission::ProjectMemberManage,
        Permission::TestPlanRead,
        Permission::TestPlanManage,
        Permission::TestSuiteRead,
        Permission::TestSuiteManage,
        Permission::TestCaseRead,
        Permission::TestCaseManage,
        Permission::TestRunRead,
        Permission::TestRunManage,
        Permission::TestRunDelete,
        Permission::TestRunItemUpdate,
        Permission::TestRunMetricsUpdate,
        Permission::BugRead,
        Permission::BugCreate,
        Permission::BugUpdate,
        Permission::BugDelete,
    ];

    /// Stable string key, the form call sites and logs use.
    pub fn key(self) -> &'static str {
        spec(self).key
    }

    /// Look up a permission by its string key.
    pub fn from_key(key: &str) -> Option<Permission> {
        REGISTRY_BY_KEY.get(key).copied()
    }

    fn describe(self) -> PermissionSpec {
        use ActionKind::{Mutate, Read};
        use ScopeRequirement::{Global, Organization, Project};

        match self {
            Permission::UserList => PermissionSpec {
                key: "user.list",
                scope: Global,
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::UserManage => PermissionSpec {
                key: "user.manage",
                scope: Global,
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::OrganizationListAll => PermissionSpec {
                key: "org.list_all",
                scope: Global,
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::OrganizationRead => PermissionSpec {
                key: "org.read",
                scope: Organization {
                    min_role: OrgRole::Member,
                },
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::OrganizationUpdate => PermissionSpec {
                key: "org.update",
                scope: Organization {
                    min_role: OrgRole::Admin,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::OrganizationDelete => PermissionSpec {
                key: "org.delete",
                scope: Organization {
                    min_role: OrgRole::Owner,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::OrganizationMemberRead => PermissionSpec {
                key: "org.member.read",
                scope: Organization {
                    min_role: OrgRole::Member,
                },
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::OrganizationMemberManage => PermissionSpec {
                key: "org.member.manage",
                scope: Organization {
                    min_role: OrgRole::Admin,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::ProjectCreate => PermissionSpec {
                key: "project.create",
                scope: Organization {
                    min_role: OrgRole::Admin,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::ProjectRead => PermissionSpec {
                key: "project.read",
                scope: Project {
                    min_role: ProjectRole::Viewer,
                },
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::ProjectUpdate => PermissionSpec {
                key: "project.update",
                scope: Project {
                    min_role: ProjectRole::Admin,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::ProjectDelete => PermissionSpec {
                key: "project.delete",
                scope: Project {
                    min_role: ProjectRole::Admin,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::ProjectMemberManage => PermissionSpec {
                key: "project.member.manage",
                scope: Project {
                    min_role: ProjectRole::Admin,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::TestPlanRead => PermissionSpec {
                key: "test_plan.read",
                scope: Project {
                    min_role: ProjectRole::Viewer,
                },
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::TestPlanManage => PermissionSpec {
                key: "test_plan.manage",
                scope: Project {
                    min_role: ProjectRole::Editor,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::TestSuiteRead => PermissionSpec {
                key: "test_suite.read",
                scope: Project {
                    min_role: ProjectRole::Viewer,
                },
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::TestSuiteManage => PermissionSpec {
                key: "test_suite.manage",
                scope: Project {
                    min_role: ProjectRole::Editor,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::TestCaseRead => PermissionSpec {
                key: "test_case.read",
                scope: Project {
                    min_role: ProjectRole::Viewer,
                },
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::TestCaseManage => PermissionSpec {
                key: "test_case.manage",
                scope: Project {
                    min_role: ProjectRole::Editor,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::TestRunRead => PermissionSpec {
                key: "test_run.read",
                scope: Project {
                    min_role: ProjectRole::Viewer,
                },
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::TestRunManage => PermissionSpec {
                key: "test_run.manage",
                scope: Project {
                    min_role: ProjectRole::Editor,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::TestRunDelete => PermissionSpec {
                key: "test_run.delete",
                scope: Project {
                    min_role: ProjectRole::Admin,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::TestRunItemUpdate => PermissionSpec {
                key: "test_run.item.update",
                scope: Project {
                    min_role: ProjectRole::Editor,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::TestRunMetricsUpdate => PermissionSpec {
                key: "test_run.metrics.update",
                scope: Project {
                    min_role: ProjectRole::Editor,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::BugRead => PermissionSpec {
                key: "bug.read",
                scope: Project {
                    min_role: ProjectRole::Viewer,
                },
                kind: Read,
                global_grants: READ_ONLY_GLOBALS,
            },
            Permission::BugCreate => PermissionSpec {
                key: "bug.create",
                scope: Project {
                    min_role: ProjectRole::Editor,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::BugUpdate => PermissionSpec {
                key: "bug.update",
                scope: Project {
                    min_role: ProjectRole::Editor,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
            Permission::BugDelete => PermissionSpec {
                key: "bug.delete",
                scope: Project {
                    min_role: ProjectRole::Admin,
                },
                kind: Mutate,
                global_grants: NO_GLOBALS,
            },
        }
    }
}

lazy_static::lazy_static! {
    /// Immutable permission table, built once at startup.
    static ref REGISTRY: HashMap<Permission, PermissionSpec> = Permission::ALL
        .iter()
        .map(|permission| (*permission, permission.describe()))
        .collect();

    static ref REGISTRY_BY_KEY: HashMap<&'static str, Permission> = REGISTRY
        .iter()
        .map(|(permission, spec)| (spec.key, *permission))
        .collect();
}

/// Look up a permission's requirements. A permission absent from the registry
/// is a programming error, not a runtime condition.
pub fn spec(permission: Permission) -> &'static PermissionSpec {
    REGISTRY
        .get(&permission)
        .expect("permission missing from registry")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_permission_has_a_spec() {
        for permission in Permission::ALL {
            let _ = spec(*permission);
        }
    }

    #[test]
    fn test_keys_are_unique() {
        assert_eq!(REGISTRY_BY_KEY.len(), Permission::ALL.len());
    }

    #[test]
    fn test_key_format() {
        let key_regex = regex::Regex::new(r"^[a-z][a-z0-9_]*(?:\.[a-z][a-z0-9_]*)+$").unwrap();
        for permission in Permission::ALL {
            assert!(
                key_regex.is_match(permission.key()),
                "bad permission key: {}",
                permission.key()
            );
        }
    }

    #[test]
    fn test_from_key_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(Permission::from_key(permission.key()), Some(*permission));
        }
        assert_eq!(Permission::from_key("bug.transmogrify"), None);
    }

    #[test]
    fn test_mutations_never_carry_read_only_grants() {
        for permission in Permission::ALL {
            let spec = spec(*permission);
            if spec.kind == ActionKind::Mutate {
                assert!(
                    spec.global_grants
                        .iter()
                        .all(|role| !role.is_read_only()),
                    "mutation {} grants a read-only global role",
                    spec.key
                );
            }
        }
    }

    #[test]
    fn test_read_permissions_grant_read_only_globals() {
        for permission in Permission::ALL {
            let spec = spec(*permission);
            if spec.kind == ActionKind::Read {
                assert!(
                    spec.global_grants.contains(&GlobalRole::Support)
                        && spec.global_grants.contains(&GlobalRole::Auditor),
                    "read permission {} misses read-only global grants",
                    spec.key
                );
            }
        }
    }

    #[test]
    fn test_run_item_update_requires_editor() {
        let spec = spec(Permission::TestRunItemUpdate);
        assert_eq!(
            spec.scope,
            ScopeRequirement::Project {
                min_role: ProjectRole::Editor
            }
        );
    }
}
