//! Role enumerations for the three permission scopes.
//!
//! Role ordering is an explicit total order via `rank()`; comparisons never
//! rely on declaration order or derived `Ord`.

use serde::{Deserialize, Serialize};

/// Platform-wide role carried in the session, independent of any tenant.
///
/// `SuperAdmin` passes every permission check. `Support` and `Auditor` are
/// read-only: they see everything and may mutate nothing, regardless of any
/// organization or project role the same user also holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
    SuperAdmin,
    Support,
    Auditor,
}

impl GlobalRole {
    pub fn is_read_only(self) -> bool {
        matches!(self, GlobalRole::Support | GlobalRole::Auditor)
    }
}

impl std::str::FromStr for GlobalRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(GlobalRole::SuperAdmin),
            "support" => Ok(GlobalRole::Support),
            "auditor" => Ok(GlobalRole::Auditor),
            _ => Err(format!("Unknown global role: {}", s)),
        }
    }
}

impl std::fmt::Display for GlobalRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GlobalRole::SuperAdmin => "super_admin",
            GlobalRole::Support => "support",
            GlobalRole::Auditor => "auditor",
        };
        write!(f, "{}", s)
    }
}

impl sqlx::Type<sqlx::MySql> for GlobalRole {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for GlobalRole {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for GlobalRole {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// Role within one organization membership.
///
/// `Billing` ranks equal to `Member`: it exists for invoicing visibility and
/// grants nothing beyond read access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Owner,
    Admin,
    Member,
    Billing,
}

impl OrgRole {
    /// Explicit total order: owner > admin > member = billing.
    pub fn rank(self) -> u8 {
        match self {
            OrgRole::Owner => 3,
            OrgRole::Admin => 2,
            OrgRole::Member => 1,
            OrgRole::Billing => 1,
        }
    }

    pub fn at_least(self, min: OrgRole) -> bool {
        self.rank() >= min.rank()
    }
}

impl std::str::FromStr for OrgRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "owner" => Ok(OrgRole::Owner),
            "admin" => Ok(OrgRole::Admin),
            "member" => Ok(OrgRole::Member),
            "billing" => Ok(OrgRole::Billing),
            _ => Err(format!("Unknown organization role: {}", s)),
        }
    }
}

impl std::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrgRole::Owner => "owner",
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
            OrgRole::Billing => "billing",
        };
        write!(f, "{}", s)
    }
}

impl sqlx::Type<sqlx::MySql> for OrgRole {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for OrgRole {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for OrgRole {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// Role within one project membership, independent of organization role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Admin,
    Editor,
    Viewer,
}

impl ProjectRole {
    /// Explicit total order: admin > editor > viewer.
    pub fn rank(self) -> u8 {
        match self {
            ProjectRole::Admin => 3,
            ProjectRole::Editor => 2,
            ProjectRole::Viewer => 1,
        }
    }

    pub fn at_least(self, min: ProjectRole) -> bool {
        self.rank() >= min.rank()
    }
}

impl std::str::FromStr for ProjectRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(ProjectRole::Admin),
            "editor" => Ok(ProjectRole::Editor),
            "viewer" => Ok(ProjectRole::Viewer),
            _ => Err(format!("Unknown project role: {}", s)),
        }
    }
}

impl std::fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProjectRole::Admin => "admin",
            ProjectRole::Editor => "editor",
            ProjectRole::Viewer => "viewer",
        };
        write!(f, "{}", s)
    }
}

impl sqlx::Type<sqlx::MySql> for ProjectRole {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for ProjectRole {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for ProjectRole {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OrgRole::Owner, OrgRole::Admin, true)]
    #[case(OrgRole::Owner, OrgRole::Owner, true)]
    #[case(OrgRole::Admin, OrgRole::Member, true)]
    #[case(OrgRole::Admin, OrgRole::Owner, false)]
    #[case(OrgRole::Member, OrgRole::Admin, false)]
    #[case(OrgRole::Billing, OrgRole::Admin, false)]
    #[case(OrgRole::Billing, OrgRole::Member, true)]
    fn test_org_role_ordering(#[case] role: OrgRole, #[case] min: OrgRole, #[case] expected: bool) {
        assert_eq!(role.at_least(min), expected);
    }

    #[test]
    fn test_billing_ranks_as_member() {
        assert_eq!(OrgRole::Billing.rank(), OrgRole::Member.rank());
    }

    #[rstest]
    #[case(ProjectRole::Admin, ProjectRole::Editor, true)]
    #[case(ProjectRole::Editor, ProjectRole::Editor, true)]
    #[case(ProjectRole::Editor, ProjectRole::Viewer, true)]
    #[case(ProjectRole::Viewer, ProjectRole::Editor, false)]
    #[case(ProjectRole::Viewer, ProjectRole::Viewer, true)]
    fn test_project_role_ordering(
        #[case] role: ProjectRole,
        #[case] min: ProjectRole,
        #[case] expected: bool,
    ) {
        assert_eq!(role.at_least(min), expected);
    }

    #[test]
    fn test_global_role_read_only() {
        assert!(GlobalRole::Support.is_read_only());
        assert!(GlobalRole::Auditor.is_read_only());
        assert!(!GlobalRole::SuperAdmin.is_read_only());
    }

    #[test]
    fn test_role_round_trip() {
        for role in ["owner", "admin", "member", "billing"] {
            let parsed: OrgRole = role.parse().unwrap();
            assert_eq!(parsed.to_string(), role);
        }
        for role in ["admin", "editor", "viewer"] {
            let parsed: ProjectRole = role.parse().unwrap();
            assert_eq!(parsed.to_string(), role);
        }
        for role in ["super_admin", "support", "auditor"] {
            let parsed: GlobalRole = role.parse().unwrap();
            assert_eq!(parsed.to_string(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("root".parse::<GlobalRole>().is_err());
        assert!("manager".parse::<OrgRole>().is_err());
        assert!("owner".parse::<ProjectRole>().is_err());
    }
}
