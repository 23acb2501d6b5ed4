//! Session authentication middleware and extractors
//!
//! Provides the `AuthUser` extractor: the entry point of the request
//! authorization pipeline. It verifies the Bearer session token and hands the
//! handler a typed principal; unauthenticated requests never reach a handler.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{GlobalRole, OrgRole};
use crate::jwt::SessionClaims;
use crate::policy::AuthzContext;
use crate::state::HasAuthz;

/// Authenticated principal extracted from the session token.
///
/// Built once per request and immutable for its duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// User ID from the token's `sub` claim
    pub user_id: Uuid,
    /// User's email address
    pub email: String,
    /// Global roles held by the user
    pub global_roles: Vec<GlobalRole>,
    /// Active organization, if one was selected
    pub active_organization_id: Option<Uuid>,
    /// Role within the active organization
    pub organization_role: Option<OrgRole>,
}

impl AuthUser {
    /// Create an AuthUser from verified session claims
    pub fn from_session_claims(claims: SessionClaims) -> Result<Self, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("Invalid user ID in token".to_string()))?;

        let global_roles = claims
            .global_roles
            .iter()
            .map(|role| role.parse::<GlobalRole>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| AuthError::InvalidToken("Unknown global role in token".to_string()))?;

        let active_organization_id = claims
            .active_organization_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|_| AuthError::InvalidToken("Invalid organization ID in token".to_string()))?;

        let organization_role = claims
            .organization_role
            .as_deref()
            .map(str::parse::<OrgRole>)
            .transpose()
            .map_err(|_| {
                AuthError::InvalidToken("Unknown organization role in token".to_string())
            })?;

        if active_organization_id.is_some() != organization_role.is_some() {
            return Err(AuthError::InvalidToken(
                "Organization ID and role must be set together".to_string(),
            ));
        }

        Ok(Self {
            user_id,
            email: claims.email,
            global_roles,
            active_organization_id,
            organization_role,
        })
    }

    pub fn has_global(&self, role: GlobalRole) -> bool {
        self.global_roles.contains(&role)
    }

    /// Authorization context for policy checks, carrying the active
    /// organization pair from the session. Narrow with `for_project` /
    /// `for_organization` before scoped checks.
    pub fn authz_context(&self) -> AuthzContext {
        AuthzContext {
            user_id: self.user_id,
            global_roles: self.global_roles.clone(),
            organization_id: self.active_organization_id,
            organization_role: self.organization_role,
            project_id: None,
        }
    }
}

/// Authentication errors
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No Authorization header present
    MissingToken,
    /// Invalid Authorization header format
    InvalidHeader(String),
    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidHeader(_) => {
                (StatusCode::UNAUTHORIZED, "Invalid authorization header")
            }
            AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "Invalid token"),
        };

        let body = serde_json::json!({
            "error": message,
            "code": "UNAUTHORIZED"
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Extract and validate Bearer token from Authorization header
fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AuthError::InvalidHeader(
            "Authorization header must use Bearer scheme".to_string(),
        ));
    }

    Ok(&auth_header[7..])
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasAuthz + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let claims = state
            .token_manager()
            .verify_session_token(token)
            .map_err(|_| AuthError::InvalidToken("Token validation failed".to_string()))?;

        AuthUser::from_session_claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(
        global_roles: Vec<&str>,
        org: Option<(&str, &str)>,
    ) -> SessionClaims {
        SessionClaims {
            sub: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            email: "qa@example.com".to_string(),
            global_roles: global_roles.into_iter().map(String::from).collect(),
            active_organization_id: org.map(|(id, _)| id.to_string()),
            organization_role: org.map(|(_, role)| role.to_string()),
            iss: "https://id.testdeck.test".to_string(),
            token_type: "session".to_string(),
            iat: 1_000_000,
            exp: 1_003_600,
        }
    }

    #[test]
    fn test_auth_user_from_claims() {
        let user = AuthUser::from_session_claims(claims(
            vec!["support"],
            Some(("6ba7b810-9dad-11d1-80b4-00c04fd430c8", "admin")),
        ))
        .unwrap();

        assert_eq!(
            user.user_id,
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
        );
        assert_eq!(user.email, "qa@example.com");
        assert_eq!(user.global_roles, vec![GlobalRole::Support]);
        assert_eq!(
            user.active_organization_id,
            Some(Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap())
        );
        assert_eq!(user.organization_role, Some(OrgRole::Admin));
    }

    #[test]
    fn test_auth_user_without_organization() {
        let user = AuthUser::from_session_claims(claims(vec![], None)).unwrap();
        assert!(user.global_roles.is_empty());
        assert!(user.active_organization_id.is_none());
        assert!(user.organization_role.is_none());
    }

    #[test]
    fn test_auth_user_rejects_unknown_global_role() {
        let result = AuthUser::from_session_claims(claims(vec!["root"], None));
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_auth_user_rejects_bad_user_id() {
        let mut bad = claims(vec![], None);
        bad.sub = "not-a-uuid".to_string();
        assert!(AuthUser::from_session_claims(bad).is_err());
    }

    #[test]
    fn test_auth_user_rejects_org_without_role() {
        let mut bad = claims(vec![], Some(("6ba7b810-9dad-11d1-80b4-00c04fd430c8", "admin")));
        bad.organization_role = None;
        assert!(AuthUser::from_session_claims(bad).is_err());
    }

    #[test]
    fn test_authz_context_carries_session_scope() {
        let user = AuthUser::from_session_claims(claims(
            vec![],
            Some(("6ba7b810-9dad-11d1-80b4-00c04fd430c8", "owner")),
        ))
        .unwrap();

        let ctx = user.authz_context();
        assert_eq!(ctx.user_id, user.user_id);
        assert_eq!(ctx.organization_id, user.active_organization_id);
        assert_eq!(ctx.organization_role, Some(OrgRole::Owner));
        assert!(ctx.project_id.is_none());
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer test-token-123".parse().unwrap());

        let token = extract_bearer_token(&headers).unwrap();
        assert_eq!(token, "test-token-123");
    }

    #[test]
    fn test_extract_bearer_token_missing() {
        let headers = axum::http::HeaderMap::new();
        let result = extract_bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());

        let result = extract_bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::InvalidHeader(_))));
    }

    #[test]
    fn test_auth_error_into_response() {
        let errors = vec![
            AuthError::MissingToken,
            AuthError::InvalidHeader("test".to_string()),
            AuthError::InvalidToken("test".to_string()),
        ];

        for error in errors {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
