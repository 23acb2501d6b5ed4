//! Session token handling
//!
//! Session issuance lives in the external authentication service; this module
//! verifies the tokens it mints and re-signs them when the active organization
//! changes. Tokens are HS256 with a shared secret.

use crate::config::SessionConfig;
use crate::domain::{GlobalRole, OrgRole};
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Global roles held by the user ("super_admin", "support", "auditor")
    #[serde(default)]
    pub global_roles: Vec<String>,
    /// Active organization, if one has been selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_organization_id: Option<String>,
    /// Role within the active organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_role: Option<String>,
    /// Issuer
    pub iss: String,
    /// Token type discriminator (prevents token confusion attacks)
    #[serde(default)]
    pub token_type: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct TokenManager {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenManager {
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Validation with a strict leeway (5 seconds) instead of the default 60,
    /// so tokens expire promptly while tolerating minor clock skew.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v.set_issuer(&[&self.config.issuer]);
        v
    }

    /// Create a session token
    pub fn create_session_token(
        &self,
        user_id: Uuid,
        email: &str,
        global_roles: &[GlobalRole],
        active_organization: Option<(Uuid, OrgRole)>,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.token_ttl_secs);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            global_roles: global_roles.iter().map(|r| r.to_string()).collect(),
            active_organization_id: active_organization.map(|(id, _)| id.to_string()),
            organization_role: active_organization.map(|(_, role)| role.to_string()),
            iss: self.config.issuer.clone(),
            token_type: "session".to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key).map_err(AppError::Jwt)
    }

    /// Verify a session token and return its claims
    pub fn verify_session_token(&self, token: &str) -> Result<SessionClaims> {
        let data =
            decode::<SessionClaims>(token, &self.decoding_key, &self.strict_validation())?;
        if data.claims.token_type != "session" {
            return Err(AppError::Unauthorized("Unexpected token type".to_string()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manager() -> TokenManager {
        TokenManager::new(SessionConfig {
            secret: "test-secret-for-session-tokens".to_string(),
            issuer: "https://id.testdeck.test".to_string(),
            token_ttl_secs: 3600,
        })
    }

    #[test]
    fn test_session_token_round_trip() {
        let manager = test_manager();
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let token = manager
            .create_session_token(
                user_id,
                "qa@example.com",
                &[GlobalRole::Support],
                Some((org_id, OrgRole::Admin)),
            )
            .unwrap();

        let claims = manager.verify_session_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "qa@example.com");
        assert_eq!(claims.global_roles, vec!["support"]);
        assert_eq!(claims.active_organization_id, Some(org_id.to_string()));
        assert_eq!(claims.organization_role, Some("admin".to_string()));
        assert_eq!(claims.token_type, "session");
    }

    #[test]
    fn test_session_token_without_organization() {
        let manager = test_manager();
        let token = manager
            .create_session_token(Uuid::new_v4(), "qa@example.com", &[], None)
            .unwrap();

        let claims = manager.verify_session_token(&token).unwrap();
        assert!(claims.global_roles.is_empty());
        assert!(claims.active_organization_id.is_none());
        assert!(claims.organization_role.is_none());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let manager = test_manager();
        assert!(manager.verify_session_token("not-a-token").is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let manager = test_manager();
        let other = TokenManager::new(SessionConfig {
            secret: "a-different-secret".to_string(),
            issuer: "https://id.testdeck.test".to_string(),
            token_ttl_secs: 3600,
        });

        let token = other
            .create_session_token(Uuid::new_v4(), "qa@example.com", &[], None)
            .unwrap();
        assert!(manager.verify_session_token(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let manager = test_manager();
        let other = TokenManager::new(SessionConfig {
            secret: "test-secret-for-session-tokens".to_string(),
            issuer: "https://elsewhere.test".to_string(),
            token_ttl_secs: 3600,
        });

        let token = other
            .create_session_token(Uuid::new_v4(), "qa@example.com", &[], None)
            .unwrap();
        assert!(manager.verify_session_token(&token).is_err());
    }
}
