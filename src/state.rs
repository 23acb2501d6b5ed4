//! Application state traits for dependency injection
//!
//! The policy engine and the authentication extractor only need a small slice
//! of the application state: configuration, the session token manager, and
//! read access to membership storage. Abstracting that slice behind a trait
//! lets the same code run against the production `AppState` and mock-backed
//! test states.

use crate::config::Config;
use crate::jwt::TokenManager;
use crate::repository::{OrganizationRepository, ProjectRepository};

/// Trait for application state that the authorization core depends on.
pub trait HasAuthz: Clone + Send + Sync + 'static {
    /// The organization repository type
    type OrgRepo: OrganizationRepository;
    /// The project repository type
    type ProjectRepo: ProjectRepository;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the session token manager
    fn token_manager(&self) -> &TokenManager;

    /// Get the organization repository (membership lookups)
    fn organization_repo(&self) -> &Self::OrgRepo;

    /// Get the project repository (membership lookups)
    fn project_repo(&self) -> &Self::ProjectRepo;
}
