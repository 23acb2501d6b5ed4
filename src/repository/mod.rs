//! Data access layer (Repository pattern)

pub mod bug;
pub mod organization;
pub mod project;
pub mod test_case;
pub mod test_plan;
pub mod test_run;
pub mod test_suite;
pub mod user;

pub use bug::BugRepository;
pub use organization::OrganizationRepository;
pub use project::ProjectRepository;
pub use test_case::TestCaseRepository;
pub use test_plan::TestPlanRepository;
pub use test_run::TestRunRepository;
pub use test_suite::TestSuiteRepository;
pub use user::UserRepository;
