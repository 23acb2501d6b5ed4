//! Business logic layer

pub mod bug;
pub mod organization;
pub mod project;
pub mod test_case;
pub mod test_plan;
pub mod test_run;
pub mod test_suite;
pub mod user;

pub use bug::BugService;
pub use organization::OrganizationService;
pub use project::ProjectService;
pub use test_case::TestCaseService;
pub use test_plan::TestPlanService;
pub use test_run::TestRunService;
pub use test_suite::TestSuiteService;
pub use user::UserService;
