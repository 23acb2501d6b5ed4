//! Domain models for Testdeck Core

pub mod bug;
pub mod common;
pub mod organization;
pub mod project;
pub mod roles;
pub mod test_case;
pub mod test_plan;
pub mod test_run;
pub mod test_suite;
pub mod user;

pub use bug::*;
pub use common::*;
pub use organization::*;
pub use project::*;
pub use roles::*;
pub use test_case::*;
pub use test_plan::*;
pub use test_run::*;
pub use test_suite::*;
pub use user::*;
