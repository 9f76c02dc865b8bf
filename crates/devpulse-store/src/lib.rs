pub mod cohort_programs;
pub mod cohorts;
pub mod database;
pub mod enrollments;
pub mod error;
pub mod invites;
pub mod programs;
pub mod roles;
pub mod schema;
pub mod users;

pub use database::Database;
pub use error::StoreError;
