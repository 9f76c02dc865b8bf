//! Invitation and enrollment core: who may register, which cohort-program
//! a new trainee lands in, and how the catalog keeps cohorts and programs
//! paired.

pub mod catalog;
pub mod enroll;
pub mod invites;
pub mod populate;
pub mod register;
pub mod resolver;
pub mod selector;

pub use catalog::CatalogService;
pub use enroll::EnrollmentWriter;
pub use invites::{InviteRequest, InviteService};
pub use populate::{AutoPopulator, PopulateTrigger};
pub use register::{Registrar, Registration};
