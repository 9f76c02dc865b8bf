pub mod config;
pub mod mock;
pub mod notifier;
pub mod sendgrid;
pub mod template;

pub use config::{NotifierConfig, SendgridConfig};
pub use mock::MockMailer;
pub use notifier::{DeliveryOutcome, InviteNotifier};
pub use sendgrid::SendgridMailer;
