pub mod errors;
pub mod ids;
pub mod mailer;
pub mod settings;

pub use errors::EnrollError;
pub use settings::AdvancedSettings;
