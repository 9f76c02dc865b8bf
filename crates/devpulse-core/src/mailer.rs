use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A rendered email, ready for transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// The slice of an invitation the notifier needs to render and address the
/// invite email. Name and role fields are optional; the template substitutes
/// neutral placeholders when they are absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InviteNotice {
    pub email: String,
    pub inviter_first_name: Option<String>,
    pub inviter_last_name: Option<String>,
    pub role_name: Option<String>,
}

impl InviteNotice {
    /// A notice carrying only the recipient address.
    pub fn bare(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            inviter_first_name: None,
            inviter_last_name: None,
            role_name: None,
        }
    }
}

/// Transport-level mail failure.
#[derive(Clone, Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Outbound mail transport port. Implementations deliver one rendered
/// message to one recipient; retry policy lives with the caller.
#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, to: &str, message: &EmailMessage) -> Result<(), MailError>;
}
