use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use devpulse_core::mailer::{InviteNotice, Mailer};

use crate::config::NotifierConfig;
use crate::template;

/// Terminal state of one invitation delivery:
/// `Pending → {Sent | FailedPermanent}`, with retrying in between.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { message: String },
    FailedPermanent { message: String },
}

impl DeliveryOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Sent { message } | Self::FailedPermanent { message } => message,
        }
    }
}

/// Sends invitation emails with exponential backoff.
///
/// Each dispatch runs as a detached task: the invite-creation request
/// returns before delivery is confirmed, and the outcome is never surfaced
/// to the original caller. The returned handle can be awaited in tests or
/// aborted; dropping it detaches the delivery.
///
/// The loop keeps retrying while the current delay is strictly below the
/// configured ceiling, multiplying the delay after each failed attempt.
/// A multiplier of 1.0 or less therefore never reaches the ceiling and
/// retries without bound.
pub struct InviteNotifier {
    mailer: Arc<dyn Mailer>,
    config: NotifierConfig,
}

impl InviteNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, config: NotifierConfig) -> Self {
        Self { mailer, config }
    }

    /// Fire-and-forget delivery of the invite email.
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, notice: InviteNotice) -> JoinHandle<DeliveryOutcome> {
        let mailer = self.mailer.clone();
        let config = self.config.clone();
        tokio::spawn(async move { deliver(mailer, config, notice).await })
    }
}

async fn deliver(
    mailer: Arc<dyn Mailer>,
    config: NotifierConfig,
    notice: InviteNotice,
) -> DeliveryOutcome {
    let message = template::invite_email(&notice, &config.invite_url);
    let mut delay = config.retry_delay;
    let mut attempt: u32 = 1;

    loop {
        match mailer.send(&notice.email, &message).await {
            Ok(()) => {
                info!(to = %notice.email, attempt, "invitation email sent");
                return DeliveryOutcome::Sent {
                    message: format!("Invitation email sent to {}", notice.email),
                };
            }
            Err(err) => {
                // Strict comparison: a delay equal to the ceiling stops the loop.
                if delay < config.max_retry_duration {
                    warn!(
                        to = %notice.email,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Error sending email to {}. You will be notified when the email is sent",
                        notice.email
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f64(config.retry_multiplier);
                    attempt += 1;
                } else {
                    warn!(to = %notice.email, attempt, error = %err, "invitation email failed permanently");
                    return DeliveryOutcome::FailedPermanent {
                        message: format!(
                            "Failed to send email to {}. Aborting retrying. Please send this link, {}, manually",
                            notice.email, config.invite_url
                        ),
                    };
                }
            }
        }
    }
}
