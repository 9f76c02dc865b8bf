use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use devpulse_core::mailer::{EmailMessage, MailError, Mailer};

/// One recorded call to [`MockMailer::send`].
#[derive(Clone, Debug)]
pub struct MockAttempt {
    pub to: String,
    pub subject: String,
    pub text: String,
    /// Tokio clock timestamp, so paused-clock tests can assert backoff gaps.
    pub at: Instant,
}

/// In-memory transport for tests. Responses can be scripted per call;
/// once the script runs out the fallback response applies.
pub struct MockMailer {
    scripted: Mutex<VecDeque<Result<(), MailError>>>,
    fallback: Result<(), MailError>,
    attempts: Mutex<Vec<MockAttempt>>,
}

impl MockMailer {
    /// Every send succeeds.
    pub fn succeeding() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fallback: Ok(()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Every send is rejected by the transport.
    pub fn failing() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fallback: Err(MailError::Rejected {
                status: 503,
                body: "service unavailable".to_string(),
            }),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Responses are consumed in order; after the script is exhausted every
    /// further send succeeds.
    pub fn script(responses: Vec<Result<(), MailError>>) -> Self {
        Self {
            scripted: Mutex::new(responses.into()),
            fallback: Ok(()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> Vec<MockAttempt> {
        self.attempts.lock().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, to: &str, message: &EmailMessage) -> Result<(), MailError> {
        self.attempts.lock().push(MockAttempt {
            to: to.to_string(),
            subject: message.subject.clone(),
            text: message.text.clone(),
            at: Instant::now(),
        });
        match self.scripted.lock().pop_front() {
            Some(response) => response,
            None => self.fallback.clone(),
        }
    }
}
