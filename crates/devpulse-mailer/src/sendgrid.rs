use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::instrument;

use devpulse_core::mailer::{EmailMessage, MailError, Mailer};

use crate::config::SendgridConfig;

const API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// SendGrid v3 mail transport.
pub struct SendgridMailer {
    client: Client,
    config: SendgridConfig,
}

impl SendgridMailer {
    pub fn new(config: SendgridConfig) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            config,
        }
    }
}

/// The v3 send payload. Split out so tests can assert its shape without a
/// network.
pub fn build_payload(
    to: &str,
    message: &EmailMessage,
    from: &str,
    reply_to: Option<&str>,
) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "personalizations": [{ "to": [{ "email": to }] }],
        "from": { "email": from },
        "subject": message.subject,
        "content": [
            { "type": "text/plain", "value": message.text },
            { "type": "text/html", "value": message.html },
        ],
    });
    if let Some(reply) = reply_to {
        payload["reply_to"] = serde_json::json!({ "email": reply });
    }
    payload
}

#[async_trait]
impl Mailer for SendgridMailer {
    fn name(&self) -> &str {
        "sendgrid"
    }

    #[instrument(skip(self, message), fields(provider = "sendgrid"))]
    async fn send(&self, to: &str, message: &EmailMessage) -> Result<(), MailError> {
        if to.is_empty() {
            return Err(MailError::InvalidMessage(
                "recipient address is empty".to_string(),
            ));
        }

        let payload = build_payload(
            to,
            message,
            &self.config.default_from,
            self.config.reply_to.as_deref(),
        );

        let response = self
            .client
            .post(API_URL)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            subject: "Welcome".to_string(),
            text: "plain body".to_string(),
            html: "<p>rich body</p>".to_string(),
        }
    }

    #[test]
    fn payload_addresses_the_recipient() {
        let payload = build_payload("new@x.com", &message(), "noreply@x.com", None);
        assert_eq!(
            payload["personalizations"][0]["to"][0]["email"],
            "new@x.com"
        );
        assert_eq!(payload["from"]["email"], "noreply@x.com");
        assert_eq!(payload["subject"], "Welcome");
    }

    #[test]
    fn payload_carries_both_content_parts() {
        let payload = build_payload("new@x.com", &message(), "noreply@x.com", None);
        let content = payload["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["type"], "text/plain");
        assert_eq!(content[0]["value"], "plain body");
        assert_eq!(content[1]["type"], "text/html");
        assert_eq!(content[1]["value"], "<p>rich body</p>");
    }

    #[test]
    fn reply_to_is_optional() {
        let without = build_payload("new@x.com", &message(), "noreply@x.com", None);
        assert!(without.get("reply_to").is_none());

        let with = build_payload("new@x.com", &message(), "noreply@x.com", Some("team@x.com"));
        assert_eq!(with["reply_to"]["email"], "team@x.com");
    }
}
