use std::time::Duration;

use secrecy::SecretString;

/// Retry policy and link configuration for the invitation notifier.
/// Built once from the environment (or programmatically) and injected.
#[derive(Clone, Debug)]
pub struct NotifierConfig {
    /// Link embedded in the invite template.
    pub invite_url: String,
    /// Initial backoff delay.
    pub retry_delay: Duration,
    /// Multiplicative backoff factor applied after each failed attempt.
    pub retry_multiplier: f64,
    /// Ceiling on the current delay; once the delay reaches it, retrying
    /// stops for good.
    pub max_retry_duration: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            invite_url: "https://devpulse.atlp-rwanda.org/register".to_string(),
            retry_delay: Duration::from_millis(1000),
            retry_multiplier: 2.0,
            max_retry_duration: Duration::from_secs(60),
        }
    }
}

impl NotifierConfig {
    /// Read the recognized environment keys, falling back to defaults for
    /// anything missing or unparseable. A negative or non-finite multiplier
    /// would panic the backoff arithmetic, so those fall back too; values
    /// in (0, 1] are accepted and keep the documented unbounded retrying.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            invite_url: std::env::var("EMAIL_INVITE_URL").unwrap_or(defaults.invite_url),
            retry_delay: env_millis("EMAIL_SEND_RETRY_DELAY_MILLISECONDS")
                .unwrap_or(defaults.retry_delay),
            retry_multiplier: std::env::var("EMAIL_RETRY_DELAY_MULTIPLIER")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|m| m.is_finite() && *m >= 0.0)
                .unwrap_or(defaults.retry_multiplier),
            max_retry_duration: env_millis("MAXIMUM_RETRY_DURATION")
                .unwrap_or(defaults.max_retry_duration),
        }
    }
}

/// SendGrid transport configuration, mirroring the platform's mail plugin
/// settings.
#[derive(Clone, Debug)]
pub struct SendgridConfig {
    pub api_key: SecretString,
    pub default_from: String,
    pub reply_to: Option<String>,
}

impl SendgridConfig {
    /// Read `SENDGRID_API_KEY`, `EMAIL_DEFAULT_FROM` and `EMAIL_REPLY_TO`.
    /// Returns None when the api key is not configured.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("SENDGRID_API_KEY").ok()?;
        Some(Self {
            api_key: SecretString::from(api_key),
            default_from: std::env::var("EMAIL_DEFAULT_FROM")
                .unwrap_or_else(|_| "noreply@atlp-rwanda.org".to_string()),
            reply_to: std::env::var("EMAIL_REPLY_TO").ok(),
        })
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}
