//! Mailer configuration.

use std::time::Duration;

use secrecy::SecretString;
use tracing::warn;

pub const DEFAULT_SENDER: &str = "Your App <onboarding@resend.dev>";
pub const DEFAULT_API_URL: &str = "https://api.resend.com";

/// Email provider configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Provider API key
    pub api_key: SecretString,
    /// `from` address on every message
    pub sender: String,
    /// Provider API base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl MailerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            sender: DEFAULT_SENDER.to_string(),
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Create config from environment variables.
    ///
    /// A missing `RESEND_API_KEY` is not fatal here; the provider rejects
    /// every send made without one.
    pub fn from_env() -> Self {
        let api_key = std::env::var("RESEND_API_KEY").unwrap_or_else(|_| {
            warn!("RESEND_API_KEY not set; email sends will be rejected by the provider");
            String::new()
        });

        Self {
            sender: std::env::var("EMAIL_SENDER_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_SENDER.to_string()),
            base_url: std::env::var("RESEND_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("MAILER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            ..Self::new(api_key)
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
