//! Email provider client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::MailerConfig;
use crate::error::{MailerError, MailerResult};
use crate::message::EmailMessage;

/// Sends transactional email.
#[async_trait]
pub trait EmailClient: Send + Sync {
    /// Send one message. Resolves once the provider has accepted it for
    /// delivery.
    async fn send_email(&self, message: &EmailMessage) -> MailerResult<()>;

    /// Send to a single recipient.
    async fn send(&self, to: &str, subject: &str, text: &str, html: &str) -> MailerResult<()> {
        self.send_email(&EmailMessage::new([to], subject, text, html))
            .await
    }
}

/// Provider send request body.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Resend API client.
#[derive(Debug, Clone)]
pub struct ResendClient {
    http: Client,
    config: MailerConfig,
    send_url: String,
}

impl ResendClient {
    pub fn new(config: MailerConfig) -> MailerResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cbams-mailer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MailerError::Config(e.to_string()))?;

        let send_url = format!("{}/emails", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            config,
            send_url,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> MailerResult<Self> {
        Self::new(MailerConfig::from_env())
    }

    pub fn sender(&self) -> &str {
        &self.config.sender
    }
}

#[async_trait]
impl EmailClient for ResendClient {
    async fn send_email(&self, message: &EmailMessage) -> MailerResult<()> {
        message.validate()?;

        let body = SendEmailRequest {
            from: &self.config.sender,
            to: &message.to,
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        debug!(recipients = message.to.len(), subject = %message.subject, "Sending email");

        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Email provider unreachable: {}", e);
                MailerError::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Email provider rejected send: {}", body);
            return Err(MailerError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
