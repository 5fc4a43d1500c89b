//! Mailer error types.

use thiserror::Error;

pub type MailerResult<T> = Result<T, MailerError>;

#[derive(Debug, Error)]
pub enum MailerError {
    /// The provider answered with a non-success status.
    #[error("Email provider rejected request: {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Email provider unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid email message: {0}")]
    InvalidMessage(String),

    #[error("Invalid mailer configuration: {0}")]
    Config(String),
}

impl MailerError {
    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::InvalidMessage(msg.into())
    }

    /// HTTP status returned by the provider, if it answered.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            MailerError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}
