//! Email message model.

use crate::error::{MailerError, MailerResult};

/// A single transactional email. Addresses are passed through untouched;
/// the provider is the one that rejects malformed ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl EmailMessage {
    pub fn new<I, S>(
        to: I,
        subject: impl Into<String>,
        text: impl Into<String>,
        html: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            to: to.into_iter().map(Into::into).collect(),
            subject: subject.into(),
            text: text.into(),
            html: html.into(),
        }
    }

    /// Require at least one recipient and a subject.
    pub fn validate(&self) -> MailerResult<()> {
        if self.to.is_empty() {
            return Err(MailerError::invalid_message("at least one recipient is required"));
        }
        if self.to.iter().any(|addr| addr.trim().is_empty()) {
            return Err(MailerError::invalid_message("recipient address is blank"));
        }
        if self.subject.trim().is_empty() {
            return Err(MailerError::invalid_message("subject is required"));
        }
        Ok(())
    }
}
