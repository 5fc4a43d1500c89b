//! Transactional email dispatch.
//!
//! A single operation: send one email through the provider and wait for the
//! provider to accept it. No retry, queuing or templating happens here, and
//! the provider's message id is not surfaced.

pub mod client;
pub mod config;
pub mod error;
pub mod message;

pub use client::{EmailClient, ResendClient};
pub use config::MailerConfig;
pub use error::{MailerError, MailerResult};
pub use message::EmailMessage;
