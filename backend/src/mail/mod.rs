//! Transactional email.
//!
//! The welcome email is sent from its own endpoint, never as part of profile
//! creation, so a failed send cannot block or roll back sign-up.

mod sendgrid;

pub use sendgrid::SendGridMailer;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{EmailConfig, EmailProvider};

pub const WELCOME_SUBJECT: &str = "Welcome to EduPortal!";
pub const WELCOME_HTML: &str =
    "<h1>Welcome to EduPortal!</h1><p>Your account has been created successfully.</p>";

/// A single outgoing HTML email.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html: String,
}

impl EmailMessage {
    pub fn welcome(to: &str, from: &str) -> Self {
        Self {
            to: to.to_string(),
            from: from.to_string(),
            subject: WELCOME_SUBJECT.to_string(),
            html: WELCOME_HTML.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Provider rejected message: {0}")]
    Rejected(String),
    #[error("Mailer misconfigured: {0}")]
    Config(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Provider name for logs.
    fn provider(&self) -> &'static str;

    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn provider(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            from = %message.from,
            subject = %message.subject,
            "Email not delivered (log provider)"
        );
        Ok(())
    }
}

/// Build the mailer selected by configuration.
pub fn from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.provider {
        EmailProvider::Log => Ok(Arc::new(LogMailer)),
        EmailProvider::Sendgrid => {
            let api_key = config
                .api_key
                .as_deref()
                .ok_or_else(|| MailError::Config("email.api_key is required".to_string()))?;
            Ok(Arc::new(SendGridMailer::new(&config.base_url, api_key)))
        }
    }
}
