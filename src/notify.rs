use std::error::Error;

use async_trait::async_trait;
use tracing::info;

use crate::types::PrincipalSummary;

pub const WELCOME_SUBJECT: &str = "Welcome to Our Platform!";

/// A welcome message for a freshly created principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeMessage {
    pub to: String,
    pub name: String,
    pub username: String,
    pub subject: String,
}

impl From<&PrincipalSummary> for WelcomeMessage {
    fn from(summary: &PrincipalSummary) -> Self {
        Self {
            to: summary.email.clone(),
            name: summary.name.clone(),
            username: summary.username.0.clone(),
            subject: WELCOME_SUBJECT.to_string(),
        }
    }
}

/// Outbound delivery of account notifications, e.g. over SMTP.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send_welcome(
        &self,
        message: &WelcomeMessage,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_welcome(
        &self,
        message: &WelcomeMessage,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        info!(
            to = %message.to,
            username = %message.username,
            subject = %message.subject,
            "welcome message"
        );
        Ok(())
    }
}
