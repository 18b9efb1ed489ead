//! Outgoing email capability
//!
//! The rest of the application only sees the `Mailer` trait. Delivery is a
//! side effect that may fail independently of the request; callers decide
//! whether a failure is fatal.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::core::config::{EmailConfig, MailerBackend};

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail delivery rejected with status {status}")]
    Rejected { status: u16 },

    #[error("Mailer misconfigured: {0}")]
    Config(String),
}

/// Email delivery capability: `send(to, subject, body) -> ok | fail`
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

/// Mailer that logs messages instead of delivering them.
///
/// Default for development and tests; the OTP shows up in the server log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        tracing::info!(%to, %subject, %body, "Email (log mailer, not delivered)");
        Ok(())
    }
}

/// Mailer that posts messages to an HTTP delivery API
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let payload = serde_json::json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": body,
        });

        let mut request = self.client.post(&self.api_url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MailerError::Rejected {
                status: response.status().as_u16(),
            });
        }

        tracing::debug!(%to, "Email dispatched");
        Ok(())
    }
}

/// Build the configured mailer
pub fn build_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>, MailerError> {
    match config.backend {
        MailerBackend::Log => Ok(Arc::new(LogMailer)),
        MailerBackend::Http => {
            let api_url = config
                .api_url
                .clone()
                .ok_or_else(|| MailerError::Config("http mailer requires an API URL".into()))?;
            Ok(Arc::new(HttpMailer::new(
                api_url,
                config.api_key.clone(),
                config.from_address.clone(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer;
        let result = mailer.send("a@x.com", "Your OTP Code", "123456").await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_mailer_http_requires_url() {
        let config = EmailConfig {
            backend: MailerBackend::Http,
            api_url: None,
            api_key: None,
            from_address: "no-reply@quickbill.local".to_string(),
        };
        assert!(build_mailer(&config).is_err());
    }
}
