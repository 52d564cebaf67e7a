//! Outbound email.
//!
//! Sign-in codes go out through a [`Mailer`]. Two backends:
//! - Resend HTTP API for real deployments
//! - Console, which logs the message instead of sending it (the
//!   default for local development, where no API key exists)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from sending mail.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Email provider rejected the message: {0}")]
    Rejected(String),
}

/// Mailer backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum MailerConfig {
    /// Log the message instead of sending it
    Console,

    /// Resend HTTP API
    Resend {
        api_key: String,
        from: String,
        #[serde(default = "default_base_url")]
        base_url: String,
    },
}

fn default_base_url() -> String {
    "https://api.resend.com".to_string()
}

impl Default for MailerConfig {
    fn default() -> Self {
        MailerConfig::Console
    }
}

/// Trait for email backends.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Deliver a sign-in code to the given address.
    async fn send_signin_code(&self, to: &str, code: &str) -> Result<(), EmailError>;
}

/// Build a mailer from configuration.
pub fn mailer_from_config(config: &MailerConfig) -> Box<dyn Mailer> {
    match config {
        MailerConfig::Console => Box::new(ConsoleMailer),
        MailerConfig::Resend {
            api_key,
            from,
            base_url,
        } => Box::new(ResendMailer::new(
            api_key.clone(),
            from.clone(),
            base_url.clone(),
        )),
    }
}

/// Logs the code instead of sending it.
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn send_signin_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        info!("Sign-in code for {}: {}", to, code);
        Ok(())
    }
}

/// Resend API backend.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            from,
            base_url,
        }
    }
}

/// Resend API request format.
#[derive(Debug, Serialize)]
struct ResendRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    text: String,
}

#[async_trait]
impl Mailer for ResendMailer {
    fn name(&self) -> &'static str {
        "resend"
    }

    async fn send_signin_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let url = format!("{}/emails", self.base_url);

        let request = ResendRequest {
            from: self.from.clone(),
            to: vec![to.to_string()],
            subject: "Your sign-in code".to_string(),
            text: format!(
                "Your sign-in code is {}. It expires in 10 minutes.\n\n\
                 If you didn't request this, you can ignore this email.",
                code
            ),
        };

        debug!("Sending sign-in code email to {}", to);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmailError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Resend returned {}: {}", status, body);
            return Err(EmailError::Rejected(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}
