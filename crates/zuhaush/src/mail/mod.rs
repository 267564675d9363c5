//! Outbound e-mail. Delivery is a collaborator behind [`Mailer`] so services never block on
//! the mail provider.

mod http;
pub mod templates;

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::MailConfig;

pub use http::HttpMailer;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Mail transport abstraction.
pub trait Mailer: Send + Sync {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

/// Mail dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error("no async runtime available to deliver mail")]
    NoRuntime,
}

/// Writes messages to the tracing log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, "mail delivery disabled; message logged");
        debug!(body = %email.text, "mail body");
        Ok(())
    }
}

/// Keeps every message in memory; handy for flows that need to read a code back.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutboundEmail>>,
}

impl MemoryMailer {
    pub fn outbox(&self) -> Vec<OutboundEmail> {
        self.outbox
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Most recent message addressed to `to`.
    pub fn last_to(&self, to: &str) -> Option<OutboundEmail> {
        self.outbox().into_iter().rev().find(|email| email.to == to)
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let mut guard = self
            .outbox
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".to_string()))?;
        guard.push(email);
        Ok(())
    }
}

/// HTTP delivery when an API key is configured, log-only otherwise.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.api_key.as_deref() {
        Some(api_key) => {
            let mailer = HttpMailer::new(&config.api_url, api_key, &config.from)?;
            Ok(Arc::new(mailer))
        }
        None => Ok(Arc::new(LogMailer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> OutboundEmail {
        OutboundEmail {
            to: to.to_string(),
            subject: "Hello".to_string(),
            text: "Hi".to_string(),
            html: "<p>Hi</p>".to_string(),
        }
    }

    #[test]
    fn memory_mailer_returns_latest_message_per_recipient() {
        let mailer = MemoryMailer::default();
        mailer.send(message("a@x.io")).expect("send");
        let mut second = message("a@x.io");
        second.subject = "Again".to_string();
        mailer.send(second).expect("send");
        mailer.send(message("b@x.io")).expect("send");

        assert_eq!(mailer.outbox().len(), 3);
        assert_eq!(mailer.last_to("a@x.io").expect("present").subject, "Again");
        assert!(mailer.last_to("c@x.io").is_none());
    }

    #[test]
    fn config_without_key_falls_back_to_logging() {
        let config = MailConfig {
            api_url: "https://mail.invalid/emails".to_string(),
            api_key: None,
            from: "noreply@zuhaush.test".to_string(),
        };
        let mailer = from_config(&config).expect("log mailer builds");
        assert!(mailer.send(message("a@x.io")).is_ok());
    }
}
