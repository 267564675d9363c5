use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use super::{MailError, Mailer, OutboundEmail};

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Posts messages to a Resend-compatible JSON API on a background task.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl std::fmt::Debug for HttpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailer")
            .field("endpoint", &self.endpoint)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl HttpMailer {
    pub fn new(endpoint: &str, api_key: &str, from: &str) -> Result<Self, MailError> {
        let client = Client::builder()
            .user_agent("zuhaush/0.1 (+reqwest)")
            .tcp_nodelay(true)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| MailError::Transport(format!("build client failed: {err}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }

    async fn deliver(&self, email: OutboundEmail) -> Result<(), MailError> {
        let payload = SendEmailRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| MailError::Transport(format!("send failed: {err}")))?;

        let status = response.status();
        if status.is_success() {
            info!(to = %email.to, subject = %email.subject, "mail delivered");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MailError::Transport(format!("HTTP {status}: {body}")))
        }
    }
}

impl Mailer for HttpMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| MailError::NoRuntime)?;
        let mailer = self.clone();
        runtime.spawn(async move {
            let to = email.to.clone();
            if let Err(err) = mailer.deliver(email).await {
                warn!(%to, error = %err, "mail delivery failed");
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_outside_runtime_is_rejected() {
        let mailer = HttpMailer::new("https://mail.invalid/emails", "key", "noreply@zuhaush.test")
            .expect("client builds");
        let outcome = mailer.send(OutboundEmail {
            to: "a@x.io".to_string(),
            subject: "s".to_string(),
            text: "t".to_string(),
            html: "h".to_string(),
        });
        assert!(matches!(outcome, Err(MailError::NoRuntime)));
    }

    #[test]
    fn payload_targets_single_recipient() {
        let payload = SendEmailRequest {
            from: "noreply@zuhaush.test",
            to: ["a@x.io"],
            subject: "Code",
            html: "<b>1</b>",
            text: "1",
        };
        let value = serde_json::to_value(&payload).expect("serializes");
        assert_eq!(value["to"], serde_json::json!(["a@x.io"]));
    }
}
