use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Notifier;
use crate::config::SmtpSettings;
use crate::error::NotifyError;

pub const ENV_SENDER_EMAIL: &str = "SENDER_EMAIL";
pub const ENV_SENDER_PASSWORD: &str = "SENDER_APP_PASSWORD";

/// SMTP sender for HTML digests. Port 465 uses implicit TLS, anything else
/// STARTTLS.
pub struct EmailSender {
    smtp: SmtpSettings,
    sender: Option<String>,
    password: Option<String>,
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl EmailSender {
    pub fn new(smtp: SmtpSettings, sender: Option<String>, password: Option<String>) -> Self {
        Self {
            smtp,
            sender: non_blank(sender),
            password: non_blank(password),
        }
    }

    /// Credentials come from SENDER_EMAIL / SENDER_APP_PASSWORD. Missing
    /// values are only reported when a delivery is attempted.
    pub fn from_env(smtp: &SmtpSettings) -> Self {
        Self::new(
            smtp.clone(),
            std::env::var(ENV_SENDER_EMAIL).ok(),
            std::env::var(ENV_SENDER_PASSWORD).ok(),
        )
    }

    pub fn has_credentials(&self) -> bool {
        self.sender.is_some() && self.password.is_some()
    }

    fn credentials(&self) -> Result<(&str, &str), NotifyError> {
        let sender = self
            .sender
            .as_deref()
            .ok_or(NotifyError::MissingCredentials(ENV_SENDER_EMAIL))?;
        let password = self
            .password
            .as_deref()
            .ok_or(NotifyError::MissingCredentials(ENV_SENDER_PASSWORD))?;
        Ok((sender, password))
    }

    /// Build the MIME message without touching the network.
    pub fn build_message(&self, subject: &str, body: &str, recipient: &str) -> Result<Message, NotifyError> {
        let (sender, _) = self.credentials()?;
        let from = parse_mailbox(sender)?;
        let to = parse_mailbox(recipient)?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    fn transport(&self, user: &str, pass: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let builder = if self.smtp.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.host)
        };
        let builder = builder.map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(builder
            .port(self.smtp.port)
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .build())
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, NotifyError> {
    addr.trim()
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: addr.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl Notifier for EmailSender {
    async fn deliver(&self, subject: &str, body: &str, recipient: &str) -> Result<(), NotifyError> {
        let (user, pass) = self.credentials()?;
        let msg = self.build_message(subject, body, recipient)?;
        let mailer = self.transport(user, pass)?;

        mailer
            .send(msg)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        tracing::info!(target: "notify", %recipient, "digest sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_count_as_missing() {
        let s = EmailSender::new(SmtpSettings::default(), Some("  ".into()), Some("pw".into()));
        assert!(!s.has_credentials());
        assert_eq!(
            s.build_message("s", "b", "to@example.com").unwrap_err(),
            NotifyError::MissingCredentials(ENV_SENDER_EMAIL)
        );
    }

    #[test]
    fn message_is_html_and_addressed() {
        let s = EmailSender::new(
            SmtpSettings::default(),
            Some("bot@example.com".into()),
            Some("pw".into()),
        );
        let msg = s
            .build_message("Notes for: X", "<p>hi</p>", "me@example.com")
            .unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("Subject: Notes for: X"));
        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("Content-Type: text/html"));
    }

    #[test]
    fn bad_recipient_is_reported() {
        let s = EmailSender::new(
            SmtpSettings::default(),
            Some("bot@example.com".into()),
            Some("pw".into()),
        );
        assert!(matches!(
            s.build_message("s", "b", "not an address"),
            Err(NotifyError::InvalidAddress { .. })
        ));
    }
}
