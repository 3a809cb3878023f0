//! Notifier: delivers the assembled digest to the recipient.

pub mod email;

use crate::error::NotifyError;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// One attempt, no automatic retry.
    async fn deliver(&self, subject: &str, body: &str, recipient: &str) -> Result<(), NotifyError>;
    fn name(&self) -> &'static str;
}

pub use email::EmailSender;
