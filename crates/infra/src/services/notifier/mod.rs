mod inmemory;
mod webhook;

pub use inmemory::{InMemoryNotifier, SentMessage};
pub use webhook::WebhookNotifier;

use fee_reminder_domain::Channel;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierReceipt {
    /// Provider id of the delivered message, if the provider returned one
    pub message_id: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("The {0} channel is not configured")]
    ChannelDisabled(Channel),
    #[error("Invalid address: `{0}`")]
    InvalidAddress(String),
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Delivers a single rendered message over one channel
#[async_trait::async_trait]
pub trait INotifier: Send + Sync {
    async fn send(
        &self,
        channel: Channel,
        address: &str,
        subject: &str,
        body: &str,
    ) -> Result<NotifierReceipt, TransportError>;
}
