use super::{INotifier, NotifierReceipt, TransportError};
use fee_reminder_domain::Channel;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: Channel,
    pub address: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that records every message instead of delivering it.
/// Used when running locally and in tests.
pub struct InMemoryNotifier {
    sent: Mutex<Vec<SentMessage>>,
    failing_addresses: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(vec![]),
            failing_addresses: Mutex::new(HashSet::new()),
            delay: Mutex::new(None),
        }
    }

    /// Every send to `address` will fail with a provider error
    pub fn fail_for(&self, address: &str) {
        self.failing_addresses
            .lock()
            .unwrap()
            .insert(address.to_string());
    }

    /// Every send will wait this long before completing
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.address == address)
            .collect()
    }
}

impl Default for InMemoryNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl INotifier for InMemoryNotifier {
    async fn send(
        &self,
        channel: Channel,
        address: &str,
        subject: &str,
        body: &str,
    ) -> Result<NotifierReceipt, TransportError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if address.trim().is_empty() {
            return Err(TransportError::InvalidAddress(address.to_string()));
        }
        if self.failing_addresses.lock().unwrap().contains(address) {
            return Err(TransportError::Provider(format!(
                "Unable to deliver to {}",
                address
            )));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            channel,
            address: address.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(NotifierReceipt {
            message_id: Some(format!("inmemory-{}", sent.len())),
        })
    }
}
