use super::{INotifier, NotifierReceipt, TransportError};
use crate::config::NotifierSettings;
use fee_reminder_domain::Channel;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

const API_KEY_HEADER: &str = "x-notifier-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    channel: Channel,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageResponse {
    #[serde(default)]
    message_id: Option<String>,
}

/// Delivers messages by posting them to an email or SMS gateway
pub struct WebhookNotifier {
    client: Client,
    settings: NotifierSettings,
}

impl WebhookNotifier {
    pub fn new(settings: NotifierSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn url(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Email => self.settings.email_webhook_url.as_deref(),
            Channel::Sms => self.settings.sms_webhook_url.as_deref(),
        }
    }
}

#[async_trait::async_trait]
impl INotifier for WebhookNotifier {
    async fn send(
        &self,
        channel: Channel,
        address: &str,
        subject: &str,
        body: &str,
    ) -> Result<NotifierReceipt, TransportError> {
        let url = self
            .url(channel)
            .ok_or(TransportError::ChannelDisabled(channel))?;
        let address = address.trim();
        if address.is_empty() {
            return Err(TransportError::InvalidAddress(address.to_string()));
        }

        let mut req = self.client.post(url).json(&SendMessageRequest {
            channel,
            to: address,
            subject,
            body,
        });
        if let Some(key) = &self.settings.api_key {
            req = req.header(API_KEY_HEADER, key);
        }

        let res = req.send().await.map_err(|e| {
            error!(
                "[Network Error] {} gateway request failed. Error message: {:?}",
                channel, e
            );
            TransportError::Provider(e.to_string())
        })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            error!(
                "[Unexpected Response] {} gateway returned {}. Body: {}",
                channel, status, text
            );
            return Err(TransportError::Provider(format!(
                "Gateway returned status {}",
                status
            )));
        }

        // A delivered message without a parsable receipt is still delivered
        let message_id = res
            .json::<SendMessageResponse>()
            .await
            .ok()
            .and_then(|r| r.message_id);
        Ok(NotifierReceipt { message_id })
    }
}
