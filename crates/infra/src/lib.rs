mod config;
mod repos;
mod services;
mod system;

pub use config::{Config, ConfigError, NotifierSettings, PreDueSettings};
pub use repos::{IClientRepo, IReminderHistoryRepo, Repos};
pub use services::*;
use std::sync::Arc;
pub use system::{ISys, RealSys, StaticTimeSys};
use tracing::warn;

#[derive(Clone)]
pub struct ReminderContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub notifier: Arc<dyn INotifier>,
}

impl ReminderContext {
    /// Context backed entirely by memory with the default configuration.
    /// Messages are recorded by an `InMemoryNotifier` instead of being sent.
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::default(),
            sys: Arc::new(RealSys {}),
            notifier: Arc::new(InMemoryNotifier::new()),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<ReminderContext> {
    let config = Config::new()?;

    let repos = match std::env::var("DATABASE_URL") {
        Ok(connection_string) if !connection_string.trim().is_empty() => {
            Repos::create_postgres(&connection_string).await?
        }
        _ => {
            warn!("DATABASE_URL is not set, clients and reminder history are kept in memory.");
            Repos::create_inmemory()
        }
    };

    if config.notifier.email_webhook_url.is_none() && config.notifier.sms_webhook_url.is_none() {
        warn!("Neither EMAIL_WEBHOOK_URL nor SMS_WEBHOOK_URL is set, every reminder will fail.");
    }
    let notifier = Arc::new(WebhookNotifier::new(config.notifier.clone()));

    Ok(ReminderContext {
        repos,
        config,
        sys: Arc::new(RealSys {}),
        notifier,
    })
}
