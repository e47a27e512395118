mod client;
mod reminder_history;
mod shared;

pub use client::IClientRepo;
use client::{InMemoryClientRepo, PostgresClientRepo};
pub use reminder_history::IReminderHistoryRepo;
use reminder_history::{InMemoryReminderHistoryRepo, PostgresReminderHistoryRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub clients: Arc<dyn IClientRepo>,
    pub reminder_history: Arc<dyn IReminderHistoryRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");

        info!("DB EXECUTING MIGRATION ...");
        sqlx::migrate!().run(&pool).await?;
        info!("DB EXECUTING MIGRATION ... [done]");

        Ok(Self {
            clients: Arc::new(PostgresClientRepo::new(pool.clone())),
            reminder_history: Arc::new(PostgresReminderHistoryRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            clients: Arc::new(InMemoryClientRepo::new()),
            reminder_history: Arc::new(InMemoryReminderHistoryRepo::new()),
        }
    }
}
