use super::IClientRepo;
use crate::repos::shared::inmemory_repo::*;
use fee_reminder_domain::{Client, ID};

pub struct InMemoryClientRepo {
    clients: std::sync::Mutex<Vec<Client>>,
}

impl InMemoryClientRepo {
    pub fn new() -> Self {
        Self {
            clients: std::sync::Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IClientRepo for InMemoryClientRepo {
    async fn insert(&self, client: &Client) -> anyhow::Result<()> {
        insert(client, &self.clients);
        Ok(())
    }

    async fn save(&self, client: &Client) -> anyhow::Result<()> {
        save(client, &self.clients);
        Ok(())
    }

    async fn find(&self, client_id: &ID) -> anyhow::Result<Option<Client>> {
        Ok(find(client_id, &self.clients))
    }

    async fn delete(&self, client_id: &ID) -> anyhow::Result<Option<Client>> {
        Ok(delete(client_id, &self.clients))
    }

    async fn find_active_with_due_date(&self) -> anyhow::Result<Vec<Client>> {
        Ok(find_by(&self.clients, |c| c.should_receive_reminders()))
    }

    async fn update_last_reminder_sent(&self, client_id: &ID, timestamp: i64) -> anyhow::Result<()> {
        if update_one(client_id, &self.clients, |c| {
            c.last_reminder_sent = Some(timestamp)
        }) {
            Ok(())
        } else {
            Err(anyhow::Error::msg(format!("Client {} not found", client_id)))
        }
    }
}
