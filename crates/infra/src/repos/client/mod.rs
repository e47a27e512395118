mod inmemory;
mod postgres;

pub use inmemory::InMemoryClientRepo;
pub use postgres::PostgresClientRepo;

use fee_reminder_domain::{Client, ID};

/// Access to the client store. Client records are maintained by the
/// host application, the reminder engine reads them and only ever
/// writes `last_reminder_sent`.
#[async_trait::async_trait]
pub trait IClientRepo: Send + Sync {
    async fn insert(&self, client: &Client) -> anyhow::Result<()>;
    async fn save(&self, client: &Client) -> anyhow::Result<()>;
    async fn find(&self, client_id: &ID) -> anyhow::Result<Option<Client>>;
    async fn delete(&self, client_id: &ID) -> anyhow::Result<Option<Client>>;
    /// All `Active` clients that have a fee due date
    async fn find_active_with_due_date(&self) -> anyhow::Result<Vec<Client>>;
    async fn update_last_reminder_sent(&self, client_id: &ID, timestamp: i64)
        -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use crate::ReminderContext;
    use chrono::NaiveDate;
    use fee_reminder_domain::{Client, MembershipStatus};

    fn client(name: &str, day: u32) -> Client {
        Client::new(
            name,
            &format!("{}@example.com", name),
            "+4712345678",
            500.0,
            NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
        )
    }

    #[tokio::test]
    async fn create_find_and_delete() {
        let ctx = ReminderContext::create_inmemory();
        let client = client("ola", 5);

        assert!(ctx.repos.clients.insert(&client).await.is_ok());
        let found = ctx.repos.clients.find(&client.id).await.unwrap();
        assert_eq!(found, Some(client.clone()));

        let deleted = ctx.repos.clients.delete(&client.id).await.unwrap();
        assert_eq!(deleted, Some(client.clone()));
        assert!(ctx.repos.clients.find(&client.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn finds_only_active_clients() {
        let ctx = ReminderContext::create_inmemory();
        let active = client("active", 3);
        let mut inactive = client("inactive", 3);
        inactive.membership_status = MembershipStatus::Inactive;
        let mut suspended = client("suspended", 3);
        suspended.membership_status = MembershipStatus::Suspended;
        for c in &[&active, &inactive, &suspended] {
            ctx.repos.clients.insert(c).await.unwrap();
        }

        let found = ctx.repos.clients.find_active_with_due_date().await.unwrap();
        assert_eq!(found, vec![active]);
    }

    #[tokio::test]
    async fn updates_last_reminder_sent() {
        let ctx = ReminderContext::create_inmemory();
        let mut client = client("kari", 12);
        ctx.repos.clients.insert(&client).await.unwrap();

        ctx.repos
            .clients
            .update_last_reminder_sent(&client.id, 1000)
            .await
            .unwrap();
        let found = ctx.repos.clients.find(&client.id).await.unwrap().unwrap();
        assert_eq!(found.last_reminder_sent, Some(1000));

        client.name = "Kari".into();
        ctx.repos.clients.save(&client).await.unwrap();
        let found = ctx.repos.clients.find(&client.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Kari");

        // Unknown clients are reported
        assert!(ctx
            .repos
            .clients
            .update_last_reminder_sent(&Default::default(), 1000)
            .await
            .is_err());
    }
}
