mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderHistoryRepo;
pub use postgres::PostgresReminderHistoryRepo;

use fee_reminder_domain::{
    HistoryQuery, HistoryStatus, Page, ReminderHistoryEntry, ReminderKind, ID,
};

/// Append-only store of `ReminderHistoryEntry`s. There is deliberately
/// no update operation.
#[async_trait::async_trait]
pub trait IReminderHistoryRepo: Send + Sync {
    async fn insert(&self, entry: &ReminderHistoryEntry) -> anyhow::Result<()>;
    async fn find(&self, entry_id: &ID) -> anyhow::Result<Option<ReminderHistoryEntry>>;
    /// Newest entries first
    async fn find_by_query(&self, query: &HistoryQuery) -> anyhow::Result<Page<ReminderHistoryEntry>>;
    /// Whether the client has an entry of the given kind and status created at or after `since`
    async fn exists_since(
        &self,
        client_id: &ID,
        kind: ReminderKind,
        status: HistoryStatus,
        since: i64,
    ) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use crate::ReminderContext;
    use chrono::NaiveDate;
    use fee_reminder_domain::{
        Client, HistoryEntryDraft, HistoryQuery, HistoryStatus, ReminderChannel,
        ReminderHistoryEntry, ReminderKind,
    };

    fn client(name: &str) -> Client {
        Client::new(
            name,
            &format!("{}@example.com", name),
            "+4700000000",
            100.0,
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
        )
    }

    fn entry(client: &Client, status: HistoryStatus, created: i64) -> ReminderHistoryEntry {
        let mut draft = HistoryEntryDraft::new(client, ReminderKind::Slot, status, "desc".into());
        draft.channel = Some(ReminderChannel::Email);
        ReminderHistoryEntry::from_draft(draft, created)
    }

    #[tokio::test]
    async fn insert_and_find() {
        let ctx = ReminderContext::create_inmemory();
        let entry = entry(&client("per"), HistoryStatus::Success, 10);
        ctx.repos.reminder_history.insert(&entry).await.unwrap();

        let found = ctx.repos.reminder_history.find(&entry.id).await.unwrap();
        assert_eq!(found, Some(entry));
        assert!(ctx
            .repos
            .reminder_history
            .find(&Default::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn query_filters_sorts_and_paginates() {
        let ctx = ReminderContext::create_inmemory();
        let per = client("per");
        let pal = client("pal");
        let entries = vec![
            entry(&per, HistoryStatus::Success, 10),
            entry(&per, HistoryStatus::Failed, 20),
            entry(&pal, HistoryStatus::Success, 30),
            entry(&pal, HistoryStatus::Skipped, 40),
            entry(&per, HistoryStatus::Success, 50),
        ];
        for e in &entries {
            ctx.repos.reminder_history.insert(e).await.unwrap();
        }

        let page = ctx
            .repos
            .reminder_history
            .find_by_query(&HistoryQuery {
                per_page: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(
            page.items.iter().map(|e| e.created).collect::<Vec<_>>(),
            vec![50, 40]
        );

        let page = ctx
            .repos
            .reminder_history
            .find_by_query(&HistoryQuery {
                page: 3,
                per_page: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].created, 10);

        let page = ctx
            .repos
            .reminder_history
            .find_by_query(&HistoryQuery {
                client_id: Some(per.id),
                status: Some(HistoryStatus::Success),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let page = ctx
            .repos
            .reminder_history
            .find_by_query(&HistoryQuery {
                start_ts: Some(20),
                end_ts: Some(40),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);

        let page = ctx
            .repos
            .reminder_history
            .find_by_query(&HistoryQuery {
                search: Some("PAL@".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn exists_since() {
        let ctx = ReminderContext::create_inmemory();
        let per = client("per");
        ctx.repos
            .reminder_history
            .insert(&entry(&per, HistoryStatus::Success, 100))
            .await
            .unwrap();

        let repo = &ctx.repos.reminder_history;
        assert!(repo
            .exists_since(&per.id, ReminderKind::Slot, HistoryStatus::Success, 100)
            .await
            .unwrap());
        assert!(!repo
            .exists_since(&per.id, ReminderKind::Slot, HistoryStatus::Success, 101)
            .await
            .unwrap());
        assert!(!repo
            .exists_since(&per.id, ReminderKind::PreDue, HistoryStatus::Success, 0)
            .await
            .unwrap());
        assert!(!repo
            .exists_since(&per.id, ReminderKind::Slot, HistoryStatus::Failed, 0)
            .await
            .unwrap());
    }
}
