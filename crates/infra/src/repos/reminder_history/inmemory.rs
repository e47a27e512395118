use super::IReminderHistoryRepo;
use crate::repos::shared::inmemory_repo::*;
use fee_reminder_domain::{
    HistoryQuery, HistoryStatus, Page, ReminderHistoryEntry, ReminderKind, ID,
};

pub struct InMemoryReminderHistoryRepo {
    entries: std::sync::Mutex<Vec<ReminderHistoryEntry>>,
}

impl InMemoryReminderHistoryRepo {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IReminderHistoryRepo for InMemoryReminderHistoryRepo {
    async fn insert(&self, entry: &ReminderHistoryEntry) -> anyhow::Result<()> {
        insert(entry, &self.entries);
        Ok(())
    }

    async fn find(&self, entry_id: &ID) -> anyhow::Result<Option<ReminderHistoryEntry>> {
        Ok(find(entry_id, &self.entries))
    }

    async fn find_by_query(&self, query: &HistoryQuery) -> anyhow::Result<Page<ReminderHistoryEntry>> {
        let mut entries = find_by(&self.entries, |e| query.matches(e));
        // Stable sort keeps insertion order for entries created at the same millisecond
        entries.sort_by(|e1, e2| e2.created.cmp(&e1.created));

        let total = entries.len() as i64;
        let items = entries
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.per_page.max(0) as usize)
            .collect();
        Ok(Page::new(items, total, query.page, query.per_page))
    }

    async fn exists_since(
        &self,
        client_id: &ID,
        kind: ReminderKind,
        status: HistoryStatus,
        since: i64,
    ) -> anyhow::Result<bool> {
        let matches = find_by(&self.entries, |e| {
            e.client_id == *client_id && e.kind == kind && e.status == status && e.created >= since
        });
        Ok(!matches.is_empty())
    }
}
