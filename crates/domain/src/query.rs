use crate::{
    history::{HistoryStatus, ReminderChannel, ReminderHistoryEntry, ReminderKind},
    shared::entity::ID,
};

/// Filters for reading the reminder history. All filters are optional
/// and combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub client_id: Option<ID>,
    pub status: Option<HistoryStatus>,
    pub kind: Option<ReminderKind>,
    pub channel: Option<ReminderChannel>,
    /// Inclusive lower bound on `created`
    pub start_ts: Option<i64>,
    /// Inclusive upper bound on `created`
    pub end_ts: Option<i64>,
    pub search: Option<String>,
    /// 1-based
    pub page: i64,
    pub per_page: i64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            client_id: None,
            status: None,
            kind: None,
            channel: None,
            start_ts: None,
            end_ts: None,
            search: None,
            page: 1,
            per_page: 10,
        }
    }
}

impl HistoryQuery {
    /// Number of entries before the requested page, `None` on overflow
    pub fn checked_skip(&self) -> Option<i64> {
        (self.page.max(1) - 1).checked_mul(self.per_page.max(0))
    }

    pub fn skip(&self) -> i64 {
        self.checked_skip().unwrap_or(i64::MAX)
    }

    pub fn matches(&self, entry: &ReminderHistoryEntry) -> bool {
        self.client_id.map_or(true, |id| entry.client_id == id)
            && self.status.map_or(true, |s| entry.status == s)
            && self.kind.map_or(true, |k| entry.kind == k)
            && self.channel.map_or(true, |c| entry.channel == Some(c))
            && self.start_ts.map_or(true, |ts| entry.created >= ts)
            && self.end_ts.map_or(true, |ts| entry.created <= ts)
            && self
                .search
                .as_ref()
                .map_or(true, |search| entry.matches_search(search))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_skip_and_pages() {
        let query = HistoryQuery {
            page: 3,
            per_page: 20,
            ..Default::default()
        };
        assert_eq!(query.skip(), 40);

        let query = HistoryQuery {
            page: 0,
            ..Default::default()
        };
        assert_eq!(query.skip(), 0);

        let query = HistoryQuery {
            page: i64::MAX / 5,
            per_page: 10,
            ..Default::default()
        };
        assert_eq!(query.checked_skip(), None);
        assert_eq!(query.skip(), i64::MAX);

        let page: Page<()> = Page::new(vec![], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        let page: Page<()> = Page::new(vec![], 0, 1, 20);
        assert_eq!(page.total_pages, 0);
    }
}
