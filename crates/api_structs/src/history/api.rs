use crate::dtos::ReminderHistoryEntryDTO;
use fee_reminder_domain::{Page, ReminderHistoryEntry, ID};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderHistoryEntryResponse {
    pub entry: ReminderHistoryEntryDTO,
}

impl ReminderHistoryEntryResponse {
    pub fn new(entry: ReminderHistoryEntry) -> Self {
        Self {
            entry: ReminderHistoryEntryDTO::new(entry),
        }
    }
}

pub mod get_history_entry {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub entry_id: ID,
    }

    pub type APIResponse = ReminderHistoryEntryResponse;
}

pub mod query_history {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        pub client_id: Option<ID>,
        pub status: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub channel: Option<String>,
        /// Inclusive lower bound on when the entry was created, in millis
        pub start_ts: Option<i64>,
        /// Inclusive upper bound on when the entry was created, in millis
        pub end_ts: Option<i64>,
        pub search: Option<String>,
        pub page: Option<i64>,
        pub per_page: Option<i64>,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub items: Vec<ReminderHistoryEntryDTO>,
        pub total: i64,
        pub page: i64,
        pub per_page: i64,
        pub total_pages: i64,
    }

    impl APIResponse {
        pub fn new(page: Page<ReminderHistoryEntry>) -> Self {
            let page = page.map(ReminderHistoryEntryDTO::new);
            Self {
                items: page.items,
                total: page.total,
                page: page.page,
                per_page: page.per_page,
                total_pages: page.total_pages,
            }
        }
    }
}
