use fee_reminder_domain::{
    ClientSnapshot, HistoryMetadata, HistoryStatus, ReminderChannel, ReminderHistoryEntry,
    ReminderKind, ID,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReminderHistoryEntryDTO {
    pub id: ID,
    pub client_id: ID,
    pub client_details: ClientSnapshot,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    pub channel: Option<ReminderChannel>,
    pub status: HistoryStatus,
    pub title: String,
    pub description: String,
    pub metadata: HistoryMetadata,
    pub created: i64,
}

impl ReminderHistoryEntryDTO {
    pub fn new(entry: ReminderHistoryEntry) -> Self {
        Self {
            id: entry.id,
            client_id: entry.client_id,
            client_details: entry.client_details,
            kind: entry.kind,
            channel: entry.channel,
            status: entry.status,
            title: entry.title,
            description: entry.description,
            metadata: entry.metadata,
            created: entry.created,
        }
    }
}
