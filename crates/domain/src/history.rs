use crate::{
    client::{Channel, Client},
    shared::entity::{Entity, ID},
    slot::SlotId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Success,
    Failed,
    Skipped,
}

impl HistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl Display for HistoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(format!("Unknown history status: {}", s)),
        }
    }
}

/// Which channels a reminder attempt went out on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderChannel {
    Email,
    Sms,
    Both,
}

impl ReminderChannel {
    /// `None` when no channel is given
    pub fn from_channels(channels: &[Channel]) -> Option<Self> {
        let email = channels.contains(&Channel::Email);
        let sms = channels.contains(&Channel::Sms);
        match (email, sms) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Email),
            (false, true) => Some(Self::Sms),
            (false, false) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Both => "both",
        }
    }
}

impl FromStr for ReminderChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "both" => Ok(Self::Both),
            _ => Err(format!("Unknown reminder channel: {}", s)),
        }
    }
}

/// The trigger that produced a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Slot,
    PreDue,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slot => "slot",
            Self::PreDue => "pre_due",
        }
    }
}

impl FromStr for ReminderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slot" => Ok(Self::Slot),
            "pre_due" => Ok(Self::PreDue),
            _ => Err(format!("Unknown reminder kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InactiveMembership,
    ClientNotFound,
    NoChannelsEnabled,
}

/// Client details at the time of the attempt, so that the audit trail
/// survives later edits or deletion of the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSnapshot {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub fee_due_date: NaiveDate,
}

impl From<&Client> for ClientSnapshot {
    fn from(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            fee_due_date: client.fee_due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelOutcome {
    pub channel: Channel,
    pub delivered: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn delivered(channel: Channel, message_id: Option<String>) -> Self {
        Self {
            channel,
            delivered: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(channel: Channel, error: String) -> Self {
        Self {
            channel,
            delivered: false,
            message_id: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMetadata {
    pub run_id: Option<ID>,
    pub slot: Option<SlotId>,
    pub payment_period: Option<String>,
    pub due_period: Option<String>,
    pub days_before_due: Option<u32>,
    #[serde(default)]
    pub channels: Vec<ChannelOutcome>,
    pub error_details: Option<String>,
    pub skip_reason: Option<SkipReason>,
    #[serde(default)]
    pub last_reminder_update_failed: bool,
}

/// A `ReminderHistoryEntry` before it has been stored
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntryDraft {
    pub client_id: ID,
    pub client_details: ClientSnapshot,
    pub kind: ReminderKind,
    /// `None` when the attempt was skipped before any channel was chosen
    pub channel: Option<ReminderChannel>,
    pub status: HistoryStatus,
    pub title: String,
    pub description: String,
    pub metadata: HistoryMetadata,
}

impl HistoryEntryDraft {
    pub fn new(client: &Client, kind: ReminderKind, status: HistoryStatus, description: String) -> Self {
        Self {
            client_id: client.id,
            client_details: client.into(),
            kind,
            channel: None,
            status,
            title: format!("Fee Reminder - {}", client.name),
            description,
            metadata: Default::default(),
        }
    }
}

/// Immutable audit record of one reminder attempt for one client
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderHistoryEntry {
    pub id: ID,
    pub client_id: ID,
    pub client_details: ClientSnapshot,
    pub kind: ReminderKind,
    pub channel: Option<ReminderChannel>,
    pub status: HistoryStatus,
    pub title: String,
    pub description: String,
    pub metadata: HistoryMetadata,
    pub created: i64,
}

impl ReminderHistoryEntry {
    pub fn from_draft(draft: HistoryEntryDraft, created: i64) -> Self {
        Self {
            id: Default::default(),
            client_id: draft.client_id,
            client_details: draft.client_details,
            kind: draft.kind,
            channel: draft.channel,
            status: draft.status,
            title: draft.title,
            description: draft.description,
            metadata: draft.metadata,
            created,
        }
    }

    /// Case insensitive match against the searchable text fields
    pub fn matches_search(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        [
            &self.title,
            &self.description,
            &self.client_details.name,
            &self.client_details.email,
            &self.client_details.phone,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Entity for ReminderHistoryEntry {
    fn id(&self) -> &ID {
        &self.id
    }
}
