mod client;
pub mod date;
mod history;
mod message;
mod pre_due;
mod query;
mod run;
mod shared;
mod slot;

pub use client::{Channel, Client, MembershipStatus, ReminderPreferences};
pub use history::{
    ChannelOutcome, ClientSnapshot, HistoryEntryDraft, HistoryMetadata, HistoryStatus,
    ReminderChannel, ReminderHistoryEntry, ReminderKind, SkipReason,
};
pub use message::{MessageSettings, ReminderMessage};
pub use pre_due::{days_until, PreDueOffsets, PreDueOffsetsError};
pub use query::{HistoryQuery, Page};
pub use run::{DispatchReason, RunResult};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use slot::{resolve_slot, DayRange, PaymentSlot, SlotId, SlotTable, SlotTableError};
