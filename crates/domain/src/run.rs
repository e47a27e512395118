use crate::{history::HistoryStatus, shared::entity::ID, slot::PaymentSlot};

/// Why a dispatch run is sending reminders
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchReason {
    /// The pay window of the slot is open
    Slot(PaymentSlot),
    /// The due date is this many days away
    PreDue { days_before_due: u32 },
}

impl DispatchReason {
    /// Only slot reminders mark the client as reminded for the window.
    /// Pre-due reminders are deduplicated through the history instead.
    pub fn updates_last_reminder(&self) -> bool {
        matches!(self, Self::Slot(_))
    }
}

/// Aggregated outcome of one dispatch run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub run_id: ID,
    pub successes: usize,
    pub failures: usize,
    pub skipped: usize,
    /// Clients that were never started because the run deadline passed
    pub not_attempted: usize,
    pub deadline_exceeded: bool,
}

impl RunResult {
    pub fn new(run_id: ID) -> Self {
        Self {
            run_id,
            successes: 0,
            failures: 0,
            skipped: 0,
            not_attempted: 0,
            deadline_exceeded: false,
        }
    }

    pub fn add(&mut self, status: HistoryStatus) {
        match status {
            HistoryStatus::Success => self.successes += 1,
            HistoryStatus::Failed => self.failures += 1,
            HistoryStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn add_not_attempted(&mut self) {
        self.not_attempted += 1;
        self.deadline_exceeded = true;
    }

    pub fn attempted(&self) -> usize {
        self.successes + self.failures + self.skipped
    }

    /// Merges the counts of another run into this one
    pub fn merge(&mut self, other: &RunResult) {
        self.successes += other.successes;
        self.failures += other.failures;
        self.skipped += other.skipped;
        self.not_attempted += other.not_attempted;
        self.deadline_exceeded |= other.deadline_exceeded;
    }
}
