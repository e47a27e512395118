use crate::shared::usecase::UseCase;
use fee_reminder_domain::{HistoryEntryDraft, ReminderHistoryEntry};
use fee_reminder_infra::ReminderContext;

/// Appends one attempt to the reminder history
#[derive(Debug)]
pub struct RecordHistoryUseCase {
    pub draft: HistoryEntryDraft,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for RecordHistoryUseCase {
    type Response = ReminderHistoryEntry;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let entry = ReminderHistoryEntry::from_draft(self.draft.clone(), ctx.sys.get_timestamp_millis());

        ctx.repos
            .reminder_history
            .insert(&entry)
            .await
            .map(|_| entry)
            .map_err(|_| UseCaseErrors::StorageError)
    }
}
