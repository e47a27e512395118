use super::{
    dispatch_reminders::DispatchRemindersUseCase,
    select_eligible_clients::{self, SelectEligibleClientsUseCase},
};
use crate::shared::usecase::{execute, UseCase};
use chrono::Datelike;
use fee_reminder_domain::{date::local_date, DispatchReason, PaymentSlot, RunResult, ID};
use fee_reminder_infra::ReminderContext;
use tokio::time::Instant;
use tracing::info;

/// Sends the reminders for the payment slot whose pay window contains today
#[derive(Debug)]
pub struct SendSlotRemindersUseCase {
    pub run_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum SlotRunOutcome {
    /// Today is outside every pay window
    NoActiveWindow,
    Completed(PaymentSlot, RunResult),
}

#[derive(Debug)]
pub enum UseCaseErrors {
    StoreUnavailable(String),
}

impl From<select_eligible_clients::UseCaseErrors> for UseCaseErrors {
    fn from(e: select_eligible_clients::UseCaseErrors) -> Self {
        match e {
            select_eligible_clients::UseCaseErrors::StoreUnavailable(msg) => {
                Self::StoreUnavailable(msg)
            }
        }
    }
}

#[async_trait::async_trait]
impl UseCase for SendSlotRemindersUseCase {
    type Response = SlotRunOutcome;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let now = ctx.sys.get_timestamp_millis();
        let today = local_date(now, &ctx.config.timezone);
        let slot = match ctx.config.slots.resolve_slot(today.day()) {
            Some(slot) => slot,
            None => {
                info!("No payment window today: {}, no reminders to send", today);
                return Ok(SlotRunOutcome::NoActiveWindow);
            }
        };

        let clients = execute(SelectEligibleClientsUseCase { slot, as_of: now }, ctx).await?;
        info!(
            "Sending {} reminders to {} clients with due dates in the {} window",
            slot.id,
            clients.len(),
            slot.due_period()
        );

        let usecase = DispatchRemindersUseCase {
            run_id: self.run_id,
            clients,
            reason: DispatchReason::Slot(slot),
            deadline: Instant::now() + ctx.config.max_run_duration,
        };
        let result = match execute(usecase, ctx).await {
            Ok(result) => result,
            Err(e) => match e {},
        };

        Ok(SlotRunOutcome::Completed(slot, result))
    }
}
