use crate::shared::usecase::UseCase;
use chrono::Datelike;
use fee_reminder_domain::{date::local_date, Client, PaymentSlot};
use fee_reminder_infra::ReminderContext;

/// Finds the clients that should get a reminder for the given slot.
///
/// A client is eligible when it is `Active`, its due day lies in the due
/// window of the slot and it has not already been reminded during the pay
/// window of the current month.
#[derive(Debug)]
pub struct SelectEligibleClientsUseCase {
    pub slot: PaymentSlot,
    /// Timestamp in millis deciding which month's pay window is current
    pub as_of: i64,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    StoreUnavailable(String),
}

#[async_trait::async_trait]
impl UseCase for SelectEligibleClientsUseCase {
    type Response = Vec<Client>;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let clients = ctx
            .repos
            .clients
            .find_active_with_due_date()
            .await
            .map_err(|e| UseCaseErrors::StoreUnavailable(e.to_string()))?;

        let tz = &ctx.config.timezone;
        let today = local_date(self.as_of, tz);
        let (window_start, window_end) =
            self.slot
                .pay_window_bounds(today.year(), today.month(), tz);
        let reminded_this_window = |client: &Client| match client.last_reminder_sent {
            Some(ts) => ts >= window_start && ts < window_end,
            None => false,
        };

        let mut eligible = clients
            .into_iter()
            .filter(|c| c.should_receive_reminders())
            .filter(|c| self.slot.due_window.contains(c.due_day()))
            .filter(|c| !reminded_this_window(c))
            .collect::<Vec<_>>();
        eligible.sort_by(|c1, c2| (c1.due_day(), c1.id).cmp(&(c2.due_day(), c2.id)));

        Ok(eligible)
    }
}
