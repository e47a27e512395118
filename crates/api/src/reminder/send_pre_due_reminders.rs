use super::dispatch_reminders::DispatchRemindersUseCase;
use crate::shared::usecase::{execute, UseCase};
use fee_reminder_domain::{
    date::{local_date, start_of_day_millis},
    Client, DispatchReason, HistoryStatus, ReminderKind, RunResult, ID,
};
use fee_reminder_infra::ReminderContext;
use std::collections::BTreeMap;
use tokio::time::Instant;
use tracing::info;

/// Reminds clients whose due date is a configured number of days away.
///
/// Unlike slot reminders these do not touch `last_reminder_sent`, a client
/// is instead skipped if it already got a pre-due reminder today.
#[derive(Debug)]
pub struct SendPreDueRemindersUseCase {
    pub run_id: ID,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    StoreUnavailable(String),
}

#[async_trait::async_trait]
impl UseCase for SendPreDueRemindersUseCase {
    type Response = RunResult;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        // One deadline for the whole run, across every offset group
        let deadline = Instant::now() + ctx.config.max_run_duration;
        let tz = &ctx.config.timezone;
        let today = local_date(ctx.sys.get_timestamp_millis(), tz);
        let start_of_today = start_of_day_millis(today, tz);

        let clients = ctx
            .repos
            .clients
            .find_active_with_due_date()
            .await
            .map_err(|e| UseCaseErrors::StoreUnavailable(e.to_string()))?;

        let offsets = &ctx.config.pre_due.offsets;
        let mut candidates: BTreeMap<u32, Vec<Client>> = BTreeMap::new();
        for client in clients {
            let days_before_due = match offsets.matching(today, client.fee_due_date) {
                Some(days) => days,
                None => continue,
            };
            let reminded_today = ctx
                .repos
                .reminder_history
                .exists_since(
                    &client.id,
                    ReminderKind::PreDue,
                    HistoryStatus::Success,
                    start_of_today,
                )
                .await
                .map_err(|e| UseCaseErrors::StoreUnavailable(e.to_string()))?;
            if !reminded_today {
                candidates.entry(days_before_due).or_default().push(client);
            }
        }

        let mut result = RunResult::new(self.run_id);
        // Closest due dates first
        for (days_before_due, mut clients) in candidates {
            clients.sort_by(|c1, c2| (c1.fee_due_date, c1.id).cmp(&(c2.fee_due_date, c2.id)));
            info!(
                "Sending {}-day pre-due reminders to {} clients",
                days_before_due,
                clients.len()
            );
            let usecase = DispatchRemindersUseCase {
                run_id: self.run_id,
                clients,
                reason: DispatchReason::PreDue { days_before_due },
                deadline,
            };
            match execute(usecase, ctx).await {
                Ok(run) => result.merge(&run),
                Err(e) => match e {},
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use fee_reminder_domain::{HistoryQuery, MembershipStatus};
    use fee_reminder_infra::{InMemoryNotifier, StaticTimeSys};
    use std::sync::Arc;
    use std::time::Duration;

    fn client(name: &str, due: NaiveDate) -> Client {
        Client::new(name, &format!("{}@example.com", name), "+919833333333", 2000.0, due)
    }

    #[actix_web::main]
    #[test]
    async fn reminds_clients_at_configured_offsets() {
        let mut ctx = ReminderContext::create_inmemory();
        let notifier = Arc::new(InMemoryNotifier::new());
        ctx.notifier = notifier.clone();
        // 2024-02-13 09:00 UTC
        let now = Utc
            .with_ymd_and_hms(2024, 2, 13, 9, 0, 0)
            .unwrap()
            .timestamp_millis();
        ctx.sys = Arc::new(StaticTimeSys::new(now));

        let in_7 = client("in7", NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());
        let in_3 = client("in3", NaiveDate::from_ymd_opt(2024, 2, 16).unwrap());
        let in_1 = client("in1", NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        let in_2 = client("in2", NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        let overdue = client("overdue", NaiveDate::from_ymd_opt(2024, 2, 12).unwrap());
        let mut inactive = client("inactive", NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        inactive.membership_status = MembershipStatus::Inactive;
        for c in &[&in_7, &in_3, &in_1, &in_2, &overdue, &inactive] {
            ctx.repos.clients.insert(c).await.unwrap();
        }

        let usecase = SendPreDueRemindersUseCase { run_id: ID::new() };
        let result = execute(usecase, &ctx).await.unwrap();
        assert_eq!(result.successes, 3);

        let subjects = |address: &str| {
            notifier
                .sent_to(address)
                .into_iter()
                .map(|m| m.subject)
                .collect::<Vec<_>>()
        };
        assert_eq!(
            subjects("in7@example.com"),
            vec!["Upcoming Fee Payment - 7 Days Reminder"]
        );
        assert_eq!(
            subjects("in3@example.com"),
            vec!["Important: Fee Payment Due in 3 Days"]
        );
        assert_eq!(
            subjects("in1@example.com"),
            vec!["URGENT: Fee Payment Due Tomorrow"]
        );
        assert!(subjects("in2@example.com").is_empty());
        assert!(subjects("overdue@example.com").is_empty());
        assert!(subjects("inactive@example.com").is_empty());

        // Pre-due reminders never mark the window as reminded
        let stored = ctx.repos.clients.find(&in_1.id).await.unwrap().unwrap();
        assert_eq!(stored.last_reminder_sent, None);

        // Running again the same day sends nothing new
        let usecase = SendPreDueRemindersUseCase { run_id: ID::new() };
        let result = execute(usecase, &ctx).await.unwrap();
        assert_eq!(result.attempted(), 0);
        assert_eq!(notifier.sent().len(), 3);
        let page = ctx
            .repos
            .reminder_history
            .find_by_query(&HistoryQuery {
                kind: Some(ReminderKind::PreDue),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn offset_groups_share_one_run_deadline() {
        let mut ctx = ReminderContext::create_inmemory();
        let notifier = Arc::new(InMemoryNotifier::new());
        ctx.notifier = notifier.clone();
        let now = Utc
            .with_ymd_and_hms(2024, 2, 13, 9, 0, 0)
            .unwrap()
            .timestamp_millis();
        ctx.sys = Arc::new(StaticTimeSys::new(now));
        ctx.config.max_run_duration = Duration::from_secs(1);
        ctx.config.dispatch_concurrency = 1;
        notifier.set_delay(Some(Duration::from_secs(2)));

        let in_1 = client("in1", NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        let in_3 = client("in3", NaiveDate::from_ymd_opt(2024, 2, 16).unwrap());
        let in_7 = client("in7", NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());
        for c in &[&in_1, &in_3, &in_7] {
            ctx.repos.clients.insert(c).await.unwrap();
        }

        let usecase = SendPreDueRemindersUseCase { run_id: ID::new() };
        let result = execute(usecase, &ctx).await.unwrap();
        assert_eq!(result.successes, 1);
        assert_eq!(result.not_attempted, 2);
        assert!(result.deadline_exceeded);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent_to("in1@example.com").len(), 1);
    }
}
