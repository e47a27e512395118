use crate::{
    history::record_history::RecordHistoryUseCase,
    shared::usecase::{execute, UseCase},
};
use fee_reminder_domain::{
    Channel, ChannelOutcome, Client, DispatchReason, HistoryEntryDraft, HistoryMetadata,
    HistoryStatus, ReminderChannel, ReminderKind, ReminderMessage, RunResult, SkipReason, ID,
};
use fee_reminder_infra::ReminderContext;
use futures::{stream, StreamExt};
use std::collections::HashSet;
use tokio::time::{timeout, Instant};
use tracing::{error, info, warn};

/// Sends reminders to the given clients and records one history entry per
/// client that was attempted.
///
/// Clients are processed with bounded parallelism and each client is
/// handled by exactly one task. A failure for one client never affects
/// the others, and no client is retried within the same run.
#[derive(Debug)]
pub struct DispatchRemindersUseCase {
    pub run_id: ID,
    pub clients: Vec<Client>,
    pub reason: DispatchReason,
    /// Clients not started by this instant are not attempted. Shared by
    /// every dispatch of one run.
    pub deadline: Instant,
}

#[derive(Debug)]
pub enum UseCaseErrors {}

fn kind_of(reason: &DispatchReason) -> ReminderKind {
    match reason {
        DispatchReason::Slot(_) => ReminderKind::Slot,
        DispatchReason::PreDue { .. } => ReminderKind::PreDue,
    }
}

fn skip_description(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::InactiveMembership => "Automated reminder skipped: membership is not active",
        SkipReason::ClientNotFound => "Automated reminder skipped: client no longer exists",
        SkipReason::NoChannelsEnabled => {
            "Automated reminder skipped: no reminder channels are enabled"
        }
    }
}

fn success_description(reason: &DispatchReason) -> String {
    match reason {
        DispatchReason::Slot(slot) => format!(
            "Automated reminder sent for {} payment window",
            slot.payment_period()
        ),
        DispatchReason::PreDue { days_before_due } => {
            format!("Automated {}-day pre-due reminder sent", days_before_due)
        }
    }
}

fn failure_description(reason: &DispatchReason, error: &str) -> String {
    match reason {
        DispatchReason::Slot(_) => format!("Failed to send automated reminder: {}", error),
        DispatchReason::PreDue { .. } => format!("Failed to send pre-due reminder: {}", error),
    }
}

fn run_metadata(run_id: ID, reason: &DispatchReason) -> HistoryMetadata {
    let mut metadata = HistoryMetadata {
        run_id: Some(run_id),
        ..Default::default()
    };
    match reason {
        DispatchReason::Slot(slot) => {
            metadata.slot = Some(slot.id);
            metadata.payment_period = Some(slot.payment_period());
            metadata.due_period = Some(slot.due_period());
        }
        DispatchReason::PreDue { days_before_due } => {
            metadata.days_before_due = Some(*days_before_due);
        }
    }
    metadata
}

async fn record(draft: HistoryEntryDraft, ctx: &ReminderContext) {
    let client_id = draft.client_id;
    if execute(RecordHistoryUseCase { draft }, ctx).await.is_err() {
        warn!(
            "Unable to store the reminder history entry for client: {}",
            client_id
        );
    }
}

async fn record_skipped(
    client: &Client,
    run_id: ID,
    reason: &DispatchReason,
    skip_reason: SkipReason,
    ctx: &ReminderContext,
) -> HistoryStatus {
    let mut draft = HistoryEntryDraft::new(
        client,
        kind_of(reason),
        HistoryStatus::Skipped,
        skip_description(skip_reason).into(),
    );
    draft.metadata = run_metadata(run_id, reason);
    draft.metadata.skip_reason = Some(skip_reason);
    record(draft, ctx).await;
    HistoryStatus::Skipped
}

async fn send_on_channel(
    client: &Client,
    channel: Channel,
    reason: &DispatchReason,
    ctx: &ReminderContext,
) -> ChannelOutcome {
    let address = client.address_for(channel).trim();
    if address.is_empty() {
        return ChannelOutcome::failed(channel, format!("No {} address on record", channel));
    }

    let message = match reason {
        DispatchReason::Slot(slot) => {
            ReminderMessage::for_slot(client, slot, channel, &ctx.config.message)
        }
        DispatchReason::PreDue { days_before_due } => {
            ReminderMessage::for_pre_due(client, *days_before_due, channel, &ctx.config.message)
        }
    };

    let send = ctx
        .notifier
        .send(channel, address, &message.subject, &message.body);
    match timeout(ctx.config.send_timeout, send).await {
        Ok(Ok(receipt)) => ChannelOutcome::delivered(channel, receipt.message_id),
        Ok(Err(e)) => {
            warn!(
                "Unable to send {} reminder to client: {}. Error: {}",
                channel, client.id, e
            );
            ChannelOutcome::failed(channel, e.to_string())
        }
        Err(_) => {
            warn!(
                "Sending {} reminder to client: {} timed out",
                channel, client.id
            );
            ChannelOutcome::failed(
                channel,
                format!(
                    "Timed out after {} seconds",
                    ctx.config.send_timeout.as_secs()
                ),
            )
        }
    }
}

async fn dispatch_to_client(
    selected: Client,
    run_id: ID,
    reason: DispatchReason,
    ctx: &ReminderContext,
) -> HistoryStatus {
    // The selection may be stale by the time this client is processed
    let client = match ctx.repos.clients.find(&selected.id).await {
        Ok(Some(client)) => client,
        Ok(None) => {
            return record_skipped(&selected, run_id, &reason, SkipReason::ClientNotFound, ctx)
                .await
        }
        Err(e) => {
            error!("Unable to reload client: {}. Error: {:?}", selected.id, e);
            let error = e.to_string();
            let mut draft = HistoryEntryDraft::new(
                &selected,
                kind_of(&reason),
                HistoryStatus::Failed,
                failure_description(&reason, &error),
            );
            draft.metadata = run_metadata(run_id, &reason);
            draft.metadata.error_details = Some(error);
            record(draft, ctx).await;
            return HistoryStatus::Failed;
        }
    };
    if !client.should_receive_reminders() {
        return record_skipped(&client, run_id, &reason, SkipReason::InactiveMembership, ctx)
            .await;
    }
    let channels = client.enabled_channels();
    if channels.is_empty() {
        return record_skipped(&client, run_id, &reason, SkipReason::NoChannelsEnabled, ctx)
            .await;
    }

    let mut outcomes = Vec::with_capacity(channels.len());
    for channel in &channels {
        outcomes.push(send_on_channel(&client, *channel, &reason, ctx).await);
    }
    let delivered = outcomes.iter().any(|o| o.delivered);

    let mut metadata = run_metadata(run_id, &reason);
    let (status, description) = if delivered {
        (HistoryStatus::Success, success_description(&reason))
    } else {
        let error = outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {}", o.channel, e)))
            .collect::<Vec<_>>()
            .join("; ");
        let description = failure_description(&reason, &error);
        metadata.error_details = Some(error);
        (HistoryStatus::Failed, description)
    };
    metadata.channels = outcomes;

    // Must happen before the history entry is written
    if delivered && reason.updates_last_reminder() {
        if let Err(e) = ctx
            .repos
            .clients
            .update_last_reminder_sent(&client.id, ctx.sys.get_timestamp_millis())
            .await
        {
            error!(
                "Unable to update last reminder sent for client: {}. Error: {:?}",
                client.id, e
            );
            metadata.last_reminder_update_failed = true;
        }
    }

    let mut draft = HistoryEntryDraft::new(&client, kind_of(&reason), status, description);
    draft.channel = ReminderChannel::from_channels(&channels);
    draft.metadata = metadata;
    record(draft, ctx).await;

    status
}

#[async_trait::async_trait]
impl UseCase for DispatchRemindersUseCase {
    type Response = RunResult;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let deadline = self.deadline;
        let run_id = self.run_id;
        let reason = self.reason;

        let mut seen = HashSet::new();
        let clients = std::mem::take(&mut self.clients)
            .into_iter()
            .filter(|c| seen.insert(c.id))
            .collect::<Vec<_>>();

        let statuses = stream::iter(clients)
            .map(|client| async move {
                if Instant::now() >= deadline {
                    return None;
                }
                Some(dispatch_to_client(client, run_id, reason, ctx).await)
            })
            .buffer_unordered(ctx.config.dispatch_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut result = RunResult::new(run_id);
        for status in statuses {
            match status {
                Some(status) => result.add(status),
                None => result.add_not_attempted(),
            }
        }
        if result.deadline_exceeded {
            warn!(
                "Run: {} exceeded its deadline, {} clients were not attempted",
                run_id, result.not_attempted
            );
        }
        info!(
            "Run: {} finished with {} successes, {} failures and {} skipped",
            run_id, result.successes, result.failures, result.skipped
        );

        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use fee_reminder_domain::{
        resolve_slot, HistoryQuery, MembershipStatus, Page, ReminderHistoryEntry,
    };
    use fee_reminder_infra::{
        IClientRepo, IReminderHistoryRepo, InMemoryNotifier, StaticTimeSys,
    };
    use std::sync::Arc;
    use std::time::Duration;

    const NOW: i64 = 1706954400000; // 2024-02-03 10:00 UTC

    struct TestContext {
        ctx: ReminderContext,
        notifier: Arc<InMemoryNotifier>,
    }

    fn setup() -> TestContext {
        let mut ctx = ReminderContext::create_inmemory();
        let notifier = Arc::new(InMemoryNotifier::new());
        ctx.notifier = notifier.clone();
        ctx.sys = Arc::new(StaticTimeSys::new(NOW));
        TestContext { ctx, notifier }
    }

    fn client(name: &str) -> Client {
        Client::new(
            name,
            &format!("{}@example.com", name),
            "+919800000000",
            1500.0,
            NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
        )
    }

    fn slot_reason() -> DispatchReason {
        DispatchReason::Slot(resolve_slot(3).unwrap())
    }

    async fn dispatch(
        ctx: &ReminderContext,
        clients: Vec<Client>,
        reason: DispatchReason,
    ) -> RunResult {
        let usecase = DispatchRemindersUseCase {
            run_id: ID::new(),
            clients,
            reason,
            deadline: Instant::now() + ctx.config.max_run_duration,
        };
        match execute(usecase, ctx).await {
            Ok(result) => result,
            Err(e) => match e {},
        }
    }

    async fn history(ctx: &ReminderContext) -> Vec<ReminderHistoryEntry> {
        ctx.repos
            .reminder_history
            .find_by_query(&HistoryQuery {
                per_page: 100,
                ..Default::default()
            })
            .await
            .unwrap()
            .items
    }

    async fn entry_for(ctx: &ReminderContext, client: &Client) -> ReminderHistoryEntry {
        let mut entries = history(ctx)
            .await
            .into_iter()
            .filter(|e| e.client_id == client.id)
            .collect::<Vec<_>>();
        assert_eq!(entries.len(), 1);
        entries.remove(0)
    }

    #[tokio::test]
    async fn records_successful_slot_reminder() {
        let TestContext { ctx, notifier } = setup();
        let client = client("asha");
        ctx.repos.clients.insert(&client).await.unwrap();

        let result = dispatch(&ctx, vec![client.clone()], slot_reason()).await;
        assert_eq!(result.successes, 1);
        assert_eq!(result.attempted(), 1);

        let sent = notifier.sent_to("asha@example.com");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Fee Payment Window Open - Action Required");

        let entry = entry_for(&ctx, &client).await;
        assert_eq!(entry.status, HistoryStatus::Success);
        assert_eq!(entry.kind, ReminderKind::Slot);
        assert_eq!(entry.channel, Some(ReminderChannel::Email));
        assert_eq!(
            entry.description,
            "Automated reminder sent for 1st - 5th payment window"
        );
        assert_eq!(entry.metadata.run_id, Some(result.run_id));
        assert_eq!(entry.metadata.payment_period.as_deref(), Some("1st - 5th"));
        assert_eq!(entry.metadata.due_period.as_deref(), Some("1st - 10th"));
        assert_eq!(entry.created, NOW);

        let stored = ctx.repos.clients.find(&client.id).await.unwrap().unwrap();
        assert_eq!(stored.last_reminder_sent, Some(NOW));
    }

    #[tokio::test]
    async fn isolates_partial_failures() {
        let TestContext { ctx, notifier } = setup();
        let ok1 = client("ok1");
        let failing = client("failing");
        let ok2 = client("ok2");
        for c in &[&ok1, &failing, &ok2] {
            ctx.repos.clients.insert(c).await.unwrap();
        }
        notifier.fail_for("failing@example.com");

        let result = dispatch(
            &ctx,
            vec![ok1.clone(), failing.clone(), ok2.clone()],
            slot_reason(),
        )
        .await;
        assert_eq!(result.successes, 2);
        assert_eq!(result.failures, 1);
        assert_eq!(history(&ctx).await.len(), 3);

        let failed = entry_for(&ctx, &failing).await;
        assert_eq!(failed.status, HistoryStatus::Failed);
        assert!(failed
            .description
            .starts_with("Failed to send automated reminder: "));
        assert!(failed.metadata.error_details.is_some());
        assert!(!failed.metadata.channels[0].delivered);

        // Only delivered reminders mark the client as reminded
        let stored = ctx.repos.clients.find(&failing.id).await.unwrap().unwrap();
        assert_eq!(stored.last_reminder_sent, None);
        let stored = ctx.repos.clients.find(&ok2.id).await.unwrap().unwrap();
        assert_eq!(stored.last_reminder_sent, Some(NOW));
    }

    #[tokio::test]
    async fn success_when_any_channel_delivers() {
        let TestContext { ctx, notifier } = setup();
        let mut client = client("both");
        client.reminder_preferences.sms = true;
        ctx.repos.clients.insert(&client).await.unwrap();
        notifier.fail_for("+919800000000");

        let result = dispatch(&ctx, vec![client.clone()], slot_reason()).await;
        assert_eq!(result.successes, 1);

        let entry = entry_for(&ctx, &client).await;
        assert_eq!(entry.channel, Some(ReminderChannel::Both));
        assert_eq!(entry.metadata.channels.len(), 2);
        assert!(entry.metadata.channels[0].delivered);
        assert!(!entry.metadata.channels[1].delivered);
    }

    #[tokio::test]
    async fn empty_address_fails_without_sending() {
        let TestContext { ctx, notifier } = setup();
        let mut client = client("noemail");
        client.email = "".into();
        ctx.repos.clients.insert(&client).await.unwrap();

        let result = dispatch(&ctx, vec![client.clone()], slot_reason()).await;
        assert_eq!(result.failures, 1);
        assert!(notifier.sent().is_empty());
        assert_eq!(entry_for(&ctx, &client).await.status, HistoryStatus::Failed);
    }

    #[tokio::test]
    async fn skips_clients_that_changed_after_selection() {
        let TestContext { ctx, notifier } = setup();
        let deleted = client("deleted");
        let mut inactive = client("inactive");
        let mut silent = client("silent");
        silent.reminder_preferences.email = false;
        ctx.repos.clients.insert(&silent).await.unwrap();
        ctx.repos.clients.insert(&inactive).await.unwrap();
        let selected = vec![deleted.clone(), inactive.clone(), silent.clone()];
        inactive.membership_status = MembershipStatus::Suspended;
        ctx.repos.clients.save(&inactive).await.unwrap();

        let result = dispatch(&ctx, selected, slot_reason()).await;
        assert_eq!(result.skipped, 3);
        assert!(notifier.sent().is_empty());

        let reasons = vec![
            (deleted, SkipReason::ClientNotFound),
            (inactive, SkipReason::InactiveMembership),
            (silent, SkipReason::NoChannelsEnabled),
        ];
        for (client, reason) in reasons {
            let entry = entry_for(&ctx, &client).await;
            assert_eq!(entry.status, HistoryStatus::Skipped);
            assert_eq!(entry.metadata.skip_reason, Some(reason));
        }
    }

    #[tokio::test]
    async fn deduplicates_clients() {
        let TestContext { ctx, notifier } = setup();
        let client = client("twice");
        ctx.repos.clients.insert(&client).await.unwrap();

        let result = dispatch(&ctx, vec![client.clone(), client.clone()], slot_reason()).await;
        assert_eq!(result.attempted(), 1);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(history(&ctx).await.len(), 1);
    }

    #[tokio::test]
    async fn pre_due_reminders_leave_last_reminder_untouched() {
        let TestContext { ctx, notifier } = setup();
        let client = client("predue");
        ctx.repos.clients.insert(&client).await.unwrap();

        let reason = DispatchReason::PreDue { days_before_due: 1 };
        let result = dispatch(&ctx, vec![client.clone()], reason).await;
        assert_eq!(result.successes, 1);
        assert_eq!(
            notifier.sent()[0].subject,
            "URGENT: Fee Payment Due Tomorrow"
        );

        let entry = entry_for(&ctx, &client).await;
        assert_eq!(entry.kind, ReminderKind::PreDue);
        assert_eq!(entry.description, "Automated 1-day pre-due reminder sent");
        assert_eq!(entry.metadata.days_before_due, Some(1));
        let stored = ctx.repos.clients.find(&client.id).await.unwrap().unwrap();
        assert_eq!(stored.last_reminder_sent, None);
    }

    #[tokio::test(start_paused = true)]
    async fn send_timeout_is_a_failure() {
        let TestContext { mut ctx, notifier } = setup();
        ctx.config.send_timeout = Duration::from_secs(1);
        notifier.set_delay(Some(Duration::from_secs(5)));
        let client = client("slow");
        ctx.repos.clients.insert(&client).await.unwrap();

        let result = dispatch(&ctx, vec![client.clone()], slot_reason()).await;
        assert_eq!(result.failures, 1);

        let entry = entry_for(&ctx, &client).await;
        assert_eq!(entry.status, HistoryStatus::Failed);
        assert!(entry.metadata.channels[0]
            .error
            .as_deref()
            .unwrap()
            .contains("Timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn clients_after_the_deadline_are_not_attempted() {
        let TestContext { mut ctx, notifier } = setup();
        ctx.config.max_run_duration = Duration::from_secs(1);
        ctx.config.dispatch_concurrency = 1;
        notifier.set_delay(Some(Duration::from_secs(2)));
        let clients = vec![client("first"), client("second"), client("third")];
        for c in &clients {
            ctx.repos.clients.insert(c).await.unwrap();
        }

        let result = dispatch(&ctx, clients, slot_reason()).await;
        assert_eq!(result.successes, 1);
        assert_eq!(result.not_attempted, 2);
        assert!(result.deadline_exceeded);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(history(&ctx).await.len(), 1);
    }

    struct FailingHistoryRepo;

    #[async_trait::async_trait]
    impl IReminderHistoryRepo for FailingHistoryRepo {
        async fn insert(&self, _entry: &ReminderHistoryEntry) -> anyhow::Result<()> {
            Err(anyhow::Error::msg("history store is down"))
        }
        async fn find(&self, _entry_id: &ID) -> anyhow::Result<Option<ReminderHistoryEntry>> {
            Err(anyhow::Error::msg("history store is down"))
        }
        async fn find_by_query(
            &self,
            _query: &HistoryQuery,
        ) -> anyhow::Result<Page<ReminderHistoryEntry>> {
            Err(anyhow::Error::msg("history store is down"))
        }
        async fn exists_since(
            &self,
            _client_id: &ID,
            _kind: ReminderKind,
            _status: HistoryStatus,
            _since: i64,
        ) -> anyhow::Result<bool> {
            Err(anyhow::Error::msg("history store is down"))
        }
    }

    #[tokio::test]
    async fn history_write_failures_do_not_abort_the_run() {
        let TestContext { mut ctx, notifier } = setup();
        ctx.repos.reminder_history = Arc::new(FailingHistoryRepo);
        let clients = vec![client("one"), client("two")];
        for c in &clients {
            ctx.repos.clients.insert(c).await.unwrap();
        }

        let result = dispatch(&ctx, clients, slot_reason()).await;
        assert_eq!(result.successes, 2);
        assert_eq!(notifier.sent().len(), 2);
    }

    /// Client store that serves reads but rejects every write
    struct ReadOnlyClientRepo {
        client: Client,
    }

    #[async_trait::async_trait]
    impl IClientRepo for ReadOnlyClientRepo {
        async fn insert(&self, _client: &Client) -> anyhow::Result<()> {
            Err(anyhow::Error::msg("read only"))
        }
        async fn save(&self, _client: &Client) -> anyhow::Result<()> {
            Err(anyhow::Error::msg("read only"))
        }
        async fn find(&self, client_id: &ID) -> anyhow::Result<Option<Client>> {
            Ok(Some(self.client.clone()).filter(|c| c.id == *client_id))
        }
        async fn delete(&self, _client_id: &ID) -> anyhow::Result<Option<Client>> {
            Err(anyhow::Error::msg("read only"))
        }
        async fn find_active_with_due_date(&self) -> anyhow::Result<Vec<Client>> {
            Ok(vec![self.client.clone()])
        }
        async fn update_last_reminder_sent(
            &self,
            _client_id: &ID,
            _timestamp: i64,
        ) -> anyhow::Result<()> {
            Err(anyhow::Error::msg("read only"))
        }
    }

    #[tokio::test]
    async fn flags_failed_last_reminder_update() {
        let TestContext { mut ctx, .. } = setup();
        let client = client("readonly");
        ctx.repos.clients = Arc::new(ReadOnlyClientRepo {
            client: client.clone(),
        });

        let result = dispatch(&ctx, vec![client.clone()], slot_reason()).await;
        assert_eq!(result.successes, 1);

        let entry = entry_for(&ctx, &client).await;
        assert_eq!(entry.status, HistoryStatus::Success);
        assert!(entry.metadata.last_reminder_update_failed);
    }
}
