use crate::{
    reminder::{
        send_pre_due_reminders::SendPreDueRemindersUseCase,
        send_slot_reminders::{SendSlotRemindersUseCase, SlotRunOutcome},
    },
    shared::usecase::execute,
};
use actix_web::rt::time::sleep;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use fee_reminder_domain::{date::local_date, RunResult, ID};
use fee_reminder_infra::ReminderContext;
use std::fmt::Display;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Reminders for the payment slot whose pay window is open
    Slot,
    /// Reminders a configured number of days before the due date
    PreDue,
}

impl Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slot => f.write_str("slot"),
            Self::PreDue => f.write_str("pre-due"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// Another run held the guard, nothing was done
    AlreadyRunning,
    /// Today is outside every pay window
    NoActiveWindow,
    Completed(RunResult),
    /// The client store could not be read, no client was processed
    Aborted(String),
}

/// Marks a run as active for as long as it is alive
struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(running: &Arc<AtomicBool>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                running: running.clone(),
            })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Fires the daily reminder runs. At most one run, of either kind, is
/// active at any time.
#[derive(Clone)]
pub struct Scheduler {
    ctx: ReminderContext,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(ctx: ReminderContext) -> Self {
        Self {
            ctx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn trigger(&self, kind: TriggerKind) -> TriggerOutcome {
        let _guard = match RunGuard::acquire(&self.running) {
            Some(guard) => guard,
            None => {
                warn!("A reminder run is already active, skipping the {} trigger", kind);
                return TriggerOutcome::AlreadyRunning;
            }
        };

        let run_id = ID::new();
        info!("Starting {} reminder run: {}", kind, run_id);
        let outcome = match kind {
            TriggerKind::Slot => match execute(SendSlotRemindersUseCase { run_id }, &self.ctx).await
            {
                Ok(SlotRunOutcome::NoActiveWindow) => TriggerOutcome::NoActiveWindow,
                Ok(SlotRunOutcome::Completed(_, result)) => TriggerOutcome::Completed(result),
                Err(e) => TriggerOutcome::Aborted(format!("{:?}", e)),
            },
            TriggerKind::PreDue => {
                match execute(SendPreDueRemindersUseCase { run_id }, &self.ctx).await {
                    Ok(result) => TriggerOutcome::Completed(result),
                    Err(e) => TriggerOutcome::Aborted(format!("{:?}", e)),
                }
            }
        };

        match &outcome {
            TriggerOutcome::Completed(result) => info!(
                "Finished {} reminder run: {}. {} succeeded, {} failed, {} skipped, {} not attempted",
                kind,
                run_id,
                result.successes,
                result.failures,
                result.skipped,
                result.not_attempted
            ),
            TriggerOutcome::Aborted(reason) => {
                error!("Aborted {} reminder run: {}. Reason: {}", kind, run_id, reason)
            }
            _ => (),
        }
        outcome
    }

    /// Registers the daily triggers on the current runtime
    pub fn start(&self) {
        self.start_daily_trigger(TriggerKind::Slot, self.ctx.config.slot_trigger_time);
        if self.ctx.config.pre_due.enabled {
            self.start_daily_trigger(TriggerKind::PreDue, self.ctx.config.pre_due.trigger_time);
        }
    }

    fn start_daily_trigger(&self, kind: TriggerKind, time_of_day: NaiveTime) {
        let scheduler = self.clone();
        actix_web::rt::spawn(async move {
            let tz = scheduler.ctx.config.timezone;
            let now = scheduler.ctx.sys.get_timestamp_millis();
            let mut delay = millis_until_next_trigger(now, time_of_day, &tz);
            loop {
                sleep(Duration::from_millis(delay as u64)).await;
                let now = scheduler.ctx.sys.get_timestamp_millis();
                delay = millis_until_trigger_after_fire(now, time_of_day, &tz);

                let scheduler = scheduler.clone();
                actix_web::rt::spawn(async move {
                    scheduler.trigger(kind).await;
                });
            }
        });
    }
}

const MIN_TRIGGER_GAP_MILLIS: i64 = 60 * 1000;

fn trigger_at(date: NaiveDate, time_of_day: NaiveTime, tz: &Tz) -> Option<i64> {
    let local = date.and_time(time_of_day);
    tz.from_local_datetime(&local)
        .earliest()
        // The time does not exist on this day because of a DST gap
        .or_else(|| tz.from_local_datetime(&(local + ChronoDuration::hours(1))).earliest())
        .map(|dt| dt.timestamp_millis())
}

/// Millis from `now` until the next time the local clock in `tz` shows
/// `time_of_day`. Always positive.
pub fn millis_until_next_trigger(now: i64, time_of_day: NaiveTime, tz: &Tz) -> i64 {
    let today = local_date(now, tz);
    let next = [Some(today), today.succ_opt(), today.succ_opt().and_then(|d| d.succ_opt())]
        .iter()
        .filter_map(|date| date.and_then(|d| trigger_at(d, time_of_day, tz)))
        .find(|ts| *ts > now);

    // `None` is unreachable for real time zones, retry in an hour
    next.map(|ts| ts - now).unwrap_or(60 * 60 * 1000)
}

/// Like `millis_until_next_trigger`, but never schedules within a minute of
/// `now`. The wall clock can lag the timer that just woke the loop.
fn millis_until_trigger_after_fire(now: i64, time_of_day: NaiveTime, tz: &Tz) -> i64 {
    let earliest = now + MIN_TRIGGER_GAP_MILLIS;
    MIN_TRIGGER_GAP_MILLIS + millis_until_next_trigger(earliest, time_of_day, tz)
}
