use chrono::NaiveTime;
use chrono_tz::Tz;
use fee_reminder_domain::{
    MessageSettings, PreDueOffsets, PreDueOffsetsError, SlotTable, SlotTableError,
};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid payment slots in PAYMENT_SLOTS: {0}")]
    InvalidSlots(#[from] SlotTableError),
    #[error("Invalid pre-due offsets in PRE_DUE_OFFSET_DAYS: {0}")]
    InvalidPreDueOffsets(#[from] PreDueOffsetsError),
    #[error("Invalid value `{value}` for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct PreDueSettings {
    /// Whether the pre-due reminder trigger is registered at all
    pub enabled: bool,
    /// Local time of day at which the pre-due trigger fires
    pub trigger_time: NaiveTime,
    pub offsets: PreDueOffsets,
}

#[derive(Debug, Clone, Default)]
pub struct NotifierSettings {
    /// Gateway that delivers emails. Email is disabled when not set
    pub email_webhook_url: Option<String>,
    /// Gateway that delivers text messages. SMS is disabled when not set
    pub sms_webhook_url: Option<String>,
    /// Sent to the gateways in the `x-notifier-key` header
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Time zone in which calendar days and trigger times are evaluated
    pub timezone: Tz,
    pub slots: SlotTable,
    /// Local time of day at which the slot reminder trigger fires
    pub slot_trigger_time: NaiveTime,
    pub pre_due: PreDueSettings,
    /// A single channel send that takes longer than this is treated as failed
    pub send_timeout: Duration,
    /// Clients not started before a run has lasted this long are not attempted
    pub max_run_duration: Duration,
    /// Number of clients processed in parallel within one run
    pub dispatch_concurrency: usize,
    /// Maximum page size when querying the reminder history.
    /// This is used to avoid having clients ask for the whole history
    /// in a single request.
    pub history_page_size_limit: i64,
    pub message: MessageSettings,
    pub notifier: NotifierSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            timezone: Tz::UTC,
            slots: SlotTable::default(),
            slot_trigger_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            pre_due: PreDueSettings {
                enabled: true,
                trigger_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
                offsets: PreDueOffsets::default(),
            },
            send_timeout: Duration::from_secs(30),
            max_run_duration: Duration::from_secs(30 * 60),
            dispatch_concurrency: 4,
            history_page_size_limit: 100,
            message: MessageSettings::default(),
            notifier: NotifierSettings::default(),
        }
    }
}

fn env_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_time(var: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| invalid(var, value, "expected a time of day as HH:MM"))
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(var, value, "expected a positive whole number")),
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(var, value, "expected true or false")),
    }
}

impl Config {
    /// Reads the configuration from the environment. Variables that are not
    /// set fall back to their defaults, invalid values are rejected.
    pub fn new() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = env_var("PORT") {
            match port.parse::<usize>() {
                Ok(port) => config.port = port,
                Err(_) => {
                    warn!(
                        "The given PORT: {} is not valid, falling back to the default port: {}.",
                        port, config.port
                    );
                }
            }
        }
        if let Some(tz) = env_var("REMINDER_TIMEZONE") {
            config.timezone = tz
                .parse::<Tz>()
                .map_err(|_| invalid("REMINDER_TIMEZONE", &tz, "unknown IANA time zone"))?;
        }
        if let Some(slots) = env_var("PAYMENT_SLOTS") {
            config.slots = slots.parse::<SlotTable>()?;
        }
        if let Some(time) = env_var("SLOT_REMINDER_TIME") {
            config.slot_trigger_time = parse_time("SLOT_REMINDER_TIME", &time)?;
        }
        if let Some(enabled) = env_var("PRE_DUE_REMINDERS_ENABLED") {
            config.pre_due.enabled = parse_bool("PRE_DUE_REMINDERS_ENABLED", &enabled)?;
        }
        if let Some(time) = env_var("PRE_DUE_REMINDER_TIME") {
            config.pre_due.trigger_time = parse_time("PRE_DUE_REMINDER_TIME", &time)?;
        }
        if let Some(offsets) = env_var("PRE_DUE_OFFSET_DAYS") {
            config.pre_due.offsets = offsets.parse::<PreDueOffsets>()?;
        }
        if let Some(secs) = env_var("SEND_TIMEOUT_SECS") {
            config.send_timeout = Duration::from_secs(parse_positive("SEND_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = env_var("MAX_RUN_DURATION_SECS") {
            config.max_run_duration =
                Duration::from_secs(parse_positive("MAX_RUN_DURATION_SECS", &secs)?);
        }
        if let Some(n) = env_var("DISPATCH_CONCURRENCY") {
            config.dispatch_concurrency = parse_positive("DISPATCH_CONCURRENCY", &n)? as usize;
        }
        if let Some(n) = env_var("HISTORY_PAGE_SIZE_LIMIT") {
            config.history_page_size_limit = parse_positive("HISTORY_PAGE_SIZE_LIMIT", &n)? as i64;
        }
        if let Some(name) = env_var("REMINDER_SENDER_NAME") {
            config.message.sender_name = name;
        }
        if let Some(symbol) = env_var("FEE_CURRENCY_SYMBOL") {
            config.message.currency_symbol = symbol;
        }
        config.notifier = NotifierSettings {
            email_webhook_url: env_var("EMAIL_WEBHOOK_URL"),
            sms_webhook_url: env_var("SMS_WEBHOOK_URL"),
            api_key: env_var("NOTIFIER_API_KEY"),
        };

        Ok(config)
    }
}
