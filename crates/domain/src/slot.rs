use crate::date::{get_month_length, ordinal, start_of_day_millis};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotId {
    #[serde(rename = "slot1")]
    Slot1,
    #[serde(rename = "slot2")]
    Slot2,
    #[serde(rename = "slot3")]
    Slot3,
}

impl SlotId {
    pub const ALL: [SlotId; 3] = [SlotId::Slot1, SlotId::Slot2, SlotId::Slot3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slot1 => "slot1",
            Self::Slot2 => "slot2",
            Self::Slot3 => "slot3",
        }
    }
}

impl Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slot1" => Ok(Self::Slot1),
            "slot2" => Ok(Self::Slot2),
            "slot3" => Ok(Self::Slot3),
            _ => Err(format!("Unknown slot: {}", s)),
        }
    }
}

/// Inclusive range of days of the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub start: u32,
    pub end: u32,
}

impl DayRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, day: u32) -> bool {
        self.start <= day && day <= self.end
    }

    fn overlaps(&self, other: &DayRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Human readable label, e.g. "1st - 5th"
    pub fn label(&self) -> String {
        format!("{} - {}", ordinal(self.start), ordinal(self.end))
    }
}

impl FromStr for DayRange {
    type Err = SlotTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SlotTableError::Malformed(s.to_string());
        let mut parts = s.trim().splitn(2, '-');
        let start = parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .ok_or_else(malformed)?;
        let end = parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .ok_or_else(malformed)?;
        Ok(Self::new(start, end))
    }
}

/// One of the three fixed day-of-month windows. The `pay_window` is when
/// reminders are sent, the `due_window` decides which clients belong to the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSlot {
    pub id: SlotId,
    pub pay_window: DayRange,
    pub due_window: DayRange,
}

impl PaymentSlot {
    pub fn payment_period(&self) -> String {
        self.pay_window.label()
    }

    pub fn due_period(&self) -> String {
        self.due_window.label()
    }

    /// The [start, end) timestamps of this slot's pay window in the given month.
    /// The end of the window is clamped to the last day of the month.
    pub fn pay_window_bounds(&self, year: i32, month: u32, tz: &Tz) -> (i64, i64) {
        let month_length = get_month_length(year, month);
        let start_day = self.pay_window.start.min(month_length);
        let end_day = self.pay_window.end.min(month_length);

        // Both days are clamped to the month length so they are valid dates
        let start = NaiveDate::from_ymd_opt(year, month, start_day)
            .map(|d| start_of_day_millis(d, tz))
            .unwrap_or_default();
        let end = NaiveDate::from_ymd_opt(year, month, end_day)
            .and_then(|d| d.succ_opt())
            .map(|d| start_of_day_millis(d, tz))
            .unwrap_or(start);
        (start, end)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum SlotTableError {
    #[error("Malformed slot definition: `{0}`")]
    Malformed(String),
    #[error("Expected exactly 3 slots, got {0}")]
    WrongSlotCount(usize),
    #[error("Range {0}-{1} must be within days 1-31 and start before it ends")]
    InvalidRange(u32, u32),
    #[error("Due day {0} is not covered by exactly one slot")]
    DueWindowsNotPartitioned(u32),
    #[error("Pay windows of {0} and {1} overlap")]
    OverlappingPayWindows(SlotId, SlotId),
}

/// The validated set of `PaymentSlot`s
#[derive(Debug, Clone, PartialEq)]
pub struct SlotTable {
    slots: [PaymentSlot; 3],
}

impl Default for SlotTable {
    fn default() -> Self {
        Self {
            slots: [
                PaymentSlot {
                    id: SlotId::Slot1,
                    pay_window: DayRange::new(1, 5),
                    due_window: DayRange::new(1, 10),
                },
                PaymentSlot {
                    id: SlotId::Slot2,
                    pay_window: DayRange::new(15, 20),
                    due_window: DayRange::new(11, 20),
                },
                PaymentSlot {
                    id: SlotId::Slot3,
                    pay_window: DayRange::new(25, 30),
                    due_window: DayRange::new(21, 31),
                },
            ],
        }
    }
}

impl SlotTable {
    /// `windows` are the (pay, due) ranges of slot1, slot2 and slot3 in that order
    pub fn new(windows: [(DayRange, DayRange); 3]) -> Result<Self, SlotTableError> {
        let mut slots = SlotTable::default().slots;
        for (slot, (pay, due)) in slots.iter_mut().zip(windows.iter()) {
            for range in [pay, due] {
                if range.start < 1 || range.end > 31 || range.start > range.end {
                    return Err(SlotTableError::InvalidRange(range.start, range.end));
                }
            }
            slot.pay_window = *pay;
            slot.due_window = *due;
        }

        for day in 1..=31 {
            let covering = slots.iter().filter(|s| s.due_window.contains(day)).count();
            if covering != 1 {
                return Err(SlotTableError::DueWindowsNotPartitioned(day));
            }
        }

        for i in 0..slots.len() {
            for j in (i + 1)..slots.len() {
                if slots[i].pay_window.overlaps(&slots[j].pay_window) {
                    return Err(SlotTableError::OverlappingPayWindows(
                        slots[i].id,
                        slots[j].id,
                    ));
                }
            }
        }

        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[PaymentSlot] {
        &self.slots
    }

    pub fn get(&self, id: SlotId) -> &PaymentSlot {
        match id {
            SlotId::Slot1 => &self.slots[0],
            SlotId::Slot2 => &self.slots[1],
            SlotId::Slot3 => &self.slots[2],
        }
    }

    /// The slot whose pay window contains `day`, if any
    pub fn resolve_slot(&self, day: u32) -> Option<PaymentSlot> {
        self.slots
            .iter()
            .find(|slot| slot.pay_window.contains(day))
            .copied()
    }

    /// The slot whose due window contains `day`
    pub fn slot_for_due_day(&self, day: u32) -> Option<PaymentSlot> {
        self.slots
            .iter()
            .find(|slot| slot.due_window.contains(day))
            .copied()
    }
}

impl FromStr for SlotTable {
    type Err = SlotTableError;

    /// Parses "1-5:1-10,15-20:11-20,25-30:21-31"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let definitions = s.split(',').collect::<Vec<_>>();
        if definitions.len() != 3 {
            return Err(SlotTableError::WrongSlotCount(definitions.len()));
        }
        let mut windows = [(DayRange::new(0, 0), DayRange::new(0, 0)); 3];
        for (window, definition) in windows.iter_mut().zip(definitions) {
            let mut parts = definition.splitn(2, ':');
            let pay = parts
                .next()
                .ok_or_else(|| SlotTableError::Malformed(definition.to_string()))?
                .parse::<DayRange>()?;
            let due = parts
                .next()
                .ok_or_else(|| SlotTableError::Malformed(definition.to_string()))?
                .parse::<DayRange>()?;
            *window = (pay, due);
        }
        Self::new(windows)
    }
}

/// Resolves the slot for `day` using the default slot boundaries
pub fn resolve_slot(day: u32) -> Option<PaymentSlot> {
    SlotTable::default().resolve_slot(day)
}
