use chrono::NaiveDate;
use std::str::FromStr;
use thiserror::Error;

/// Days before the due date at which a pre-due reminder is sent
#[derive(Debug, Clone, PartialEq)]
pub struct PreDueOffsets(Vec<u32>);

impl Default for PreDueOffsets {
    fn default() -> Self {
        Self(vec![7, 3, 1])
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum PreDueOffsetsError {
    #[error("Pre-due offsets can not be empty")]
    Empty,
    #[error("Invalid pre-due offset: `{0}`. Offsets must be whole days between 1 and 31")]
    InvalidOffset(String),
}

impl PreDueOffsets {
    pub fn new(mut offsets: Vec<u32>) -> Result<Self, PreDueOffsetsError> {
        if offsets.is_empty() {
            return Err(PreDueOffsetsError::Empty);
        }
        if let Some(invalid) = offsets.iter().find(|o| **o == 0 || **o > 31) {
            return Err(PreDueOffsetsError::InvalidOffset(invalid.to_string()));
        }
        offsets.sort_unstable_by(|a, b| b.cmp(a));
        offsets.dedup();
        Ok(Self(offsets))
    }

    pub fn inner(&self) -> &[u32] {
        &self.0
    }

    /// The offset matching the number of days left until `due_date`, if any.
    /// Due dates in the past never match.
    pub fn matching(&self, today: NaiveDate, due_date: NaiveDate) -> Option<u32> {
        let days_until_due = days_until(today, due_date)?;
        self.0.iter().find(|o| **o == days_until_due).copied()
    }
}

impl FromStr for PreDueOffsets {
    type Err = PreDueOffsetsError;

    /// Parses "7,3,1"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let offsets = s
            .split(',')
            .filter(|o| !o.trim().is_empty())
            .map(|o| {
                o.trim()
                    .parse::<u32>()
                    .map_err(|_| PreDueOffsetsError::InvalidOffset(o.trim().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(offsets)
    }
}

/// Whole days from `today` until `due_date`, `None` if the due date has passed
pub fn days_until(today: NaiveDate, due_date: NaiveDate) -> Option<u32> {
    let days = (due_date - today).num_days();
    if days < 0 {
        None
    } else {
        Some(days as u32)
    }
}
