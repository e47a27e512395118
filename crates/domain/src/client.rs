use crate::shared::entity::{Entity, ID};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipStatus {
    Active,
    Inactive,
    Suspended,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Suspended => "Suspended",
        }
    }
}

impl Default for MembershipStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            "Suspended" => Ok(Self::Suspended),
            _ => Err(format!("Unknown membership status: {}", s)),
        }
    }
}

/// Transport used to deliver a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPreferences {
    pub email: bool,
    pub sms: bool,
}

impl Default for ReminderPreferences {
    fn default() -> Self {
        Self {
            email: true,
            sms: false,
        }
    }
}

/// A client with a recurring fee obligation. Client records are owned
/// by the client store, the reminder engine only ever changes
/// `last_reminder_sent`.
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    pub id: ID,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub fee_amount: f64,
    pub fee_due_date: NaiveDate,
    pub membership_status: MembershipStatus,
    /// Timestamp in millis of the most recent automated slot reminder
    pub last_reminder_sent: Option<i64>,
    pub reminder_preferences: ReminderPreferences,
}

impl Client {
    pub fn new(name: &str, email: &str, phone: &str, fee_amount: f64, fee_due_date: NaiveDate) -> Self {
        Self {
            id: Default::default(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            fee_amount,
            fee_due_date,
            membership_status: Default::default(),
            last_reminder_sent: None,
            reminder_preferences: Default::default(),
        }
    }

    pub fn due_day(&self) -> u32 {
        self.fee_due_date.day()
    }

    pub fn should_receive_reminders(&self) -> bool {
        self.membership_status == MembershipStatus::Active
    }

    pub fn enabled_channels(&self) -> Vec<Channel> {
        let mut channels = Vec::with_capacity(2);
        if self.reminder_preferences.email {
            channels.push(Channel::Email);
        }
        if self.reminder_preferences.sms {
            channels.push(Channel::Sms);
        }
        channels
    }

    pub fn address_for(&self, channel: Channel) -> &str {
        match channel {
            Channel::Email => &self.email,
            Channel::Sms => &self.phone,
        }
    }
}

impl Entity for Client {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(
            "Asha",
            "asha@example.com",
            "+911234567890",
            1500.0,
            NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
        )
    }

    #[test]
    fn defaults_to_active_email_only() {
        let client = client();
        assert!(client.should_receive_reminders());
        assert_eq!(client.enabled_channels(), vec![Channel::Email]);
        assert_eq!(client.due_day(), 5);
    }

    #[test]
    fn only_active_clients_receive_reminders() {
        let mut client = client();
        for status in &[MembershipStatus::Inactive, MembershipStatus::Suspended] {
            client.membership_status = *status;
            assert!(!client.should_receive_reminders());
        }
    }

    #[test]
    fn addresses_per_channel() {
        let mut client = client();
        client.reminder_preferences = ReminderPreferences {
            email: true,
            sms: true,
        };
        assert_eq!(client.enabled_channels(), vec![Channel::Email, Channel::Sms]);
        assert_eq!(client.address_for(Channel::Email), "asha@example.com");
        assert_eq!(client.address_for(Channel::Sms), "+911234567890");
    }

    #[test]
    fn parses_membership_status() {
        assert_eq!(
            "Suspended".parse::<MembershipStatus>().unwrap(),
            MembershipStatus::Suspended
        );
        assert!("active".parse::<MembershipStatus>().is_err());
    }
}
