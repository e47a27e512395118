use crate::{
    client::{Channel, Client},
    date::format_date,
    slot::PaymentSlot,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MessageSettings {
    /// Sign-off used at the end of every reminder
    pub sender_name: String,
    /// Prefix for fee amounts, e.g. "₹"
    pub currency_symbol: String,
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            sender_name: "FeeAlert Team".into(),
            currency_symbol: "₹".into(),
        }
    }
}

impl MessageSettings {
    fn amount(&self, client: &Client) -> String {
        format!("{}{:.2}", self.currency_symbol, client.fee_amount)
    }
}

/// A rendered reminder ready to be handed to a notifier
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderMessage {
    pub subject: String,
    pub body: String,
}

const SLOT_SUBJECT: &str = "Fee Payment Window Open - Action Required";

const EMAIL_FOOTER: &str = "---\n\
This is an automated reminder. Please do not reply to this email.\n\
For any queries, please contact our support team.";

impl ReminderMessage {
    pub fn for_slot(
        client: &Client,
        slot: &PaymentSlot,
        channel: Channel,
        settings: &MessageSettings,
    ) -> Self {
        let period = slot.payment_period();
        let due_date = format_date(&client.fee_due_date);
        let body = match channel {
            Channel::Email => format!(
                "Dear {name},\n\n\
                 This is a reminder that your fee payment window is currently open.\n\n\
                 Payment Details:\n\
                 - Payment Window: {period} of this month\n\
                 - Due Date: {due_date}\n\
                 - Amount: {amount}\n\n\
                 IMPORTANT: Please ensure to make the payment within the current payment window ({period}) to avoid any late fee charges.\n\n\
                 If you have already made the payment, please disregard this reminder and accept our thanks.\n\n\
                 Best regards,\n\
                 {sender}\n\n\
                 {footer}",
                name = client.name,
                period = period,
                due_date = due_date,
                amount = settings.amount(client),
                sender = settings.sender_name,
                footer = EMAIL_FOOTER,
            ),
            Channel::Sms => format!(
                "Dear {}, your fee payment window ({}) is open. Due date: {}. Amount: {}. - {}",
                client.name,
                period,
                due_date,
                settings.amount(client),
                settings.sender_name
            ),
        };

        Self {
            subject: SLOT_SUBJECT.into(),
            body,
        }
    }

    pub fn for_pre_due(
        client: &Client,
        days_before_due: u32,
        channel: Channel,
        settings: &MessageSettings,
    ) -> Self {
        let due_in = if days_before_due == 1 {
            "tomorrow".to_string()
        } else {
            format!("in {} days", days_before_due)
        };
        let urgent = days_before_due <= 3;
        let due_date = format_date(&client.fee_due_date);

        let body = match channel {
            Channel::Email => {
                let mut body = format!(
                    "Dear {},\n\n{}This is a reminder that your fee payment is due {}.\n\n\
                     Payment Details:\n\
                     - Due Date: {}\n\
                     - Days Remaining: {}\n\
                     - Amount: {}\n\n",
                    client.name,
                    if urgent { "IMPORTANT: " } else { "" },
                    due_in,
                    due_date,
                    days_before_due,
                    settings.amount(client),
                );
                if urgent {
                    body.push_str(
                        "URGENT ACTION REQUIRED: Please ensure your payment is made before the due date to avoid any late fees or service interruptions.\n\n",
                    );
                }
                body.push_str(&format!(
                    "If you have already made the payment, please disregard this reminder and accept our thanks.\n\n\
                     Best regards,\n{}\n\n{}",
                    settings.sender_name, EMAIL_FOOTER
                ));
                body
            }
            Channel::Sms => format!(
                "Dear {}, your fee payment of {} is due {} ({}). - {}",
                client.name,
                settings.amount(client),
                due_in,
                due_date,
                settings.sender_name
            ),
        };

        Self {
            subject: pre_due_subject(days_before_due),
            body,
        }
    }
}

fn pre_due_subject(days_before_due: u32) -> String {
    match days_before_due {
        1 => "URGENT: Fee Payment Due Tomorrow".into(),
        2..=3 => format!("Important: Fee Payment Due in {} Days", days_before_due),
        _ => format!("Upcoming Fee Payment - {} Days Reminder", days_before_due),
    }
}
