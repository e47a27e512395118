pub mod dispatch_reminders;
pub mod select_eligible_clients;
pub mod send_pre_due_reminders;
pub mod send_slot_reminders;
