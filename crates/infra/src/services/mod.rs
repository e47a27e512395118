mod notifier;

pub use notifier::{
    INotifier, InMemoryNotifier, NotifierReceipt, SentMessage, TransportError, WebhookNotifier,
};
