//! Channel type definitions for inter-task communication

use tokio::sync::mpsc;

use super::types::{IntentMessage, Notification};

/// Default channel buffer size
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;

/// Create a new intent channel with the default buffer size
pub fn create_intent_channel() -> (mpsc::Sender<IntentMessage>, mpsc::Receiver<IntentMessage>) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}

/// Create a new notification channel with a custom buffer size
pub fn create_notification_channel(
    size: usize,
) -> (mpsc::Sender<Notification>, mpsc::Receiver<Notification>) {
    mpsc::channel(size)
}
