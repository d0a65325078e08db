//! Operator notification sinks

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::common::traits::Notifier;
use crate::common::types::Notification;

/// Writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(target: "notification", title, message, "Notification");
    }
}

/// Forwards notifications into a bounded channel
///
/// Never waits: when the channel is full or closed the notification is
/// dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::Sender<Notification>) -> Self {
        Self { sender }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Err(e) = self.sender.try_send(Notification::new(title, message)) {
            warn!(title, "Notification dropped: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::channels::create_notification_channel;

    #[tokio::test]
    async fn test_channel_notifier_forwards() {
        let (tx, mut rx) = create_notification_channel(4);
        let notifier = ChannelNotifier::new(tx);

        notifier.notify("Binance Closed", "BTCUSDT");

        let received = rx.recv().await.unwrap();
        assert_eq!(received, Notification::new("Binance Closed", "BTCUSDT"));
    }

    #[test]
    fn test_channel_notifier_drops_when_full() {
        let (tx, mut rx) = create_notification_channel(1);
        let notifier = ChannelNotifier::new(tx);

        notifier.notify("first", "kept");
        notifier.notify("second", "dropped");

        assert_eq!(rx.try_recv().unwrap().title, "first");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_log_notifier_does_not_panic() {
        LogNotifier.notify("Bybit Fail", "timeout");
    }
}
