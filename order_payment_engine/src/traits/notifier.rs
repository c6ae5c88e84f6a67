use std::sync::Arc;

use crate::notifications::PushEvent;

/// Best-effort delivery of realtime events to connected users.
///
/// Implementations must never block, queue for later, or retry. An event for a user that is not connected is simply
/// dropped. The return values are informational only.
pub trait Notifier {
    /// Pushes `event` to the user's active channel. Returns `true` if the event was handed to a channel.
    fn notify_user(&self, user_id: &str, event: PushEvent) -> bool;

    /// Pushes `event` to every connected user. Returns the number of channels that accepted it.
    fn notify_all(&self, event: PushEvent) -> usize;

    fn count_connected(&self) -> usize;

    fn is_connected(&self, user_id: &str) -> bool;
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify_user(&self, user_id: &str, event: PushEvent) -> bool {
        self.as_ref().notify_user(user_id, event)
    }

    fn notify_all(&self, event: PushEvent) -> usize {
        self.as_ref().notify_all(event)
    }

    fn count_connected(&self) -> usize {
        self.as_ref().count_connected()
    }

    fn is_connected(&self, user_id: &str) -> bool {
        self.as_ref().is_connected(user_id)
    }
}
