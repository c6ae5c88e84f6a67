use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::*;
use tokio::sync::{mpsc, mpsc::error::TrySendError};
use uuid::Uuid;

use crate::{notifications::PushEvent, traits::Notifier};

/// Identifies one channel instance. A user who reconnects gets a new id.
pub type ChannelId = Uuid;

/// Events buffered per channel before new ones are dropped.
pub const CHANNEL_BUFFER_SIZE: usize = 64;

struct ChannelHandle {
    id: ChannelId,
    tx: mpsc::Sender<PushEvent>,
    connected_at: DateTime<Utc>,
}

impl ChannelHandle {
    fn new(tx: mpsc::Sender<PushEvent>) -> Self {
        Self { id: Uuid::new_v4(), tx, connected_at: Utc::now() }
    }

    fn try_send(&self, user_id: &str, event: PushEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(ev)) => {
                warn!("🔔️ Channel {} for user {user_id} is full. Dropping {} event", self.id, ev.name());
                false
            },
            Err(TrySendError::Closed(ev)) => {
                debug!("🔔️ Channel {} for user {user_id} is closed. Dropping {} event", self.id, ev.name());
                false
            },
        }
    }
}

/// The in-process registry of realtime channels: one active channel per user.
///
/// Registering a second channel for the same user replaces the first. The superseded channel's sender is dropped,
/// so its receiver drains and then yields `None`, which tells the transport to close that connection.
///
/// Teardown is keyed by [`ChannelId`], so a late teardown of a superseded channel can never remove its replacement.
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: DashMap<String, ChannelHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new channel for `user_id` and returns its id with the receiving end of its event queue.
    pub fn register(&self, user_id: &str) -> (ChannelId, mpsc::Receiver<PushEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let handle = ChannelHandle::new(tx);
        let id = handle.id;
        if let Some(old) = self.channels.insert(user_id.to_string(), handle) {
            info!(
                "🔔️ User {user_id} opened channel {id}. It replaces channel {} (connected since {})",
                old.id, old.connected_at
            );
        } else {
            info!("🔔️ User {user_id} connected on channel {id}");
        }
        (id, rx)
    }

    /// Removes the entry for `user_id`, but only if it still belongs to `channel_id`. Returns `true` if an entry was
    /// removed.
    pub fn unregister(&self, user_id: &str, channel_id: ChannelId) -> bool {
        let removed = self.channels.remove_if(user_id, |_, handle| handle.id == channel_id).is_some();
        if removed {
            info!("🔔️ User {user_id} disconnected from channel {channel_id}");
        } else {
            debug!("🔔️ Channel {channel_id} for user {user_id} was already superseded. Registry left as is");
        }
        removed
    }

    pub fn channel_id(&self, user_id: &str) -> Option<ChannelId> {
        self.channels.get(user_id).map(|h| h.id)
    }
}

impl Notifier for ConnectionRegistry {
    fn notify_user(&self, user_id: &str, event: PushEvent) -> bool {
        match self.channels.get(user_id) {
            Some(handle) => {
                trace!("🔔️ Pushing {} event to user {user_id}", event.name());
                handle.try_send(user_id, event)
            },
            None => {
                debug!("🔔️ User {user_id} is not connected. {} event not delivered", event.name());
                false
            },
        }
    }

    fn notify_all(&self, event: PushEvent) -> usize {
        let delivered = self.channels.iter().filter(|entry| entry.value().try_send(entry.key(), event.clone())).count();
        debug!("🔔️ Broadcast {} event to {delivered} channels", event.name());
        delivered
    }

    fn count_connected(&self) -> usize {
        self.channels.len()
    }

    fn is_connected(&self, user_id: &str) -> bool {
        self.channels.contains_key(user_id)
    }
}
