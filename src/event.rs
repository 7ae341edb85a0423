//! Domain events published when transaction journals change.

use tokio::sync::broadcast;

use crate::database_id::JournalId;

/// Something happened to a transaction journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalEvent {
    /// A new journal was stored.
    Stored(JournalId),
    /// An existing journal was updated.
    Updated(JournalId),
}

/// Fans journal events out to any number of listeners.
///
/// Listeners that fall behind by more than the bus capacity miss the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<JournalEvent>,
}

impl EventBus {
    /// Create a bus that buffers up to `capacity` events per listener.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self { sender }
    }

    /// Publish `event` to every current listener.
    ///
    /// Publishing with no listeners is not an error.
    pub fn emit(&self, event: JournalEvent) {
        match self.sender.send(event) {
            Ok(listener_count) => {
                tracing::debug!("Sent {event:?} to {listener_count} listener(s).")
            }
            Err(_) => tracing::debug!("No listeners for {event:?}."),
        }
    }

    /// Start listening for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<JournalEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
