//! Change notifications for the display collaborator

use formzone_schema::SchemaChange;
use tokio::sync::broadcast;
use tracing::trace;

/// Default notification buffer
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// What changed, and on which entity
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// Structural schema edit
    Schema(SchemaChange),
    /// A captured value changed
    ValueSet { document: String, field: String },
    /// A record's ledger was edited
    CommentsChanged { document: String },
    /// A record moved to the review dataset
    Escalated { document: String },
    /// A record returned to the clean dataset
    DeEscalated { document: String },
    /// Validation findings merged into a record's ledger
    ValidationMerged { document: String, added: usize },
}

/// Broadcast channel of [`ChangeEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// Create bus buffering up to `capacity` events per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// New receiver for events published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; having no subscribers is fine
    pub fn publish(&self, event: ChangeEvent) {
        if self.sender.send(event).is_err() {
            trace!("change event dropped, no subscribers");
        }
    }

    /// Current subscriber count
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
