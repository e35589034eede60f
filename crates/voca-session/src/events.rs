//! Session events for observing the controller.
//!
//! Every state change the controller applies is published on a broadcast
//! channel so a front end can re-render without polling. Events are not
//! persisted; a subscriber sees only what happens after it subscribes.
//!
//! # Example
//!
//! ```
//! use voca_session::events::{EventBroadcaster, SessionEvent};
//!
//! let broadcaster = EventBroadcaster::new(16);
//! let mut receiver = broadcaster.subscribe();
//! broadcaster.send(SessionEvent::discarded(3, 4, "card_loaded"));
//! assert_eq!(receiver.try_recv().unwrap().event_name(), "discarded");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::ReviewAck;
use crate::state::SessionView;

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `transition` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionPayload {
    /// Cycle the transition belongs to.
    pub seq: u64,
    /// Name of the applied transition.
    pub transition: String,
    /// Snapshot after the transition.
    pub view: SessionView,
    /// When the transition was applied.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `discarded` event.
///
/// Sent when a result from a superseded cycle arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscardedPayload {
    /// Cycle the late result belonged to.
    pub seq: u64,
    /// The cycle that is current.
    pub current_seq: u64,
    /// Name of the dropped transition.
    pub transition: String,
}

/// Payload for the `review_recorded` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecordedPayload {
    /// Cycle the review was submitted in.
    pub seq: u64,
    /// The backend's acknowledgement.
    pub ack: ReviewAck,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Events published by a [`StudySession`](crate::StudySession).
///
/// Serialized as JSON objects with `event` and `payload` fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A transition was applied.
    Transition(TransitionPayload),
    /// A stale transition was dropped.
    Discarded(DiscardedPayload),
    /// A review was accepted by the backend.
    ReviewRecorded(ReviewRecordedPayload),
}

impl SessionEvent {
    /// Creates a `Transition` event stamped with the current time.
    #[must_use]
    pub fn transition(seq: u64, transition: impl Into<String>, view: SessionView) -> Self {
        Self::Transition(TransitionPayload {
            seq,
            transition: transition.into(),
            view,
            timestamp: Utc::now(),
        })
    }

    /// Creates a `Discarded` event.
    #[must_use]
    pub fn discarded(seq: u64, current_seq: u64, transition: impl Into<String>) -> Self {
        Self::Discarded(DiscardedPayload {
            seq,
            current_seq,
            transition: transition.into(),
        })
    }

    /// Creates a `ReviewRecorded` event.
    #[must_use]
    pub const fn review_recorded(seq: u64, ack: ReviewAck) -> Self {
        Self::ReviewRecorded(ReviewRecordedPayload { seq, ack })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Transition(_) => "transition",
            Self::Discarded(_) => "discarded",
            Self::ReviewRecorded(_) => "review_recorded",
        }
    }

    /// The cycle this event belongs to.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        match self {
            Self::Transition(p) => p.seq,
            Self::Discarded(p) => p.seq,
            Self::ReviewRecorded(p) => p.seq,
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts session events to every subscriber.
///
/// A subscriber that falls more than `capacity` events behind receives a
/// `Lagged` error and misses the oldest events.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster buffering `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publishes `event`, returning how many subscribers will see it.
    pub fn send(&self, event: SessionEvent) -> usize {
        // Err only means nobody is subscribed
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
