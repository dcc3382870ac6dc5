//! Fan-out of accepted detection events to live subscribers.
//!
//! Purely a notification side effect: the pipeline publishes after
//! persisting and never depends on anyone listening.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::DetectionEvent;

const CHANNEL_CAPACITY: usize = 64;

/// One accepted event plus the score it moved the interview to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveUpdate {
    pub interview_id: String,
    pub event: DetectionEvent,
    pub integrity_score: u8,
}

/// Per-interview broadcast channels keyed by interview id.
#[derive(Default)]
pub struct EventBus {
    channels: Mutex<HashMap<String, broadcast::Sender<LiveUpdate>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, broadcast::Sender<LiveUpdate>>> {
        match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Subscribe to updates for one interview. Late subscribers only see
    /// updates published after they join.
    pub fn subscribe(&self, interview_id: &str) -> broadcast::Receiver<LiveUpdate> {
        let mut channels = self.lock();
        channels
            .entry(interview_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish an update. No-op when the interview has no subscribers.
    pub fn publish(&self, update: LiveUpdate) {
        let channels = self.lock();
        if let Some(sender) = channels.get(&update.interview_id) {
            // Send only fails when every receiver is gone; that's fine.
            let _ = sender.send(update);
        }
    }

    /// Drop the channel for an ended interview.
    pub fn close(&self, interview_id: &str) {
        self.lock().remove(interview_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DetectionType, Severity};
    use chrono::Utc;

    fn update(interview_id: &str, integrity_score: u8) -> LiveUpdate {
        LiveUpdate {
            interview_id: interview_id.to_string(),
            event: DetectionEvent {
                detection_type: DetectionType::PhoneDetected,
                timestamp: Utc::now(),
                duration: 1.2,
                confidence: 0.9,
                description: String::from("Mobile phone detected in frame"),
                severity: Severity::High,
            },
            integrity_score,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_update() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe("iv-1");

        bus.publish(update("iv-1", 85));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.interview_id, "iv-1");
        assert_eq!(received.integrity_score, 85);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let bus = EventBus::new();
        bus.publish(update("iv-unwatched", 90));
    }

    #[tokio::test]
    async fn channels_are_scoped_per_interview() {
        let bus = EventBus::new();
        let mut rx_a = bus.subscribe("iv-a");
        let _rx_b = bus.subscribe("iv-b");

        bus.publish(update("iv-b", 70));
        bus.publish(update("iv-a", 95));

        let received = rx_a.recv().await.unwrap();
        assert_eq!(received.interview_id, "iv-a");
    }
}
