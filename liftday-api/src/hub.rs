//! Broadcast hub for live competition events
//!
//! One fan-out channel per competition. Delivery is best-effort and
//! non-blocking: publishing never waits on subscribers, and a receiver
//! that lags past the channel capacity loses events rather than
//! stalling anyone else. The hub is constructed once per process and
//! injected wherever events are published, so tests can stand up their
//! own instance.

use std::collections::HashMap;
use std::sync::Mutex;

use liftday_common::events::CompetitionEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

/// Default per-competition event buffer
const DEFAULT_CAPACITY: usize = 100;

/// Per-competition event fan-out
pub struct BroadcastHub {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<CompetitionEvent>>>,
    capacity: usize,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        info!("Broadcast hub initialized with capacity {}", capacity);
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Subscribe to one competition's event stream
    ///
    /// Dropping the receiver unsubscribes; no explicit deregistration is
    /// needed.
    pub fn subscribe(&self, competition_id: Uuid) -> broadcast::Receiver<CompetitionEvent> {
        let mut channels = self.channels.lock().unwrap();
        let tx = channels
            .entry(competition_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        tx.subscribe()
    }

    /// Publish an event to every subscriber of the competition
    ///
    /// Events for the same competition are delivered in publish order.
    /// Publishing to a competition with no subscribers is a no-op: the
    /// domain transition that produced the event has already committed.
    pub fn publish(&self, competition_id: Uuid, event: CompetitionEvent) {
        let kind = event.kind();
        let mut channels = self.channels.lock().unwrap();
        if let Some(tx) = channels.get(&competition_id) {
            match tx.send(event) {
                Ok(count) => debug!(
                    "Broadcast {} to {} subscribers of competition {}",
                    kind, count, competition_id
                ),
                Err(_) => {
                    // Last receiver disconnected; drop the channel so the
                    // map does not accumulate dead competitions
                    channels.remove(&competition_id);
                }
            }
        }
    }

    /// Number of live subscribers for a competition
    pub fn subscriber_count(&self, competition_id: Uuid) -> usize {
        let channels = self.channels.lock().unwrap();
        channels
            .get(&competition_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop every channel, ending all subscriber streams
    pub fn shutdown(&self) {
        let mut channels = self.channels.lock().unwrap();
        let count = channels.len();
        channels.clear();
        info!("Broadcast hub shut down, {} channels drained", count);
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use liftday_common::types::Verdict;

    fn closed_event(competition_id: Uuid, white: u32) -> CompetitionEvent {
        CompetitionEvent::AttemptClosed {
            attempt_id: Uuid::new_v4(),
            competition_id,
            verdict: Verdict::Passed,
            white,
            red: 0,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let hub = BroadcastHub::new();
        let competition = Uuid::new_v4();
        let mut rx = hub.subscribe(competition);

        for white in 0..3 {
            hub.publish(competition, closed_event(competition, white));
        }

        for expected in 0..3 {
            match rx.recv().await.unwrap() {
                CompetitionEvent::AttemptClosed { white, .. } => assert_eq!(white, expected),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn competitions_are_isolated() {
        let hub = BroadcastHub::new();
        let comp_a = Uuid::new_v4();
        let comp_b = Uuid::new_v4();
        let mut rx_a = hub.subscribe(comp_a);
        let mut rx_b = hub.subscribe(comp_b);

        hub.publish(comp_a, closed_event(comp_a, 7));

        match rx_a.recv().await.unwrap() {
            CompetitionEvent::AttemptClosed { white, .. } => assert_eq!(white, 7),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let hub = BroadcastHub::new();
        let competition = Uuid::new_v4();
        // Must not panic or error
        hub.publish(competition, closed_event(competition, 0));
        assert_eq!(hub.subscriber_count(competition), 0);
    }

    #[tokio::test]
    async fn dropped_receiver_is_reclaimed() {
        let hub = BroadcastHub::new();
        let competition = Uuid::new_v4();
        let rx = hub.subscribe(competition);
        assert_eq!(hub.subscriber_count(competition), 1);

        drop(rx);
        // First publish after the drop notices the dead channel
        hub.publish(competition, closed_event(competition, 0));
        assert_eq!(hub.subscriber_count(competition), 0);
    }

    #[tokio::test]
    async fn shutdown_ends_streams() {
        let hub = BroadcastHub::new();
        let competition = Uuid::new_v4();
        let mut rx = hub.subscribe(competition);

        hub.shutdown();
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
