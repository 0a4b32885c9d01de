//! Room-scoped broadcast topics.
//!
//! Every participant joins a named topic and gets a publisher/subscriber
//! pair. Messages are delivered to every other member of the topic; the
//! sender's own subscriber never sees its posts. Delivery is fire-and-forget:
//! nothing is acknowledged and slow subscribers may skip messages.

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Message on a topic together with the member that posted it
#[derive(Clone, Debug)]
pub struct Posted {
    pub sender: String,
    pub message: Value,
}

/// Registry of broadcast topics
pub struct BroadcastHub {
    topics: DashMap<String, broadcast::Sender<Posted>>,
    capacity: usize,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Join `topic` as `member`, creating the topic on first use.
    ///
    /// Topics left without subscribers are dropped here; a publisher that
    /// outlives every subscriber keeps posting into the dropped channel.
    pub fn join(&self, topic: &str, member: &str) -> (RoomPublisher, RoomSubscriber) {
        self.topics
            .retain(|name, tx| name == topic || tx.receiver_count() > 0);

        let tx = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone();
        let rx = tx.subscribe();

        debug!(topic = %topic, member = %member, "Joined broadcast topic");

        (
            RoomPublisher {
                tx,
                topic: topic.to_string(),
                member: member.to_string(),
            },
            RoomSubscriber {
                rx,
                member: member.to_string(),
            },
        )
    }

    /// Number of live subscribers on `topic`
    pub fn member_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Posting side of a topic membership
#[derive(Clone)]
pub struct RoomPublisher {
    tx: broadcast::Sender<Posted>,
    topic: String,
    member: String,
}

impl RoomPublisher {
    /// Post to every other member. Returns how many subscribers were
    /// reachable, including the sender's own.
    pub fn post(&self, message: Value) -> usize {
        self.tx
            .send(Posted {
                sender: self.member.clone(),
                message,
            })
            .unwrap_or(0)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Receiving side of a topic membership
pub struct RoomSubscriber {
    rx: broadcast::Receiver<Posted>,
    member: String,
}

impl RoomSubscriber {
    /// Next message posted by another member; `None` once the topic is gone
    pub async fn recv(&mut self) -> Option<Value> {
        loop {
            match self.rx.recv().await {
                Ok(posted) if posted.sender == self.member => continue,
                Ok(posted) => return Some(posted.message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Broadcast subscriber lagged, skipped messages");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<Value> {
        loop {
            match self.rx.try_recv() {
                Ok(posted) if posted.sender == self.member => continue,
                Ok(posted) => return Some(posted.message),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Broadcast subscriber lagged, skipped messages");
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_reaches_other_members_only() {
        let hub = BroadcastHub::default();
        let (pub_a, mut sub_a) = hub.join("agent-office-r1", "a");
        let (_pub_b, mut sub_b) = hub.join("agent-office-r1", "b");

        pub_a.post(json!({"hello": 1}));

        assert_eq!(sub_b.try_recv(), Some(json!({"hello": 1})));
        assert_eq!(sub_a.try_recv(), None);
    }

    #[test]
    fn test_topics_are_isolated() {
        let hub = BroadcastHub::default();
        let (pub_a, _sub_a) = hub.join("agent-office-r1", "a");
        let (_pub_c, mut sub_c) = hub.join("agent-office-r2", "c");

        pub_a.post(json!("ping"));
        assert_eq!(sub_c.try_recv(), None);
    }

    #[test]
    fn test_member_count() {
        let hub = BroadcastHub::default();
        assert_eq!(hub.member_count("t"), 0);

        let (_p1, s1) = hub.join("t", "a");
        let (_p2, _s2) = hub.join("t", "b");
        assert_eq!(hub.member_count("t"), 2);

        drop(s1);
        assert_eq!(hub.member_count("t"), 1);
    }

    #[test]
    fn test_join_prunes_abandoned_topics() {
        let hub = BroadcastHub::default();
        let (_p1, s1) = hub.join("agent-office-r1", "a");
        let (_p2, _s2) = hub.join("agent-office-r2", "b");
        assert_eq!(hub.topic_count(), 2);

        drop(s1);
        let (_p3, _s3) = hub.join("agent-office-r3", "c");
        assert_eq!(hub.topic_count(), 2);
        assert_eq!(hub.member_count("agent-office-r1"), 0);
        assert_eq!(hub.member_count("agent-office-r2"), 1);
    }

    #[test]
    fn test_lagging_subscriber_keeps_receiving() {
        let hub = BroadcastHub::new(2);
        let (pub_a, _sub_a) = hub.join("t", "a");
        let (_pub_b, mut sub_b) = hub.join("t", "b");

        for i in 0..5 {
            pub_a.post(json!(i));
        }

        // Oldest messages were dropped; the newest ones still arrive
        assert_eq!(sub_b.try_recv(), Some(json!(3)));
        assert_eq!(sub_b.try_recv(), Some(json!(4)));
        assert_eq!(sub_b.try_recv(), None);
    }

    #[tokio::test]
    async fn test_recv_async() {
        let hub = BroadcastHub::default();
        let (pub_a, _sub_a) = hub.join("t", "a");
        let (_pub_b, mut sub_b) = hub.join("t", "b");

        pub_a.post(json!({"n": 1}));
        assert_eq!(sub_b.recv().await, Some(json!({"n": 1})));
    }
}
