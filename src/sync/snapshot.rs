use crate::roster::{Agent, AgentStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Unit of synchronization, persisted and broadcast as-is
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub selected_agent_id: String,
    pub statuses: BTreeMap<String, AgentStatus>,
    /// Milliseconds since epoch; the last-write-wins merge key
    pub updated_at: i64,
}

/// Peer notification wrapping a snapshot.
///
/// The payload stays untyped so a partially valid snapshot from a peer can
/// still be applied agent by agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncEnvelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "roomId", default)]
    pub room_id: String,
    /// Context id of the sender
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub payload: Value,
}

impl SyncEnvelope {
    /// Lenient read of an incoming message; `None` when it is not an envelope
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Uninitialized,
    Hydrating,
    Ready,
}

/// Transport that delivered the most recent state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Durable-storage notifications only
    StorageOnly,
    /// Room broadcast available
    Live,
}

impl SyncMode {
    pub fn label(&self) -> &'static str {
        match self {
            SyncMode::StorageOnly => "Tab Sync",
            SyncMode::Live => "Live Sync",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of offering a peer update to the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Accepted and committed without echoing
    Applied,
    /// Wrong kind, room, slot, or our own message
    Mismatch,
    /// Missing, invalid, or not newer than the last applied `updatedAt`
    Stale,
    /// Storage value could not be decoded
    Malformed,
    /// Engine has not started yet
    NotReady,
}

/// Read-only state of one context, published after every change
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkspaceView {
    pub room_id: String,
    pub context_id: String,
    pub phase: SyncPhase,
    pub agents: Vec<Agent>,
    pub selected_agent_id: String,
    pub updated_at: i64,
    pub sync_mode: SyncMode,
    pub last_remote_sync_at: Option<i64>,
    pub share_link: String,
}

impl WorkspaceView {
    pub fn status_of(&self, agent_id: &str) -> Option<AgentStatus> {
        self.agents
            .iter()
            .find(|agent| agent.id == agent_id)
            .map(|agent| agent.status)
    }

    pub fn statuses(&self) -> BTreeMap<String, AgentStatus> {
        crate::roster::build_statuses(&self.agents)
    }
}

/// Latest timestamp accepted from untrusted input, the end of the JS date range
pub(crate) const MAX_TIMESTAMP_MILLIS: i64 = 8_640_000_000_000_000;

/// Millisecond timestamp from an untrusted JSON number, rounded up when fractional
pub(crate) fn timestamp_millis(value: &Value) -> Option<i64> {
    let millis = match value.as_i64() {
        Some(millis) => millis,
        None => {
            let float = value.as_f64()?;
            if !float.is_finite() || float.abs() > MAX_TIMESTAMP_MILLIS as f64 {
                return None;
            }
            float.ceil() as i64
        }
    };
    (-MAX_TIMESTAMP_MILLIS..=MAX_TIMESTAMP_MILLIS)
        .contains(&millis)
        .then_some(millis)
}
