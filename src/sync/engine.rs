use crate::broadcast::RoomPublisher;
use crate::clock::SharedClock;
use crate::codec;
use crate::config::SyncConfig;
use crate::link::ShareLink;
use crate::roster::{self, Agent, AgentStatus};
use crate::storage::{SharedStore, StorageChange};
use crate::sync::snapshot::{
    timestamp_millis, ApplyOutcome, SyncEnvelope, SyncMode, SyncPhase, WorkspaceSnapshot,
    WorkspaceView,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

/// Where hydration found its starting state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HydrationSource {
    LinkFragment,
    DurableSlot,
    Default,
}

/// Shared workspace state of one context in one room.
///
/// Local actions advance `updated_at` monotonically and commit; peer updates
/// are merged last-write-wins on `updatedAt`. A commit persists the snapshot
/// to the room's durable slot, refreshes the share link, and broadcasts to
/// the room unless the commit came from applying a peer update.
pub struct SyncEngine {
    config: SyncConfig,
    room_id: String,
    context_id: String,
    storage_key: String,

    /// Roster as supplied; hydration applies statuses on top of it
    base_roster: Vec<Agent>,
    default_selected: String,

    agents: Vec<Agent>,
    selected_agent_id: String,
    updated_at: i64,

    /// Highest `updatedAt` applied or committed; peers must beat it
    last_applied: i64,
    last_remote_sync_at: Option<i64>,

    phase: SyncPhase,
    sync_mode: SyncMode,

    /// Set while committing a peer update so it is not echoed back
    suppress_next_broadcast: bool,

    store: SharedStore,
    publisher: Option<RoomPublisher>,
    link: ShareLink,
    clock: SharedClock,
}

impl SyncEngine {
    /// Create an engine over the default roster with no broadcast publisher
    pub fn new(
        config: SyncConfig,
        room_id: &str,
        context_id: &str,
        store: SharedStore,
        clock: SharedClock,
    ) -> Self {
        let storage_key = config.storage_key(room_id);
        let base_roster = roster::default_roster();

        Self {
            config,
            room_id: room_id.to_string(),
            context_id: context_id.to_string(),
            storage_key,
            agents: base_roster.clone(),
            base_roster,
            default_selected: roster::DEFAULT_SELECTED_AGENT_ID.to_string(),
            selected_agent_id: roster::DEFAULT_SELECTED_AGENT_ID.to_string(),
            updated_at: 0,
            last_applied: 0,
            last_remote_sync_at: None,
            phase: SyncPhase::Uninitialized,
            sync_mode: SyncMode::StorageOnly,
            suppress_next_broadcast: false,
            store,
            publisher: None,
            link: ShareLink::default(),
            clock,
        }
    }

    /// Replace the roster and its default selection
    pub fn with_roster(mut self, agents: Vec<Agent>, default_selected: &str) -> Self {
        self.agents = agents.clone();
        self.base_roster = agents;
        self.default_selected = default_selected.to_string();
        self.selected_agent_id = default_selected.to_string();
        self
    }

    /// Enable live sync over a room broadcast topic
    pub fn with_publisher(mut self, publisher: RoomPublisher) -> Self {
        self.publisher = Some(publisher);
        self.sync_mode = SyncMode::Live;
        self
    }

    /// Load the starting state.
    ///
    /// Priority: `#state=` fragment of `link`, then the durable slot, then the
    /// roster defaults. Corrupt state is dropped with a warning and never
    /// surfaces as an error.
    pub fn hydrate(&mut self, link: &ShareLink) -> HydrationSource {
        self.phase = SyncPhase::Hydrating;
        self.link = link.clone();

        let (source, decoded) = self.load_bootstrap();
        let now = self.clock.now_millis();

        match decoded {
            Some(state) => {
                self.agents = roster::apply_statuses(&self.base_roster, state.get("statuses"));
                self.selected_agent_id = state
                    .get("selectedAgentId")
                    .and_then(Value::as_str)
                    .filter(|id| roster::contains(&self.base_roster, id))
                    .unwrap_or(self.default_selected.as_str())
                    .to_string();
                self.updated_at = state
                    .get("updatedAt")
                    .and_then(timestamp_millis)
                    .unwrap_or(now);
            }
            None => {
                self.agents = self.base_roster.clone();
                self.selected_agent_id = self.default_selected.clone();
                self.updated_at = now;
            }
        }

        self.last_applied = self.updated_at;

        info!(
            room_id = %self.room_id,
            context_id = %self.context_id,
            source = ?source,
            updated_at = self.updated_at,
            "Workspace hydrated"
        );

        source
    }

    fn load_bootstrap(&mut self) -> (HydrationSource, Option<Value>) {
        if let Some(fragment) = self.link.state_fragment().map(str::to_string) {
            match codec::decode::<Value>(&fragment) {
                Ok(state) => return (HydrationSource::LinkFragment, Some(state)),
                Err(e) => {
                    warn!(room_id = %self.room_id, error = %e, "Discarding corrupt link state");
                    self.link.clear_fragment();
                    return (HydrationSource::Default, None);
                }
            }
        }

        let stored = match self.store.get(&self.storage_key) {
            Ok(stored) => stored.filter(|value| !value.is_empty()),
            Err(e) => {
                warn!(room_id = %self.room_id, error = %e, "Failed to read durable state");
                None
            }
        };

        let Some(stored) = stored else {
            return (HydrationSource::Default, None);
        };

        match codec::decode::<Value>(&stored) {
            Ok(state) => (HydrationSource::DurableSlot, Some(state)),
            Err(e) => {
                warn!(room_id = %self.room_id, error = %e, "Purging corrupt durable state");
                if let Err(e) = self.store.remove(&self.storage_key, &self.context_id) {
                    warn!(room_id = %self.room_id, error = %e, "Failed to purge durable state");
                }
                (HydrationSource::Default, None)
            }
        }
    }

    /// Become Ready and commit the hydrated state once
    pub fn start(&mut self) {
        match self.phase {
            SyncPhase::Ready => return,
            SyncPhase::Uninitialized => {
                let link = self.link.clone();
                self.hydrate(&link);
            }
            SyncPhase::Hydrating => {}
        }

        self.phase = SyncPhase::Ready;
        info!(
            room_id = %self.room_id,
            context_id = %self.context_id,
            mode = %self.sync_mode,
            "Sync engine ready"
        );
        self.commit();
    }

    /// Offer a message received on the room broadcast topic
    pub fn apply_envelope(&mut self, message: &Value) -> ApplyOutcome {
        let Some(envelope) = SyncEnvelope::from_value(message) else {
            trace!(room_id = %self.room_id, "Ignoring non-envelope broadcast");
            return ApplyOutcome::Mismatch;
        };

        if envelope.kind != self.config.message_kind || envelope.room_id != self.room_id {
            trace!(
                kind = %envelope.kind,
                room_id = %envelope.room_id,
                "Ignoring envelope for another kind or room"
            );
            return ApplyOutcome::Mismatch;
        }

        if envelope.source == self.context_id {
            trace!(room_id = %self.room_id, "Ignoring own envelope");
            return ApplyOutcome::Mismatch;
        }

        self.apply_remote(&envelope.payload, SyncMode::Live)
    }

    /// Offer a durable-storage change written by another context
    pub fn apply_storage_change(&mut self, change: &StorageChange) -> ApplyOutcome {
        if change.key != self.storage_key || change.writer == self.context_id {
            trace!(key = %change.key, writer = %change.writer, "Ignoring storage change");
            return ApplyOutcome::Mismatch;
        }

        let Some(encoded) = change.new_value.as_deref().filter(|v| !v.is_empty()) else {
            trace!(key = %change.key, "Ignoring storage removal");
            return ApplyOutcome::Mismatch;
        };

        match codec::decode::<Value>(encoded) {
            Ok(payload) => self.apply_remote(&payload, SyncMode::StorageOnly),
            Err(e) => {
                debug!(key = %change.key, error = %e, "Ignoring malformed storage value");
                ApplyOutcome::Malformed
            }
        }
    }

    /// Merge a peer snapshot last-write-wins on `updatedAt`
    pub fn apply_remote(&mut self, payload: &Value, mode: SyncMode) -> ApplyOutcome {
        if self.phase != SyncPhase::Ready {
            return ApplyOutcome::NotReady;
        }

        let incoming = payload.get("updatedAt").and_then(timestamp_millis);
        let incoming = match incoming {
            Some(ts) if ts != 0 && ts > self.last_applied => ts,
            _ => {
                debug!(
                    room_id = %self.room_id,
                    incoming = ?incoming,
                    last_applied = self.last_applied,
                    "Discarding stale update"
                );
                return ApplyOutcome::Stale;
            }
        };

        self.suppress_next_broadcast = true;
        self.last_applied = incoming;

        self.agents = roster::apply_statuses(&self.agents, payload.get("statuses"));
        if let Some(selected) = payload
            .get("selectedAgentId")
            .and_then(Value::as_str)
            .filter(|id| roster::contains(&self.agents, id))
        {
            self.selected_agent_id = selected.to_string();
        }

        self.updated_at = incoming;
        self.last_remote_sync_at = Some(incoming);
        self.sync_mode = mode;

        debug!(
            room_id = %self.room_id,
            updated_at = incoming,
            mode = %mode,
            "Applied remote update"
        );

        self.commit();
        ApplyOutcome::Applied
    }

    pub fn select_agent(&mut self, agent_id: &str) -> bool {
        if !self.accepts_local_action() || !roster::contains(&self.agents, agent_id) {
            return false;
        }
        self.selected_agent_id = agent_id.to_string();
        self.commit_local();
        true
    }

    /// Advance one agent to the next status in status order
    pub fn cycle_status(&mut self, agent_id: &str) -> bool {
        let Some(current) = self.status_of(agent_id) else {
            return false;
        };
        self.set_status(agent_id, current.next())
    }

    pub fn set_status(&mut self, agent_id: &str, status: AgentStatus) -> bool {
        if !self.accepts_local_action() {
            return false;
        }
        let Some(index) = self.agents.iter().position(|agent| agent.id == agent_id) else {
            return false;
        };
        self.agents[index] = self.agents[index].with_status(status);
        self.commit_local();
        true
    }

    /// Give every agent a random status
    pub fn shuffle_statuses(&mut self) -> bool {
        self.shuffle_statuses_with(&mut rand::thread_rng())
    }

    pub fn shuffle_statuses_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.accepts_local_action() {
            return false;
        }
        self.agents = self
            .agents
            .iter()
            .map(|agent| {
                let status = AgentStatus::ORDER
                    .choose(rng)
                    .copied()
                    .unwrap_or(agent.status);
                agent.with_status(status)
            })
            .collect();
        self.commit_local();
        true
    }

    fn accepts_local_action(&self) -> bool {
        if self.phase != SyncPhase::Ready {
            debug!(room_id = %self.room_id, phase = ?self.phase, "Ignoring action before ready");
            return false;
        }
        true
    }

    fn commit_local(&mut self) {
        let now = self.clock.now_millis();
        self.updated_at = self.updated_at.saturating_add(1).max(now);
        self.commit();
    }

    /// Persist, refresh the link, and broadcast unless suppressed
    fn commit(&mut self) {
        let snapshot = self.snapshot();

        match codec::encode(&snapshot) {
            Ok(encoded) => {
                if let Err(e) = self.store.set(&self.storage_key, &encoded, &self.context_id) {
                    warn!(room_id = %self.room_id, error = %e, "Failed to persist workspace state");
                }
                self.link.set_state_fragment(&encoded);
            }
            Err(e) => {
                warn!(room_id = %self.room_id, error = %e, "Failed to encode workspace state");
            }
        }

        self.last_applied = self.last_applied.max(self.updated_at);

        if self.suppress_next_broadcast {
            self.suppress_next_broadcast = false;
            return;
        }

        let Some(publisher) = &self.publisher else {
            return;
        };

        let envelope = SyncEnvelope {
            kind: self.config.message_kind.clone(),
            room_id: self.room_id.clone(),
            source: self.context_id.clone(),
            payload: match serde_json::to_value(&snapshot) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(room_id = %self.room_id, error = %e, "Failed to build sync envelope");
                    return;
                }
            },
        };

        match serde_json::to_value(&envelope) {
            Ok(message) => {
                let receivers = publisher.post(message);
                trace!(
                    room_id = %self.room_id,
                    updated_at = snapshot.updated_at,
                    receivers = receivers,
                    "Broadcast workspace state"
                );
            }
            Err(e) => warn!(room_id = %self.room_id, error = %e, "Failed to serialize envelope"),
        }
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            selected_agent_id: self.selected_agent_id.clone(),
            statuses: roster::build_statuses(&self.agents),
            updated_at: self.updated_at,
        }
    }

    pub fn view(&self) -> WorkspaceView {
        WorkspaceView {
            room_id: self.room_id.clone(),
            context_id: self.context_id.clone(),
            phase: self.phase,
            agents: self.agents.clone(),
            selected_agent_id: self.selected_agent_id.clone(),
            updated_at: self.updated_at,
            sync_mode: self.sync_mode,
            last_remote_sync_at: self.last_remote_sync_at,
            share_link: self.link.to_string(),
        }
    }

    /// Link that bootstraps a fresh context into the current state
    pub fn share_link(&self) -> &ShareLink {
        &self.link
    }

    pub fn status_of(&self, agent_id: &str) -> Option<AgentStatus> {
        self.agents
            .iter()
            .find(|agent| agent.id == agent_id)
            .map(|agent| agent.status)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn selected_agent_id(&self) -> &str {
        &self.selected_agent_id
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn last_applied(&self) -> i64 {
        self.last_applied
    }

    pub fn last_remote_sync_at(&self) -> Option<i64> {
        self.last_remote_sync_at
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }
}
