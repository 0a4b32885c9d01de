use crate::broadcast::{BroadcastHub, RoomSubscriber};
use crate::clock::SharedClock;
use crate::config::SyncConfig;
use crate::link::{self, ShareLink};
use crate::roster::AgentStatus;
use crate::storage::{SharedStore, StorageSubscription};
use crate::sync::engine::SyncEngine;
use crate::sync::snapshot::WorkspaceView;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, trace};

/// Pending local actions per context before senders wait
const ACTION_CHANNEL_CAPACITY: usize = 64;

/// User action against the shared workspace
#[derive(Clone, Debug, PartialEq)]
pub enum LocalAction {
    SelectAgent(String),
    CycleStatus(String),
    SetStatus { agent_id: String, status: AgentStatus },
    ShuffleStatuses,
}

/// Handle to a running context task
pub struct ContextHandle {
    context_id: String,
    room_id: String,
    actions: mpsc::Sender<LocalAction>,
    view: watch::Receiver<WorkspaceView>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ContextHandle {
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Queue a local action; fails once the context has stopped
    pub async fn dispatch(&self, action: LocalAction) -> Result<()> {
        self.actions
            .send(action)
            .await
            .map_err(|_| anyhow!("Context {} has stopped", self.context_id))
    }

    /// Latest published view
    pub fn view(&self) -> WorkspaceView {
        self.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<WorkspaceView> {
        self.view.clone()
    }

    /// Wait until the published view satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&WorkspaceView) -> bool,
    ) -> Result<WorkspaceView> {
        let mut rx = self.view.clone();
        let view = rx
            .wait_for(predicate)
            .await
            .context("Context stopped before the view matched")?
            .clone();
        Ok(view)
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.task.await.context("Context task failed")?;
        Ok(())
    }
}

/// Open a context for the room named in `link` and start syncing.
///
/// The room id is resolved (and generated if missing), the engine hydrates
/// from the link, the room's durable slot, or the default roster, and the
/// task begins listening for peer updates. Joins the room's broadcast topic
/// when a hub is given and broadcast is enabled.
pub fn spawn_context(
    config: &SyncConfig,
    mut link: ShareLink,
    store: SharedStore,
    hub: Option<&BroadcastHub>,
    clock: SharedClock,
) -> ContextHandle {
    let room_id = link.resolve_room_id(&config.room_param);
    let context_id = link::generate_context_id();

    let mut engine = SyncEngine::new(config.clone(), &room_id, &context_id, store.clone(), clock);

    let room = match hub.filter(|_| config.broadcast_enabled) {
        Some(hub) => {
            let (publisher, subscriber) = hub.join(&config.topic(&room_id), &context_id);
            engine = engine.with_publisher(publisher);
            Some(subscriber)
        }
        None => None,
    };

    // Subscribe before the first commit so no peer write is missed
    let storage = StorageSubscription::new(store.as_ref(), &context_id);

    engine.hydrate(&link);
    engine.start();

    spawn_engine(engine, storage, room)
}

/// Run an already started engine on its own task
pub fn spawn_engine(
    engine: SyncEngine,
    storage: StorageSubscription,
    room: Option<RoomSubscriber>,
) -> ContextHandle {
    let (actions_tx, actions_rx) = mpsc::channel(ACTION_CHANNEL_CAPACITY);
    let (view_tx, view_rx) = watch::channel(engine.view());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let context_id = engine.context_id().to_string();
    let room_id = engine.room_id().to_string();

    let task = tokio::spawn(run_context(
        engine,
        actions_rx,
        storage,
        room,
        view_tx,
        shutdown_rx,
    ));

    ContextHandle {
        context_id,
        room_id,
        actions: actions_tx,
        view: view_rx,
        shutdown: shutdown_tx,
        task,
    }
}

/// Context event loop; each event is handled to completion before the next
async fn run_context(
    mut engine: SyncEngine,
    mut actions: mpsc::Receiver<LocalAction>,
    mut storage: StorageSubscription,
    mut room: Option<RoomSubscriber>,
    view_tx: watch::Sender<WorkspaceView>,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!(
        room_id = %engine.room_id(),
        context_id = %engine.context_id(),
        "Context running"
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            action = actions.recv() => {
                match action {
                    Some(action) => apply_action(&mut engine, action),
                    // Every handle dropped
                    None => break,
                }
            }

            Some(change) = storage.recv() => {
                let outcome = engine.apply_storage_change(&change);
                trace!(outcome = ?outcome, key = %change.key, "Storage change handled");
            }

            Some(message) = recv_room(&mut room) => {
                let outcome = engine.apply_envelope(&message);
                trace!(outcome = ?outcome, "Room broadcast handled");
            }
        }

        let next = engine.view();
        view_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    info!(
        room_id = %engine.room_id(),
        context_id = %engine.context_id(),
        "Context stopped"
    );
}

fn apply_action(engine: &mut SyncEngine, action: LocalAction) {
    let changed = match &action {
        LocalAction::SelectAgent(agent_id) => engine.select_agent(agent_id),
        LocalAction::CycleStatus(agent_id) => engine.cycle_status(agent_id),
        LocalAction::SetStatus { agent_id, status } => engine.set_status(agent_id, *status),
        LocalAction::ShuffleStatuses => engine.shuffle_statuses(),
    };
    trace!(action = ?action, changed = changed, "Local action handled");
}

async fn recv_room(room: &mut Option<RoomSubscriber>) -> Option<Value> {
    match room {
        Some(subscriber) => subscriber.recv().await,
        None => std::future::pending().await,
    }
}
