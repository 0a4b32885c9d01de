// Cross-context workspace sync: snapshot model, merge engine, context runtime

mod engine;
mod runtime;
mod snapshot;

pub use engine::{HydrationSource, SyncEngine};
pub use runtime::{spawn_context, spawn_engine, ContextHandle, LocalAction};
pub use snapshot::{
    ApplyOutcome, SyncEnvelope, SyncMode, SyncPhase, WorkspaceSnapshot, WorkspaceView,
};
