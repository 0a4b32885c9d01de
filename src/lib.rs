// Wall-clock abstraction
pub mod clock;

// Snapshot encoding for storage and share links
pub mod codec;

// TOML configuration
pub mod config;

// Agent roster and status model
pub mod roster;

// Durable per-room state slots
pub mod storage;

// Room-scoped broadcast topics
pub mod broadcast;

// Share links and id generation
pub mod link;

// Cross-context workspace sync
pub mod sync;

// Avatar placement and zones
pub mod spatial;

// Chat log and speech bubbles
pub mod chat;

// Untrusted payload validation
pub mod validation;
