use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod env;

/// Complete officesync configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfficeConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub world: WorldConfig,
}

/// Naming and transport settings for cross-context sync
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Durable slot key is "{storage_key_prefix}:{room_id}"
    #[serde(default = "default_storage_key_prefix")]
    pub storage_key_prefix: String,
    /// Broadcast topic is "{channel_prefix}-{room_id}"
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
    /// Envelope kind accepted and emitted
    #[serde(default = "default_message_kind")]
    pub message_kind: String,
    /// Query parameter carrying the room id in share links
    #[serde(default = "default_room_param")]
    pub room_param: String,
    /// When false, contexts rely on storage notifications only
    #[serde(default = "default_broadcast_enabled")]
    pub broadcast_enabled: bool,
    /// Per-topic buffer before slow receivers start lagging
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_storage_key_prefix() -> String {
    "agent-office-state-v1".to_string()
}

fn default_channel_prefix() -> String {
    "agent-office".to_string()
}

fn default_message_kind() -> String {
    "workspace_sync".to_string()
}

fn default_room_param() -> String {
    "room".to_string()
}

fn default_broadcast_enabled() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            storage_key_prefix: default_storage_key_prefix(),
            channel_prefix: default_channel_prefix(),
            message_kind: default_message_kind(),
            room_param: default_room_param(),
            broadcast_enabled: default_broadcast_enabled(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl SyncConfig {
    pub fn storage_key(&self, room_id: &str) -> String {
        format!("{}:{}", self.storage_key_prefix, room_id)
    }

    pub fn topic(&self, room_id: &str) -> String {
        format!("{}-{}", self.channel_prefix, room_id)
    }
}

/// Durable slot backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    /// SQLite database file (sqlite backend only)
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Memory
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("officesync.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
        }
    }
}

/// Chat history and bubble limits
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    #[serde(default = "default_bubble_ttl_ms")]
    pub bubble_ttl_ms: i64,
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "default_max_nickname_length")]
    pub max_nickname_length: usize,
}

fn default_max_messages() -> usize {
    120
}

fn default_bubble_ttl_ms() -> i64 {
    18_000
}

fn default_max_message_length() -> usize {
    220
}

fn default_max_nickname_length() -> usize {
    12
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            bubble_ttl_ms: default_bubble_ttl_ms(),
            max_message_length: default_max_message_length(),
            max_nickname_length: default_max_nickname_length(),
        }
    }
}

/// Floor plan dimensions
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_width")]
    pub width: f64,
    #[serde(default = "default_world_height")]
    pub height: f64,
}

fn default_world_width() -> f64 {
    960.0
}

fn default_world_height() -> f64 {
    540.0
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_width(),
            height: default_world_height(),
        }
    }
}

impl WorldConfig {
    pub fn size(&self) -> crate::spatial::WorldSize {
        crate::spatial::WorldSize::new(self.width, self.height)
    }
}

/// Load configuration from TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<OfficeConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: OfficeConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
