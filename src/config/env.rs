use super::{OfficeConfig, StorageBackend};
use std::path::PathBuf;
use tracing::warn;

impl OfficeConfig {
    /// Apply `OFFICESYNC_*` environment overrides on top of file settings.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`; unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("OFFICESYNC_BROADCAST_ENABLED") {
            match v.parse::<bool>() {
                Ok(b) => self.sync.broadcast_enabled = b,
                Err(_) => warn!(value = %v, "Ignoring invalid OFFICESYNC_BROADCAST_ENABLED"),
            }
        }
        if let Some(v) = lookup("OFFICESYNC_STORAGE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.storage.backend = StorageBackend::Memory,
                "sqlite" => self.storage.backend = StorageBackend::Sqlite,
                _ => warn!(value = %v, "Ignoring invalid OFFICESYNC_STORAGE_BACKEND"),
            }
        }
        if let Some(v) = lookup("OFFICESYNC_STORAGE_PATH") {
            if !v.is_empty() {
                self.storage.path = PathBuf::from(v);
            }
        }
        if let Some(v) = lookup("OFFICESYNC_BUBBLE_TTL_MS") {
            match v.parse::<i64>() {
                Ok(n) if n > 0 => self.chat.bubble_ttl_ms = n,
                _ => warn!(value = %v, "Ignoring invalid OFFICESYNC_BUBBLE_TTL_MS"),
            }
        }
        if let Some(v) = lookup("OFFICESYNC_MAX_MESSAGES") {
            match v.parse::<usize>() {
                Ok(n) if n > 0 => self.chat.max_messages = n,
                _ => warn!(value = %v, "Ignoring invalid OFFICESYNC_MAX_MESSAGES"),
            }
        }

        self
    }
}
