use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Presence status of an agent.
///
/// Declaration order is the status order used when cycling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Focus,
    Idle,
    Offline,
}

impl AgentStatus {
    /// All statuses in status order
    pub const ORDER: [AgentStatus; 4] = [
        AgentStatus::Active,
        AgentStatus::Focus,
        AgentStatus::Idle,
        AgentStatus::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Focus => "focus",
            AgentStatus::Idle => "idle",
            AgentStatus::Offline => "offline",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            AgentStatus::Active => "Active",
            AgentStatus::Focus => "Focus",
            AgentStatus::Idle => "Idle",
            AgentStatus::Offline => "Offline",
        }
    }

    /// Next status in status order, wrapping around
    pub fn next(self) -> Self {
        let index = Self::ORDER.iter().position(|s| *s == self).unwrap_or(0);
        Self::ORDER[(index + 1) % Self::ORDER.len()]
    }

    /// Parse one of the four wire names; anything else is rejected
    pub fn parse(value: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status name
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown agent status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for AgentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Agent shown in the shared workspace.
///
/// Identity fields never change after creation. A status change produces a
/// new `Agent` via [`Agent::with_status`] rather than mutating in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier (e.g., "pm-02")
    pub id: String,

    /// Display name
    pub name: String,

    /// Team role
    pub role: String,

    /// Accent color (CSS hex)
    pub accent: String,

    /// Current presence status
    pub status: AgentStatus,
}

impl Agent {
    pub fn new(id: &str, name: &str, role: &str, accent: &str, status: AgentStatus) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            accent: accent.to_string(),
            status,
        }
    }

    /// Copy of this agent carrying a different status
    pub fn with_status(&self, status: AgentStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
