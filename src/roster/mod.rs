// Agent roster: entity model, status maps, default crew

mod entity;

pub use entity::{Agent, AgentStatus, UnknownStatus};

use serde_json::Value;
use std::collections::BTreeMap;


/// Agent selected when nothing else is known
pub const DEFAULT_SELECTED_AGENT_ID: &str = "pm-02";

/// Built-in crew used when no roster is supplied
pub fn default_roster() -> Vec<Agent> {
    vec![
        Agent::new("ops-01", "Kim Chief", "Ops", "#58ffc9", AgentStatus::Focus),
        Agent::new("pm-02", "Lee PM", "PM", "#d9b8ff", AgentStatus::Active),
        Agent::new("be-03", "Park Backend", "Backend", "#f0a6ff", AgentStatus::Active),
        Agent::new("data-04", "On Data", "Data", "#bfa9d9", AgentStatus::Idle),
        Agent::new("design-05", "Han Design", "Design", "#fcf9f2", AgentStatus::Offline),
        Agent::new("plan-06", "Jung Plan", "Planning", "#d9ff7f", AgentStatus::Active),
        Agent::new("qa-07", "Cho QA", "QA", "#ffd67a", AgentStatus::Idle),
    ]
}

/// Build the id -> status map carried in snapshots
pub fn build_statuses(agents: &[Agent]) -> BTreeMap<String, AgentStatus> {
    agents
        .iter()
        .map(|agent| (agent.id.clone(), agent.status))
        .collect()
}

/// Apply an untrusted id -> status map to a roster.
///
/// Each agent is replaced only when the incoming map names it with one of the
/// four valid statuses. Unknown ids and invalid values are ignored per agent;
/// a missing or non-object map leaves the roster unchanged.
pub fn apply_statuses(agents: &[Agent], incoming: Option<&Value>) -> Vec<Agent> {
    let statuses = incoming.and_then(Value::as_object);

    agents
        .iter()
        .map(|agent| {
            let next = statuses
                .and_then(|map| map.get(&agent.id))
                .and_then(Value::as_str)
                .and_then(AgentStatus::parse);

            match next {
                Some(status) if status != agent.status => agent.with_status(status),
                _ => agent.clone(),
            }
        })
        .collect()
}

/// Whether `agent_id` names an agent in the roster
pub fn contains(agents: &[Agent], agent_id: &str) -> bool {
    agents.iter().any(|agent| agent.id == agent_id)
}

/// 31-multiplier rolling hash over UTF-16 code units, wrapping at u32
pub fn hash_text(text: &str) -> u32 {
    text.encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Deterministically pick an avatar asset for a display name
pub fn avatar_for_name<'a>(name: &str, avatars: &'a [String]) -> Option<&'a str> {
    if avatars.is_empty() {
        return None;
    }
    let index = hash_text(name) as usize % avatars.len();
    Some(avatars[index].as_str())
}
