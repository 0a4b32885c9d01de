//! Bounded chat history with speech-bubble cache.
//!
//! One `ChatLog` exists per chat session and owns the ordered history, the
//! set of seen ids and the bubbles. Bubble expiry is evaluated lazily when a
//! bubble is read; nothing is reaped in the background.

use crate::clock::{system_clock, SharedClock};
use crate::config::ChatConfig;
use crate::validation::{self, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;
use uuid::Uuid;


/// Chat line, immutable once appended
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,

    /// Context id of the speaker, when the sender supplied one
    #[serde(rename = "clientId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    pub nickname: String,

    pub text: String,

    /// Unix epoch milliseconds
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl ChatMessage {
    /// New outgoing message with a time-ordered id
    pub fn compose(client_id: &str, nickname: &str, text: &str, now_millis: i64) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            client_id: Some(client_id.to_string()).filter(|id| !id.is_empty()),
            nickname: nickname.to_string(),
            text: text.to_string(),
            created_at: now_millis,
        }
    }
}

/// Someone present in the room, used to attribute messages to a speaker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "clientId")]
    pub client_id: String,
    pub name: String,
}

impl Participant {
    pub fn new(client_id: &str, name: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Speech bubble shown above a speaker
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleEntry {
    pub text: String,
    /// Unix epoch milliseconds
    pub expires_at: i64,
}

pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
    seen_ids: HashSet<String>,
    bubbles: HashMap<String, BubbleEntry>,
    config: ChatConfig,
    clock: SharedClock,
}

impl ChatLog {
    pub fn new(config: ChatConfig, clock: SharedClock) -> Self {
        Self {
            messages: VecDeque::with_capacity(config.max_messages),
            seen_ids: HashSet::new(),
            bubbles: HashMap::new(),
            config,
            clock,
        }
    }

    /// Append a message to the history.
    ///
    /// Returns `false` without touching any state when the id is empty or
    /// was already seen. Ids are forgotten once their message is evicted.
    pub fn append(
        &mut self,
        message: ChatMessage,
        participants: &[Participant],
        local_client_id: &str,
    ) -> bool {
        if message.id.is_empty() || self.seen_ids.contains(&message.id) {
            debug!(message_id = %message.id, "Chat message rejected");
            return false;
        }

        let speaker = resolve_speaker(&message, participants, local_client_id);
        let text = message.text.clone();

        self.seen_ids.insert(message.id.clone());
        self.messages.push_back(message);

        while self.messages.len() > self.config.max_messages {
            if let Some(evicted) = self.messages.pop_front() {
                self.seen_ids.remove(&evicted.id);
            }
        }

        if let Some(speaker) = speaker {
            self.set_bubble(&speaker, &text);
        }

        true
    }

    /// Normalize an untrusted payload against this log's limits, then append it
    pub fn receive(
        &mut self,
        raw: &Value,
        participants: &[Participant],
        local_client_id: &str,
    ) -> Result<bool, ValidationError> {
        let message =
            validation::normalize_chat_payload(raw, &self.config, self.clock.now_millis())?;
        Ok(self.append(message, participants, local_client_id))
    }

    /// Show `text` above `speaker` for the bubble TTL, replacing any
    /// existing bubble. Empty arguments are ignored.
    pub fn set_bubble(&mut self, speaker: &str, text: &str) {
        if speaker.is_empty() || text.is_empty() {
            return;
        }

        let entry = BubbleEntry {
            text: text.chars().take(self.config.max_message_length).collect(),
            expires_at: self
                .clock
                .now_millis()
                .saturating_add(self.config.bubble_ttl_ms),
        };
        self.bubbles.insert(speaker.to_string(), entry);
    }

    /// Current bubble text for `speaker`, or empty.
    ///
    /// An expired bubble is deleted on read.
    pub fn bubble_text(&mut self, speaker: &str) -> String {
        let now = self.clock.now_millis();
        match self.bubbles.get(speaker) {
            Some(bubble) if now < bubble.expires_at => bubble.text.clone(),
            Some(_) => {
                self.bubbles.remove(speaker);
                String::new()
            }
            None => String::new(),
        }
    }

    /// Whether a bubble entry is stored, expired or not
    pub fn has_bubble(&self, speaker: &str) -> bool {
        self.bubbles.contains_key(speaker)
    }

    pub fn bubble(&self, speaker: &str) -> Option<&BubbleEntry> {
        self.bubbles.get(speaker)
    }

    pub fn is_seen(&self, message_id: &str) -> bool {
        self.seen_ids.contains(message_id)
    }

    /// Messages, oldest first
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(ChatConfig::default(), system_clock())
    }
}

/// Work out which context spoke a message.
///
/// Precedence: the message's own client id; else the single participant
/// whose name equals the nickname; else the local participant if its name
/// equals the nickname; else nobody.
pub fn resolve_speaker(
    message: &ChatMessage,
    participants: &[Participant],
    local_client_id: &str,
) -> Option<String> {
    if let Some(client_id) = message.client_id.as_deref().filter(|id| !id.is_empty()) {
        return Some(client_id.to_string());
    }

    let mut matched = participants.iter().filter(|p| p.name == message.nickname);
    if let (Some(only), None) = (matched.next(), matched.next()) {
        return Some(only.client_id.clone());
    }

    participants
        .iter()
        .find(|p| p.client_id == local_client_id)
        .filter(|me| me.name == message.nickname)
        .map(|me| me.client_id.clone())
}
