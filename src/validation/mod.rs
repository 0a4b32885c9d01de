//! Validation boundary for untrusted chat and move payloads.
//!
//! Everything arriving from another context passes through here once and
//! comes out as a strongly typed, already normalized record. Downstream
//! components do not re-validate.

use crate::chat::ChatMessage;
use crate::config::ChatConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[cfg(test)]
mod tests;

/// Facing used when a move omits it
pub const DEFAULT_DIRECTION: &str = "down";

/// Validation errors for inbound payloads
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    PayloadNotObject,
    MissingId,
    MissingNickname,
    MissingText,
    MissingClientId,
    InvalidCoordinate(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::PayloadNotObject => write!(f, "payload must be a JSON object"),
            ValidationError::MissingId => write!(f, "id is required"),
            ValidationError::MissingNickname => write!(f, "nickname is required"),
            ValidationError::MissingText => write!(f, "text is required"),
            ValidationError::MissingClientId => write!(f, "clientId is required"),
            ValidationError::InvalidCoordinate(axis) => {
                write!(f, "{} must be a finite number", axis)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Avatar movement reported by a peer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    #[serde(rename = "clientId")]
    pub client_id: String,
    pub x: f64,
    pub y: f64,
    pub dir: String,
    /// Unix epoch milliseconds
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

/// Normalize an untrusted chat payload.
///
/// Rules:
/// - Payload must be a JSON object
/// - `id`, `clientId`, `nickname`, `text` are coerced to strings and trimmed
/// - `nickname` is cut to `max_nickname_length` characters, `text` to
///   `max_message_length`
/// - `createdAt` falls back to `now_millis` when absent or not a number
/// - `id`, `nickname` and `text` must be non-empty afterwards
pub fn normalize_chat_payload(
    raw: &Value,
    limits: &ChatConfig,
    now_millis: i64,
) -> Result<ChatMessage, ValidationError> {
    let payload = raw.as_object().ok_or(ValidationError::PayloadNotObject)?;

    let id = trimmed_field(payload, "id");
    let client_id = trimmed_field(payload, "clientId");
    let nickname = truncate(&trimmed_field(payload, "nickname"), limits.max_nickname_length);
    let text = truncate(&trimmed_field(payload, "text"), limits.max_message_length);
    let created_at = timestamp_field(payload, "createdAt", now_millis);

    if id.is_empty() {
        return Err(ValidationError::MissingId);
    }
    if nickname.is_empty() {
        return Err(ValidationError::MissingNickname);
    }
    if text.is_empty() {
        return Err(ValidationError::MissingText);
    }

    Ok(ChatMessage {
        id,
        client_id: Some(client_id).filter(|c| !c.is_empty()),
        nickname,
        text,
        created_at,
    })
}

/// Normalize an untrusted move payload.
///
/// Rules:
/// - Payload must be a JSON object
/// - `clientId` is required (trimmed, non-empty)
/// - `x` and `y` accept numbers or numeric strings and must be finite
/// - `dir` defaults to "down"
/// - `updatedAt` falls back to `now_millis`
pub fn normalize_move_payload(raw: &Value, now_millis: i64) -> Result<MoveCommand, ValidationError> {
    let payload = raw.as_object().ok_or(ValidationError::PayloadNotObject)?;

    let client_id = trimmed_field(payload, "clientId");
    let x = coerce_number(payload.get("x"));
    let y = coerce_number(payload.get("y"));

    if client_id.is_empty() {
        return Err(ValidationError::MissingClientId);
    }
    let x = x
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::InvalidCoordinate("x"))?;
    let y = y
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::InvalidCoordinate("y"))?;

    let dir = match coerce_string(payload.get("dir")) {
        dir if dir.is_empty() => DEFAULT_DIRECTION.to_string(),
        dir => dir,
    };

    Ok(MoveCommand {
        client_id,
        x,
        y,
        dir,
        updated_at: timestamp_field(payload, "updatedAt", now_millis),
    })
}

fn trimmed_field(payload: &Map<String, Value>, key: &str) -> String {
    coerce_string(payload.get(key)).trim().to_string()
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Millisecond timestamp field; absent, zero or unusable values yield `fallback`
fn timestamp_field(payload: &Map<String, Value>, key: &str, fallback: i64) -> i64 {
    match coerce_number(payload.get(key)) {
        Some(v) if v.is_finite() && v != 0.0 => v as i64,
        _ => fallback,
    }
}

/// String form of a scalar. Falsy values (null, false, 0, "") become empty;
/// arrays and objects are not accepted as text and become empty too.
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "true".to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 0.0 => String::new(),
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        _ => String::new(),
    }
}

/// Numeric form of a scalar; numeric strings are parsed after trimming
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}
