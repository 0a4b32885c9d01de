//! Reversible snapshot codec.
//!
//! Values are serialized to JSON and wrapped in URL-safe base64 so the result
//! can live in a storage slot or a link fragment without further escaping.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;


/// URL-safe alphabet, no padding on encode, padding optional on decode
const STATE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Codec failures
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Value cannot be represented as JSON
    Serialize(String),
    /// Input is not valid base64
    Base64(String),
    /// Decoded bytes are not UTF-8
    Utf8,
    /// Decoded text is not valid JSON for the requested type
    Json(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Serialize(e) => write!(f, "value is not serializable: {}", e),
            CodecError::Base64(e) => write!(f, "invalid base64: {}", e),
            CodecError::Utf8 => write!(f, "decoded bytes are not valid UTF-8"),
            CodecError::Json(e) => write!(f, "invalid JSON: {}", e),
        }
    }
}

impl std::error::Error for CodecError {}

/// Encode a value into an opaque, URL/storage-safe string.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    let json = serde_json::to_vec(value).map_err(|e| CodecError::Serialize(e.to_string()))?;
    Ok(STATE_ENGINE.encode(json))
}

/// Like [`encode`], but yields the empty string when the value cannot be encoded.
pub fn encode_or_empty<T: Serialize + ?Sized>(value: &T) -> String {
    encode(value).unwrap_or_default()
}

/// Decode a string produced by [`encode`].
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    let bytes = STATE_ENGINE
        .decode(text.trim())
        .map_err(|e| CodecError::Base64(e.to_string()))?;
    let json = String::from_utf8(bytes).map_err(|_| CodecError::Utf8)?;
    serde_json::from_str(&json).map_err(|e| CodecError::Json(e.to_string()))
}
