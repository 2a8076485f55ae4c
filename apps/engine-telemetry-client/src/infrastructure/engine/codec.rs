//! Stream Codec Module
//!
//! JSON decoding for the engine's two channels.
//!
//! - **Metrics channel**: one partial-snapshot object per frame; unknown
//!   fields are ignored, absent fields left unset.
//! - **Transaction channel**: either a single event object or an array of
//!   them. Validation is element-level: a malformed element (or one missing
//!   a numeric `id`) is dropped without poisoning the rest of the batch.

use crate::domain::state::{MetricsUpdate, TransactionEvent};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON parsing failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload was valid JSON but not a shape this channel accepts.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),
}

/// JSON codec for the engine streams.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a metrics frame into a partial update.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not a JSON object.
    pub fn decode_metrics(&self, text: &str) -> Result<MetricsUpdate, CodecError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(CodecError::InvalidFormat(format!(
                "expected JSON object, got: {}",
                truncate(text)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Decode a transaction frame into zero or more events.
    ///
    /// A frame is either one event object or an array of them. Elements
    /// that fail to deserialize are dropped individually; the well-formed
    /// remainder is returned in array order.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not valid JSON, or is valid JSON
    /// but neither an object nor an array.
    pub fn decode_transactions(&self, text: &str) -> Result<Vec<TransactionEvent>, CodecError> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        match value {
            serde_json::Value::Array(elements) => Ok(elements
                .into_iter()
                .filter_map(|element| match serde_json::from_value(element) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        tracing::debug!(error = %e, "Dropping malformed transaction element");
                        None
                    }
                })
                .collect()),
            serde_json::Value::Object(_) => match serde_json::from_value(value) {
                Ok(event) => Ok(vec![event]),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed transaction event");
                    Ok(vec![])
                }
            },
            _ => Err(CodecError::InvalidFormat(format!(
                "expected JSON object or array, got: {}",
                truncate(text)
            ))),
        }
    }
}

fn truncate(text: &str) -> &str {
    let mut end = text.len().min(50);
    // Back off to a char boundary so the slice cannot split a multi-byte
    // character.
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// =============================================================================
// Tests
// =============================================================================
