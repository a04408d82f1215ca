// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming Envelope Mapper
//!
//! Every frame an instance pushes over the streaming socket is a JSON
//! envelope whose `payload` is itself a JSON document encoded as a string:
//!
//! ```json
//! {"event": "update", "payload": "{\"url\": \"https://...\", \"content\": \"...\"}"}
//! ```
//!
//! Only `update` envelopes carry new statuses. Everything else (`delete`,
//! `status.update`, `notification`, ...) is discarded without side effects.

use crate::core::error::{FireHoseError, FireHoseResult};
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Envelope event name that carries a new public status
pub const UPDATE_EVENT: &str = "update";

/// Default upper bound for a single inbound frame (1 MiB)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    event: String,
    #[serde(default)]
    payload: Option<JsonValue>,
}

/// Decodes the outer streaming envelope and unwraps `update` payloads.
#[derive(Debug, Clone)]
pub struct JsonEnvelopeMapper {
    /// Maximum input size in bytes
    max_frame_bytes: usize,
}

impl JsonEnvelopeMapper {
    pub fn new() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Set maximum frame size in bytes
    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Decode one frame.
    ///
    /// # Returns
    /// * `Ok(Some(payload))` - an `update` frame with its decoded payload object
    /// * `Ok(None)` - a well-formed frame for some other event
    /// * `Err(FireHoseError::Protocol)` - malformed envelope or payload
    pub fn map(&self, frame: &[u8]) -> FireHoseResult<Option<JsonValue>> {
        if frame.len() > self.max_frame_bytes {
            return Err(FireHoseError::protocol(format!(
                "Frame size {} bytes exceeds maximum allowed {} bytes",
                frame.len(),
                self.max_frame_bytes
            )));
        }

        let envelope: StreamEnvelope = serde_json::from_slice(frame)?;
        if envelope.event != UPDATE_EVENT {
            return Ok(None);
        }

        let payload = match envelope.payload {
            Some(JsonValue::String(encoded)) => serde_json::from_str::<JsonValue>(&encoded)?,
            // Some servers inline the object instead of double-encoding it
            Some(obj @ JsonValue::Object(_)) => obj,
            Some(other) => {
                return Err(FireHoseError::protocol(format!(
                    "Unexpected update payload type: {}",
                    json_type_name(&other)
                )))
            }
            None => return Err(FireHoseError::protocol("Update frame without payload")),
        };

        if !payload.is_object() {
            return Err(FireHoseError::protocol(format!(
                "Update payload must be an object, got {}",
                json_type_name(&payload)
            )));
        }

        Ok(Some(payload))
    }
}

impl Default for JsonEnvelopeMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
