// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Frame Mapping
//!
//! Converts raw frames read from an instance socket into [`Post`]s:
//!
//! ```text
//! frame bytes → JsonEnvelopeMapper → payload JSON → EventNormalizer → Post
//! ```
//!
//! Decode failures are reported as per-frame protocol errors. Frames for other
//! event kinds and payloads missing required fields yield `Ok(None)`.

pub mod json_mapper;
pub mod normalizer;

pub use json_mapper::{JsonEnvelopeMapper, DEFAULT_MAX_FRAME_BYTES, UPDATE_EVENT};
pub use normalizer::EventNormalizer;

use crate::core::error::FireHoseResult;
use crate::core::event::Post;

/// Full frame → post mapping used by every source connector
#[derive(Debug, Clone, Default)]
pub struct StatusMapper {
    envelope: JsonEnvelopeMapper,
    normalizer: EventNormalizer,
}

impl StatusMapper {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            envelope: JsonEnvelopeMapper::with_max_frame_bytes(max_frame_bytes),
            normalizer: EventNormalizer::new(),
        }
    }

    /// Map one frame.
    ///
    /// # Returns
    /// * `Ok(Some(post))` - a valid new status
    /// * `Ok(None)` - frame intentionally discarded (other event, incomplete post)
    /// * `Err(FireHoseError::Protocol)` - frame could not be decoded
    pub fn map(&self, frame: &[u8]) -> FireHoseResult<Option<Post>> {
        let Some(payload) = self.envelope.map(frame)? else {
            return Ok(None);
        };

        let post = self.normalizer.normalize(&payload);
        if post.is_none() {
            log::debug!("[StatusMapper] Dropping update without required post fields");
        }
        Ok(post)
    }
}
