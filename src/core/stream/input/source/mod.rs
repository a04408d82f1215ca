// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Sources
//!
//! One [`SourceConnector`] per monitored instance. Connectors never touch
//! filter or stats state; they only push [`SourceEvent`]s into the channel
//! drained by the aggregator:
//!
//! ```text
//! instance socket → frame → StatusMapper → Post ─┐
//!                  lifecycle → ConnectionStatus ─┴→ mpsc → FireHoseAggregator
//! ```

pub mod websocket_source;

pub use websocket_source::{subscribe_frame, SourceConnector, SourceConnectorConfig};

use crate::core::event::Post;
use serde::Serialize;
use std::fmt;

/// Index of a source in the aggregator's connection table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceId(pub usize);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of one streaming connection.
///
/// ```text
/// Connecting ──→ Open ──→ Closed
///     │           │
///     └──→ Failed ←┘
/// ```
///
/// Closed and Failed are terminal unless reconnection is enabled, in which
/// case they may move back to Connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Closed,
    Failed,
}

impl ConnectionStatus {
    pub fn can_transition_to(self, next: ConnectionStatus) -> bool {
        use ConnectionStatus::*;
        matches!(
            (self, next),
            (Connecting, Open)
                | (Connecting, Failed)
                | (Connecting, Closed)
                | (Open, Closed)
                | (Open, Failed)
                | (Closed, Connecting)
                | (Failed, Connecting)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionStatus::Closed | ConnectionStatus::Failed)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Open => "open",
            ConnectionStatus::Closed => "closed",
            ConnectionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current status of one source, as tracked by the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub source: SourceId,
    pub instance: String,
    pub status: ConnectionStatus,
    /// Whether this source ever reached Open
    pub ever_opened: bool,
}

impl ConnectionState {
    pub fn new(source: SourceId, instance: impl Into<String>) -> Self {
        Self {
            source,
            instance: instance.into(),
            status: ConnectionStatus::Connecting,
            ever_opened: false,
        }
    }
}

/// Messages from connectors to the aggregator
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Status {
        source: SourceId,
        status: ConnectionStatus,
    },
    /// A normalized post, stamped with the filter session that was current
    /// when its frame arrived.
    Post {
        source: SourceId,
        session_id: u64,
        post: Post,
    },
}

impl SourceEvent {
    pub fn source(&self) -> SourceId {
        match self {
            SourceEvent::Status { source, .. } | SourceEvent::Post { source, .. } => *source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionStatus::*;

    #[test]
    fn test_valid_transitions() {
        assert!(Connecting.can_transition_to(Open));
        assert!(Connecting.can_transition_to(Failed));
        assert!(Open.can_transition_to(Closed));
        assert!(Open.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Connecting));
        assert!(Closed.can_transition_to(Connecting));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!Open.can_transition_to(Open));
        assert!(!Open.can_transition_to(Connecting));
        assert!(!Failed.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Open));
        assert!(!Failed.can_transition_to(Closed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(Closed.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Open.is_terminal());
        assert!(!Connecting.is_terminal());
    }
}
