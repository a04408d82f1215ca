// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod source;

pub use source::{
    ConnectionState, ConnectionStatus, SourceConnector, SourceConnectorConfig, SourceEvent,
    SourceId,
};
