// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod input;
pub mod mapper;
pub mod output;

pub use self::input::{
    ConnectionState, ConnectionStatus, SourceConnector, SourceConnectorConfig, SourceEvent,
    SourceId,
};
pub use self::mapper::StatusMapper;
pub use self::output::{ConsoleSink, LogSink, Sink, SinkRecord};
