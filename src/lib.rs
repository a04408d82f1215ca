// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live aggregation of public posts from many federated instances, filtered
//! by a single case-insensitive query.

pub mod core;

pub use crate::core::stream::{ConnectionStatus, ConsoleSink, LogSink, Sink, SourceEvent};
pub use crate::core::util::{HealthCheck, HealthChecker, HealthStatus};
pub use crate::core::{
    FireHoseAggregator, FireHoseConfig, FireHoseError, FireHoseResult, Post, Stats,
};
