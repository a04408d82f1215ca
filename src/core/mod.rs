// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod config;
pub mod error;
pub mod event;
pub mod firehose_aggregator;
pub mod query;
pub mod stats;
pub mod stream;
pub mod util;

pub use self::config::{FireHoseConfig, ReconnectConfig};
pub use self::error::{FireHoseError, FireHoseResult};
pub use self::event::{Author, Post};
pub use self::firehose_aggregator::FireHoseAggregator;
pub use self::stats::Stats;
