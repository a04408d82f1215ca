// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod firehose_config;
pub mod reconnect;

pub use firehose_config::{
    FireHoseConfig, DEFAULT_ENDPOINT_TEMPLATE, DEFAULT_INSTANCES, INSTANCE_PLACEHOLDER,
};
pub use reconnect::ReconnectConfig;
