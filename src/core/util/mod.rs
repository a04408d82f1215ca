// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod health;

pub use health::{connection_health, HealthCheck, HealthChecker, HealthStatus};
