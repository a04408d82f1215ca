// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health summary derived from the connection table

use crate::core::stream::input::source::{ConnectionState, ConnectionStatus};
use serde::{Deserialize, Serialize};

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub message: String,
    pub timestamp: u64,
}

impl HealthCheck {
    pub fn new(component: &str, status: HealthStatus, message: &str) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            component: component.to_string(),
            status,
            message: message.to_string(),
            timestamp,
        }
    }
}

/// Health checker trait
pub trait HealthChecker {
    fn check(&self) -> HealthCheck;
}

/// All sources open: healthy. Some open: degraded. None open: unhealthy.
pub fn connection_health(component: &str, connections: &[ConnectionState]) -> HealthCheck {
    let open = connections
        .iter()
        .filter(|c| c.status == ConnectionStatus::Open)
        .count();
    let total = connections.len();

    let status = if total > 0 && open == total {
        HealthStatus::Healthy
    } else if open > 0 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Unhealthy
    };

    let mut message = format!("{} of {} sources open", open, total);
    let down: Vec<&str> = connections
        .iter()
        .filter(|c| c.status.is_terminal())
        .map(|c| c.instance.as_str())
        .collect();
    if !down.is_empty() {
        message.push_str(&format!(", down: {}", down.join(", ")));
    }

    HealthCheck::new(component, status, &message)
}
