// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running counters shown to the operator.
//!
//! `seen` and `matched` are scoped to the current filter session and are
//! zeroed whenever the query is replaced. `connected` counts sources that
//! reached the open state and never goes down within a run, even when a
//! connection later fails.

use serde::Serialize;
use std::fmt;

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub connected: u64,
    pub seen: u64,
    pub matched: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Connected to {} instances. Matched {} of {} seen posts.",
            self.connected, self.matched, self.seen
        )
    }
}

#[derive(Debug, Default)]
pub struct StatsAggregator {
    stats: Stats,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connected(&mut self) {
        self.stats.connected += 1;
    }

    pub fn record_seen(&mut self) {
        self.stats.seen += 1;
    }

    /// Only posts already counted as seen in this session may be matched.
    pub fn record_matched(&mut self) {
        debug_assert!(self.stats.matched < self.stats.seen);
        if self.stats.matched < self.stats.seen {
            self.stats.matched += 1;
        }
    }

    /// Zero the session scoped counters, keep `connected`.
    pub fn reset_session(&mut self) {
        self.stats.seen = 0;
        self.stats.matched = 0;
    }

    pub fn snapshot(&self) -> Stats {
        self.stats
    }
}
