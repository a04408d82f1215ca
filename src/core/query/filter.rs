// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Query Filter
//!
//! Holds the active pattern and the filter session it belongs to.
//!
//! Every call to [`QueryFilter::set_query`] opens a new session: the session
//! id is bumped, the deduplicator is replaced and the seen/matched counters
//! are zeroed, all without yielding. Connectors stamp each post with the
//! session id current when the frame arrived (read through a [`SessionClock`]),
//! so posts still queued from an older session are recognised and dropped.

use super::dedupe::Deduplicator;
use crate::core::error::{FireHoseError, FireHoseResult};
use crate::core::event::Post;
use crate::core::stats::StatsAggregator;
use regex::{Regex, RegexBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared view of the current session id.
///
/// Only [`QueryFilter`] advances it; connectors just read it.
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    current: Arc<AtomicU64>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Snapshot of the active session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSession {
    pub session_id: u64,
    /// `None` while filtering is disabled
    pub pattern: Option<String>,
}

#[derive(Debug)]
pub struct QueryFilter {
    pattern: Option<String>,
    matcher: Option<Regex>,
    clock: SessionClock,
}

impl QueryFilter {
    /// Filter with no pattern, session 0
    pub fn new(clock: SessionClock) -> Self {
        Self {
            pattern: None,
            matcher: None,
            clock,
        }
    }

    /// Compile a case-insensitive matcher, `None` for the empty pattern.
    pub fn compile(pattern: &str) -> FireHoseResult<Option<Regex>> {
        if pattern.is_empty() {
            return Ok(None);
        }
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Some)
            .map_err(|e| FireHoseError::invalid_filter(pattern, e))
    }

    /// Replace the query and start a new session.
    ///
    /// The pattern is compiled first; on failure nothing changes and the
    /// error is returned. Returns whether filtering is now active.
    pub fn set_query(
        &mut self,
        pattern: &str,
        dedup: &mut Deduplicator,
        stats: &mut StatsAggregator,
    ) -> FireHoseResult<bool> {
        let matcher = Self::compile(pattern)?;

        let session_id = self.clock.advance();
        *dedup = Deduplicator::new(dedup.capacity());
        stats.reset_session();

        self.pattern = matcher.as_ref().map(|_| pattern.to_string());
        self.matcher = matcher;

        log::debug!(
            "[QueryFilter] Session {} started with pattern {:?}",
            session_id,
            self.pattern
        );
        Ok(self.matcher.is_some())
    }

    /// Test a post captured under `session_id`.
    ///
    /// Stale posts return false without touching the counters. Otherwise the
    /// post counts as seen and is matched against its content.
    pub fn test(&self, session_id: u64, post: &Post, stats: &mut StatsAggregator) -> bool {
        if session_id != self.session_id() {
            return false;
        }
        stats.record_seen();

        match &self.matcher {
            Some(matcher) => matcher.is_match(&post.content),
            None => false,
        }
    }

    pub fn session_id(&self) -> u64 {
        self.clock.current()
    }

    pub fn session(&self) -> FilterSession {
        FilterSession {
            session_id: self.session_id(),
            pattern: self.pattern.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }
}
