// SPDX-License-Identifier: MIT OR Apache-2.0

//! # FireHose Aggregator
//!
//! Owns every source connector and the filter session state, and drives the
//! pipeline from a single task:
//!
//! ```text
//! SourceConnector × N ──mpsc──→ handle_event ──→ QueryFilter ──→ Deduplicator ──→ Sink
//!                                                     └────────→ StatsAggregator
//! ```
//!
//! Filter, dedup and stats state are only ever touched through `&mut self`,
//! so an event and a query change can never interleave. `set_query` has no
//! suspension point; posts decoded under an older session are recognised by
//! their session stamp and dropped.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let sink = Arc::new(LogSink::new());
//! let mut aggregator = FireHoseAggregator::new(FireHoseConfig::default(), sink)?;
//! aggregator.start();
//! aggregator.set_query("rust")?;
//! while let Some(event) = aggregator.next_event().await {
//!     aggregator.handle_event(event);
//! }
//! ```

use crate::core::config::FireHoseConfig;
use crate::core::error::FireHoseResult;
use crate::core::event::Post;
use crate::core::query::{Deduplicator, FilterSession, QueryFilter, SessionClock};
use crate::core::stats::{Stats, StatsAggregator};
use crate::core::stream::input::source::{
    ConnectionState, ConnectionStatus, SourceConnector, SourceConnectorConfig, SourceEvent,
    SourceId,
};
use crate::core::stream::output::sink::Sink;
use crate::core::util::health::{connection_health, HealthCheck, HealthChecker};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long `shutdown` waits for each connector before aborting it
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct FireHoseAggregator {
    sink: Arc<dyn Sink>,
    connectors: Vec<SourceConnector>,
    connections: Vec<ConnectionState>,
    filter: QueryFilter,
    dedup: Deduplicator,
    stats: StatsAggregator,
    events_tx: mpsc::Sender<SourceEvent>,
    events_rx: mpsc::Receiver<SourceEvent>,
    started: bool,
}

impl FireHoseAggregator {
    /// Build the aggregator and one connector per configured instance.
    ///
    /// Fails on invalid configuration, including an invalid `initial_query`.
    /// Connectors are not opened until [`start`](Self::start).
    pub fn new(config: FireHoseConfig, sink: Arc<dyn Sink>) -> FireHoseResult<Self> {
        config.validate()?;

        let (events_tx, events_rx) = mpsc::channel(config.channel_capacity);
        let mut connectors = Vec::with_capacity(config.instances.len());
        let mut connections = Vec::with_capacity(config.instances.len());
        for (i, instance) in config.instances.iter().enumerate() {
            let id = SourceId(i);
            connectors.push(SourceConnector::new(
                id,
                SourceConnectorConfig::for_instance(&config, instance),
            ));
            connections.push(ConnectionState::new(id, instance.clone()));
        }

        let mut aggregator = Self {
            sink,
            connectors,
            connections,
            filter: QueryFilter::new(SessionClock::new()),
            dedup: Deduplicator::new(config.dedup_capacity),
            stats: StatsAggregator::new(),
            events_tx,
            events_rx,
            started: false,
        };

        aggregator.set_query(config.initial_query.as_deref().unwrap_or(""))?;
        Ok(aggregator)
    }

    /// Open every connector. Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        log::info!(
            "[FireHoseAggregator] Starting {} source connectors",
            self.connectors.len()
        );
        for connector in &mut self.connectors {
            connector.open(self.events_tx.clone(), self.filter.clock().clone());
        }
    }

    /// Replace the active query.
    ///
    /// An empty pattern disables filtering. On an invalid pattern the error
    /// is returned and the previous filter, dedup set and counters are kept.
    pub fn set_query(&mut self, pattern: &str) -> FireHoseResult<()> {
        let active = self
            .filter
            .set_query(pattern, &mut self.dedup, &mut self.stats)?;

        if active {
            log::info!("[FireHoseAggregator] Filtering for {:?}", pattern);
        } else {
            log::info!("[FireHoseAggregator] Filtering disabled");
        }
        self.sink.on_filter_reset(active);
        Ok(())
    }

    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    pub fn session(&self) -> FilterSession {
        self.filter.session()
    }

    pub fn is_filter_active(&self) -> bool {
        self.filter.is_active()
    }

    pub fn connection_states(&self) -> &[ConnectionState] {
        &self.connections
    }

    pub fn health(&self) -> HealthCheck {
        connection_health("firehose", &self.connections)
    }

    /// Sender for pushing events from additional sources into this aggregator.
    pub fn event_sender(&self) -> mpsc::Sender<SourceEvent> {
        self.events_tx.clone()
    }

    /// Wait for the next event from any source.
    pub async fn next_event(&mut self) -> Option<SourceEvent> {
        self.events_rx.recv().await
    }

    /// Process everything already queued without waiting. Returns the number
    /// of events handled.
    pub fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Status { source, status } => self.handle_status(source, status),
            SourceEvent::Post {
                source,
                session_id,
                post,
            } => self.handle_post(source, session_id, post),
        }
    }

    fn handle_status(&mut self, source: SourceId, status: ConnectionStatus) {
        let Some(state) = self.connections.get_mut(source.0) else {
            log::warn!("[FireHoseAggregator] Status for unknown source {}", source);
            return;
        };

        if state.status == status {
            return;
        }
        if !state.status.can_transition_to(status) {
            log::warn!(
                "[FireHoseAggregator] Ignoring invalid transition {} -> {} for {}",
                state.status,
                status,
                state.instance
            );
            return;
        }

        log::debug!(
            "[FireHoseAggregator] {}: {} -> {}",
            state.instance,
            state.status,
            status
        );
        state.status = status;

        match status {
            ConnectionStatus::Open if !state.ever_opened => {
                state.ever_opened = true;
                self.stats.record_connected();
                log::info!("[FireHoseAggregator] Connected to {}", state.instance);
            }
            ConnectionStatus::Failed => {
                log::warn!("[FireHoseAggregator] Source {} failed", state.instance);
            }
            _ => {}
        }
    }

    fn handle_post(&mut self, source: SourceId, session_id: u64, post: Post) {
        if !self.filter.test(session_id, &post, &mut self.stats) {
            return;
        }
        if self.dedup.seen(&post.id) {
            log::trace!(
                "[FireHoseAggregator] Duplicate {} from source {}",
                post.id,
                source
            );
            return;
        }

        self.dedup.mark_seen(&post.id);
        self.stats.record_matched();
        self.sink.on_match(post);
    }

    /// Stop all connectors and wait briefly for them to finish.
    pub async fn shutdown(&mut self) {
        log::info!("[FireHoseAggregator] Shutting down");
        for connector in &mut self.connectors {
            connector.stop();
        }
        for connector in &mut self.connectors {
            connector.join(SHUTDOWN_GRACE).await;
        }
        // Closing statuses sent on the way out
        self.drain_pending();
    }
}

impl HealthChecker for FireHoseAggregator {
    fn check(&self) -> HealthCheck {
        self.health()
    }
}
