// SPDX-License-Identifier: MIT OR Apache-2.0

//! # WebSocket Source Connector
//!
//! Owns the streaming connection to one instance:
//!
//! ```text
//! wss://{instance}/api/v1/streaming/? → tokio-tungstenite → frame → StatusMapper → SourceEvent
//! ```
//!
//! After the socket opens the connector reports `Open` and subscribes to the
//! public timeline. Frames that fail to decode are dropped one at a time and
//! never end the connection. A failed connection is reported and, unless
//! reconnection is enabled, the connector stays down.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let config = SourceConnectorConfig::for_instance(&FireHoseConfig::default(), "mastodon.social");
//! let mut connector = SourceConnector::new(SourceId(0), config);
//! connector.open(events_tx, session_clock);
//! ```

use super::{ConnectionStatus, SourceEvent, SourceId};
use crate::core::config::{FireHoseConfig, ReconnectConfig};
use crate::core::error::{FireHoseError, FireHoseResult};
use crate::core::query::SessionClock;
use crate::core::stream::mapper::StatusMapper;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How often the read loop wakes up to check the running flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Timeline requested from every instance
pub const PUBLIC_STREAM: &str = "public";

/// The subscription request sent once right after the socket opens
pub fn subscribe_frame() -> String {
    serde_json::json!({"type": "subscribe", "stream": PUBLIC_STREAM}).to_string()
}

/// Configuration for one source connector
#[derive(Debug, Clone)]
pub struct SourceConnectorConfig {
    /// Instance hostname
    pub instance: String,
    /// Streaming URL (ws:// or wss://)
    pub url: String,
    pub connect_timeout: Duration,
    pub max_frame_bytes: usize,
    pub reconnect: ReconnectConfig,
}

impl SourceConnectorConfig {
    pub fn for_instance(config: &FireHoseConfig, instance: &str) -> Self {
        Self {
            instance: instance.to_string(),
            url: config.endpoint_for(instance),
            connect_timeout: config.connect_timeout(),
            max_frame_bytes: config.max_frame_bytes,
            reconnect: config.reconnect.clone(),
        }
    }
}

/// Handle to the background task streaming one instance
#[derive(Debug)]
pub struct SourceConnector {
    id: SourceId,
    config: SourceConnectorConfig,
    /// Running flag for graceful shutdown
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl SourceConnector {
    pub fn new(id: SourceId, config: SourceConnectorConfig) -> Self {
        Self {
            id,
            config,
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn instance(&self) -> &str {
        &self.config.instance
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the connection task. Must be called from within a tokio runtime.
    pub fn open(&mut self, events: mpsc::Sender<SourceEvent>, clock: SessionClock) {
        if self.task.is_some() {
            log::warn!(
                "[SourceConnector] {} already opened, ignoring",
                self.config.instance
            );
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        let task = ConnectorTask {
            id: self.id,
            mapper: StatusMapper::new(self.config.max_frame_bytes),
            config: self.config.clone(),
            running: Arc::clone(&self.running),
            events,
            clock,
        };
        self.task = Some(tokio::spawn(task.run()));
    }

    pub fn stop(&mut self) {
        log::info!("[SourceConnector] Stopping {}...", self.config.instance);
        self.running.store(false, Ordering::SeqCst);
    }

    /// Wait for the task to finish, aborting it after `grace`.
    pub async fn join(&mut self, grace: Duration) {
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(grace, &mut task).await.is_err() {
                log::warn!(
                    "[SourceConnector] {} did not stop within {:?}, aborting",
                    self.config.instance,
                    grace
                );
                task.abort();
            }
        }
    }
}

/// Why a connection ended
enum ConnectionEnd {
    Closed,
    Failed,
    /// Shutdown requested or aggregator gone
    Stopped,
}

/// Result of processing a message
enum MessageResult {
    Continue,
    Closed,
    Stop,
}

struct ConnectorTask {
    id: SourceId,
    config: SourceConnectorConfig,
    running: Arc<AtomicBool>,
    events: mpsc::Sender<SourceEvent>,
    clock: SessionClock,
    mapper: StatusMapper,
}

impl ConnectorTask {
    async fn run(self) {
        let mut failed_attempts: u32 = 0;
        let mut first_attempt = true;

        while self.running.load(Ordering::SeqCst) {
            // Sources start out as Connecting in the aggregator's table
            if !first_attempt && !self.set_status(ConnectionStatus::Connecting).await {
                break;
            }
            first_attempt = false;

            let ws_stream = match self.connect().await {
                Ok(stream) => {
                    failed_attempts = 0;
                    stream
                }
                Err(e) => {
                    failed_attempts += 1;
                    log::error!("[SourceConnector] {}", e);
                    if !self.set_status(ConnectionStatus::Failed).await
                        || !self.config.reconnect.should_retry(failed_attempts)
                    {
                        break;
                    }

                    let delay = self.config.reconnect.delay_for_attempt(failed_attempts);
                    log::warn!(
                        "[SourceConnector] {}: reconnecting in {:?} (attempt {})",
                        self.config.instance,
                        delay,
                        failed_attempts
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            let next = match self.stream(ws_stream).await {
                ConnectionEnd::Stopped => {
                    let _ = self.set_status(ConnectionStatus::Closed).await;
                    break;
                }
                ConnectionEnd::Closed => ConnectionStatus::Closed,
                ConnectionEnd::Failed => ConnectionStatus::Failed,
            };
            if !self.set_status(next).await || !self.config.reconnect.should_retry(0) {
                break;
            }

            log::info!("[SourceConnector] {}: reconnecting...", self.config.instance);
            tokio::time::sleep(self.config.reconnect.delay_for_attempt(1)).await;
        }

        self.running.store(false, Ordering::SeqCst);
        log::info!("[SourceConnector] {}: connector ended", self.config.instance);
    }

    async fn connect(&self) -> FireHoseResult<WsStream> {
        log::info!("[SourceConnector] Connecting to {}", self.config.url);

        let connect =
            tokio::time::timeout(self.config.connect_timeout, connect_async(self.config.url.as_str()));
        match connect.await {
            Ok(Ok((stream, response))) => {
                log::info!(
                    "[SourceConnector] Connected to {} (status: {})",
                    self.config.url,
                    response.status()
                );
                Ok(stream)
            }
            Ok(Err(e)) => Err(FireHoseError::connection_unavailable_with_source(
                format!("Failed to connect to {}: {}", self.config.url, e),
                Box::new(e),
            )),
            Err(_) => Err(FireHoseError::connection_unavailable(format!(
                "Connection to {} timed out after {:?}",
                self.config.url, self.config.connect_timeout
            ))),
        }
    }

    /// Subscribe and pump frames until the connection ends.
    async fn stream(&self, ws_stream: WsStream) -> ConnectionEnd {
        let (mut write, mut read) = ws_stream.split();

        if !self.set_status(ConnectionStatus::Open).await {
            return ConnectionEnd::Stopped;
        }
        if let Err(e) = write.send(Message::text(subscribe_frame())).await {
            log::error!(
                "[SourceConnector] {}: failed to subscribe: {}",
                self.config.instance,
                e
            );
            return ConnectionEnd::Failed;
        }
        log::debug!(
            "[SourceConnector] {}: subscribed to {} stream",
            self.config.instance,
            PUBLIC_STREAM
        );

        loop {
            if !self.running.load(Ordering::SeqCst) {
                let _ = write.close().await;
                return ConnectionEnd::Stopped;
            }

            // Use timeout to periodically check running flag
            match tokio::time::timeout(POLL_INTERVAL, read.next()).await {
                Ok(Some(Ok(message))) => match self.process_message(message, &mut write).await {
                    MessageResult::Continue => {}
                    MessageResult::Closed => return ConnectionEnd::Closed,
                    MessageResult::Stop => return ConnectionEnd::Stopped,
                },
                Ok(Some(Err(e))) => {
                    let err = FireHoseError::connection_unavailable_with_source(
                        format!("WebSocket error from {}: {}", self.config.instance, e),
                        Box::new(e),
                    );
                    log::error!("[SourceConnector] {}", err);
                    return ConnectionEnd::Failed;
                }
                Ok(None) => {
                    log::info!(
                        "[SourceConnector] {}: connection closed by server",
                        self.config.instance
                    );
                    return ConnectionEnd::Closed;
                }
                Err(_) => continue,
            }
        }
    }

    async fn process_message(
        &self,
        message: Message,
        write: &mut SplitSink<WsStream, Message>,
    ) -> MessageResult {
        match message {
            Message::Text(text) => self.deliver(text.as_bytes()).await,
            Message::Binary(data) => self.deliver(&data).await,
            Message::Ping(data) => {
                if let Err(e) = write.send(Message::Pong(data)).await {
                    log::warn!(
                        "[SourceConnector] {}: failed to send pong: {}",
                        self.config.instance,
                        e
                    );
                }
                MessageResult::Continue
            }
            Message::Pong(_) => {
                log::trace!("[SourceConnector] {}: pong received", self.config.instance);
                MessageResult::Continue
            }
            Message::Close(frame) => {
                if let Some(cf) = frame {
                    log::info!(
                        "[SourceConnector] {}: close frame received: {} {}",
                        self.config.instance,
                        cf.code,
                        cf.reason
                    );
                } else {
                    log::info!(
                        "[SourceConnector] {}: close frame received",
                        self.config.instance
                    );
                }
                MessageResult::Closed
            }
            Message::Frame(_) => MessageResult::Continue,
        }
    }

    /// Decode one frame and forward the post, if any.
    async fn deliver(&self, data: &[u8]) -> MessageResult {
        match self.mapper.map(data) {
            Ok(Some(post)) => {
                let event = SourceEvent::Post {
                    source: self.id,
                    session_id: self.clock.current(),
                    post,
                };
                if self.emit(event).await {
                    MessageResult::Continue
                } else {
                    MessageResult::Stop
                }
            }
            Ok(None) => MessageResult::Continue,
            Err(e) => {
                log::debug!(
                    "[SourceConnector] {}: dropping frame: {}",
                    self.config.instance,
                    e
                );
                MessageResult::Continue
            }
        }
    }

    async fn set_status(&self, status: ConnectionStatus) -> bool {
        self.emit(SourceEvent::Status {
            source: self.id,
            status,
        })
        .await
    }

    /// Returns false once the aggregator has gone away.
    async fn emit(&self, event: SourceEvent) -> bool {
        if self.events.send(event).await.is_err() {
            log::debug!(
                "[SourceConnector] {}: aggregator gone, stopping",
                self.config.instance
            );
            self.running.store(false, Ordering::SeqCst);
            return false;
        }
        true
    }
}
