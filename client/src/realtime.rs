//! Realtime booking and campaign updates over WebSocket.
//!
//! The server pushes JSON frames of the form `{"event": "...", "data": ...}`.
//! [`RealtimeClient`] keeps one connection open in a background task,
//! reconnecting after drops, and:
//!
//! - decodes known events into [`RealtimeEvent`] and broadcasts them
//! - invalidates the cached queries each event makes stale
//! - remembers joined campaign rooms and rejoins them after a reconnect
//!
//! ```ignore
//! let realtime = RealtimeClient::connect(&config.realtime, &token, client.context().clone())?;
//! let mut events = realtime.subscribe();
//! realtime.join_campaign("cmp-1")?;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

use crate::config::RealtimeConfig;
use boxoffice_runtime::metrics::RealtimeMetrics;
use boxoffice_runtime::{SessionContext, keys};
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Inbound: a booking changed.
pub const BOOKING_UPDATED: &str = "booking:updated";
/// Inbound: a booking was made.
pub const BOOKING_NEW: &str = "booking:new";
/// Inbound: a campaign changed.
pub const CAMPAIGN_UPDATED: &str = "campaign:updated";
/// Outbound: subscribe to a campaign room.
pub const JOIN_CAMPAIGN: &str = "join:campaign";
/// Outbound: unsubscribe from a campaign room.
pub const LEAVE_CAMPAIGN: &str = "leave:campaign";

const EVENT_CAPACITY: usize = 64;

/// Realtime client errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RealtimeError {
    /// The configured endpoint is not a WebSocket URL.
    #[error("invalid realtime url {0}")]
    InvalidUrl(String),

    /// The client has been disconnected.
    #[error("realtime client is disconnected")]
    Closed,

    /// A frame could not be encoded.
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// First connection attempt in progress.
    Connecting,
    /// Connected; events flow.
    Connected,
    /// Waiting to retry after a drop or failed attempt.
    Reconnecting {
        /// Consecutive failed attempts so far.
        attempt: u32,
    },
    /// Gave up after the configured number of attempts.
    Failed,
    /// Disconnected on request.
    Disconnected,
}

/// `booking:updated` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    /// Booking id.
    #[serde(default)]
    pub booking_id: Option<String>,
    /// Campaign the booking belongs to.
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Human-readable booking reference.
    #[serde(default)]
    pub booking_reference: Option<String>,
    /// New booking status, as sent.
    #[serde(default)]
    pub status: Option<String>,
}

/// `booking:new` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    /// Booking id.
    #[serde(default)]
    pub booking_id: Option<String>,
    /// Campaign booked.
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Campaign name for display.
    #[serde(default)]
    pub campaign_name: Option<String>,
}

/// `campaign:updated` payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignUpdate {
    /// Campaign id.
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Remaining fields as sent.
    #[serde(flatten)]
    pub changes: serde_json::Map<String, Value>,
}

/// A decoded server event.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    /// `booking:updated`.
    BookingUpdated(BookingUpdate),
    /// `booking:new`.
    BookingNew(NewBooking),
    /// `campaign:updated`.
    CampaignUpdated(CampaignUpdate),
}

impl RealtimeEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BookingUpdated(_) => BOOKING_UPDATED,
            Self::BookingNew(_) => BOOKING_NEW,
            Self::CampaignUpdated(_) => CAMPAIGN_UPDATED,
        }
    }

    /// Decode a text frame. `None` for unknown events and malformed frames.
    #[must_use]
    pub fn decode(text: &str) -> Option<Self> {
        let frame: Frame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed realtime frame");
                return None;
            }
        };

        let decoded = match frame.event.as_str() {
            BOOKING_UPDATED => serde_json::from_value(frame.data).map(Self::BookingUpdated),
            BOOKING_NEW => serde_json::from_value(frame.data).map(Self::BookingNew),
            CAMPAIGN_UPDATED => serde_json::from_value(frame.data).map(Self::CampaignUpdated),
            other => {
                tracing::debug!(event = other, "Skipping unknown realtime event");
                return None;
            }
        };

        decoded
            .map_err(|e| tracing::warn!(event = %frame.event, error = %e, "Undecodable realtime payload"))
            .ok()
    }

    /// Drop the cached queries this event makes stale.
    pub async fn invalidate(&self, context: &SessionContext) {
        let cache = context.cache();
        match self {
            Self::BookingUpdated(update) => {
                cache.invalidate_prefix(&keys::bookings::list(None)).await;
                cache.invalidate_prefix(&keys::bookings::mine(None)).await;
                if let Some(campaign_id) = &update.campaign_id {
                    cache.invalidate_prefix(&keys::bookings::by_campaign(campaign_id)).await;
                }
                if let Some(booking_id) = &update.booking_id {
                    cache.invalidate(&keys::bookings::detail(booking_id)).await;
                }
            }
            Self::BookingNew(booking) => {
                cache.invalidate_prefix(&keys::bookings::list(None)).await;
                cache.invalidate_prefix(&keys::bookings::mine(None)).await;
                if let Some(campaign_id) = &booking.campaign_id {
                    cache.invalidate_prefix(&keys::bookings::by_campaign(campaign_id)).await;
                    cache.invalidate(&keys::campaigns::detail(campaign_id)).await;
                }
            }
            Self::CampaignUpdated(update) => {
                if let Some(campaign_id) = &update.campaign_id {
                    cache.invalidate(&keys::campaigns::detail(campaign_id)).await;
                }
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

fn encode(event: &str, data: Value) -> Result<String, RealtimeError> {
    serde_json::to_string(&Frame {
        event: event.to_string(),
        data,
    })
    .map_err(|e| RealtimeError::Encode(e.to_string()))
}

#[derive(Debug)]
enum Command {
    Join(String),
    Leave(String),
}

/// Handle to the background connection.
#[derive(Debug)]
pub struct RealtimeClient {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<RealtimeEvent>,
    state: watch::Receiver<ConnectionState>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeClient {
    /// Start connecting to `config.url` with `token`.
    ///
    /// Returns immediately; the connection is made in the background.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::InvalidUrl`] unless the URL is `ws://` or
    /// `wss://`.
    pub fn connect(
        config: &RealtimeConfig,
        token: &str,
        context: Arc<SessionContext>,
    ) -> Result<Self, RealtimeError> {
        let url = endpoint(&config.url, token)?;
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let connection = Connection {
            url,
            config: config.clone(),
            context,
            events: events.clone(),
            state: state_tx,
            shutdown: shutdown_rx,
            commands: command_rx,
            rooms: BTreeSet::new(),
        };
        let task = tokio::spawn(connection.run());

        Ok(Self {
            commands,
            events,
            state,
            shutdown,
            task: Mutex::new(Some(task)),
        })
    }

    /// Receive events from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.events.subscribe()
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Subscribe to updates for one campaign. Rejoined after reconnects.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Closed`] after [`disconnect`](Self::disconnect).
    pub fn join_campaign(&self, campaign_id: &str) -> Result<(), RealtimeError> {
        self.command(Command::Join(campaign_id.to_string()))
    }

    /// Stop receiving updates for one campaign.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Closed`] after [`disconnect`](Self::disconnect).
    pub fn leave_campaign(&self, campaign_id: &str) -> Result<(), RealtimeError> {
        self.command(Command::Leave(campaign_id.to_string()))
    }

    fn command(&self, command: Command) -> Result<(), RealtimeError> {
        self.commands.send(command).map_err(|_| RealtimeError::Closed)
    }

    /// Close the connection and stop reconnecting.
    ///
    /// Returns `false` if already disconnected.
    pub async fn disconnect(&self) -> bool {
        let Some(task) = self.task.lock().await.take() else {
            return false;
        };
        let _ = self.shutdown.send(true);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Realtime task ended abnormally");
        }
        tracing::info!("Realtime disconnected");
        true
    }
}

/// Endpoint URL with the auth token attached.
fn endpoint(url: &str, token: &str) -> Result<String, RealtimeError> {
    let mut parsed = Url::parse(url).map_err(|_| RealtimeError::InvalidUrl(url.to_string()))?;
    if !matches!(parsed.scheme(), "ws" | "wss") {
        return Err(RealtimeError::InvalidUrl(url.to_string()));
    }
    if !token.is_empty() {
        parsed.query_pairs_mut().append_pair("token", token);
    }
    Ok(parsed.into())
}

enum Ended {
    Shutdown,
    Dropped,
}

struct Connection {
    url: String,
    config: RealtimeConfig,
    context: Arc<SessionContext>,
    events: broadcast::Sender<RealtimeEvent>,
    state: watch::Sender<ConnectionState>,
    shutdown: watch::Receiver<bool>,
    commands: mpsc::UnboundedReceiver<Command>,
    rooms: BTreeSet<String>,
}

impl Connection {
    async fn run(mut self) {
        let mut failures = 0u32;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let attempt = tokio::select! {
                attempt = connect_async(self.url.as_str()) => attempt,
                _ = self.shutdown.changed() => break,
            };

            match attempt {
                Ok((socket, _)) => {
                    failures = 0;
                    tracing::info!(rooms = self.rooms.len(), "Realtime connected");
                    let _ = self.state.send(ConnectionState::Connected);
                    if let Ended::Shutdown = self.serve(socket).await {
                        break;
                    }
                    tracing::warn!("Realtime connection dropped");
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt = failures + 1, "Realtime connection failed");
                }
            }

            failures += 1;
            if failures > self.config.max_reconnect_attempts {
                tracing::error!(attempts = failures - 1, "Realtime reconnection gave up");
                let _ = self.state.send(ConnectionState::Failed);
                return;
            }

            let _ = self.state.send(ConnectionState::Reconnecting { attempt: failures });
            RealtimeMetrics::record_reconnect();
            if let Ended::Shutdown = self.backoff().await {
                break;
            }
        }

        let _ = self.state.send(ConnectionState::Disconnected);
    }

    /// Wait out the reconnect delay, still tracking room changes.
    async fn backoff(&mut self) -> Ended {
        let delay = tokio::time::sleep(self.config.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                () = &mut delay => return Ended::Dropped,
                _ = self.shutdown.changed() => return Ended::Shutdown,
                command = self.commands.recv() => match command {
                    Some(command) => {
                        self.track(&command);
                    }
                    None => return Ended::Shutdown,
                },
            }
        }
    }

    async fn serve(&mut self, socket: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Ended {
        let (mut sink, mut stream) = socket.split();

        let rejoin: Vec<String> = self.rooms.iter().cloned().collect();
        for room in rejoin {
            if !send(&mut sink, JOIN_CAMPAIGN, &room).await {
                return Ended::Dropped;
            }
        }

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ended::Shutdown;
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        let _ = sink.send(Message::Close(None)).await;
                        return Ended::Shutdown;
                    };
                    if self.track(&command) {
                        let (event, room) = match &command {
                            Command::Join(room) => (JOIN_CAMPAIGN, room),
                            Command::Leave(room) => (LEAVE_CAMPAIGN, room),
                        };
                        if !send(&mut sink, event, room).await {
                            return Ended::Dropped;
                        }
                    }
                }
                message = stream.next() => match message {
                    Some(Ok(Message::Text(text))) => self.dispatch(&text).await,
                    Some(Ok(Message::Close(_))) | None => return Ended::Dropped,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Realtime read failed");
                        return Ended::Dropped;
                    }
                },
            }
        }
    }

    /// Apply a room change. Returns whether it changed anything.
    fn track(&mut self, command: &Command) -> bool {
        match command {
            Command::Join(room) => self.rooms.insert(room.clone()),
            Command::Leave(room) => self.rooms.remove(room),
        }
    }

    async fn dispatch(&self, text: &str) {
        let Some(event) = RealtimeEvent::decode(text) else {
            return;
        };
        tracing::debug!(event = event.name(), "Realtime event");
        RealtimeMetrics::record_event(event.name());
        event.invalidate(&self.context).await;
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

async fn send<K>(sink: &mut K, event: &str, campaign_id: &str) -> bool
where
    K: futures::Sink<Message> + Unpin,
{
    let frame = match encode(event, Value::String(campaign_id.to_string())) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping realtime frame");
            return true;
        }
    };
    sink.send(Message::Text(frame)).await.is_ok()
}
