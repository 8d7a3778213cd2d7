//! Realtime change feed with auto-reconnect.
//!
//! Connects to the project's realtime websocket (a Phoenix channel
//! server), joins `realtime:public:{table}` with a `postgres_changes`
//! subscription, and streams row-change notifications through a
//! [`tokio::sync::broadcast`] channel. Heartbeats keep the socket alive;
//! reconnection uses exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use fleetboard_api::{ApiCredentials, RealtimeEndpoint, RealtimeHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let endpoint = RealtimeEndpoint::from_project_url(&project_url, &credentials)?;
//! let handle = RealtimeHandle::connect(endpoint, "members", ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(change) = rx.recv().await {
//!     println!("{} on {}", change.kind, change.table);
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::transport::ApiCredentials;

// ── Protocol constants ───────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const PROTOCOL_VERSION: &str = "1.0.0";
const JOIN_REF: &str = "1";
const PHOENIX_TOPIC: &str = "phoenix";
const SCHEMA: &str = "public";

// ── ChangeEvent ──────────────────────────────────────────────────────

/// What happened to a row.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Emitted after a reconnect, when changes may have been missed.
    Resync,
    /// Emitted before every reconnect attempt; no row changed.
    Disconnected,
}

/// A payload-agnostic notification that a table changed.
///
/// The row data itself is deliberately not carried: consumers refetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for websocket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

impl ReconnectConfig {
    /// Exponential backoff with jitter.
    ///
    /// `delay = min(initial * 2^attempt, max) + jitter`
    ///
    /// Jitter is +-25% to spread out reconnection storms from multiple clients.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());

        // Deterministic jitter seeded from the attempt number.
        let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
        let with_jitter = (capped * jitter_factor).max(0.0);

        Duration::from_secs_f64(with_jitter)
    }
}

// ── RealtimeEndpoint ─────────────────────────────────────────────────

/// Where and how to open the realtime socket.
#[derive(Debug, Clone)]
pub struct RealtimeEndpoint {
    url: Url,
    api_key: SecretString,
    access_token: Option<SecretString>,
}

impl RealtimeEndpoint {
    /// Derive `wss://<host>/realtime/v1/websocket` from the project URL.
    pub fn from_project_url(project_url: &Url, credentials: &ApiCredentials) -> Result<Self, Error> {
        let mut url = project_url.clone();
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(Error::WebSocketConnect(format!(
                    "unsupported URL scheme for realtime: {other}"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot switch {project_url} to {scheme}")))?;

        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/realtime/v1/websocket"));
        url.set_query(None);

        Ok(Self {
            url,
            api_key: credentials.api_key.clone(),
            access_token: credentials.access_token.clone(),
        })
    }

    /// Socket URL without credentials, safe to log.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Channel topic for a table in the public schema.
    pub fn topic(table: &str) -> String {
        format!("realtime:{SCHEMA}:{table}")
    }

    fn connect_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("apikey", self.api_key.expose_secret())
            .append_pair("vsn", PROTOCOL_VERSION);
        url
    }

    fn join_message(&self, table: &str) -> PhoenixMessage {
        let token = self
            .access_token
            .as_ref()
            .unwrap_or(&self.api_key)
            .expose_secret()
            .to_owned();

        PhoenixMessage {
            topic: Self::topic(table),
            event: "phx_join".into(),
            payload: json!({
                "config": {
                    "broadcast": { "ack": false, "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [
                        { "event": "*", "schema": SCHEMA, "table": table }
                    ],
                    "private": false
                },
                "access_token": token
            }),
            msg_ref: Some(JOIN_REF.into()),
            join_ref: Some(JOIN_REF.into()),
        }
    }
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running change feed for one table.
///
/// The background task owns the only sender: once it gives up (retry
/// limit) or is shut down, every receiver observes `Closed`. Outages it
/// rides out are announced with [`ChangeKind::Disconnected`] and end with
/// [`ChangeKind::Resync`] once the channel is joined again.
pub struct RealtimeHandle {
    event_rx: broadcast::Receiver<Arc<ChangeEvent>>,
    cancel: CancellationToken,
    topic: String,
}

impl RealtimeHandle {
    /// Spawn the connect/join/read loop for `table`.
    ///
    /// Returns immediately; the first connection attempt happens in the
    /// background. Must be called from within a Tokio runtime.
    pub fn connect(
        endpoint: RealtimeEndpoint,
        table: &str,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let topic = RealtimeEndpoint::topic(table);

        let task_cancel = cancel.clone();
        let task_table = table.to_owned();
        tokio::spawn(async move {
            realtime_loop(endpoint, task_table, event_tx, reconnect, task_cancel).await;
        });

        Self {
            event_rx,
            cancel,
            topic,
        }
    }

    /// Get a new broadcast receiver for the change stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ChangeEvent>> {
        self.event_rx.resubscribe()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Signal the background task to leave the channel and shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → join → read → on error, backoff → reconnect.
async fn realtime_loop(
    endpoint: RealtimeEndpoint,
    table: String,
    event_tx: broadcast::Sender<Arc<ChangeEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    let mut reconnecting = false;

    loop {
        let mut joined = false;
        let result =
            connect_and_read(&endpoint, &table, &event_tx, &cancel, reconnecting, &mut joined)
                .await;

        if cancel.is_cancelled() {
            break;
        }
        if joined {
            attempt = 0;
        }

        let delay = match result {
            Ok(()) => {
                tracing::info!(table = %table, "Realtime socket closed cleanly, reconnecting");
                reconnect.initial_delay
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, table = %table, "Realtime connection error");

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(
                            max_retries = max,
                            table = %table,
                            "Realtime reconnection limit reached, giving up"
                        );
                        break;
                    }
                }

                let delay = reconnect.delay_for(attempt);
                attempt = attempt.saturating_add(1);
                delay
            }
        };

        broadcast_change(&event_tx, &table, ChangeKind::Disconnected, None);
        reconnecting = true;

        tracing::debug!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "Waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!(table = %table, "Realtime loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one socket, join the table channel, and read until it drops.
///
/// `joined` is set once the server acknowledges the join; on any attempt
/// after the first (`resync_on_join`) a [`ChangeKind::Resync`] is broadcast
/// so consumers refetch whatever they missed while disconnected.
async fn connect_and_read(
    endpoint: &RealtimeEndpoint,
    table: &str,
    event_tx: &broadcast::Sender<Arc<ChangeEvent>>,
    cancel: &CancellationToken,
    resync_on_join: bool,
    joined: &mut bool,
) -> Result<(), Error> {
    tracing::info!(url = %endpoint.url(), table, "Connecting to realtime");

    let uri: tungstenite::http::Uri = endpoint
        .connect_url()
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let connect = tokio_tungstenite::connect_async(ClientRequestBuilder::new(uri));
    let (ws_stream, _response) = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(()),
        result = connect => result.map_err(|e| Error::WebSocketConnect(e.to_string()))?,
    };

    let (mut write, mut read) = ws_stream.split();
    let topic = RealtimeEndpoint::topic(table);

    write.send(encode(&endpoint.join_message(table))?).await.map_err(ws_error)?;

    let mut heartbeat = tokio::time::interval_at(
        tokio::time::Instant::now() + HEARTBEAT_INTERVAL,
        HEARTBEAT_INTERVAL,
    );
    let mut next_ref: u64 = 2;
    let mut pending_heartbeat: Option<String> = None;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let leave = PhoenixMessage::control(&topic, "phx_leave", next_ref);
                if let Ok(frame) = encode(&leave) {
                    let _ = write.send(frame).await;
                }
                let _ = write.close().await;
                return Ok(());
            }
            _ = heartbeat.tick() => {
                if !*joined {
                    return Err(Error::ChannelRejected {
                        topic: topic.clone(),
                        reason: "join not acknowledged".into(),
                    });
                }
                if pending_heartbeat.is_some() {
                    return Err(Error::WebSocketClosed {
                        code: 1001,
                        reason: "heartbeat timed out".into(),
                    });
                }
                let msg = PhoenixMessage::control(PHOENIX_TOPIC, "heartbeat", next_ref);
                pending_heartbeat = msg.msg_ref.clone();
                next_ref += 1;
                write.send(encode(&msg)?).await.map_err(ws_error)?;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        match handle_text(&text, &topic, table, event_tx)? {
                            Inbound::Joined => {
                                tracing::info!(topic = %topic, "Realtime channel joined");
                                *joined = true;
                                if resync_on_join {
                                    broadcast_change(event_tx, table, ChangeKind::Resync, None);
                                }
                            }
                            Inbound::HeartbeatAck(reply_ref) => {
                                if pending_heartbeat.as_deref() == reply_ref.as_deref() {
                                    pending_heartbeat = None;
                                }
                            }
                            Inbound::Change | Inbound::Ignored => {}
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        tracing::trace!("Realtime ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "Realtime close frame received"
                            );
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(ws_error(e)),
                    None => {
                        tracing::info!("Realtime stream ended");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

fn ws_error(err: tungstenite::Error) -> Error {
    Error::WebSocketConnect(err.to_string())
}

fn encode(msg: &PhoenixMessage) -> Result<tungstenite::Message, Error> {
    serde_json::to_string(msg)
        .map(tungstenite::Message::text)
        .map_err(|e| Error::WebSocketConnect(format!("failed to encode {}: {e}", msg.event)))
}

// ── Message parsing ──────────────────────────────────────────────────

/// Phoenix v1 JSON frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PhoenixMessage {
    topic: String,
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
    #[serde(rename = "ref", default)]
    msg_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    join_ref: Option<String>,
}

impl PhoenixMessage {
    fn control(topic: &str, event: &str, msg_ref: u64) -> Self {
        Self {
            topic: topic.to_owned(),
            event: event.to_owned(),
            payload: json!({}),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: None,
        }
    }
}

/// What a single inbound frame meant to the connection.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Joined,
    HeartbeatAck(Option<String>),
    Change,
    Ignored,
}

/// Interpret one text frame, broadcasting row changes.
///
/// Channel-level failures come back as errors so the caller reconnects.
fn handle_text(
    text: &str,
    topic: &str,
    table: &str,
    event_tx: &broadcast::Sender<Arc<ChangeEvent>>,
) -> Result<Inbound, Error> {
    let msg: PhoenixMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse realtime frame");
            return Ok(Inbound::Ignored);
        }
    };

    if msg.topic == PHOENIX_TOPIC {
        return Ok(if msg.event == "phx_reply" {
            Inbound::HeartbeatAck(msg.msg_ref)
        } else {
            Inbound::Ignored
        });
    }
    if msg.topic != topic {
        return Ok(Inbound::Ignored);
    }

    match msg.event.as_str() {
        "phx_reply" => {
            let status = msg.payload["status"].as_str().unwrap_or("");
            if status == "ok" {
                Ok(if msg.msg_ref.as_deref() == Some(JOIN_REF) {
                    Inbound::Joined
                } else {
                    Inbound::Ignored
                })
            } else {
                Err(Error::ChannelRejected {
                    topic: topic.to_owned(),
                    reason: reply_reason(&msg.payload),
                })
            }
        }
        "postgres_changes" => {
            let data = &msg.payload["data"];
            Ok(broadcast_row_change(data, table, event_tx))
        }
        // Older servers send the change type as the event name.
        "INSERT" | "UPDATE" | "DELETE" => Ok(broadcast_row_change(&msg.payload, table, event_tx)),
        "system" => {
            if msg.payload["status"].as_str() == Some("error") {
                Err(Error::ChannelRejected {
                    topic: topic.to_owned(),
                    reason: reply_reason(&msg.payload),
                })
            } else {
                tracing::debug!(payload = %msg.payload, "Realtime system message");
                Ok(Inbound::Ignored)
            }
        }
        "phx_error" => Err(Error::WebSocketClosed {
            code: 1011,
            reason: "channel crashed on the server".into(),
        }),
        "phx_close" => Err(Error::WebSocketClosed {
            code: 1000,
            reason: "channel closed by the server".into(),
        }),
        _ => Ok(Inbound::Ignored),
    }
}

fn reply_reason(payload: &serde_json::Value) -> String {
    payload["response"]["reason"]
        .as_str()
        .or_else(|| payload["message"].as_str())
        .map_or_else(|| payload.to_string(), String::from)
}

fn broadcast_row_change(
    data: &serde_json::Value,
    table: &str,
    event_tx: &broadcast::Sender<Arc<ChangeEvent>>,
) -> Inbound {
    let Some(kind) = data["type"]
        .as_str()
        .and_then(|t| t.parse::<ChangeKind>().ok())
    else {
        tracing::debug!(data = %data, "Realtime change without a known type");
        return Inbound::Ignored;
    };

    let changed_table = data["table"].as_str().unwrap_or(table);
    let timestamp = data["commit_timestamp"].as_str().map(String::from);
    broadcast_change(event_tx, changed_table, kind, timestamp);
    Inbound::Change
}

fn broadcast_change(
    event_tx: &broadcast::Sender<Arc<ChangeEvent>>,
    table: &str,
    kind: ChangeKind,
    commit_timestamp: Option<String>,
) {
    tracing::debug!(table, %kind, "Realtime change");
    // No subscribers right now is fine.
    let _ = event_tx.send(Arc::new(ChangeEvent {
        table: table.to_owned(),
        kind,
        commit_timestamp,
    }));
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn endpoint(project: &str) -> RealtimeEndpoint {
        let creds = ApiCredentials::anonymous("anon".to_string().into());
        RealtimeEndpoint::from_project_url(&Url::parse(project).unwrap(), &creds).unwrap()
    }

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = config.delay_for(0);
        let d1 = config.delay_for(1);
        let d2 = config.delay_for(2);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = config.delay_for(10);
        assert!(d10 <= Duration::from_secs(13), "attempt 10 gave {d10:?}");
    }

    #[test]
    fn endpoint_switches_to_websocket_scheme() {
        let ep = endpoint("https://abc.supabase.co");
        assert_eq!(ep.url().as_str(), "wss://abc.supabase.co/realtime/v1/websocket");

        let ep = endpoint("http://localhost:54321/");
        assert_eq!(ep.url().as_str(), "ws://localhost:54321/realtime/v1/websocket");
    }

    #[test]
    fn connect_url_carries_key_and_version() {
        let url = endpoint("https://abc.supabase.co").connect_url();
        assert_eq!(url.query(), Some("apikey=anon&vsn=1.0.0"));
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        let creds = ApiCredentials::anonymous("anon".to_string().into());
        let url = Url::parse("ftp://example.com").unwrap();
        assert!(RealtimeEndpoint::from_project_url(&url, &creds).is_err());
    }

    #[test]
    fn join_message_subscribes_to_all_events() {
        let msg = endpoint("https://abc.supabase.co").join_message("faqs");
        assert_eq!(msg.topic, "realtime:public:faqs");
        assert_eq!(msg.event, "phx_join");
        let changes = &msg.payload["config"]["postgres_changes"][0];
        assert_eq!(changes["event"], "*");
        assert_eq!(changes["table"], "faqs");
        assert_eq!(msg.payload["access_token"], "anon");
    }

    #[test]
    fn join_reply_ok_marks_joined() {
        let (tx, _rx) = broadcast::channel(4);
        let raw = json!({
            "topic": "realtime:public:members",
            "event": "phx_reply",
            "payload": { "status": "ok", "response": { "postgres_changes": [] } },
            "ref": "1"
        });
        let inbound = handle_text(&raw.to_string(), "realtime:public:members", "members", &tx);
        assert_eq!(inbound.unwrap(), Inbound::Joined);
    }

    #[test]
    fn join_reply_error_is_rejection() {
        let (tx, _rx) = broadcast::channel(4);
        let raw = json!({
            "topic": "realtime:public:members",
            "event": "phx_reply",
            "payload": { "status": "error", "response": { "reason": "unauthorized" } },
            "ref": "1"
        });
        let err = handle_text(&raw.to_string(), "realtime:public:members", "members", &tx)
            .unwrap_err();
        assert!(matches!(err, Error::ChannelRejected { ref reason, .. } if reason == "unauthorized"));
    }

    #[test]
    fn postgres_change_is_broadcast() {
        let (tx, mut rx) = broadcast::channel(4);
        let raw = json!({
            "topic": "realtime:public:best_games",
            "event": "postgres_changes",
            "payload": {
                "data": {
                    "type": "UPDATE",
                    "table": "best_games",
                    "schema": "public",
                    "commit_timestamp": "2026-03-01T10:00:00Z",
                    "record": { "id": "g1", "position": 2 }
                },
                "ids": [42]
            },
            "ref": null
        });

        let inbound =
            handle_text(&raw.to_string(), "realtime:public:best_games", "best_games", &tx).unwrap();
        assert_eq!(inbound, Inbound::Change);

        let change = rx.try_recv().unwrap();
        assert_eq!(change.table, "best_games");
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.commit_timestamp.as_deref(), Some("2026-03-01T10:00:00Z"));
    }

    #[test]
    fn legacy_change_event_is_broadcast() {
        let (tx, mut rx) = broadcast::channel(4);
        let raw = json!({
            "topic": "realtime:public:faqs",
            "event": "DELETE",
            "payload": { "type": "DELETE", "table": "faqs" },
            "ref": null
        });

        handle_text(&raw.to_string(), "realtime:public:faqs", "faqs", &tx).unwrap();
        assert_eq!(rx.try_recv().unwrap().kind, ChangeKind::Delete);
    }

    #[test]
    fn heartbeat_reply_is_acknowledged() {
        let (tx, _rx) = broadcast::channel(4);
        let raw = json!({
            "topic": "phoenix",
            "event": "phx_reply",
            "payload": { "status": "ok", "response": {} },
            "ref": "7"
        });
        let inbound = handle_text(&raw.to_string(), "realtime:public:faqs", "faqs", &tx).unwrap();
        assert_eq!(inbound, Inbound::HeartbeatAck(Some("7".into())));
    }

    #[test]
    fn other_topics_and_garbage_are_ignored() {
        let (tx, mut rx) = broadcast::channel::<Arc<ChangeEvent>>(4);
        let raw = json!({
            "topic": "realtime:public:members",
            "event": "postgres_changes",
            "payload": { "data": { "type": "INSERT", "table": "members" } },
            "ref": null
        });

        let inbound = handle_text(&raw.to_string(), "realtime:public:faqs", "faqs", &tx).unwrap();
        assert_eq!(inbound, Inbound::Ignored);
        let inbound = handle_text("not json", "realtime:public:faqs", "faqs", &tx).unwrap();
        assert_eq!(inbound, Inbound::Ignored);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_close_forces_reconnect() {
        let (tx, _rx) = broadcast::channel(4);
        let raw = json!({
            "topic": "realtime:public:faqs",
            "event": "phx_close",
            "payload": {},
            "ref": "1"
        });
        let result = handle_text(&raw.to_string(), "realtime:public:faqs", "faqs", &tx);
        assert!(matches!(result, Err(Error::WebSocketClosed { code: 1000, .. })));
    }

    #[test]
    fn change_kind_parses_case_insensitively() {
        assert_eq!("insert".parse::<ChangeKind>().unwrap(), ChangeKind::Insert);
        assert_eq!(ChangeKind::Resync.to_string(), "RESYNC");
        assert_eq!(ChangeKind::Disconnected.to_string(), "DISCONNECTED");
    }

    #[tokio::test]
    async fn outage_is_announced_before_each_retry() {
        // Nothing listens on port 1, so every attempt is refused.
        let reconnect = ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            max_retries: Some(1),
        };
        let handle = RealtimeHandle::connect(
            endpoint("http://127.0.0.1:1"),
            "faqs",
            reconnect,
            CancellationToken::new(),
        );
        let mut rx = handle.subscribe();

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.table, "faqs");
        assert_eq!(first.kind, ChangeKind::Disconnected);

        // The retry limit is reached on the second refusal.
        let last = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(matches!(last, Err(broadcast::error::RecvError::Closed)));
    }
}
