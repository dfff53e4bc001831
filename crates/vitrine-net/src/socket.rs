//! Realtime socket task with a tokio mpsc command/notification pattern.
//!
//! The WebSocket connection lives in a dedicated tokio task. External code
//! talks to it through a [`SocketHandle`] (commands in) and a channel of
//! [`SocketNotification`]s (events out). The task reconnects with
//! exponential backoff until it is shut down or every handle is dropped.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use vitrine_shared::constants::{DEFAULT_RECONNECT_INITIAL_SECS, DEFAULT_RECONNECT_MAX_SECS};
use vitrine_shared::protocol::{ClientEvent, SocketEvent};
use vitrine_shared::ProtocolError;

use crate::error::{NetError, Result};

// ---------------------------------------------------------------------------
// Command / notification types
// ---------------------------------------------------------------------------

/// Commands sent *into* the socket task.
#[derive(Debug)]
pub enum SocketCommand {
    /// Emit an event to the backend. Dropped while disconnected.
    Emit(ClientEvent),
    /// Close the connection and stop reconnecting.
    Shutdown,
}

/// Notifications sent *from* the socket task to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketNotification {
    /// A connection was (re-)established.
    Connected,
    /// The connection dropped; the task will try again after a backoff.
    Disconnected { reason: String },
    /// A decoded backend event.
    Event(SocketEvent),
}

/// Configuration for spawning the socket task.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// `ws://` or `wss://` endpoint.
    pub url: String,
    /// Sent as the `token` query parameter.
    pub token: Option<String>,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
}

impl SocketConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            reconnect_initial: Duration::from_secs(DEFAULT_RECONNECT_INITIAL_SECS),
            reconnect_max: Duration::from_secs(DEFAULT_RECONNECT_MAX_SECS),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The URL actually dialed, with the auth token appended.
    pub fn connect_url(&self) -> String {
        match &self.token {
            Some(token) => {
                let sep = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{}token={}", self.url, sep, token)
            }
            None => self.url.clone(),
        }
    }
}

/// Sender side of the socket task.
#[derive(Debug, Clone)]
pub struct SocketHandle {
    cmd_tx: mpsc::Sender<SocketCommand>,
}

impl SocketHandle {
    pub async fn emit(&self, event: ClientEvent) -> Result<()> {
        self.cmd_tx
            .send(SocketCommand::Emit(event))
            .await
            .map_err(|_| NetError::SocketClosed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.cmd_tx
            .send(SocketCommand::Shutdown)
            .await
            .map_err(|_| NetError::SocketClosed)
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Doubling reconnect delay, capped at `max`.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub(crate) fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.max);
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.initial;
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Spawn the socket task.
///
/// Returns the command handle and the notification receiver. The first
/// notification is `Connected` once the initial dial succeeds.
pub fn spawn_socket(
    config: SocketConfig,
) -> Result<(SocketHandle, mpsc::Receiver<SocketNotification>)> {
    if !(config.url.starts_with("ws://") || config.url.starts_with("wss://")) {
        return Err(NetError::InvalidUrl(config.url));
    }

    let (cmd_tx, cmd_rx) = mpsc::channel::<SocketCommand>(64);
    let (notif_tx, notif_rx) = mpsc::channel::<SocketNotification>(256);

    tokio::spawn(async move {
        run_socket(config, cmd_rx, notif_tx).await;
        info!("Socket task terminated");
    });

    Ok((SocketHandle { cmd_tx }, notif_rx))
}

/// What ended a connected session.
enum SessionEnd {
    Dropped(String),
    Stop,
}

async fn run_socket(
    config: SocketConfig,
    mut cmd_rx: mpsc::Receiver<SocketCommand>,
    notif_tx: mpsc::Sender<SocketNotification>,
) {
    let url = config.connect_url();
    let mut backoff = Backoff::new(config.reconnect_initial, config.reconnect_max);

    loop {
        match connect_async(url.as_str()).await {
            Ok((ws, _response)) => {
                info!(url = %config.url, "Socket connected");
                backoff.reset();

                if notif_tx.send(SocketNotification::Connected).await.is_err() {
                    return;
                }

                match run_session(ws, &mut cmd_rx, &notif_tx).await {
                    SessionEnd::Stop => return,
                    SessionEnd::Dropped(reason) => {
                        warn!(reason = %reason, "Socket disconnected");
                        let notice = SocketNotification::Disconnected { reason };
                        if notif_tx.send(notice).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(url = %config.url, error = %e, "Socket connect failed");
            }
        }

        let delay = backoff.next_delay();
        debug!(delay_ms = delay.as_millis() as u64, "Waiting before reconnect");
        if !wait_for_reconnect(delay, &mut cmd_rx).await {
            return;
        }
    }
}

async fn run_session<S>(
    ws: S,
    cmd_rx: &mut mpsc::Receiver<SocketCommand>,
    notif_tx: &mpsc::Sender<SocketNotification>,
) -> SessionEnd
where
    S: futures::Stream<Item = std::result::Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + futures::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SocketCommand::Emit(event)) => {
                        let frame = match event.to_frame() {
                            Ok(frame) => frame,
                            Err(e) => {
                                warn!(event = event.name(), error = %e, "Failed to encode event");
                                continue;
                            }
                        };
                        if let Err(e) = sink.send(WsMessage::Text(frame)).await {
                            return SessionEnd::Dropped(e.to_string());
                        }
                        debug!(event = event.name(), "Event emitted");
                    }
                    Some(SocketCommand::Shutdown) | None => {
                        info!("Socket shutdown requested");
                        let _ = sink.send(WsMessage::Close(None)).await;
                        return SessionEnd::Stop;
                    }
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        if !forward_frame(&text, notif_tx).await {
                            return SessionEnd::Stop;
                        }
                    }
                    Some(Ok(WsMessage::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => {
                            if !forward_frame(&text, notif_tx).await {
                                return SessionEnd::Stop;
                            }
                        }
                        Err(_) => debug!("Ignoring non-UTF-8 binary frame"),
                    },
                    Some(Ok(WsMessage::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "closed by server".to_string());
                        return SessionEnd::Dropped(reason);
                    }
                    // Pings are answered by tungstenite itself.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
                    None => return SessionEnd::Dropped("stream ended".to_string()),
                }
            }
        }
    }
}

/// Decode one frame and forward it. Returns `false` once nobody listens.
async fn forward_frame(text: &str, notif_tx: &mpsc::Sender<SocketNotification>) -> bool {
    match SocketEvent::from_frame(text) {
        Ok(event) => {
            debug!(kind = ?event.kind(), "Socket event received");
            notif_tx
                .send(SocketNotification::Event(event))
                .await
                .is_ok()
        }
        Err(ProtocolError::UnknownEvent(name)) => {
            debug!(event = %name, "Ignoring unknown socket event");
            true
        }
        Err(e) => {
            warn!(error = %e, "Dropping malformed socket frame");
            true
        }
    }
}

/// Sleep for `delay` while draining commands. Returns `false` on shutdown.
async fn wait_for_reconnect(delay: Duration, cmd_rx: &mut mpsc::Receiver<SocketCommand>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            cmd = cmd_rx.recv() => match cmd {
                Some(SocketCommand::Emit(event)) => {
                    warn!(event = event.name(), "Socket offline, dropping emit");
                }
                Some(SocketCommand::Shutdown) | None => {
                    info!("Socket shutdown requested while offline");
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(5));
        let delays: Vec<u64> = (0..5).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 5, 5]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn token_is_appended_as_query() {
        let config = SocketConfig::new("ws://localhost:5000/socket").with_token("abc");
        assert_eq!(config.connect_url(), "ws://localhost:5000/socket?token=abc");

        let config = SocketConfig::new("wss://h/ws?v=2").with_token("t");
        assert_eq!(config.connect_url(), "wss://h/ws?v=2&token=t");
    }

    #[tokio::test]
    async fn rejects_http_url() {
        let err = spawn_socket(SocketConfig::new("http://localhost")).unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));
    }
}
