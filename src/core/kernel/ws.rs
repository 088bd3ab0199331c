use crate::core::errors::BitstampError;
use crate::core::kernel::codec::WsCodec;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, protocol::Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument, warn};

pub const DEFAULT_WS_URL: &str = "wss://ws.bitstamp.net";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// WebSocket session configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Idle read timeout in milliseconds, restarted before every read
    pub read_timeout_ms: u64,
    /// Capacity of each of the event and error channels
    pub message_buffer_size: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            exchange_name: "bitstamp".to_string(),
            connect_timeout_ms: 10_000, // 10 seconds
            read_timeout_ms: 60_000,    // 60 seconds
            message_buffer_size: 1024,
        }
    }
}

impl WsConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout_ms = read_timeout.as_millis() as u64;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout_ms = connect_timeout.as_millis() as u64;
        self
    }

    pub fn with_message_buffer_size(mut self, size: usize) -> Self {
        self.message_buffer_size = size.max(1);
        self
    }

    fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Receiving ends of a session. Events and errors are independent queues.
#[derive(Debug)]
pub struct WsStreams<M> {
    pub events: mpsc::Receiver<M>,
    pub errors: mpsc::Receiver<BitstampError>,
}

/// One WebSocket connection with a background read task.
///
/// Writes (subscribe, unsubscribe, pong, close) share one async lock so
/// frames never interleave. Decoded messages arrive on the `events` channel
/// and every per-frame failure on the `errors` channel; only a closed
/// connection ends the read task.
pub struct WsSession<C: WsCodec> {
    config: WsConfig,
    codec: Arc<C>,
    writer: Arc<Mutex<WsSink>>,
    state: Arc<AtomicU8>,
    shutdown: watch::Sender<bool>,
    reader: StdMutex<Option<JoinHandle<()>>>,
    streams: StdMutex<Option<WsStreams<C::Message>>>,
    subscriptions: StdMutex<BTreeSet<String>>,
}

impl<C: WsCodec> std::fmt::Debug for WsSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsSession")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<C: WsCodec> WsSession<C> {
    /// Dial the configured URL and start the read task.
    ///
    /// A failed dial is returned as is; nothing is retried.
    pub async fn connect(config: WsConfig, codec: C) -> Result<Self, BitstampError> {
        Self::connect_shared(config, Arc::new(codec)).await
    }

    #[instrument(skip(config, codec), fields(exchange = %config.exchange_name, url = %config.url))]
    async fn connect_shared(config: WsConfig, codec: Arc<C>) -> Result<Self, BitstampError> {
        let state = Arc::new(AtomicU8::new(SessionState::Connecting as u8));
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);

        let (ws_stream, _) = timeout(connect_timeout, connect_async(config.url.as_str()))
            .await
            .map_err(|_| {
                BitstampError::ConnectionTimeout("WebSocket connection timeout".to_string())
            })?
            .map_err(|e| {
                BitstampError::NetworkError(format!("WebSocket connection failed: {}", e))
            })?;

        let (write, read) = ws_stream.split();
        let writer = Arc::new(Mutex::new(write));
        let buffer = config.message_buffer_size.max(1);
        let (events_tx, events_rx) = mpsc::channel(buffer);
        let (errors_tx, errors_rx) = mpsc::channel(buffer);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        state.store(SessionState::Open as u8, Ordering::SeqCst);
        let reader = tokio::spawn(read_loop(
            read,
            Arc::clone(&writer),
            Arc::clone(&codec),
            events_tx,
            errors_tx,
            shutdown_rx,
            Arc::clone(&state),
            config.read_timeout(),
        ));
        debug!("websocket session open");

        Ok(Self {
            config,
            codec,
            writer,
            state,
            shutdown: shutdown_tx,
            reader: StdMutex::new(Some(reader)),
            streams: StdMutex::new(Some(WsStreams {
                events: events_rx,
                errors: errors_rx,
            })),
            subscriptions: StdMutex::new(BTreeSet::new()),
        })
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Hand out the event and error receivers. Returns `None` after the first call.
    pub fn take_streams(&self) -> Option<WsStreams<C::Message>> {
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Channels subscribed on this session and not unsubscribed since.
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Send one subscribe frame per channel, in order.
    #[instrument(skip(self, channels), fields(exchange = %self.config.exchange_name, channel_count = channels.len()))]
    pub async fn subscribe<S: AsRef<str> + Sync>(&self, channels: &[S]) -> Result<(), BitstampError> {
        for channel in channels {
            let channel = channel.as_ref();
            let frame = self.codec.encode_subscription(channel)?;
            self.send_tracked(frame, |set| {
                set.insert(channel.to_string());
            })
            .await?;
        }
        Ok(())
    }

    /// Send one unsubscribe frame per channel, in order.
    #[instrument(skip(self, channels), fields(exchange = %self.config.exchange_name, channel_count = channels.len()))]
    pub async fn unsubscribe<S: AsRef<str> + Sync>(&self, channels: &[S]) -> Result<(), BitstampError> {
        for channel in channels {
            let channel = channel.as_ref();
            let frame = self.codec.encode_unsubscription(channel)?;
            self.send_tracked(frame, |set| {
                set.remove(channel);
            })
            .await?;
        }
        Ok(())
    }

    /// Send `frame` and, once it is written, apply `track` to the
    /// subscription set under the same writer lock, so the set follows wire
    /// order.
    async fn send_tracked<F>(&self, frame: Message, track: F) -> Result<(), BitstampError>
    where
        F: FnOnce(&mut BTreeSet<String>) + Send,
    {
        if !self.is_open() {
            return Err(BitstampError::ConnectionClosed);
        }
        let mut writer = self.writer.lock().await;
        writer.send(frame).await.map_err(|e| {
            BitstampError::NetworkError(format!("Failed to send WebSocket message: {}", e))
        })?;
        track(&mut *self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner));
        drop(writer);
        Ok(())
    }

    /// Open a fresh session with the same configuration and codec and replay
    /// this session's subscriptions on it.
    ///
    /// This session is left untouched so pending events can be drained
    /// before calling [`close`](Self::close) on it.
    #[instrument(skip(self), fields(exchange = %self.config.exchange_name))]
    pub async fn reconnect(&self) -> Result<Self, BitstampError> {
        let fresh = Self::connect_shared(self.config.clone(), Arc::clone(&self.codec)).await?;
        let channels = self.subscriptions();
        if !channels.is_empty() {
            debug!(count = channels.len(), "replaying subscriptions");
            fresh.subscribe(channels.as_slice()).await?;
        }
        Ok(fresh)
    }

    /// Stop the read task and close the connection.
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    #[instrument(skip(self), fields(exchange = %self.config.exchange_name))]
    pub async fn close(&self) -> Result<(), BitstampError> {
        if self
            .state
            .compare_exchange(
                SessionState::Open as u8,
                SessionState::Closing as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return Ok(());
        }

        // the read task may already be gone
        let _ = self.shutdown.send(true);

        {
            // sends the close frame, flushes and shuts the write half
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.close().await {
                debug!("websocket sink not closed cleanly: {}", e);
            }
        }

        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reader) = reader {
            if let Err(e) = reader.await {
                warn!("websocket read task ended abnormally: {}", e);
            }
        }

        self.state
            .store(SessionState::Closed as u8, Ordering::SeqCst);
        Ok(())
    }
}

impl<C: WsCodec> Drop for WsSession<C> {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn read_loop<C: WsCodec>(
    mut read: WsSource,
    writer: Arc<Mutex<WsSink>>,
    codec: Arc<C>,
    events: mpsc::Sender<C::Message>,
    errors: mpsc::Sender<BitstampError>,
    mut shutdown: watch::Receiver<bool>,
    state: Arc<AtomicU8>,
    read_timeout: Duration,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let next = tokio::select! {
            _ = shutdown.changed() => break,
            next = timeout(read_timeout, read.next()) => next,
        };

        let error = match next {
            Err(_) => BitstampError::ReadTimeout(read_timeout),
            Ok(None) => {
                report(&errors, &mut shutdown, BitstampError::ConnectionClosed).await;
                break;
            }
            Ok(Some(Err(
                tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed,
            ))) => {
                report(&errors, &mut shutdown, BitstampError::ConnectionClosed).await;
                break;
            }
            Ok(Some(Err(tungstenite::Error::Io(e)))) => {
                // the socket itself failed, no further frame can arrive
                report(
                    &errors,
                    &mut shutdown,
                    BitstampError::NetworkError(format!("WebSocket error: {}", e)),
                )
                .await;
                report(&errors, &mut shutdown, BitstampError::ConnectionClosed).await;
                break;
            }
            Ok(Some(Err(e))) => BitstampError::NetworkError(format!("WebSocket error: {}", e)),
            Ok(Some(Ok(Message::Ping(payload)))) => {
                let mut writer = writer.lock().await;
                if let Err(e) = writer.send(Message::Pong(payload)).await {
                    warn!("Failed to send pong response: {}", e);
                }
                continue;
            }
            Ok(Some(Ok(Message::Pong(_) | Message::Frame(_)))) => continue,
            Ok(Some(Ok(Message::Close(frame)))) => {
                debug!(?frame, "server closed the websocket");
                report(&errors, &mut shutdown, BitstampError::ConnectionClosed).await;
                break;
            }
            Ok(Some(Ok(data))) => match codec.decode_message(data) {
                Ok(Some(message)) => {
                    let delivered = tokio::select! {
                        _ = shutdown.changed() => break,
                        sent = events.send(message) => sent.is_ok(),
                    };
                    if !delivered {
                        debug!("event receiver dropped, stopping read task");
                        break;
                    }
                    continue;
                }
                Ok(None) => continue,
                Err(e) => e,
            },
        };

        report(&errors, &mut shutdown, error).await;
    }

    state.store(SessionState::Closed as u8, Ordering::SeqCst);
}

async fn report(
    errors: &mpsc::Sender<BitstampError>,
    shutdown: &mut watch::Receiver<bool>,
    error: BitstampError,
) {
    if *shutdown.borrow() {
        return;
    }
    tokio::select! {
        _ = shutdown.changed() => {}
        sent = errors.send(error) => {
            if let Err(e) = sent {
                warn!("websocket error dropped, no receiver: {}", e.0);
            }
        }
    }
}
