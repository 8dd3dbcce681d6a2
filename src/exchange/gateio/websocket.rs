use crate::data::{Bar, CandleStore, LiveQuote, QuoteCache, SeriesKey, UpsertOutcome};
use crate::exchange::error::FeedError;
use crate::exchange::gateio::rest::GateioRestClient;
use crate::exchange::gateio::types::{
    InboundFrame, OutboundFrame, TickerUpdate, WireCandle, CHANNEL_CANDLESTICKS, CHANNEL_TICKERS,
    EVENT_SUBSCRIBE, EVENT_UNSUBSCRIBE,
};
use crate::utils::Metrics;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;

/// Upper bound on the TCP, TLS and websocket handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection lifecycle of the feed client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribed,
}

/// Subscription changes requested while connected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCommand {
    SubscribeCandles { instrument: String, interval: String },
    UnsubscribeCandles { instrument: String, interval: String },
}

impl FeedCommand {
    fn to_frame(&self, time: i64) -> OutboundFrame {
        match self {
            FeedCommand::SubscribeCandles { instrument, interval } => {
                OutboundFrame::candlesticks(time, EVENT_SUBSCRIBE, interval, instrument)
            }
            FeedCommand::UnsubscribeCandles { instrument, interval } => {
                OutboundFrame::candlesticks(time, EVENT_UNSUBSCRIBE, interval, instrument)
            }
        }
    }
}

/// How a connection session ended without an error
enum SessionEnd {
    Closed,
    Shutdown,
}

/// State shared between the connection task and its handles
struct FeedShared {
    store: Arc<CandleStore>,
    quotes: Arc<QuoteCache>,
    /// instrument -> currently subscribed candle interval
    active: DashMap<String, String>,
    /// Tracking order, used for subscriptions and history loads
    instruments: Vec<String>,
    state: watch::Sender<ConnectionState>,
    metrics: Arc<Metrics>,
}

impl FeedShared {
    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn active_interval(&self, instrument: &str) -> Option<String> {
        self.active.get(instrument).map(|i| i.clone())
    }

    fn subscription_frames(&self, time: i64) -> Vec<OutboundFrame> {
        let mut frames = Vec::with_capacity(self.instruments.len() * 2);
        for instrument in &self.instruments {
            frames.push(OutboundFrame::ticker(time, EVENT_SUBSCRIBE, instrument));
            if let Some(interval) = self.active_interval(instrument) {
                frames.push(OutboundFrame::candlesticks(time, EVENT_SUBSCRIBE, &interval, instrument));
            }
        }
        frames
    }

    /// Route one inbound text frame into the quote cache or candle store.
    ///
    /// Returns the number of items applied.
    fn apply_frame(&self, text: &str) -> Result<usize, FeedError> {
        let frame: InboundFrame = serde_json::from_str(text)?;
        if !frame.is_update() {
            debug!("Ignoring {} frame on {}", frame.event, frame.channel);
            return Ok(0);
        }

        match frame.channel.as_str() {
            CHANNEL_TICKERS => {
                let tickers: Vec<TickerUpdate> = frame.results()?;
                let mut applied = 0;
                for ticker in &tickers {
                    if self.quotes.update(&ticker.contract, &ticker.last, &ticker.change_percentage) {
                        debug!("{} Futures Price: {} USDT ({}%)", ticker.contract, ticker.last, ticker.change_percentage);
                        applied += 1;
                    }
                }
                Ok(applied)
            }
            CHANNEL_CANDLESTICKS => {
                let candles: Vec<WireCandle> = frame.results()?;
                // Validate the whole frame before touching the store.
                let routed = candles
                    .iter()
                    .map(|candle| {
                        candle
                            .interval_and_instrument()
                            .map(|(interval, instrument)| (interval, instrument, candle.to_bar()))
                            .ok_or_else(|| FeedError::Shape(format!("bad candle name {:?}", candle.n)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let mut applied = 0;
                for (interval, instrument, bar) in routed {
                    if self.apply_candle(interval, instrument, bar) {
                        applied += 1;
                    }
                }
                Ok(applied)
            }
            other => {
                debug!("Ignoring update on channel {}", other);
                Ok(0)
            }
        }
    }

    /// Upsert a streamed candle if it belongs to the instrument's active
    /// interval. The interval entry stays locked for the duration of the
    /// upsert, so an interval switch cannot interleave with it.
    fn apply_candle(&self, interval: &str, instrument: &str, bar: Bar) -> bool {
        let Some(active) = self.active.get(instrument) else {
            return false;
        };
        if active.as_str() != interval {
            debug!("Dropping {} candle for {}, active interval is {}", interval, instrument, *active);
            self.metrics.candles_stale.inc();
            return false;
        }

        let key = SeriesKey::new(instrument, interval);
        match self.store.upsert(&key, bar) {
            UpsertOutcome::Stale => {
                self.metrics.candles_stale.inc();
                false
            }
            _ => {
                self.metrics.candles_applied.inc();
                debug!("{} Candle updated: {} O:{} H:{} L:{} C:{}", key, bar.time, bar.open, bar.high, bar.low, bar.close);
                true
            }
        }
    }
}

/// Connection parameters of the feed client
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub ws_url: String,
    /// Interval every instrument is subscribed at on startup
    pub default_interval: String,
    pub ping_interval: Duration,
    pub reconnect_delay: Duration,
}

/// Persistent Gate.io futures websocket connection with auto-reconnect
///
/// Created together with a [`FeedHandle`]; `run` owns the connection for the
/// life of the process and returns once shutdown is signalled.
pub struct FeedClient {
    ws_url: String,
    ping_interval: Duration,
    reconnect_delay: Duration,
    shared: Arc<FeedShared>,
    cmd_rx: mpsc::UnboundedReceiver<FeedCommand>,
}

/// Cloneable control surface for a running [`FeedClient`]
#[derive(Clone)]
pub struct FeedHandle {
    shared: Arc<FeedShared>,
    rest: GateioRestClient,
    cmd_tx: mpsc::UnboundedSender<FeedCommand>,
}

impl FeedClient {
    /// Create the client and its handle.
    ///
    /// Every instrument starts on `settings.default_interval`.
    pub fn new(
        settings: FeedSettings,
        instruments: Vec<String>,
        store: Arc<CandleStore>,
        quotes: Arc<QuoteCache>,
        rest: GateioRestClient,
        metrics: Arc<Metrics>,
    ) -> (Self, FeedHandle) {
        let active = DashMap::new();
        for instrument in &instruments {
            quotes.track(instrument);
            active.insert(instrument.clone(), settings.default_interval.clone());
        }

        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let shared = Arc::new(FeedShared {
            store,
            quotes,
            active,
            instruments,
            state,
            metrics,
        });
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let client = Self {
            ws_url: settings.ws_url,
            ping_interval: settings.ping_interval,
            reconnect_delay: settings.reconnect_delay,
            shared: Arc::clone(&shared),
            cmd_rx,
        };
        let handle = FeedHandle { shared, rest, cmd_tx };
        (client, handle)
    }

    /// Connect, subscribe and process frames until shutdown.
    ///
    /// Connection loss stops the heartbeat, waits the reconnect delay and
    /// tries again, indefinitely. Shutdown interrupts both the session and
    /// the backoff sleep.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        if let Err(e) = Url::parse(&self.ws_url) {
            error!("Invalid websocket url {}: {}", self.ws_url, e);
            return;
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.shared.set_state(ConnectionState::Connecting);
            info!("Connecting to Gate.io WebSocket: {}", self.ws_url);

            match self.connect_and_process(&mut shutdown).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Closed) => {
                    warn!("WebSocket closed. Reconnecting in {:?}", self.reconnect_delay);
                }
                Err(e) => {
                    error!("WebSocket error: {}. Reconnecting in {:?}", e, self.reconnect_delay);
                }
            }

            self.shared.set_state(ConnectionState::Disconnected);
            self.shared.metrics.reconnects.inc();

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = shutdown.changed() => {
                    break;
                }
            }
        }

        self.shared.set_state(ConnectionState::Disconnected);
        info!("Feed client stopped");
    }

    async fn connect_and_process(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<SessionEnd, FeedError> {
        let connect = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(self.ws_url.as_str()));
        let (ws_stream, _) = tokio::select! {
            _ = shutdown.changed() => return Ok(SessionEnd::Shutdown),
            result = connect => match result {
                Ok(connected) => connected.map_err(FeedError::Connect)?,
                Err(_) => return Err(FeedError::ConnectTimeout(CONNECT_TIMEOUT)),
            },
        };
        info!("Gate.io WebSocket connected");

        let (mut write, mut read) = ws_stream.split();

        // Single writer task; subscriptions, commands and heartbeats all go
        // through `out_tx`.
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = write.send(Message::Text(text)).await {
                    warn!("WebSocket send failed: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        // Commands queued while disconnected are already reflected in the
        // active intervals used for the fresh subscription below.
        while self.cmd_rx.try_recv().is_ok() {}

        let now = unix_now();
        for frame in self.shared.subscription_frames(now) {
            info!("Subscribing {} {:?}", frame.channel, frame.payload);
            let _ = out_tx.send(frame.to_json());
        }
        self.shared.set_state(ConnectionState::Subscribed);

        let heartbeat = spawn_heartbeat(out_tx.clone(), self.ping_interval);

        let shared = Arc::clone(&self.shared);
        let cmd_rx = &mut self.cmd_rx;
        let outcome = loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    break Ok(SessionEnd::Shutdown);
                }
                Some(cmd) = cmd_rx.recv() => {
                    info!("Sending {:?}", cmd);
                    let _ = out_tx.send(cmd.to_frame(unix_now()).to_json());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => handle_text(&shared, &text),
                        Some(Ok(Message::Ping(_))) => debug!("Received ping"),
                        Some(Ok(Message::Pong(_))) => debug!("Received pong"),
                        Some(Ok(Message::Close(frame))) => {
                            info!("Received close frame: {:?}", frame);
                            break Ok(SessionEnd::Closed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => break Err(FeedError::Stream(e)),
                        None => break Ok(SessionEnd::Closed),
                    }
                }
            }
        };

        heartbeat.abort();
        drop(out_tx);
        writer.abort();

        outcome
    }
}

fn handle_text(shared: &FeedShared, text: &str) {
    shared.metrics.frames_received.inc();
    if let Err(e) = shared.apply_frame(text) {
        shared.metrics.frames_dropped.inc();
        warn!("Error processing message: {}", e);
        debug!("Dropped frame: {}", text);
    }
}

/// Send a keep-alive frame every `period` until aborted or the writer is gone.
fn spawn_heartbeat(out_tx: mpsc::UnboundedSender<String>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            if out_tx.send(OutboundFrame::ping(unix_now()).to_json()).is_err() {
                break;
            }
        }
    })
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl FeedHandle {
    pub fn instruments(&self) -> &[String] {
        &self.shared.instruments
    }

    pub fn active_interval(&self, instrument: &str) -> Option<String> {
        self.shared.active_interval(instrument)
    }

    /// Series key of the instrument's active interval.
    pub fn active_key(&self, instrument: &str) -> Option<SeriesKey> {
        self.active_interval(instrument)
            .map(|interval| SeriesKey::new(instrument, interval))
    }

    /// Quote snapshot; tracked instruments without a ticker yet get defaults.
    pub fn quote(&self, instrument: &str) -> Option<LiveQuote> {
        self.shared.quotes.get(instrument)
    }

    pub fn price(&self, instrument: &str) -> String {
        self.shared.quotes.price(instrument)
    }

    /// Snapshot of the active-interval series.
    pub fn candles(&self, instrument: &str) -> Vec<Bar> {
        self.active_key(instrument)
            .map(|key| self.shared.store.read(&key))
            .unwrap_or_default()
    }

    pub fn latest_candle(&self, instrument: &str) -> Option<Bar> {
        self.active_key(instrument)
            .and_then(|key| self.shared.store.latest(&key))
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Load REST history for the active interval of every instrument.
    pub async fn load_all_history(&self) {
        for instrument in &self.shared.instruments {
            if let Some(interval) = self.active_interval(instrument) {
                self.load_history(instrument, &interval).await;
            }
        }
    }

    /// Replace the stored series with freshly fetched history.
    ///
    /// On failure the existing series is left untouched. Returns the number
    /// of bars stored.
    pub async fn load_history(&self, instrument: &str, interval: &str) -> Option<usize> {
        match self.rest.fetch_candles(instrument, interval).await {
            Ok(bars) => {
                let key = SeriesKey::new(instrument, interval);
                let len = self.shared.store.bulk_replace(&key, bars);
                info!("Loaded {} candles for {} (interval={})", len, instrument, interval);
                Some(len)
            }
            Err(e) => {
                error!("Failed to load initial candles for {} (interval={}): {}", instrument, interval, e);
                None
            }
        }
    }

    /// Switch the candle subscription of `instrument` to `new_interval`.
    ///
    /// An unchanged interval only reloads history. Otherwise the old channel
    /// is unsubscribed, the active interval swapped, history reloaded and
    /// the new channel subscribed, in that order. Returns false for an
    /// untracked instrument.
    pub async fn change_interval(&self, instrument: &str, new_interval: &str) -> bool {
        let old_interval = {
            let Some(mut active) = self.shared.active.get_mut(instrument) else {
                warn!("Interval change requested for untracked instrument {}", instrument);
                return false;
            };
            if active.as_str() == new_interval {
                None
            } else {
                Some(std::mem::replace(&mut *active, new_interval.to_string()))
            }
        };

        match old_interval {
            None => {
                self.load_history(instrument, new_interval).await;
            }
            Some(old) => {
                info!("Switching {} candles from {} to {}", instrument, old, new_interval);
                self.send(FeedCommand::UnsubscribeCandles {
                    instrument: instrument.to_string(),
                    interval: old,
                });
                self.load_history(instrument, new_interval).await;
                self.send(FeedCommand::SubscribeCandles {
                    instrument: instrument.to_string(),
                    interval: new_interval.to_string(),
                });
            }
        }
        true
    }

    fn send(&self, cmd: FeedCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            warn!("Feed client is not running; subscription change applies on next start");
        }
    }
}
