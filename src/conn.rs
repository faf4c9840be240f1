//! Connection manager — one WebSocket to the database RPC endpoint.
//!
//! DESIGN
//! ======
//! `connect` opens the socket, sends the `use` handshake as request 0, then
//! splits the stream between two tasks:
//! - Writer: drains an mpsc channel of outbound messages into the sink.
//! - Reader: peeks the `id` of each inbound text frame and fulfills the
//!   matching ledger entry.
//!
//! The handle is returned only after the socket is usable, so no caller ever
//! waits on a half-initialised connection.
//!
//! LIFECYCLE
//! =========
//! 1. Connect → handshake (id 0, response ignored)
//! 2. `issue_query` registers an id in the ledger, then sends the frame
//! 3. Reader delivers the response text; caller resolves it into typed values
//! 4. Socket close/error or `close()` → every pending request fails

use std::sync::Arc;
use std::time::Duration;

use frames::RequestFrame;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::config::ConnConfig;
use crate::ledger::{Ledger, Slot};
use crate::resolve;

const OUTBOUND_CAPACITY: usize = 32;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("invalid websocket URL: {0}")]
    InvalidUrl(String),
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("frame encode failed: {0}")]
    Encode(#[from] frames::FrameError),
    #[error("connection closed")]
    Closed,
    #[error("connection dropped before response to request {id}")]
    Disconnected { id: u64 },
    #[error("timed out waiting for response to request {id}")]
    Timeout { id: u64 },
}

// =============================================================================
// DISPATCH
// =============================================================================

/// What the reader did with one inbound text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No readable `id`; logged and dropped.
    Malformed,
    /// Handshake acknowledgement; dropped.
    Handshake,
    /// Handed to the pending request with this id.
    Delivered(u64),
    /// No pending request with this id; dropped.
    Unmatched(u64),
}

/// Route one inbound frame to its pending request.
pub fn on_frame(ledger: &Ledger, raw: &str) -> Dispatch {
    let id = match frames::peek_id(raw) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "conn: could not decode frame id");
            return Dispatch::Malformed;
        }
    };

    if id == frames::HANDSHAKE_ID {
        debug!("conn: handshake acknowledged");
        return Dispatch::Handshake;
    }

    if ledger.fulfill(id, raw.to_owned()) {
        debug!(id, "conn: response delivered");
        Dispatch::Delivered(id)
    } else {
        debug!(id, "conn: dropping unmatched frame");
        Dispatch::Unmatched(id)
    }
}

// =============================================================================
// CONNECTION
// =============================================================================

pub struct DbConn {
    ledger: Arc<Ledger>,
    outbound: mpsc::Sender<Message>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
    request_timeout: Option<Duration>,
}

impl DbConn {
    /// Open the socket, send the namespace/database handshake and start the
    /// reader and writer tasks.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connect`] if the websocket handshake or the first
    /// send fails.
    pub async fn connect(config: &ConnConfig) -> Result<Self, DbError> {
        let (stream, _) = connect_async(config.url.as_str())
            .await
            .map_err(|e| DbError::Connect(Box::new(e)))?;
        let (mut sink, source) = stream.split();

        let handshake = frames::encode_request(&RequestFrame::handshake(&config.namespace, &config.database))?;
        sink.send(Message::Text(handshake.into()))
            .await
            .map_err(|e| DbError::Connect(Box::new(e)))?;

        let ledger = Arc::new(Ledger::new());
        let (outbound, outbound_rx) = mpsc::channel::<Message>(OUTBOUND_CAPACITY);
        let writer = tokio::spawn(run_writer(sink, outbound_rx, Arc::clone(&ledger)));
        let reader = tokio::spawn(run_reader(source, Arc::clone(&ledger)));

        info!(url = %config.url, namespace = %config.namespace, database = %config.database, "conn: connected");

        Ok(Self { ledger, outbound, writer, reader, request_timeout: config.request_timeout })
    }

    /// Send a query and return the handle for its eventual response.
    ///
    /// The ledger entry is recorded before the frame leaves, so a fast
    /// response can never miss it.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Closed`] if the writer is gone.
    pub async fn issue_query(&self, text: &str) -> Result<PendingQuery, DbError> {
        let (id, slot) = self.ledger.register();
        let pending = PendingQuery { id, slot, ledger: Arc::clone(&self.ledger), timeout: self.request_timeout };

        let raw = frames::encode_request(&RequestFrame::query(id, text))?;
        self.outbound
            .send(Message::Text(raw.into()))
            .await
            .map_err(|_| DbError::Closed)?;

        debug!(id, "conn: query sent");
        Ok(pending)
    }

    /// Run a query and decode every result item as `T`.
    ///
    /// `Ok(None)` means at least one item did not decode.
    ///
    /// # Errors
    ///
    /// Returns transport errors from [`Self::issue_query`] and
    /// [`PendingQuery::raw`].
    pub async fn query<T: DeserializeOwned>(&self, text: &str) -> Result<Option<Vec<T>>, DbError> {
        self.issue_query(text).await?.all().await
    }

    /// Run a query and decode only its first result item as `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::query`].
    pub async fn query_first<T: DeserializeOwned>(&self, text: &str) -> Result<Option<T>, DbError> {
        self.issue_query(text).await?.first().await
    }

    /// Close the socket. Callers still waiting get [`DbError::Disconnected`].
    pub async fn close(self) {
        let released = self.ledger.close();
        if self.outbound.send(Message::Close(None)).await.is_err() {
            debug!("conn: writer already gone, close frame not sent");
        }
        drop(self.outbound);
        if let Err(e) = self.writer.await {
            warn!(error = %e, "conn: writer task failed");
        }
        self.reader.abort();
        info!(released, "conn: closed");
    }
}

// =============================================================================
// PENDING QUERY
// =============================================================================

/// An issued query whose response has not been consumed yet.
///
/// Dropping it evicts its ledger entry.
pub struct PendingQuery {
    id: u64,
    slot: Slot,
    ledger: Arc<Ledger>,
    timeout: Option<Duration>,
}

impl PendingQuery {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the raw response text.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Disconnected`] if the connection went away first and
    /// [`DbError::Timeout`] if the configured request timeout elapsed.
    pub async fn raw(mut self) -> Result<String, DbError> {
        let id = self.id;
        let received = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut self.slot).await {
                Ok(received) => received,
                Err(_) => {
                    warn!(id, timeout = ?limit, "conn: request timed out");
                    return Err(DbError::Timeout { id });
                }
            },
            None => (&mut self.slot).await,
        };
        received.map_err(|_| DbError::Disconnected { id })
    }

    /// Wait for the response and decode every item as `T`.
    ///
    /// # Errors
    ///
    /// See [`Self::raw`].
    pub async fn all<T: DeserializeOwned>(self) -> Result<Option<Vec<T>>, DbError> {
        let raw = self.raw().await?;
        Ok(resolve::resolve_all(&raw))
    }

    /// Wait for the response and decode the first item as `T`.
    ///
    /// # Errors
    ///
    /// See [`Self::raw`].
    pub async fn first<T: DeserializeOwned>(self) -> Result<Option<T>, DbError> {
        let raw = self.raw().await?;
        Ok(resolve::resolve_first(&raw))
    }
}

impl Drop for PendingQuery {
    fn drop(&mut self) {
        self.ledger.evict(self.id);
    }
}

// =============================================================================
// SOCKET TASKS
// =============================================================================

async fn run_writer(mut sink: SplitSink<WsStream, Message>, mut outbound: mpsc::Receiver<Message>, ledger: Arc<Ledger>) {
    while let Some(msg) = outbound.recv().await {
        let is_close = matches!(msg, Message::Close(_));
        if let Err(e) = sink.send(msg).await {
            warn!(error = %e, "conn: send failed");
            ledger.close();
            return;
        }
        if is_close {
            return;
        }
    }
    let _ = sink.close().await;
}

async fn run_reader(mut source: SplitStream<WsStream>, ledger: Arc<Ledger>) {
    while let Some(msg) = source.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                on_frame(&ledger, text.as_str());
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "conn: receive failed");
                break;
            }
        }
    }

    let released = ledger.close();
    if released > 0 {
        warn!(released, "conn: socket closed with requests pending");
    } else {
        debug!("conn: socket closed");
    }
}

#[cfg(test)]
#[path = "conn_test.rs"]
mod tests;
