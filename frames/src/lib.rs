//! Shared frame model for the database RPC WebSocket transport.
//!
//! This crate owns the wire representation used by the connection manager:
//! outbound request frames, the cheap `id` peek done on every inbound frame,
//! and the typed two-level response envelope. Frames travel as JSON text.
//!
//! Item payloads stay as `serde_json::Value` here; decoding into caller
//! types happens once the matching request has been resolved.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier reserved for the namespace/database handshake frame.
pub const HANDSHAKE_ID: u64 = 0;

/// RPC method used to run a query.
pub const METHOD_QUERY: &str = "query";

/// RPC method used to select a namespace and database.
pub const METHOD_USE: &str = "use";

/// Error returned by frame encoding and peeking.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The text is not JSON, or lacks a numeric top-level `id`.
    #[error("invalid json frame: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// A request frame sent to the RPC endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    /// Correlation identifier echoed back by the server.
    pub id: u64,
    /// RPC method name, e.g. `"query"`.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl RequestFrame {
    /// Build a `query` request carrying one query string.
    #[must_use]
    pub fn query(id: u64, text: &str) -> Self {
        Self { id, method: METHOD_QUERY.to_owned(), params: vec![Value::String(text.to_owned())] }
    }

    /// Build the `use` handshake. Always carries [`HANDSHAKE_ID`].
    #[must_use]
    pub fn handshake(namespace: &str, database: &str) -> Self {
        Self {
            id: HANDSHAKE_ID,
            method: METHOD_USE.to_owned(),
            params: vec![Value::String(namespace.to_owned()), Value::String(database.to_owned())],
        }
    }
}

/// Encode a request frame as JSON text.
///
/// # Errors
///
/// Returns [`FrameError::Json`] if serialization fails.
pub fn encode_request(frame: &RequestFrame) -> Result<String, FrameError> {
    Ok(serde_json::to_string(frame)?)
}

// =============================================================================
// INBOUND
// =============================================================================

#[derive(Deserialize)]
struct FrameId {
    id: u64,
}

/// Read only the top-level `id` of an inbound frame.
///
/// The rest of the frame is left untouched; it is handed verbatim to the
/// pending request that owns the id.
///
/// # Errors
///
/// Returns [`FrameError::Json`] when the text is not a JSON object with a
/// non-negative integer `id`.
pub fn peek_id(raw: &str) -> Result<u64, FrameError> {
    let frame: FrameId = serde_json::from_str(raw)?;
    Ok(frame.id)
}

/// Server-side failure reported in place of a result.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RpcError {
    /// JSON-RPC error code; 0 when the server omitted it.
    #[serde(default)]
    pub code: i64,
    /// Human-readable failure description.
    #[serde(default)]
    pub message: String,
}

/// One statement result inside the envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StatementResult {
    /// Items returned by the statement.
    pub result: Vec<Value>,
}

/// Response envelope: `{ "result": [ { "result": [ <item>, ... ] } ] }`.
///
/// Only the top level is typed here. Statements are kept untyped so that a
/// later statement of any shape cannot spoil the first one.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Envelope {
    /// Per-statement results; only element 0 is ever consulted.
    #[serde(default)]
    pub result: Option<Value>,
    /// Error reported in place of `result`, in whatever shape the server sent.
    #[serde(default)]
    pub error: Option<Value>,
}

impl Envelope {
    /// Parse raw response text. Anything but a JSON object yields `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// The server error, when one is present in the `{code, message}` shape.
    #[must_use]
    pub fn rpc_error(&self) -> Option<RpcError> {
        self.error
            .as_ref()
            .and_then(|error| RpcError::deserialize(error).ok())
    }

    /// Payload list of the first statement; later statements are ignored.
    ///
    /// Any deviation from the expected nesting yields no items.
    #[must_use]
    pub fn into_items(self) -> Vec<Value> {
        let Some(Value::Array(statements)) = self.result else {
            return Vec::new();
        };
        statements
            .into_iter()
            .next()
            .and_then(|first| serde_json::from_value::<StatementResult>(first).ok())
            .map(|statement| statement.result)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
