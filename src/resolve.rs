//! Typed decoding of query responses.
//!
//! The raw response text is parsed once into [`frames::Envelope`]; the first
//! statement's items are then decoded into the caller's type. A response
//! whose shape does not match the envelope contributes no items.
//!
//! Decoding is all-or-nothing: one bad item discards the whole result.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Decode every payload item as `T`.
///
/// Returns `Some(vec![])` for an empty or mismatched envelope and `None` if
/// any item fails to decode.
#[must_use]
pub fn resolve_all<T: DeserializeOwned>(raw: &str) -> Option<Vec<T>> {
    payload_items(raw)
        .into_iter()
        .map(decode_item)
        .collect::<Option<Vec<T>>>()
}

/// Decode only the first payload item as `T`.
#[must_use]
pub fn resolve_first<T: DeserializeOwned>(raw: &str) -> Option<T> {
    payload_items(raw).into_iter().next().and_then(decode_item)
}

fn payload_items(raw: &str) -> Vec<Value> {
    let Some(envelope) = frames::Envelope::parse(raw) else {
        debug!("resolve: response does not match envelope shape");
        return Vec::new();
    };
    if let Some(error) = envelope.rpc_error() {
        warn!(code = error.code, message = %error.message, "resolve: server returned error");
    } else if let Some(error) = &envelope.error {
        warn!(error = %error, "resolve: server returned error");
    }
    envelope.into_items()
}

fn decode_item<T: DeserializeOwned>(item: Value) -> Option<T> {
    match serde_json::from_value(item) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "resolve: item does not match target type");
            None
        }
    }
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
