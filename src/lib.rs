//! Minimal client for a database RPC endpoint spoken over one WebSocket.
//!
//! Queries are correlated to their responses by integer id, so responses may
//! arrive in any order. Each response carries a two-level envelope whose
//! first statement's items are decoded into the caller's type.

pub mod config;
pub mod conn;
pub mod ledger;
pub mod resolve;

pub use config::{Cli, ConnConfig};
pub use conn::{DbConn, DbError, Dispatch, PendingQuery};
