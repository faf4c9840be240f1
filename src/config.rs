//! Command-line and environment configuration.

use std::time::Duration;

use clap::Parser;

use crate::conn::DbError;

pub const DEFAULT_URL: &str = "ws://localhost:8000/rpc";
pub const DEFAULT_NAMESPACE: &str = "test";
pub const DEFAULT_DATABASE: &str = "test";
pub const DEFAULT_QUERY: &str = "select * from person:99t3gb863y5t2s82l28w, person:99o1ox467x1o3k84c06p";

#[derive(Parser, Debug)]
#[command(name = "dbconn", about = "Run queries against a database RPC websocket endpoint")]
pub struct Cli {
    #[arg(long, env = "DBCONN_URL", default_value = DEFAULT_URL)]
    pub url: String,

    #[arg(long, env = "DBCONN_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    #[arg(long, env = "DBCONN_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    #[arg(long, env = "DBCONN_TIMEOUT_SECS", help = "Give up on a response after this many seconds")]
    pub timeout_secs: Option<u64>,

    #[arg(long, default_value_t = false, help = "Decode every result item instead of only the first")]
    pub all: bool,

    #[arg(value_name = "QUERY", default_value = DEFAULT_QUERY)]
    pub queries: Vec<String>,
}

/// Settings consumed by [`crate::conn::DbConn::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// `None` waits for a response indefinitely.
    pub request_timeout: Option<Duration>,
}

impl ConnConfig {
    /// Config for `url` with the default namespace/database and no timeout.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: DEFAULT_NAMESPACE.to_owned(),
            database: DEFAULT_DATABASE.to_owned(),
            request_timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

impl Cli {
    /// Validate the CLI settings into a connection config.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidUrl`] unless the URL is `ws://` or `wss://`.
    pub fn conn_config(&self) -> Result<ConnConfig, DbError> {
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(DbError::InvalidUrl(self.url.clone()));
        }
        Ok(ConnConfig {
            url: self.url.clone(),
            namespace: self.namespace.clone(),
            database: self.database.clone(),
            request_timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
