use clap::Parser;
use dbconn::{Cli, DbConn, DbError};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid JSON output: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Record shape decoded from the demo queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Person {
    name: String,
    id: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.conn_config()?;
    let conn = DbConn::connect(&config).await?;

    for query in &cli.queries {
        if cli.all {
            let people = conn.query::<Person>(query).await?;
            print_json(&people)?;
        } else {
            let person = conn.query_first::<Person>(query).await?;
            print_json(&person)?;
        }
    }

    conn.close().await;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", render_json(value)?);
    Ok(())
}

/// Pretty JSON for one query result; an absent result renders as `null`.
fn render_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
