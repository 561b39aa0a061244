//! Predefined task lists fetched over HTTP.
//!
//! Sources are fetched concurrently and each outcome is kept separate: one
//! unreachable or malformed source never hides the lists that did arrive.

use std::time::Duration;

use futures::future::join_all;

use crate::model::config::{ListSource, RemoteConfig};
use crate::model::task::Task;
use crate::parse::{CodecError, parse_snapshot};

/// Error type for remote list fetches
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("could not start HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not fetch {url}: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("{url} is not a valid task list: {source}")]
    Document { url: String, source: CodecError },
}

/// A successfully fetched and validated list
#[derive(Debug, Clone)]
pub struct RemoteList {
    pub source: ListSource,
    /// The document's own name if it has one, else the configured name
    pub name: String,
    pub tasks: Vec<Task>,
}

/// The result of fetching one source
#[derive(Debug)]
pub struct FetchOutcome {
    pub source: ListSource,
    pub result: Result<RemoteList, FetchError>,
}

pub fn build_client(config: &RemoteConfig) -> Result<reqwest::Client, FetchError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("checklist/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Fetch one source and validate it through the snapshot parser.
pub async fn fetch_list(
    client: &reqwest::Client,
    source: &ListSource,
) -> Result<RemoteList, FetchError> {
    let url = source.url.clone();
    let response = client
        .get(&source.url)
        .send()
        .await
        .map_err(|e| FetchError::Request {
            url: url.clone(),
            source: e,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status { url, status });
    }

    let body = response.text().await.map_err(|e| FetchError::Request {
        url: url.clone(),
        source: e,
    })?;
    let doc = parse_snapshot(&body).map_err(|e| FetchError::Document { url, source: e })?;

    Ok(RemoteList {
        source: source.clone(),
        name: doc.name.unwrap_or_else(|| source.name.clone()),
        tasks: doc.tasks,
    })
}

/// Fetch every source concurrently. The result has one outcome per source,
/// in the same order.
pub async fn fetch_all(client: &reqwest::Client, sources: &[ListSource]) -> Vec<FetchOutcome> {
    let futures = sources.iter().map(|source| async move {
        let result = fetch_list(client, source).await;
        match &result {
            Ok(list) => {
                tracing::debug!(source = %source.name, tasks = list.tasks.len(), "fetched task list")
            }
            Err(err) => tracing::warn!(source = %source.name, error = %err, "task list fetch failed"),
        }
        FetchOutcome {
            source: source.clone(),
            result,
        }
    });
    join_all(futures).await
}

fn runtime() -> Result<tokio::runtime::Runtime, FetchError> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Blocking wrapper around [`fetch_all`] on a single-threaded runtime
pub fn fetch_all_blocking(
    config: &RemoteConfig,
    sources: &[ListSource],
) -> Result<Vec<FetchOutcome>, FetchError> {
    let client = build_client(config)?;
    Ok(runtime()?.block_on(fetch_all(&client, sources)))
}

/// Blocking wrapper around [`fetch_list`]
pub fn fetch_list_blocking(
    config: &RemoteConfig,
    source: &ListSource,
) -> Result<RemoteList, FetchError> {
    let client = build_client(config)?;
    runtime()?.block_on(fetch_list(&client, source))
}
