//! HTTP transport against the scene search endpoint.
//!
//! One function per page fetch; transient failures (network errors and
//! 5xx responses) are retried with backoff, while a 4xx means the filter
//! set itself was rejected and is surfaced immediately so a malformed
//! query is never masked by retries.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::SatSearchError;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_SECONDS: u64 = 2;

/// Pagination header of a search response.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub limit: u64,
}

/// One page of raw scene records.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    pub meta: PageMeta,
    #[serde(default)]
    pub results: Vec<Value>,
}

enum FetchFailure {
    Rejected { status: u16, message: String },
    Server { status: u16 },
    Transport(reqwest::Error),
    Decode(String),
}

impl FetchFailure {
    fn is_transient(&self) -> bool {
        matches!(self, FetchFailure::Server { .. } | FetchFailure::Transport(_))
    }

    fn into_error(self, attempts: u32) -> SatSearchError {
        match self {
            FetchFailure::Rejected { status, message } => {
                SatSearchError::RejectedQuery { status, message }
            }
            FetchFailure::Server { status } => SatSearchError::ServerError { status, attempts },
            FetchFailure::Transport(err) => SatSearchError::Transport(err),
            FetchFailure::Decode(msg) => SatSearchError::UnexpectedResponse(msg),
        }
    }

    fn describe(&self) -> String {
        match self {
            FetchFailure::Rejected { status, message } => {
                format!("rejected (HTTP {status}): {message}")
            }
            FetchFailure::Server { status } => format!("server error (HTTP {status})"),
            FetchFailure::Transport(err) => err.to_string(),
            FetchFailure::Decode(msg) => msg.clone(),
        }
    }
}

pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, SatSearchError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch one result page for the given filter set.
///
/// `page` is 1-based; `limit` is the requested page size.
pub async fn fetch_page(
    client: &reqwest::Client,
    api_url: &str,
    params: &BTreeMap<String, String>,
    page: u64,
    limit: usize,
) -> Result<SearchPage, SatSearchError> {
    let mut last_failure: Option<FetchFailure> = None;

    for attempt in 1..=MAX_RETRIES {
        if attempt > 1 {
            let delay = Duration::from_secs(RETRY_DELAY_SECONDS * u64::from(attempt));
            tracing::debug!(
                "Retrying page {} after {:?} (attempt {}/{})",
                page,
                delay,
                attempt,
                MAX_RETRIES
            );
            tokio::time::sleep(delay).await;
        }

        match fetch_attempt(client, api_url, params, page, limit).await {
            Ok(body) => return Ok(body),
            Err(failure) if failure.is_transient() && attempt < MAX_RETRIES => {
                tracing::warn!(
                    "Attempt {}/{} for page {} failed: {}",
                    attempt,
                    MAX_RETRIES,
                    page,
                    failure.describe()
                );
                last_failure = Some(failure);
            }
            Err(failure) => {
                tracing::error!("Page {} request failed: {}", page, failure.describe());
                return Err(failure.into_error(attempt));
            }
        }
    }

    // Loop always ends by returning or storing a failure
    match last_failure {
        Some(failure) => Err(failure.into_error(MAX_RETRIES)),
        None => Err(SatSearchError::UnexpectedResponse(
            "page fetch ended without a response".to_string(),
        )),
    }
}

async fn fetch_attempt(
    client: &reqwest::Client,
    api_url: &str,
    params: &BTreeMap<String, String>,
    page: u64,
    limit: usize,
) -> Result<SearchPage, FetchFailure> {
    let mut query: Vec<(&str, String)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();
    query.push(("page", page.to_string()));
    // A caller-supplied limit filter takes precedence over the
    // configured page size (and may be rejected by the endpoint).
    if !params.contains_key("limit") {
        query.push(("limit", limit.to_string()));
    }

    let response = client
        .get(api_url)
        .query(&query)
        .send()
        .await
        .map_err(FetchFailure::Transport)?;

    let status = response.status();
    if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchFailure::Rejected {
            status: status.as_u16(),
            message: rejection_message(&body),
        });
    }
    if !status.is_success() {
        return Err(FetchFailure::Server {
            status: status.as_u16(),
        });
    }

    response
        .json::<SearchPage>()
        .await
        .map_err(|e| FetchFailure::Decode(format!("failed to parse search response: {e}")))
}

/// Pull a human-readable message out of a 4xx body, which may be a JSON
/// error document or plain text.
fn rejection_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error message in response".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
