use thiserror::Error;

/// Errors raised while building or executing a remote search.
///
/// A query that matches nothing is not an error: `found()` returns 0 and
/// `scenes()` returns an empty collection. `SatSearchError` covers queries
/// the endpoint rejects, transport failures and responses this client
/// cannot interpret.
#[derive(Debug, Error)]
pub enum SatSearchError {
    /// The endpoint rejected the filter set (HTTP 4xx).
    #[error("query rejected by the API (HTTP {status}): {message}")]
    RejectedQuery { status: u16, message: String },

    /// Network or protocol failure while talking to the endpoint.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server kept answering 5xx until retries ran out.
    #[error("server error (HTTP {status}) after {attempts} attempts")]
    ServerError { status: u16, attempts: u32 },

    /// The response body did not match the search response schema.
    #[error("unexpected response from the API: {0}")]
    UnexpectedResponse(String),

    /// A scene record carried no usable identifier.
    #[error("scene record has no usable scene_id")]
    MissingSceneId,

    /// Inconsistent criteria, e.g. `date_from` after `date_to`.
    #[error("invalid search criteria: {0}")]
    InvalidCriteria(String),

    /// A snapshot file could not be read or written.
    #[error("snapshot I/O failed: {0}")]
    SnapshotIo(#[from] std::io::Error),

    /// A snapshot file did not contain a recognizable scene collection.
    #[error("snapshot format error: {0}")]
    SnapshotFormat(String),
}
