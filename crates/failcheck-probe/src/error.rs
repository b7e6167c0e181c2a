//! Content probe errors.

use thiserror::Error;

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Why a probe could not produce a match result.
///
/// A non-2xx response is not an error: its body is still matched.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("GET {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
