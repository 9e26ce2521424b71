use std::sync::Arc;
use thiserror::Error;

use crate::models::MovieId;

/// Failures surfaced by the catalogue client, the discovery aggregator and
/// the enrichment cache. Nothing in the core recovers from these locally.
///
/// The type is `Clone` so a single in-flight detail fetch can hand the same
/// outcome to every caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The request never produced a response (connect, TLS, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Arc<reqwest::Error>,
    },

    /// The service answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// The service has no detail record for this movie.
    #[error("movie {0} not found")]
    NotFound(MovieId),

    /// The payload could not be parsed or lacks a field normalization needs.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub(crate) fn transport(url: &str, err: reqwest::Error) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            source: Arc::new(err),
        }
    }

    pub(crate) fn missing(field: &str, id: MovieId) -> Self {
        FetchError::Malformed(format!("movie {id}: missing `{field}`"))
    }

    /// Transport or HTTP status failure, i.e. the remote call itself failed.
    pub fn is_remote(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Http { .. })
    }

    /// HTTP status carried by the error, if the service produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            FetchError::NotFound(_) => Some(404),
            FetchError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            FetchError::Malformed(_) => None,
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
