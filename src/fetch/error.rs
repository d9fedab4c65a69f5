//! Errors raised while talking to a provider.

use thiserror::Error;

/// A failed provider call, or a failed attempt of one.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The environment variable holding the credential is not set.
    #[error("environment variable {var} is not set")]
    MissingCredential { var: String },

    /// The credential could not be encoded into the request.
    #[error("credential from {var} is not a valid header value")]
    InvalidCredential { var: String },

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// Connection, timeout or body read failure. The URL is stripped so that
    /// query-string credentials never end up in a message.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response body is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The body parsed but the expected value was not at `path`.
    #[error("no usable value at {path} in provider response")]
    UnexpectedBody { path: &'static str },

    #[error("request failed after {attempts} attempts")]
    RequestFailed {
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.without_url())
    }
}
