use std::fmt;

use reqwest::header::{ACCEPT, HeaderValue, USER_AGENT};
use reqwest::{Method, Request, Url};

use super::error::FetchError;

/// A read-only provider call: host, path and query parameters.
///
/// Credentials are not part of it; they are added by the auth wrapper of the
/// client that sends it, so a `ProviderRequest` is always safe to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub host: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ProviderRequest {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn url(&self) -> Result<Url, FetchError> {
        Url::parse_with_params(&format!("https://{}{}", self.host, self.path), &self.query)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    /// Builds a fresh GET request. Called once per attempt.
    pub fn build(&self) -> Result<Request, FetchError> {
        let mut req = Request::new(Method::GET, self.url()?);
        let headers = req.headers_mut();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("outing_carbon/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(req)
    }
}

impl fmt::Display for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.url() {
            Ok(url) => write!(f, "{url}"),
            Err(_) => write!(f, "https://{}{}", self.host, self.path),
        }
    }
}
