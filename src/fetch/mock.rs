//! In-memory [`HttpClient`] for tests.
//!
//! Replies are registered per host, either one-shot (consumed in order) or
//! as a standing reply used once the one-shot queue is empty. Every request
//! that reaches the mock is recorded, after authentication was applied.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use super::client::HttpClient;
use super::error::FetchError;

#[derive(Debug, Clone)]
pub enum MockReply {
    /// `200 OK` with the value as body.
    Json(Value),
    /// Arbitrary status and body, e.g. a `503` or an HTML error page.
    Raw { status: u16, body: String },
}

impl MockReply {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        MockReply::Raw {
            status,
            body: body.into(),
        }
    }
}

/// A request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: Url,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn query(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

#[derive(Default)]
struct MockState {
    queued: HashMap<String, VecDeque<MockReply>>,
    standing: HashMap<String, MockReply>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply served once, after previously queued ones.
    pub fn push(&self, host: &str, reply: MockReply) {
        self.lock()
            .queued
            .entry(host.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Sets the reply served whenever nothing is queued for `host`.
    pub fn always(&self, host: &str, reply: MockReply) {
        self.lock().standing.insert(host.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn requests_to(&self, host: &str) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.host() == host)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn execute(&self, req: reqwest::Request) -> Result<reqwest::Response, FetchError> {
        let reply = {
            let mut state = self.lock();
            state.requests.push(RecordedRequest {
                url: req.url().clone(),
                authorization: req
                    .headers()
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            });

            let host = req.url().host_str().unwrap_or_default().to_string();
            state
                .queued
                .get_mut(&host)
                .and_then(VecDeque::pop_front)
                .or_else(|| state.standing.get(&host).cloned())
                .unwrap_or_else(|| MockReply::status(404, format!("no mock reply for {host}")))
        };

        let (status, body) = match reply {
            MockReply::Json(value) => (200, value.to_string()),
            MockReply::Raw { status, body } => (status, body),
        };

        let response = http::Response::builder()
            .status(status)
            .body(body)
            .map_err(|e| FetchError::Status {
                status,
                body: e.to_string(),
            })?;
        Ok(reqwest::Response::from(response))
    }
}
