use crate::fetch::client::HttpClient;
use crate::fetch::error::FetchError;
use async_trait::async_trait;
use tracing::warn;

use super::read_credential;

/// An [`HttpClient`] wrapper that appends an API key as a URL query parameter.
///
/// `param_name` is the query parameter name (e.g. `"key"`). The value is read
/// from the environment variable `env_var` on every request, so a key rotated
/// mid-run is picked up by the next call.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub env_var: String,
    pub allow_anonymous: bool,
}

impl<C> UrlParam<C> {
    pub fn new(inner: C, param_name: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self {
            inner,
            param_name: param_name.into(),
            env_var: env_var.into(),
            allow_anonymous: false,
        }
    }

    /// Sends the request without the parameter when the variable is unset,
    /// instead of failing with [`FetchError::MissingCredential`].
    pub fn allow_anonymous(mut self) -> Self {
        self.allow_anonymous = true;
        self
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: reqwest::Request) -> Result<reqwest::Response, FetchError> {
        match read_credential(&self.env_var) {
            Some(key) => {
                req.url_mut()
                    .query_pairs_mut()
                    .append_pair(&self.param_name, &key);
            }
            None if self.allow_anonymous => {
                warn!(var = %self.env_var, "API key not set, sending anonymous request");
            }
            None => {
                return Err(FetchError::MissingCredential {
                    var: self.env_var.clone(),
                });
            }
        }
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::{MockClient, MockReply};
    use serde_json::json;

    fn request() -> reqwest::Request {
        reqwest::Request::new(
            reqwest::Method::GET,
            "https://maps.example.test/json?mode=driving".parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_appends_key_from_environment() {
        unsafe {
            std::env::set_var("OUTING_CARBON_TEST_URL_PARAM_KEY", "s3cret");
        }
        let mock = MockClient::new();
        mock.always("maps.example.test", MockReply::Json(json!({})));
        let client = UrlParam::new(mock.clone(), "key", "OUTING_CARBON_TEST_URL_PARAM_KEY");

        client.execute(request()).await.unwrap();

        let seen = mock.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].query("key").as_deref(), Some("s3cret"));
        assert_eq!(seen[0].query("mode").as_deref(), Some("driving"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_sending() {
        let mock = MockClient::new();
        let client = UrlParam::new(mock.clone(), "key", "OUTING_CARBON_TEST_URL_PARAM_UNSET");

        let err = client.execute(request()).await.unwrap_err();

        assert!(matches!(err, FetchError::MissingCredential { ref var } if var == "OUTING_CARBON_TEST_URL_PARAM_UNSET"));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_request_has_no_key() {
        let mock = MockClient::new();
        mock.always("maps.example.test", MockReply::Json(json!({})));
        let client = UrlParam::new(mock.clone(), "key", "OUTING_CARBON_TEST_URL_PARAM_UNSET")
            .allow_anonymous();

        client.execute(request()).await.unwrap();

        assert_eq!(mock.requests()[0].query("key"), None);
    }

    #[tokio::test]
    async fn test_transport_error_never_carries_the_key() {
        unsafe {
            std::env::set_var("OUTING_CARBON_TEST_URL_PARAM_LEAK", "SUPERSECRET123");
        }
        let client = UrlParam::new(
            crate::fetch::BasicClient::new().unwrap(),
            "key",
            "OUTING_CARBON_TEST_URL_PARAM_LEAK",
        );
        // Nothing listens on port 1.
        let req = reqwest::Request::new(
            reqwest::Method::GET,
            "http://127.0.0.1:1/json?mode=driving".parse().unwrap(),
        );

        let err = client.execute(req).await.unwrap_err();

        let FetchError::Http(ref inner) = err else {
            panic!("unexpected error: {err:?}");
        };
        let mut chain = err.to_string();
        let mut source = std::error::Error::source(inner);
        while let Some(cause) = source {
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        assert!(!chain.contains("SUPERSECRET123"), "{chain}");
        assert!(!format!("{err:?}").contains("SUPERSECRET123"));
    }
}
