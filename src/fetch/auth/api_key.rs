use crate::fetch::client::HttpClient;
use crate::fetch::error::FetchError;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use tracing::warn;

use super::read_credential;

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// `header_name` is the header field to set and `prefix` is prepended to the
/// key read from `env_var` (e.g. `"Bearer "`). The key is read on every
/// request and the header value is marked sensitive so it is never printed
/// by `reqwest`'s debug output.
pub struct ApiKey<C> {
    pub inner: C,
    pub header_name: HeaderName,
    pub prefix: String,
    pub env_var: String,
    pub allow_anonymous: bool,
}

impl<C> ApiKey<C> {
    /// Convenience constructor that uses `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, env_var: impl Into<String>) -> Self {
        Self {
            inner,
            header_name: AUTHORIZATION,
            prefix: "Bearer ".to_string(),
            env_var: env_var.into(),
            allow_anonymous: false,
        }
    }

    /// Sends the request without the header when the variable is unset,
    /// instead of failing with [`FetchError::MissingCredential`].
    pub fn allow_anonymous(mut self) -> Self {
        self.allow_anonymous = true;
        self
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> Result<reqwest::Response, FetchError> {
        match read_credential(&self.env_var) {
            Some(key) => {
                let mut value = HeaderValue::from_str(&format!("{}{}", self.prefix, key))
                    .map_err(|_| FetchError::InvalidCredential {
                        var: self.env_var.clone(),
                    })?;
                value.set_sensitive(true);
                req.headers_mut().insert(self.header_name.clone(), value);
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
            "https://co2.example.test/api".parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_bearer_header_from_environment() {
        unsafe {
            std::env::set_var("OUTING_CARBON_TEST_BEARER_KEY", "tok");
        }
        let mock = MockClient::new();
        mock.always("co2.example.test", MockReply::Json(json!({})));
        let client = ApiKey::bearer(mock.clone(), "OUTING_CARBON_TEST_BEARER_KEY");

        client.execute(request()).await.unwrap();

        assert_eq!(
            mock.requests()[0].authorization.as_deref(),
            Some("Bearer tok")
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_an_error_by_default() {
        let mock = MockClient::new();
        let client = ApiKey::bearer(mock.clone(), "OUTING_CARBON_TEST_BEARER_UNSET");

        let err = client.execute(request()).await.unwrap_err();

        assert!(matches!(err, FetchError::MissingCredential { .. }));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_bearer_sends_no_header() {
        let mock = MockClient::new();
        mock.always("co2.example.test", MockReply::Json(json!({})));
        let client =
            ApiKey::bearer(mock.clone(), "OUTING_CARBON_TEST_BEARER_UNSET").allow_anonymous();

        client.execute(request()).await.unwrap();

        assert_eq!(mock.requests()[0].authorization, None);
    }
}
