//! Authentication strategies, each an [`HttpClient`](super::HttpClient)
//! decorator that injects a credential read from the environment.

mod api_key;
mod url_param;

pub use api_key::ApiKey;
pub use url_param::UrlParam;

/// Reads a credential fresh from the environment. Empty values count as unset.
fn read_credential(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}
