use async_trait::async_trait;
use reqwest::{Request, Response};

use super::error::FetchError;

/// Sends one already-built request. Implementations may decorate the request
/// (authentication) before handing it to an inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> Result<Response, FetchError>;
}
