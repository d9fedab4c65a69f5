//! Outbound provider calls: transport, authentication and retry.
//!
//! A provider client is a stack of [`HttpClient`] decorators, e.g.
//! `RetryingClient<UrlParam<BasicClient>>`.

mod basic;
mod client;
mod error;
mod request;
mod retry;
pub mod auth;
pub mod mock;

pub use auth::{ApiKey, UrlParam};
pub use basic::BasicClient;
pub use client::HttpClient;
pub use error::FetchError;
pub use request::ProviderRequest;
pub use retry::{RetryPolicy, RetryingClient};
