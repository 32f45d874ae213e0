//! HTTP layer
//!
//! Authenticated requests, retry policy, and the pluggable transport.

pub mod client;
pub mod retry;
pub mod transport;

// Re-exports
pub use client::HttpClient;
pub use retry::{retry_strategy, RetryStrategy};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
