//! HTTP client building for outbound provider calls.

mod client;

pub use client::{HttpClientBuilder, HttpClientConfig};
