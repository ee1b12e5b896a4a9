//! # federation-auth
//!
//! Federates third-party identity providers into one canonical user record:
//! - A `Provider` trait every identity provider adapter implements
//! - Adapters for a conventional OAuth 2.0 / OpenID Connect provider (Google)
//!   and for a provider with a non-standard dialect (Zalo)
//! - Normalized `UserData` / `Claims` and provider `Token` types
//! - A read-only `Registry` of enabled adapters, built once from configuration
//! - HTTP client building with a bounded request timeout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use federation_auth::{config::ThirdPartyConfig, oauth::Registry};
//!
//! let registry = Registry::from_config(&config)?;
//! let provider = registry.get("zalo")?;
//! let url = provider.authorization_url(&state);
//! // ... after the callback
//! let token = provider.exchange_code(&code).await?;
//! let user_data = provider.fetch_user_data(&token).await?;
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod oauth;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
