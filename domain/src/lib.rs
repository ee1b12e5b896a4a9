//! Third-party login flow over the state store and the identity provider adapters.
//!
//! Consumers of the `domain` crate do not need to depend on `entity_api` or
//! `federation-auth` directly; the items they need are re-exported here.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::oauth_states;

pub use federation_auth::oauth::Registry;

pub mod error;
pub mod federation;
pub mod oauth_state;

pub mod gateway;
