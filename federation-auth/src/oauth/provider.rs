//! Identity provider trait and types.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Token, UserData};
use crate::error::{provider_error, Error, ProviderErrorKind};

/// Known third-party identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Google,
    Zalo,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Google, ProviderKind::Zalo];

    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Zalo => "zalo",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                provider_error(
                    ProviderErrorKind::Unknown,
                    &format!("unknown identity provider: {name}"),
                )
            })
    }
}

/// Trait for third-party identity provider adapters.
///
/// Each implementation hides one provider's OAuth 2.0 dialect:
/// - Authorization URL generation for a server-issued CSRF state
/// - Authorization code exchange for a provider token
/// - Profile retrieval normalized into `UserData`
///
/// Failed calls are returned as typed errors and never retried.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider kind.
    fn kind(&self) -> ProviderKind;

    /// The name this provider is registered and requested under.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Build the URL the browser is redirected to. `state` is embedded so that it
    /// comes back unchanged on the callback. Never contains the client secret.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange the authorization code from the callback for a provider token.
    async fn exchange_code(&self, code: &str) -> Result<Token, Error>;

    /// Fetch the user's profile with `token` and normalize it.
    async fn fetch_user_data(&self, token: &Token) -> Result<UserData, Error>;
}
