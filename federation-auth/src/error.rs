//! Error types for the `federation-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for federation-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in federation-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    OAuth(OAuthErrorKind),
    Provider(ProviderErrorKind),
    Http(HttpErrorKind),
}

/// Errors from the provider side of an OAuth handshake.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// The token endpoint answered with a non-success status or an error envelope.
    TokenExchangeFailed,
    /// The profile endpoint answered with a non-success status or an error envelope.
    UserInfoFailed,
    /// The token endpoint answered with a body that cannot be turned into a token.
    MalformedTokenResponse,
    /// The profile endpoint answered with a body that cannot be turned into user data.
    MalformedProfileResponse,
}

/// Errors from adapter construction and lookup.
#[derive(Debug, PartialEq)]
pub enum ProviderErrorKind {
    /// The provider exists but is disabled by configuration.
    Disabled,
    /// The provider is enabled but lacks a client id.
    MissingCredentials,
    /// The provider name is not known or not registered.
    Unknown,
    /// A configured endpoint is not a valid URL.
    InvalidEndpoint,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
    Timeout,
}

impl Error {
    /// Returns true for transport failures talking to a provider.
    pub fn is_transport(&self) -> bool {
        matches!(self.error_kind, ErrorKind::Http(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind)?,
            ErrorKind::Provider(kind) => write!(f, "Provider error: {:?}", kind)?,
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_timeout() {
            ErrorKind::Http(HttpErrorKind::Timeout)
        } else if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_connect() {
            ErrorKind::Http(HttpErrorKind::Network)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create provider errors.
pub fn provider_error(kind: ProviderErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Provider(kind),
    }
}

/// Helper function to create HTTP errors.
pub fn http_error(kind: HttpErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Http(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = oauth_error(OAuthErrorKind::MalformedTokenResponse, "expires_in is not a number");
        assert_eq!(
            err.to_string(),
            "OAuth error: MalformedTokenResponse: expires_in is not a number"
        );
    }

    #[test]
    fn only_http_errors_are_transport_errors() {
        assert!(http_error(HttpErrorKind::Timeout, "slow").is_transport());
        assert!(!provider_error(ProviderErrorKind::Disabled, "off").is_transport());
    }
}
