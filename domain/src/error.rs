//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use federation_auth::error::{
    Error as FederationError, ErrorKind as FederationErrorKind, OAuthErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
///
/// Errors in the domain layer form a tree rooted at `domain::error::Error`.
/// `error_kind` says which kind of failure occurred, here or in a lower layer,
/// and `source` keeps the error that caused it. Lower layers (`entity_api`,
/// `federation-auth`) are translated at this boundary so callers of `domain`
/// never depend on them directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Failures on our side: storage, configuration, anything else local.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Config,
    Other(String),
}

/// Entity layer errors reduced to what the domain layer cares about.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    DbTransaction,
}

/// Failures talking to, or caused by, a third-party identity provider.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Provider(ProviderErrorKind),
}

#[derive(Debug, PartialEq)]
pub enum ProviderErrorKind {
    /// The provider refused the code or the token.
    Rejected,
    MalformedTokenResponse,
    MalformedProfileResponse,
}

impl Error {
    pub(crate) fn not_found() -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::NotFound,
            )),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}", self.error_kind)?;
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

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

impl From<FederationError> for Error {
    fn from(err: FederationError) -> Self {
        let error_kind = match &err.error_kind {
            FederationErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            FederationErrorKind::Provider(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            FederationErrorKind::OAuth(kind) => {
                let provider_error_kind = match kind {
                    OAuthErrorKind::TokenExchangeFailed | OAuthErrorKind::UserInfoFailed => {
                        ProviderErrorKind::Rejected
                    }
                    OAuthErrorKind::MalformedTokenResponse => {
                        ProviderErrorKind::MalformedTokenResponse
                    }
                    OAuthErrorKind::MalformedProfileResponse => {
                        ProviderErrorKind::MalformedProfileResponse
                    }
                };
                DomainErrorKind::External(ExternalErrorKind::Provider(provider_error_kind))
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
