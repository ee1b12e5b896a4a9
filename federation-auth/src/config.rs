//! Per-provider credentials and shared federation settings.

use secrecy::SecretString;

use crate::error::{provider_error, Error, ProviderErrorKind};
use crate::http::HttpClientConfig;
use crate::oauth::ProviderKind;

/// Credentials and on/off switch for one identity provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Whether logins through this provider are allowed at all.
    pub enabled: bool,
    /// The application / client id issued by the provider.
    pub client_id: String,
    /// The application / client secret issued by the provider.
    pub secret: SecretString,
}

impl ProviderConfig {
    pub fn enabled(client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            enabled: true,
            client_id: client_id.into(),
            secret: SecretString::new(secret.into()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            client_id: String::new(),
            secret: SecretString::new(String::new()),
        }
    }

    /// Fails unless these credentials may be used to build an adapter for `kind`.
    pub fn ensure_usable(&self, kind: ProviderKind) -> Result<(), Error> {
        if !self.enabled {
            return Err(provider_error(
                ProviderErrorKind::Disabled,
                &format!("{kind} provider requested but disabled"),
            ));
        }
        if self.client_id.trim().is_empty() {
            return Err(provider_error(
                ProviderErrorKind::MissingCredentials,
                &format!("{kind} provider enabled without a client id"),
            ));
        }
        Ok(())
    }
}

/// Everything needed to build the registry of identity providers.
#[derive(Debug, Clone)]
pub struct ThirdPartyConfig {
    /// Callback URL every provider redirects back to.
    pub redirect_url: String,
    pub http: HttpClientConfig,
    pub google: ProviderConfig,
    pub zalo: ProviderConfig,
}

impl ThirdPartyConfig {
    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Google => &self.google,
            ProviderKind::Zalo => &self.zalo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn disabled_config_is_not_usable() {
        let err = ProviderConfig::disabled()
            .ensure_usable(ProviderKind::Zalo)
            .unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Provider(ProviderErrorKind::Disabled));
        assert!(err.to_string().contains("zalo provider requested but disabled"));
    }

    #[test]
    fn enabled_config_without_client_id_is_not_usable() {
        let err = ProviderConfig::enabled("  ", "secret")
            .ensure_usable(ProviderKind::Google)
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Provider(ProviderErrorKind::MissingCredentials)
        );
    }

    #[test]
    fn enabled_config_with_client_id_is_usable() {
        assert!(ProviderConfig::enabled("app-1", "secret")
            .ensure_usable(ProviderKind::Zalo)
            .is_ok());
    }
}
