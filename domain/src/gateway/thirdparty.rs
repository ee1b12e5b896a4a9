//! Identity provider registry built from the service configuration.

use crate::error::Error;
use federation_auth::config::{ProviderConfig, ThirdPartyConfig};
use federation_auth::http::HttpClientConfig;
use federation_auth::oauth::Registry;
use log::*;
use service::config::Config;

pub use federation_auth::oauth::{Claims, Email, Provider, ProviderKind, Token, UserData};

/// Builds the registry of enabled identity providers. Called once at startup.
pub fn registry(config: &Config) -> Result<Registry, Error> {
    let registry = Registry::from_config(&thirdparty_config(config))
        .inspect_err(|e| error!("Failed to build identity provider registry: {e}"))?;

    info!("Enabled identity providers: {:?}", registry.names());
    Ok(registry)
}

fn thirdparty_config(config: &Config) -> ThirdPartyConfig {
    ThirdPartyConfig {
        redirect_url: config.thirdparty_redirect_url().to_string(),
        http: HttpClientConfig {
            timeout: config.thirdparty_http_timeout(),
            ..Default::default()
        },
        google: provider_config(
            config.google_enabled,
            config.google_client_id(),
            config.google_secret(),
        ),
        zalo: provider_config(
            config.zalo_enabled,
            config.zalo_client_id(),
            config.zalo_secret(),
        ),
    }
}

fn provider_config(
    enabled: bool,
    client_id: Option<String>,
    secret: Option<String>,
) -> ProviderConfig {
    if !enabled {
        return ProviderConfig::disabled();
    }
    ProviderConfig::enabled(client_id.unwrap_or_default(), secret.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use clap::Parser;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Config {
        Config::parse_from(std::iter::once("domain-tests").chain(args.iter().copied()))
    }

    #[test]
    fn only_enabled_providers_are_registered() -> Result<(), Error> {
        let registry = registry(&parse(&[
            "--zalo-enabled",
            "--zalo-client-id",
            "app-123",
            "--zalo-secret",
            "shh",
        ]))?;

        assert_eq!(registry.names(), vec!["zalo"]);
        Ok(())
    }

    #[test]
    fn enabled_provider_without_client_id_is_a_config_error() {
        let result = registry(&parse(&["--google-enabled"]));

        assert_eq!(
            result.map(|r| r.len()).unwrap_err().error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }

    #[test]
    fn http_timeout_comes_from_config() {
        let config = thirdparty_config(&parse(&["--thirdparty-http-timeout-secs", "4"]));

        assert_eq!(config.http.timeout, Duration::from_secs(4));
        assert!(!config.google.enabled);
        assert!(!config.zalo.enabled);
    }
}
