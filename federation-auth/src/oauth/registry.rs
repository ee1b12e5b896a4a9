//! Name-to-adapter lookup for the configured identity providers.

use std::collections::{HashMap, HashSet};

use tracing::info;

use super::providers::{google, zalo};
use super::{Provider, ProviderKind};
use crate::config::ThirdPartyConfig;
use crate::error::{provider_error, Error, ProviderErrorKind};
use crate::http::HttpClientBuilder;

/// The enabled identity providers, built once at startup.
///
/// Read-only after construction, so it can be shared across concurrent
/// logins behind an `Arc` without locking.
#[derive(Default)]
pub struct Registry {
    providers: HashMap<ProviderKind, Box<dyn Provider>>,
    disabled: HashSet<ProviderKind>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an adapter for every enabled provider in `config`.
    ///
    /// Disabled providers are skipped and remembered so that a later lookup
    /// can tell "disabled" apart from "unknown". An enabled provider with
    /// unusable settings fails the whole build.
    pub fn from_config(config: &ThirdPartyConfig) -> Result<Self, Error> {
        let http_client = HttpClientBuilder::from_config(&config.http).build()?;
        let mut registry = Self::new();

        for kind in ProviderKind::ALL {
            if !config.provider(kind).enabled {
                info!("Identity provider {kind} is disabled");
                registry.disabled.insert(kind);
                continue;
            }

            let provider: Box<dyn Provider> = match kind {
                ProviderKind::Google => Box::new(google::Provider::new(
                    &config.google,
                    &config.redirect_url,
                    http_client.clone(),
                    config.http.timeout,
                )?),
                ProviderKind::Zalo => Box::new(zalo::Provider::new(
                    &config.zalo,
                    &config.redirect_url,
                    http_client.clone(),
                )?),
            };

            info!("Identity provider {kind} is enabled");
            registry.register(provider);
        }

        Ok(registry)
    }

    /// Add or replace the adapter for its provider kind.
    pub fn register(&mut self, provider: Box<dyn Provider>) {
        let kind = provider.kind();
        self.disabled.remove(&kind);
        self.providers.insert(kind, provider);
    }

    /// Look up an adapter by provider name.
    pub fn get(&self, name: &str) -> Result<&dyn Provider, Error> {
        let kind: ProviderKind = name.parse()?;

        match self.providers.get(&kind) {
            Some(provider) => Ok(provider.as_ref()),
            None if self.disabled.contains(&kind) => Err(provider_error(
                ProviderErrorKind::Disabled,
                &format!("{kind} provider requested but disabled"),
            )),
            None => Err(provider_error(
                ProviderErrorKind::Unknown,
                &format!("{kind} provider is not registered"),
            )),
        }
    }

    /// Names of the registered providers, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut kinds: Vec<ProviderKind> = self.providers.keys().copied().collect();
        kinds.sort();
        kinds.into_iter().map(|kind| kind.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::error::ErrorKind;
    use crate::http::HttpClientConfig;

    fn config(google: ProviderConfig, zalo: ProviderConfig) -> ThirdPartyConfig {
        ThirdPartyConfig {
            redirect_url: "https://login.example.com/thirdparty/callback".to_string(),
            http: HttpClientConfig::default(),
            google,
            zalo,
        }
    }

    fn error_kind(registry: &Registry, name: &str) -> ErrorKind {
        registry.get(name).map(|p| p.name()).unwrap_err().error_kind
    }

    #[test]
    fn builds_every_enabled_provider() {
        let registry = Registry::from_config(&config(
            ProviderConfig::enabled("g-id", "g-secret"),
            ProviderConfig::enabled("z-id", "z-secret"),
        ))
        .unwrap();

        assert_eq!(registry.names(), vec!["google", "zalo"]);
        assert_eq!(registry.get("zalo").unwrap().kind(), ProviderKind::Zalo);
        assert_eq!(registry.get("Google").unwrap().kind(), ProviderKind::Google);
    }

    #[test]
    fn disabled_provider_lookup_reports_disabled() {
        let registry = Registry::from_config(&config(
            ProviderConfig::enabled("g-id", "g-secret"),
            ProviderConfig::disabled(),
        ))
        .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(
            error_kind(&registry, "zalo"),
            ErrorKind::Provider(ProviderErrorKind::Disabled)
        );
    }

    #[test]
    fn unknown_provider_lookup_reports_unknown() {
        let registry = Registry::new();

        assert!(registry.is_empty());
        assert_eq!(
            error_kind(&registry, "myspace"),
            ErrorKind::Provider(ProviderErrorKind::Unknown)
        );
        assert_eq!(
            error_kind(&registry, "zalo"),
            ErrorKind::Provider(ProviderErrorKind::Unknown)
        );
    }

    #[test]
    fn enabled_provider_without_credentials_fails_the_build() {
        let result = Registry::from_config(&config(
            ProviderConfig::disabled(),
            ProviderConfig::enabled("", "z-secret"),
        ));

        assert_eq!(
            result.map(|r| r.len()).unwrap_err().error_kind,
            ErrorKind::Provider(ProviderErrorKind::MissingCredentials)
        );
    }

    #[test]
    fn register_replaces_disabled_marker() {
        let mut registry = Registry::from_config(&config(
            ProviderConfig::disabled(),
            ProviderConfig::disabled(),
        ))
        .unwrap();
        assert!(registry.is_empty());

        let zalo = zalo::Provider::new(
            &ProviderConfig::enabled("z-id", "z-secret"),
            "https://cb.example.com",
            reqwest::Client::new(),
        )
        .unwrap();
        registry.register(Box::new(zalo));

        assert_eq!(registry.names(), vec!["zalo"]);
        assert!(registry.get("zalo").is_ok());
    }
}
