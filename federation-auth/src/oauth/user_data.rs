//! Canonical, provider-agnostic user record produced by a federated login.

use serde::{Deserialize, Serialize};

/// One email address known for the external identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub address: String,
    pub verified: bool,
    pub primary: bool,
    /// Set when the adapter derived the address itself because the provider
    /// does not expose one. Such an address is stable per external subject
    /// but was never asserted by the provider.
    #[serde(default)]
    pub synthetic: bool,
}

impl Email {
    /// The single primary address of a provider that reports at most one.
    pub fn primary(address: impl Into<String>, verified: bool) -> Self {
        Self {
            address: address.into(),
            verified,
            primary: true,
            synthetic: false,
        }
    }

    /// A placeholder address derived from the provider's user id.
    pub fn synthetic(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            verified: true,
            primary: true,
            synthetic: true,
        }
    }
}

/// Provider-sourced identity claims. Fields the provider did not return are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub issuer: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

/// Normalized user data handed back to the caller after a federated login.
///
/// `metadata.issuer` together with `metadata.subject` identifies the external
/// identity. `metadata.email` always mirrors the primary entry of `emails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub emails: Vec<Email>,
    pub metadata: Claims,
}

impl UserData {
    /// Build user data whose claims mirror `primary_email`, if there is one.
    pub fn new(mut metadata: Claims, primary_email: Option<Email>) -> Self {
        metadata.email = primary_email.as_ref().map(|e| e.address.clone());
        metadata.email_verified = primary_email.as_ref().map(|e| e.verified);

        Self {
            emails: primary_email.into_iter().collect(),
            metadata,
        }
    }

    pub fn primary_email(&self) -> Option<&Email> {
        self.emails.iter().find(|e| e.primary)
    }

    /// True when the primary address was derived by the adapter.
    pub fn has_synthetic_email(&self) -> bool {
        self.primary_email().is_some_and(|e| e.synthetic)
    }
}
