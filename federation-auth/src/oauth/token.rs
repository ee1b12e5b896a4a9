//! Provider token types.

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;

/// Seconds subtracted from a provider-reported lifetime so the local clock
/// never treats a token as valid for its full nominal lifetime.
pub const EXPIRY_SAFETY_MARGIN_SECS: i64 = 100;

/// Token obtained from a provider's token endpoint.
#[derive(Debug, Clone)]
pub struct Token {
    /// Access token for profile requests.
    pub access_token: SecretString,
    /// Refresh token, when the provider issues one.
    pub refresh_token: Option<SecretString>,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// When the access token should be considered expired.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Create a bearer token.
    pub fn bearer(
        access_token: String,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token: SecretString::new(access_token),
            refresh_token: refresh_token.map(SecretString::new),
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }

    /// Absolute expiry for a token issued at `issued_at` with a reported
    /// lifetime of `expires_in_secs`, minus the safety margin.
    ///
    /// Lifetimes at or below the margin expire at `issued_at`.
    pub fn expiry_from(issued_at: DateTime<Utc>, expires_in_secs: i64) -> DateTime<Utc> {
        let lifetime = expires_in_secs
            .saturating_sub(EXPIRY_SAFETY_MARGIN_SECS)
            .max(0);

        TimeDelta::try_seconds(lifetime)
            .and_then(|delta| issued_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Tokens without a reported lifetime never expire locally.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires| expires <= Utc::now())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use secrecy::ExposeSecret;

    #[test]
    fn test_expiry_subtracts_safety_margin() {
        let issued_at = Utc::now();
        assert_eq!(
            Token::expiry_from(issued_at, 3600),
            issued_at + Duration::seconds(3500)
        );
    }

    #[test]
    fn test_short_lifetime_expires_immediately() {
        let issued_at = Utc::now();
        assert_eq!(Token::expiry_from(issued_at, 60), issued_at);
        assert_eq!(Token::expiry_from(issued_at, -5), issued_at);
    }

    #[test]
    fn test_huge_lifetime_does_not_overflow() {
        let issued_at = Utc::now();
        assert_eq!(Token::expiry_from(issued_at, i64::MAX), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_bearer_token() {
        let token = Token::bearer("abc".to_string(), Some("r1".to_string()), None);
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.access_token.expose_secret(), "abc");
        assert_eq!(
            token.refresh_token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("r1")
        );
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_expired() {
        let token = Token::bearer(
            "abc".to_string(),
            None,
            Some(Utc::now() - Duration::seconds(1)),
        );
        assert!(token.is_expired());
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let token = Token::bearer("abc-secret".to_string(), Some("r1-secret".to_string()), None);
        let debug = format!("{token:?}");
        assert!(!debug.contains("abc-secret"));
        assert!(!debug.contains("r1-secret"));
    }
}
