//! Zalo identity provider.
//!
//! Zalo speaks its own OAuth 2.0 dialect:
//! - the authorization request uses `app_id` instead of `client_id`
//! - the token request carries the app secret in a `secret_key` header and
//!   the response reports `expires_in` as a numeric string
//! - the profile has no email address, so a stable placeholder
//!   `<zalo user id>@zalo.me` is derived and flagged as synthetic
//!
//! Reference: https://developers.zalo.me/docs/social-api/tham-khao/user-access-token-v4

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::oauth::{Claims, Email, ProviderKind, Token, UserData};

pub const AUTH_URL: &str = "https://oauth.zaloapp.com/v4/permission";
pub const TOKEN_URL: &str = "https://oauth.zaloapp.com/v4/access_token";
pub const USER_INFO_URL: &str = "https://graph.zalo.me/v2.0/me";

/// Issuer recorded in the normalized claims.
pub const ISSUER: &str = "https://oauth.zaloapp.com";
/// Domain of the placeholder email derived from the Zalo user id.
pub const EMAIL_DOMAIN: &str = "zalo.me";

const USER_INFO_FIELDS: &str = "id,name,picture,gender,birthday";
const SECRET_KEY_HEADER: &str = "secret_key";
const ACCESS_TOKEN_HEADER: &str = "access_token";

/// Zalo endpoints; overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct Urls {
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,
}

impl Default for Urls {
    fn default() -> Self {
        Self {
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            user_info_url: USER_INFO_URL.to_string(),
        }
    }
}

/// Zalo identity provider adapter.
pub struct Provider {
    app_id: String,
    secret_key: SecretString,
    redirect_uri: String,
    http_client: reqwest::Client,
    urls: Urls,
}

impl Provider {
    /// Create a new Zalo provider. Fails if Zalo is disabled or has no app id.
    pub fn new(
        config: &ProviderConfig,
        redirect_uri: &str,
        http_client: reqwest::Client,
    ) -> Result<Self, Error> {
        config.ensure_usable(ProviderKind::Zalo)?;

        Ok(Self {
            app_id: config.client_id.clone(),
            secret_key: config.secret.clone(),
            redirect_uri: redirect_uri.to_string(),
            http_client,
            urls: Urls::default(),
        })
    }

    pub fn with_urls(mut self, urls: Urls) -> Self {
        self.urls = urls;
        self
    }

    /// The placeholder email for a Zalo user. Stable per user id; downstream
    /// account linking keys on it.
    pub fn synthetic_email(user_id: &str) -> String {
        format!("{user_id}@{EMAIL_DOMAIN}")
    }
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Zalo
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?state={}&app_id={}&redirect_uri={}",
            self.urls.auth_url,
            urlencoding::encode(state),
            urlencoding::encode(&self.app_id),
            urlencoding::encode(&self.redirect_uri),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<Token, Error> {
        debug!("Exchanging Zalo authorization code for an access token");

        let response = self
            .http_client
            .post(&self.urls.token_url)
            .header(SECRET_KEY_HEADER, self.secret_key.expose_secret().as_str())
            .form(&[
                ("code", code),
                ("app_id", self.app_id.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .inspect_err(|e| warn!("Failed to reach Zalo token endpoint: {e}"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Zalo token endpoint returned {status}");
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!("Zalo token endpoint returned {status}: {body}"),
            ));
        }

        token_from_response(&body, Utc::now())
    }

    async fn fetch_user_data(&self, token: &Token) -> Result<UserData, Error> {
        let response = self
            .http_client
            .get(&self.urls.user_info_url)
            .query(&[("fields", USER_INFO_FIELDS)])
            .header(ACCESS_TOKEN_HEADER, token.access_token.expose_secret().as_str())
            .send()
            .await
            .inspect_err(|e| warn!("Failed to reach Zalo profile endpoint: {e}"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Zalo profile endpoint returned {status}");
            return Err(oauth_error(
                OAuthErrorKind::UserInfoFailed,
                &format!("Zalo profile endpoint returned {status}: {body}"),
            ));
        }

        user_data_from_response(&body)
    }
}

/// `expires_in` arrives as a JSON string holding an integer. A bare number is
/// tolerated as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Text(String),
    Number(i64),
}

impl Seconds {
    fn parse(&self) -> Option<i64> {
        match self {
            Seconds::Text(text) => text.trim().parse().ok(),
            Seconds::Number(n) => Some(*n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<Seconds>,
    // Zalo reports failures with a 200 and this envelope
    error: Option<i64>,
    error_name: Option<String>,
    error_description: Option<String>,
}

fn token_from_response(body: &str, issued_at: DateTime<Utc>) -> Result<Token, Error> {
    let response: AccessTokenResponse = serde_json::from_str(body).map_err(|e| {
        warn!("Failed to parse Zalo token response: {e}");
        oauth_error(OAuthErrorKind::MalformedTokenResponse, &e.to_string())
    })?;

    let access_token = match response.access_token.filter(|t| !t.is_empty()) {
        Some(access_token) => access_token,
        None if response.error.is_some() || response.error_name.is_some() => {
            let reason = response
                .error_description
                .or(response.error_name)
                .unwrap_or_default();
            warn!("Zalo rejected the authorization code: {reason}");
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!("Zalo error {}: {reason}", response.error.unwrap_or_default()),
            ));
        }
        None => {
            return Err(oauth_error(
                OAuthErrorKind::MalformedTokenResponse,
                "Zalo token response has no access_token",
            ))
        }
    };

    let expires_in = response
        .expires_in
        .as_ref()
        .and_then(Seconds::parse)
        .ok_or_else(|| {
            warn!("Zalo token response has an unusable expires_in: {:?}", response.expires_in);
            oauth_error(
                OAuthErrorKind::MalformedTokenResponse,
                "Zalo token response has no integer expires_in",
            )
        })?;

    Ok(Token::bearer(
        access_token,
        response.refresh_token.filter(|t| !t.is_empty()),
        Some(Token::expiry_from(issued_at, expires_in)),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserResponse {
    id: String,
    name: Option<String>,
    picture: Option<Picture>,
    gender: Option<String>,
    birthday: Option<String>,
    error: i64,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Picture {
    data: PictureData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PictureData {
    url: Option<String>,
}

fn user_data_from_response(body: &str) -> Result<UserData, Error> {
    let response: UserResponse = serde_json::from_str(body).map_err(|e| {
        warn!("Failed to parse Zalo profile response: {e}");
        oauth_error(OAuthErrorKind::MalformedProfileResponse, &e.to_string())
    })?;

    if response.error != 0 {
        let message = response.message.unwrap_or_default();
        warn!("Zalo profile request failed: {message}");
        return Err(oauth_error(
            OAuthErrorKind::UserInfoFailed,
            &format!("Zalo error {}: {message}", response.error),
        ));
    }

    let user_id = response.id.trim();
    if user_id.is_empty() {
        return Err(oauth_error(
            OAuthErrorKind::MalformedProfileResponse,
            "Zalo profile response has no id",
        ));
    }

    let name = non_empty(response.name);
    let claims = Claims {
        issuer: ISSUER.to_string(),
        subject: user_id.to_string(),
        preferred_username: name.clone(),
        name,
        picture: non_empty(response.picture.and_then(|p| p.data.url)),
        gender: non_empty(response.gender),
        birthdate: non_empty(response.birthday),
        ..Default::default()
    };

    let email = Email::synthetic(Provider::synthetic_email(user_id));

    Ok(UserData::new(claims, Some(email)))
}

/// Zalo sends `""` for fields the user has not shared.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
