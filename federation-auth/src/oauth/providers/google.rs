//! Google identity provider.
//!
//! Google is a conformant OAuth 2.0 / OpenID Connect provider, so the
//! authorization URL and code exchange go through the `oauth2` client. Its
//! requests are sent over the shared `reqwest` client. The profile comes from
//! the OIDC userinfo endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, HttpRequest, HttpResponse,
    RedirectUrl, RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{
    http_error, oauth_error, provider_error, Error, HttpErrorKind, OAuthErrorKind,
    ProviderErrorKind,
};
use crate::oauth::{Claims, Email, ProviderKind, Token, UserData};

pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const USER_INFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
pub const ISSUER: &str = "https://accounts.google.com";

const SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// Google endpoints; overridable so tests can point at a local server.
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

/// Google identity provider adapter.
pub struct Provider {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    oauth_client: BasicClient,
    http_client: reqwest::Client,
    timeout: Duration,
    user_info_url: String,
}

impl Provider {
    /// Create a new Google provider. Fails if Google is disabled, has no
    /// client id, or `redirect_uri` is not a valid URL.
    pub fn new(
        config: &ProviderConfig,
        redirect_uri: &str,
        http_client: reqwest::Client,
        timeout: Duration,
    ) -> Result<Self, Error> {
        config.ensure_usable(ProviderKind::Google)?;

        let urls = Urls::default();
        let oauth_client = oauth_client(
            &config.client_id,
            &config.secret,
            redirect_uri,
            &urls,
        )?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.secret.clone(),
            redirect_uri: redirect_uri.to_string(),
            oauth_client,
            http_client,
            timeout,
            user_info_url: urls.user_info_url,
        })
    }

    pub fn with_urls(mut self, urls: Urls) -> Result<Self, Error> {
        self.oauth_client = oauth_client(
            &self.client_id,
            &self.client_secret,
            &self.redirect_uri,
            &urls,
        )?;
        self.user_info_url = urls.user_info_url;
        Ok(self)
    }
}

fn oauth_client(
    client_id: &str,
    secret: &SecretString,
    redirect_uri: &str,
    urls: &Urls,
) -> Result<BasicClient, Error> {
    let invalid = |what: &str, e: &dyn std::fmt::Display| {
        warn!("Invalid Google {what}: {e}");
        provider_error(
            ProviderErrorKind::InvalidEndpoint,
            &format!("invalid Google {what}: {e}"),
        )
    };

    let auth_url = AuthUrl::new(urls.auth_url.clone()).map_err(|e| invalid("auth url", &e))?;
    let token_url = TokenUrl::new(urls.token_url.clone()).map_err(|e| invalid("token url", &e))?;
    let redirect_url =
        RedirectUrl::new(redirect_uri.to_string()).map_err(|e| invalid("redirect url", &e))?;

    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        Some(ClientSecret::new(secret.expose_secret().clone())),
        auth_url,
        Some(token_url),
    )
    .set_redirect_uri(redirect_url))
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn authorization_url(&self, state: &str) -> String {
        let (url, _) = self
            .oauth_client
            .authorize_url(|| CsrfToken::new(state.to_string()))
            .add_scopes(SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .url();

        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<Token, Error> {
        debug!("Exchanging Google authorization code for an access token");

        let exchange = self
            .oauth_client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(|request| self.send_token_request(request));

        // Bounds the whole exchange, whatever timeout the shared client carries.
        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                warn!("Google token exchange timed out after {:?}", self.timeout);
                http_error(HttpErrorKind::Timeout, "Google token exchange timed out")
            })?
            .map_err(token_error)?;

        Ok(token_from_response(&response))
    }

    async fn fetch_user_data(&self, token: &Token) -> Result<UserData, Error> {
        let response = self
            .http_client
            .get(&self.user_info_url)
            .bearer_auth(token.access_token.expose_secret())
            .send()
            .await
            .inspect_err(|e| warn!("Failed to reach Google userinfo endpoint: {e}"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Google userinfo endpoint returned {status}");
            return Err(oauth_error(
                OAuthErrorKind::UserInfoFailed,
                &format!("Google userinfo endpoint returned {status}: {body}"),
            ));
        }

        user_data_from_response(&body)
    }
}

impl Provider {
    /// Sends a request built by the `oauth2` client over the shared HTTP client.
    ///
    /// A non-success status fails here with the status and body, before
    /// `oauth2` tries to read the body as a token response.
    async fn send_token_request(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| http_error(HttpErrorKind::BuilderFailed, &e.to_string()))?;

        let mut builder = self
            .http_client
            .request(method, request.url.as_str())
            .body(request.body);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name.as_str(), value.as_bytes());
        }

        let response = builder
            .send()
            .await
            .inspect_err(|e| warn!("Failed to reach Google token endpoint: {e}"))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!("Google token endpoint returned {status}");
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!(
                    "Google token endpoint returned {status}: {}",
                    String::from_utf8_lossy(&body)
                ),
            ));
        }

        let status_code = StatusCode::from_u16(status.as_u16())
            .map_err(|e| http_error(HttpErrorKind::RequestFailed, &e.to_string()))?;

        let mut response_headers = HeaderMap::new();
        for (name, value) in headers.iter() {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_str().as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                response_headers.append(name, value);
            }
        }

        Ok(HttpResponse {
            status_code,
            headers: response_headers,
            body: body.to_vec(),
        })
    }
}

fn token_error(err: RequestTokenError<Error, BasicErrorResponse>) -> Error {
    match err {
        RequestTokenError::ServerResponse(response) => {
            warn!("Google rejected the authorization code: {response}");
            oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!("Google rejected the authorization code: {response}"),
            )
        }
        // Already classified and logged by `send_token_request`.
        RequestTokenError::Request(e) => e,
        RequestTokenError::Parse(e, _) => {
            warn!("Failed to parse Google token response: {e}");
            oauth_error(OAuthErrorKind::MalformedTokenResponse, &e.to_string())
        }
        RequestTokenError::Other(message) => {
            warn!("Google token exchange failed: {message}");
            oauth_error(OAuthErrorKind::TokenExchangeFailed, &message)
        }
    }
}

fn token_from_response(response: &BasicTokenResponse) -> Token {
    let expires_at = response
        .expires_in()
        .map(|lifetime| {
            let secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
            Token::expiry_from(Utc::now(), secs)
        });

    Token {
        access_token: SecretString::new(response.access_token().secret().clone()),
        refresh_token: response
            .refresh_token()
            .map(|t| SecretString::new(t.secret().clone())),
        token_type: "Bearer".to_string(),
        expires_at,
    }
}

/// Standard OIDC userinfo claims returned by Google.
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
    gender: Option<String>,
    birthdate: Option<String>,
}

fn user_data_from_response(body: &str) -> Result<UserData, Error> {
    let response: UserInfoResponse = serde_json::from_str(body).map_err(|e| {
        warn!("Failed to parse Google userinfo response: {e}");
        oauth_error(OAuthErrorKind::MalformedProfileResponse, &e.to_string())
    })?;

    if response.sub.trim().is_empty() {
        return Err(oauth_error(
            OAuthErrorKind::MalformedProfileResponse,
            "Google userinfo response has an empty sub",
        ));
    }

    let email = response
        .email
        .filter(|e| !e.is_empty())
        .map(|address| Email::primary(address, response.email_verified.unwrap_or(false)));

    let claims = Claims {
        issuer: ISSUER.to_string(),
        subject: response.sub,
        preferred_username: response.name.clone(),
        name: response.name,
        picture: response.picture,
        gender: response.gender,
        birthdate: response.birthdate,
        ..Default::default()
    };

    let mut user_data = UserData::new(claims, email);
    // An unreported verification status stays unknown in the claims.
    if user_data.metadata.email.is_some() {
        user_data.metadata.email_verified = response.email_verified;
    }

    Ok(user_data)
}
