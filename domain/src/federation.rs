//! The two halves of a third-party login: sending the user to the provider,
//! and turning the provider's callback into normalized user data.

use crate::error::Error;
use crate::oauth_state;
use federation_auth::oauth::{Registry, UserData};
use log::*;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use service::config::Config;

/// Where to send the browser to start a login, and the state it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Starts a login with `provider`: issues a state and builds the provider's
/// authorization URL around it.
pub async fn begin(
    db: &DatabaseConnection,
    registry: &Registry,
    provider: &str,
) -> Result<AuthorizationRequest, Error> {
    let adapter = registry
        .get(provider)
        .inspect_err(|e| warn!("Cannot start login with {provider}: {e}"))?;

    let state = oauth_state::create(db).await?;
    let url = adapter.authorization_url(&state);

    info!("Redirecting user to {} for login", adapter.name());
    Ok(AuthorizationRequest { url, state })
}

/// Finishes a login from the provider callback's `code` and `state`.
///
/// The state is consumed before the code is exchanged, so a failed exchange
/// still uses it up and the user has to start over.
pub async fn complete(
    db: &DatabaseConnection,
    config: &Config,
    registry: &Registry,
    provider: &str,
    code: &str,
    state: &str,
) -> Result<UserData, Error> {
    let adapter = registry
        .get(provider)
        .inspect_err(|e| warn!("Cannot complete login with {provider}: {e}"))?;

    oauth_state::consume(db, config, state).await?;

    let token = adapter
        .exchange_code(code)
        .await
        .inspect_err(|e| warn!("{} code exchange failed: {e}", adapter.name()))?;

    let user_data = adapter
        .fetch_user_data(&token)
        .await
        .inspect_err(|e| warn!("{} profile fetch failed: {e}", adapter.name()))?;

    info!(
        "Completed {} login for subject {}",
        adapter.name(),
        user_data.metadata.subject
    );
    Ok(user_data)
}
