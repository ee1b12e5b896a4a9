//! Single-use CSRF state values for third-party logins.
//!
//! A state is issued when a login starts and must come back unchanged on the
//! provider callback. Consuming it deletes it, so each value authorizes at
//! most one callback even when two callbacks race.

use crate::error::Error;
use chrono::{DateTime, TimeDelta, Utc};
use entity_api::oauth_state;
use log::*;
use rand::Rng;
use sea_orm::DatabaseConnection;
use service::config::Config;

pub use entity_api::oauth_state::find_by_state;

/// Random bytes behind every state value.
const STATE_BYTES: usize = 32;

/// Returns a fresh, unguessable state value as lowercase hex.
pub fn generate_token() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Issues and stores a new state value.
pub async fn create(db: &DatabaseConnection) -> Result<String, Error> {
    let state = generate_token();

    oauth_state::create(db, &state)
        .await
        .inspect_err(|e| warn!("Failed to store OAuth state: {e}"))?;

    Ok(state)
}

/// Verifies that `state` was issued by us and has not been used, then removes it.
///
/// Unknown, already consumed and expired values all fail with `NotFound`. An
/// expired value is still deleted.
pub async fn consume(db: &DatabaseConnection, config: &Config, state: &str) -> Result<(), Error> {
    let stored = match find_by_state(db, state).await? {
        Some(stored) => stored,
        None => {
            warn!("Rejecting unknown or already used OAuth state");
            return Err(Error::not_found());
        }
    };

    // The delete is the single point of truth when two callbacks race: only
    // one of them sees a row affected.
    oauth_state::delete_by_state(db, state)
        .await
        .inspect_err(|e| warn!("Failed to consume OAuth state: {e}"))?;

    let age = Utc::now() - stored.created_at.with_timezone(&Utc);
    if age > ttl(config) {
        warn!("Rejecting expired OAuth state issued {}s ago", age.num_seconds());
        return Err(Error::not_found());
    }

    debug!("OAuth state verified and consumed");
    Ok(())
}

/// Removes every state older than the configured lifetime.
pub async fn prune_expired(db: &DatabaseConnection, config: &Config) -> Result<u64, Error> {
    let cutoff = Utc::now()
        .checked_sub_signed(ttl(config))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let pruned = oauth_state::delete_expired(db, cutoff.into()).await?;
    info!("Pruned {pruned} expired OAuth states");

    Ok(pruned)
}

fn ttl(config: &Config) -> TimeDelta {
    TimeDelta::from_std(config.oauth_state_ttl()).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn generated_tokens_do_not_repeat() {
        assert_ne!(generate_token(), generate_token());
    }
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use clap::Parser;
    use entity_api::oauth_states::Model;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn config() -> Config {
        Config::parse_from(["domain-tests", "--oauth-state-ttl-secs", "600"])
    }

    fn stored(state: &str, age_secs: i64) -> Model {
        let created = Utc::now() - TimeDelta::seconds(age_secs);
        Model {
            state: state.to_string(),
            created_at: created.into(),
            updated_at: created.into(),
        }
    }

    fn deleted(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn not_found() -> DomainErrorKind {
        DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
    }

    #[tokio::test]
    async fn create_stores_a_fresh_token() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored("ignored", 0)]])
            .into_connection();

        let state = create(&db).await?;

        assert_eq!(state.len(), 64);
        Ok(())
    }

    #[tokio::test]
    async fn consume_succeeds_once_for_a_fresh_state() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored("s1", 5)]])
            .append_exec_results(vec![deleted(1)])
            .into_connection();

        consume(&db, &config(), "s1").await
    }

    #[tokio::test]
    async fn consume_rejects_an_unknown_state() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let result = consume(&db, &config(), "forged").await;

        assert_eq!(result.unwrap_err().error_kind, not_found());
    }

    #[tokio::test]
    async fn consume_rejects_when_a_concurrent_consume_won() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored("s1", 5)]])
            .append_exec_results(vec![deleted(0)])
            .into_connection();

        let result = consume(&db, &config(), "s1").await;

        assert_eq!(result.unwrap_err().error_kind, not_found());
    }

    #[tokio::test]
    async fn consume_deletes_and_rejects_an_expired_state() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored("s1", 3600)]])
            .append_exec_results(vec![deleted(1)])
            .into_connection();

        let result = consume(&db, &config(), "s1").await;
        assert_eq!(result.unwrap_err().error_kind, not_found());

        // find + delete both ran
        assert_eq!(db.into_transaction_log().len(), 2);
    }

    #[tokio::test]
    async fn prune_expired_reports_removed_rows() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![deleted(7)])
            .into_connection();

        assert_eq!(prune_expired(&db, &config()).await?, 7);
        Ok(())
    }
}
