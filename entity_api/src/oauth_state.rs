use super::error::Error;
use entity::oauth_states::{ActiveModel, Column, Entity, Model};
use log::debug;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection};

/// Stores a freshly issued state value. Fails if the value is already stored
/// or the database cannot be reached.
pub async fn create(db: &DatabaseConnection, state: &str) -> Result<Model, Error> {
    debug!("Storing new OAuth state");

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        state: Set(state.to_owned()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?)
}

/// Finds a stored state. An unknown state is `Ok(None)`, not an error.
pub async fn find_by_state(db: &DatabaseConnection, state: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(state.to_owned()).one(db).await?)
}

/// Deletes exactly one stored state. Deleting a state that is not present,
/// including one that was already deleted, is `RecordNotFound`.
pub async fn delete_by_state(db: &DatabaseConnection, state: &str) -> Result<(), Error> {
    let result = Entity::delete_by_id(state.to_owned()).exec(db).await?;

    if result.rows_affected < 1 {
        debug!("OAuth state was not present in store");
        return Err(Error::not_found());
    }

    Ok(())
}

/// Deletes every state created before `cutoff` and returns how many were removed.
pub async fn delete_expired(
    db: &DatabaseConnection,
    cutoff: DateTimeWithTimeZone,
) -> Result<u64, Error> {
    let result = Entity::delete_many()
        .filter(Column::CreatedAt.lt(cutoff))
        .exec(db)
        .await?;

    debug!("Deleted {} expired OAuth states", result.rows_affected);

    Ok(result.rows_affected)
}


#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr};

    fn test_model(state: &str) -> Model {
        let now = chrono::Utc::now();
        Model {
            state: state.to_string(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn create_returns_the_stored_state() -> Result<(), Error> {
        let model = test_model("a1b2c3");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let result = create(&db, "a1b2c3").await?;

        assert_eq!(result.state, "a1b2c3");
        assert_eq!(result.created_at, model.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn create_fails_for_a_duplicate_state() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors(vec![DbErr::Query(RuntimeErr::Internal(
                "duplicate key value violates unique constraint \"oauth_states_pkey\"".to_string(),
            ))])
            .into_connection();

        let result = create(&db, "a1b2c3").await;

        assert_eq!(result.unwrap_err().error_kind, EntityApiErrorKind::SystemError);
    }

    #[tokio::test]
    async fn find_by_state_returns_none_when_not_found() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let result = find_by_state(&db, "unknown").await?;

        assert!(result.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn find_by_state_returns_model_when_found() -> Result<(), Error> {
        let model = test_model("a1b2c3");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let result = find_by_state(&db, "a1b2c3").await?;

        assert_eq!(result, Some(model));
        Ok(())
    }

    #[tokio::test]
    async fn find_by_state_surfaces_database_failures() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors(vec![DbErr::Conn(RuntimeErr::Internal(
                "connection refused".to_string(),
            ))])
            .into_connection();

        let result = find_by_state(&db, "a1b2c3").await;

        assert_eq!(result.unwrap_err().error_kind, EntityApiErrorKind::SystemError);
    }

    #[tokio::test]
    async fn find_then_delete_succeeds_exactly_once() -> Result<(), Error> {
        let model = test_model("a1b2c3");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .append_exec_results(vec![exec_result(1), exec_result(0)])
            .into_connection();

        assert!(find_by_state(&db, "a1b2c3").await?.is_some());
        delete_by_state(&db, "a1b2c3").await?;

        let replay = delete_by_state(&db, "a1b2c3").await;
        assert_eq!(replay.unwrap_err().error_kind, EntityApiErrorKind::RecordNotFound);
        Ok(())
    }

    #[tokio::test]
    async fn delete_by_state_returns_error_when_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![exec_result(0)])
            .into_connection();

        let result = delete_by_state(&db, "unknown").await;

        assert_eq!(result.unwrap_err().error_kind, EntityApiErrorKind::RecordNotFound);
    }

    #[tokio::test]
    async fn delete_expired_returns_number_of_rows_removed() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![exec_result(3)])
            .into_connection();

        let removed = delete_expired(&db, chrono::Utc::now().into()).await?;

        assert_eq!(removed, 3);
        Ok(())
    }
}
