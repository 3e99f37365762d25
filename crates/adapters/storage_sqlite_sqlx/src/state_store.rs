//! `SQLite` implementation of [`StateStore`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use thermolink_app::ports::StateStore;
use thermolink_domain::error::ThermostatError;
use thermolink_domain::id::EntityRef;
use thermolink_domain::record::PersistedRecord;

use crate::error::StorageError;

/// Raw `record` column, decoded once fetched.
struct Wrapper(String);

impl Wrapper {
    fn decode(self) -> Result<PersistedRecord, StorageError> {
        Ok(serde_json::from_str(&self.0)?)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(row.try_get("record")?))
    }
}

const SELECT_BY_ID: &str = "SELECT record FROM thermostat_states WHERE unique_id = ?";
const UPSERT: &str = "INSERT INTO thermostat_states (unique_id, record, updated_at) VALUES (?, ?, ?) \
     ON CONFLICT(unique_id) DO UPDATE SET record = excluded.record, updated_at = excluded.updated_at";

/// `SQLite`-backed store of persisted unit records, one JSON row per unit.
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl StateStore for SqliteStateStore {
    fn load(
        &self,
        unique_id: &EntityRef,
    ) -> impl Future<Output = Result<Option<PersistedRecord>, ThermostatError>> + Send {
        let pool = self.pool.clone();
        let unique_id = unique_id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(unique_id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(Wrapper::decode).transpose()?)
        }
    }

    fn save(
        &self,
        unique_id: &EntityRef,
        record: &PersistedRecord,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        let pool = self.pool.clone();
        let unique_id = unique_id.to_string();
        let encoded = serde_json::to_string(record).map_err(StorageError::from);
        async move {
            sqlx::query(UPSERT)
                .bind(unique_id)
                .bind(encoded?)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use thermolink_domain::hvac::HvacMode;
    use thermolink_domain::mode::EnslavedMode;
    use thermolink_domain::state::ActuatorState;

    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqliteStateStore {
        let db = Config::new("sqlite::memory:").build().await.unwrap();
        SqliteStateStore::new(db.pool().clone())
    }

    fn kitchen() -> EntityRef {
        EntityRef::new("climate.kitchen").unwrap()
    }

    fn scheduled_record() -> PersistedRecord {
        PersistedRecord {
            enslaved_mode: Some(EnslavedMode::Auto),
            enslaved_target_temp: Some(21.5),
            enslaved_hvac_mode: Some(HvacMode::Heat),
            scheduler_previous_state: Some(ActuatorState::new(19.0, HvacMode::Off)),
            manual_target_temp: Some(20.0),
            manual_hvac_mode: None,
            actuator_state: Some(ActuatorState::new(24.0, HvacMode::Heat)),
        }
    }

    #[tokio::test]
    async fn should_return_none_when_record_not_found() {
        let store = setup().await;
        let result = store.load(&kitchen()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_save_and_load_record() {
        let store = setup().await;

        store.save(&kitchen(), &scheduled_record()).await.unwrap();

        let loaded = store.load(&kitchen()).await.unwrap();
        assert_eq!(loaded, Some(scheduled_record()));
    }

    #[tokio::test]
    async fn should_replace_record_when_saved_twice() {
        let store = setup().await;
        store.save(&kitchen(), &scheduled_record()).await.unwrap();

        let cleared = PersistedRecord {
            scheduler_previous_state: None,
            ..scheduled_record()
        };
        store.save(&kitchen(), &cleared).await.unwrap();

        let loaded = store.load(&kitchen()).await.unwrap().unwrap();
        assert_eq!(loaded.scheduler_previous_state, None);
        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM thermostat_states")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn should_keep_records_per_unit() {
        let store = setup().await;
        let bedroom = EntityRef::new("climate.bedroom").unwrap();

        store.save(&kitchen(), &scheduled_record()).await.unwrap();
        store
            .save(&bedroom, &PersistedRecord::default())
            .await
            .unwrap();

        assert_eq!(
            store.load(&bedroom).await.unwrap(),
            Some(PersistedRecord::default())
        );
        assert_eq!(
            store.load(&kitchen()).await.unwrap(),
            Some(scheduled_record())
        );
    }

    #[tokio::test]
    async fn should_report_storage_error_when_record_is_corrupt() {
        let store = setup().await;
        sqlx::query(UPSERT)
            .bind("climate.kitchen")
            .bind("not json")
            .bind("2026-01-01T00:00:00+00:00")
            .execute(&store.pool)
            .await
            .unwrap();

        let result = store.load(&kitchen()).await;

        assert!(matches!(result, Err(ThermostatError::Storage(_))));
    }
}
