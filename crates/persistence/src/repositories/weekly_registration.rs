//! Weekly registration repository for database operations.

use domain::models::WeeklyRegistration;
use sqlx::types::Json;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::WeeklyRegistrationEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str =
    "id, week_start, week_end, players, settings, revision, created_at, updated_at";

/// Repository for `weekly_registrations`.
#[derive(Clone)]
pub struct WeeklyRegistrationRepository {
    pool: PgPool,
}

impl WeeklyRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All registrations, newest week first.
    pub async fn list(&self) -> Result<Vec<WeeklyRegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_weekly_registrations");
        let result = sqlx::query_as::<_, WeeklyRegistrationEntity>(&format!(
            "SELECT {} FROM weekly_registrations ORDER BY week_start DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<WeeklyRegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_weekly_registration_by_id");
        let result = sqlx::query_as::<_, WeeklyRegistrationEntity>(&format!(
            "SELECT {} FROM weekly_registrations WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        match result {
            Ok(entity) => Ok(Some(entity)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Plain insert; a second row for the same week violates the unique index.
    pub async fn insert(
        &self,
        registration: &WeeklyRegistration,
    ) -> Result<WeeklyRegistrationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_weekly_registration");
        let result = insert_query(registration, false)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Insert that yields `None` when the week is already taken.
    pub async fn insert_if_week_absent(
        &self,
        registration: &WeeklyRegistration,
    ) -> Result<Option<WeeklyRegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_weekly_registration_if_absent");
        let result = insert_query(registration, true)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Compare-and-set on `revision`. Yields `None` when the row is missing or
    /// its revision has moved on.
    pub async fn update_if_revision(
        &self,
        id: Uuid,
        expected_revision: i64,
        registration: &WeeklyRegistration,
    ) -> Result<Option<WeeklyRegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_weekly_registration");
        let result = sqlx::query_as::<_, WeeklyRegistrationEntity>(&format!(
            r#"
            UPDATE weekly_registrations
            SET players = $3, settings = $4, revision = revision + 1, updated_at = $5
            WHERE id = $1 AND revision = $2
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(expected_revision)
        .bind(Json(&registration.players))
        .bind(Json(&registration.settings))
        .bind(registration.updated_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Returns the number of rows removed; 0 when the row is gone or its
    /// revision moved.
    pub async fn delete_if_revision(
        &self,
        id: Uuid,
        expected_revision: i64,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_weekly_registration");
        let result =
            sqlx::query("DELETE FROM weekly_registrations WHERE id = $1 AND revision = $2")
                .bind(id)
                .bind(expected_revision)
                .execute(&self.pool)
                .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Replaces every row inside the caller's transaction.
    pub async fn replace_all_in(
        tx: &mut Transaction<'_, Postgres>,
        registrations: &[WeeklyRegistration],
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("replace_weekly_registrations");
        let result = async {
            sqlx::query("DELETE FROM weekly_registrations")
                .execute(&mut **tx)
                .await?;
            for registration in registrations {
                insert_query(registration, false)
                    .fetch_one(&mut **tx)
                    .await?;
            }
            Ok::<(), sqlx::Error>(())
        }
        .await;
        timer.record();
        result
    }
}

const INSERT_SQL: &str = r#"
    INSERT INTO weekly_registrations
        (id, week_start, week_end, players, settings, revision, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id, week_start, week_end, players, settings, revision, created_at, updated_at
"#;

const INSERT_IF_ABSENT_SQL: &str = r#"
    INSERT INTO weekly_registrations
        (id, week_start, week_end, players, settings, revision, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (week_start) DO NOTHING
    RETURNING id, week_start, week_end, players, settings, revision, created_at, updated_at
"#;

fn insert_query(
    registration: &WeeklyRegistration,
    skip_existing_week: bool,
) -> QueryAs<'static, Postgres, WeeklyRegistrationEntity, PgArguments> {
    let sql = if skip_existing_week {
        INSERT_IF_ABSENT_SQL
    } else {
        INSERT_SQL
    };

    sqlx::query_as::<_, WeeklyRegistrationEntity>(sql)
        .bind(registration.id)
        .bind(registration.week_start)
        .bind(registration.week_end)
        .bind(Json(registration.players.clone()))
        .bind(Json(registration.settings.clone()))
        .bind(registration.revision)
        .bind(registration.created_at)
        .bind(registration.updated_at)
}
