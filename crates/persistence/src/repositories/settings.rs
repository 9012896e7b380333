//! Club settings and admin secret repository.

use domain::models::Settings;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::metrics::QueryTimer;

const UPSERT_SQL: &str = r#"
    INSERT INTO club_settings (id, settings, updated_at)
    VALUES (1, $1, NOW())
    ON CONFLICT (id) DO UPDATE SET
        settings = EXCLUDED.settings,
        updated_at = EXCLUDED.updated_at
"#;

/// Repository for the single-row `club_settings` and `admin_secret` tables.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self) -> Result<Option<Settings>, sqlx::Error> {
        let timer = QueryTimer::new("find_club_settings");
        let result: Result<Option<(Json<Settings>,)>, sqlx::Error> =
            sqlx::query_as("SELECT settings FROM club_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        Ok(result?.map(|(settings,)| settings.0))
    }

    pub async fn upsert(&self, settings: &Settings) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("upsert_club_settings");
        let result = sqlx::query(UPSERT_SQL)
            .bind(Json(settings))
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ())
    }

    /// Upsert inside the caller's transaction.
    pub async fn upsert_in(
        tx: &mut Transaction<'_, Postgres>,
        settings: &Settings,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(UPSERT_SQL)
            .bind(Json(settings))
            .execute(&mut **tx)
            .await
            .map(|_| ())
    }

    /// Returns `(passcode_hash, legacy_plaintext)` when the row exists.
    pub async fn find_admin_secret(
        &self,
    ) -> Result<Option<(Option<String>, Option<String>)>, sqlx::Error> {
        let timer = QueryTimer::new("find_admin_secret");
        let result = sqlx::query_as::<_, (Option<String>, Option<String>)>(
            "SELECT passcode_hash, legacy_plaintext FROM admin_secret WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Stores a new hash and drops any legacy plaintext value.
    pub async fn set_admin_secret_hash(&self, hash: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("set_admin_secret_hash");
        let result = sqlx::query(
            r#"
            INSERT INTO admin_secret (id, passcode_hash, legacy_plaintext, updated_at)
            VALUES (1, $1, NULL, NOW())
            ON CONFLICT (id) DO UPDATE SET
                passcode_hash = EXCLUDED.passcode_hash,
                legacy_plaintext = NULL,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(hash)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }
}
