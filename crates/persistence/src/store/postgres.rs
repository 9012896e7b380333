//! PostgreSQL-backed store.

use async_trait::async_trait;
use domain::models::{AuditKind, AuditLogEntry, Settings, WeeklyRegistration};
use domain::store::{ClubStore, StoreError, StoreResult};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::metrics::record_pool_metrics;
use crate::repositories::{AuditLogRepository, SettingsRepository, WeeklyRegistrationRepository};

/// Maps sqlx failures onto the store's error vocabulary.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(db_err.message().to_string())
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[derive(Clone)]
pub struct PgClubStore {
    pool: PgPool,
    settings: SettingsRepository,
    registrations: WeeklyRegistrationRepository,
    audit_logs: AuditLogRepository,
}

impl PgClubStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            settings: SettingsRepository::new(pool.clone()),
            registrations: WeeklyRegistrationRepository::new(pool.clone()),
            audit_logs: AuditLogRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ClubStore for PgClubStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        record_pool_metrics(&self.pool);
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    async fn get_settings(&self) -> StoreResult<Option<Settings>> {
        self.settings.find().await.map_err(map_sqlx_error)
    }

    async fn update_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.settings.upsert(settings).await.map_err(map_sqlx_error)
    }

    async fn list_registrations(&self) -> StoreResult<Vec<WeeklyRegistration>> {
        let entities = self.registrations.list().await.map_err(map_sqlx_error)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn get_registration(&self, id: Uuid) -> StoreResult<Option<WeeklyRegistration>> {
        let entity = self
            .registrations
            .find_by_id(id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(entity.map(Into::into))
    }

    async fn create_registration(&self, registration: &WeeklyRegistration) -> StoreResult<()> {
        self.registrations
            .insert(registration)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    async fn insert_registration_if_absent(
        &self,
        registration: &WeeklyRegistration,
    ) -> StoreResult<WeeklyRegistration> {
        match self
            .registrations
            .insert_if_week_absent(registration)
            .await
            .map_err(map_sqlx_error)?
        {
            Some(entity) => Ok(entity.into()),
            None => Err(StoreError::Conflict(format!(
                "week starting {} is already registered",
                registration.week_start
            ))),
        }
    }

    async fn update_registration(
        &self,
        id: Uuid,
        expected_revision: i64,
        registration: &WeeklyRegistration,
    ) -> StoreResult<WeeklyRegistration> {
        let updated = self
            .registrations
            .update_if_revision(id, expected_revision, registration)
            .await
            .map_err(map_sqlx_error)?;

        match updated {
            Some(entity) => Ok(entity.into()),
            None => match self.get_registration(id).await? {
                Some(_) => Err(StoreError::Conflict(format!(
                    "registration {} changed since revision {}",
                    id, expected_revision
                ))),
                None => Err(StoreError::NotFound),
            },
        }
    }

    async fn delete_registration(&self, id: Uuid, expected_revision: i64) -> StoreResult<()> {
        let removed = self
            .registrations
            .delete_if_revision(id, expected_revision)
            .await
            .map_err(map_sqlx_error)?;

        match removed {
            0 => match self.get_registration(id).await? {
                Some(_) => Err(StoreError::Conflict(format!(
                    "registration {} changed since revision {}",
                    id, expected_revision
                ))),
                None => Err(StoreError::NotFound),
            },
            _ => Ok(()),
        }
    }

    async fn append_audit_log(&self, entry: &AuditLogEntry) -> StoreResult<()> {
        self.audit_logs.insert(entry).await.map_err(map_sqlx_error)
    }

    async fn list_audit_logs(
        &self,
        kind: Option<AuditKind>,
        limit: usize,
    ) -> StoreResult<Vec<AuditLogEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entities = self
            .audit_logs
            .list(kind, limit)
            .await
            .map_err(map_sqlx_error)?;

        Ok(entities
            .into_iter()
            .filter_map(|entity| {
                let id = entity.id;
                AuditLogEntry::try_from(entity)
                    .map_err(|e| warn!(audit_log_id = %id, error = %e, "Skipping unreadable audit log row"))
                    .ok()
            })
            .collect())
    }

    async fn admin_secret_hash(&self) -> StoreResult<Option<String>> {
        let row = self
            .settings
            .find_admin_secret()
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.and_then(|(hash, _)| hash))
    }

    async fn admin_secret_plaintext(&self) -> StoreResult<Option<String>> {
        let row = self
            .settings
            .find_admin_secret()
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.and_then(|(_, plaintext)| plaintext))
    }

    async fn set_admin_secret_hash(&self, hash: &str) -> StoreResult<()> {
        self.settings
            .set_admin_secret_hash(hash)
            .await
            .map_err(map_sqlx_error)
    }

    async fn replace_all(
        &self,
        settings: &Settings,
        registrations: &[WeeklyRegistration],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        SettingsRepository::upsert_in(&mut tx, settings)
            .await
            .map_err(map_sqlx_error)?;
        WeeklyRegistrationRepository::replace_all_in(&mut tx, registrations)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)
    }
}
