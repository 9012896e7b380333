//! Persistence facade.
//!
//! The API layer talks to storage only through [`ClubStore`]; backends live in
//! the `persistence` crate.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AuditKind, AuditLogEntry, Settings, WeeklyRegistration};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    /// A uniqueness or revision precondition failed.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backend could not be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Errors a read fallback may recover from.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Backend(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ClubStore: Send + Sync {
    /// Short backend label for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Cheap liveness probe.
    async fn ping(&self) -> StoreResult<()>;

    async fn get_settings(&self) -> StoreResult<Option<Settings>>;

    async fn update_settings(&self, settings: &Settings) -> StoreResult<()>;

    /// All registrations, newest week first.
    async fn list_registrations(&self) -> StoreResult<Vec<WeeklyRegistration>>;

    async fn get_registration(&self, id: Uuid) -> StoreResult<Option<WeeklyRegistration>>;

    /// Unconditional insert. Fails with `Conflict` only on an id clash.
    async fn create_registration(&self, registration: &WeeklyRegistration) -> StoreResult<()>;

    /// Inserts unless a registration for the same week already exists, in
    /// which case `Conflict` is returned and nothing is written.
    async fn insert_registration_if_absent(
        &self,
        registration: &WeeklyRegistration,
    ) -> StoreResult<WeeklyRegistration>;

    /// Replaces the registration if its stored revision still equals
    /// `expected_revision`; returns the stored record with the bumped revision.
    async fn update_registration(
        &self,
        id: Uuid,
        expected_revision: i64,
        registration: &WeeklyRegistration,
    ) -> StoreResult<WeeklyRegistration>;

    /// Deletes the registration if its stored revision still equals
    /// `expected_revision`.
    async fn delete_registration(&self, id: Uuid, expected_revision: i64) -> StoreResult<()>;

    async fn append_audit_log(&self, entry: &AuditLogEntry) -> StoreResult<()>;

    /// Most recent entries first, optionally filtered by stream.
    async fn list_audit_logs(
        &self,
        kind: Option<AuditKind>,
        limit: usize,
    ) -> StoreResult<Vec<AuditLogEntry>>;

    /// Argon2id PHC string for the admin passcode, if one has been set.
    async fn admin_secret_hash(&self) -> StoreResult<Option<String>>;

    /// Legacy plaintext passcode from older deployments.
    async fn admin_secret_plaintext(&self) -> StoreResult<Option<String>>;

    /// Stores a new hash and clears any legacy plaintext value.
    async fn set_admin_secret_hash(&self, hash: &str) -> StoreResult<()>;

    /// Replaces settings and every registration in one step.
    async fn replace_all(
        &self,
        settings: &Settings,
        registrations: &[WeeklyRegistration],
    ) -> StoreResult<()>;
}

/// Stored settings, or defaults when none have been saved yet.
pub async fn settings_or_default(store: &dyn ClubStore) -> StoreResult<Settings> {
    Ok(store.get_settings().await?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(StoreError::Unavailable("down".into()).is_transient());
        assert!(StoreError::Backend("boom".into()).is_transient());
        assert!(!StoreError::NotFound.is_transient());
        assert!(!StoreError::Conflict("week".into()).is_transient());
    }
}
