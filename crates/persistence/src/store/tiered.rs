//! Primary store with a read-fallback secondary.
//!
//! Reads try the primary first and fall back to the secondary on transient
//! failures. Successful primary reads refresh the secondary best-effort.
//! Writes go to the primary only and surface its errors unchanged.

use async_trait::async_trait;
use domain::models::{AuditKind, AuditLogEntry, Settings, WeeklyRegistration};
use domain::store::{settings_or_default, ClubStore, StoreError, StoreResult};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct TieredClubStore {
    primary: Arc<dyn ClubStore>,
    secondary: Arc<dyn ClubStore>,
}

impl TieredClubStore {
    pub fn new(primary: Arc<dyn ClubStore>, secondary: Arc<dyn ClubStore>) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &Arc<dyn ClubStore> {
        &self.primary
    }

    pub fn secondary(&self) -> &Arc<dyn ClubStore> {
        &self.secondary
    }
}

/// Retries a failed primary read against the secondary when the error is transient.
macro_rules! fallback {
    ($self:ident, $op:literal, $err:expr, |$store:ident| $call:expr) => {{
        let err: StoreError = $err;
        if !err.is_transient() {
            return Err(err);
        }
        warn!(operation = $op, error = %err, "Primary store read failed, using fallback");
        metrics::counter!("store_fallback_reads_total", "operation" => $op).increment(1);
        let $store = &$self.secondary;
        $call
    }};
}

#[async_trait]
impl ClubStore for TieredClubStore {
    fn backend_name(&self) -> &'static str {
        "tiered"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.primary.ping().await
    }

    async fn get_settings(&self) -> StoreResult<Option<Settings>> {
        match self.primary.get_settings().await {
            Ok(settings) => {
                if let Some(ref settings) = settings {
                    if let Err(e) = self.secondary.update_settings(settings).await {
                        debug!(error = %e, "Could not refresh fallback settings");
                    }
                }
                Ok(settings)
            }
            Err(e) => fallback!(self, "get_settings", e, |store| store.get_settings().await),
        }
    }

    async fn update_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.primary.update_settings(settings).await
    }

    async fn list_registrations(&self) -> StoreResult<Vec<WeeklyRegistration>> {
        match self.primary.list_registrations().await {
            Ok(registrations) => {
                let settings = settings_or_default(self.secondary.as_ref()).await;
                let refreshed = match settings {
                    Ok(settings) => self.secondary.replace_all(&settings, &registrations).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = refreshed {
                    debug!(error = %e, "Could not refresh fallback registrations");
                }
                Ok(registrations)
            }
            Err(e) => fallback!(self, "list_registrations", e, |store| store
                .list_registrations()
                .await),
        }
    }

    async fn get_registration(&self, id: Uuid) -> StoreResult<Option<WeeklyRegistration>> {
        match self.primary.get_registration(id).await {
            Err(e) => fallback!(self, "get_registration", e, |store| store
                .get_registration(id)
                .await),
            ok => ok,
        }
    }

    async fn create_registration(&self, registration: &WeeklyRegistration) -> StoreResult<()> {
        self.primary.create_registration(registration).await
    }

    async fn insert_registration_if_absent(
        &self,
        registration: &WeeklyRegistration,
    ) -> StoreResult<WeeklyRegistration> {
        self.primary.insert_registration_if_absent(registration).await
    }

    async fn update_registration(
        &self,
        id: Uuid,
        expected_revision: i64,
        registration: &WeeklyRegistration,
    ) -> StoreResult<WeeklyRegistration> {
        self.primary
            .update_registration(id, expected_revision, registration)
            .await
    }

    async fn delete_registration(&self, id: Uuid, expected_revision: i64) -> StoreResult<()> {
        self.primary.delete_registration(id, expected_revision).await
    }

    async fn append_audit_log(&self, entry: &AuditLogEntry) -> StoreResult<()> {
        self.primary.append_audit_log(entry).await
    }

    async fn list_audit_logs(
        &self,
        kind: Option<AuditKind>,
        limit: usize,
    ) -> StoreResult<Vec<AuditLogEntry>> {
        match self.primary.list_audit_logs(kind, limit).await {
            Err(e) => fallback!(self, "list_audit_logs", e, |store| store
                .list_audit_logs(kind, limit)
                .await),
            ok => ok,
        }
    }

    async fn admin_secret_hash(&self) -> StoreResult<Option<String>> {
        match self.primary.admin_secret_hash().await {
            Ok(hash) => {
                if let Some(ref hash) = hash {
                    if let Err(e) = self.secondary.set_admin_secret_hash(hash).await {
                        debug!(error = %e, "Could not refresh fallback admin secret");
                    }
                }
                Ok(hash)
            }
            Err(e) => fallback!(self, "admin_secret_hash", e, |store| store
                .admin_secret_hash()
                .await),
        }
    }

    async fn admin_secret_plaintext(&self) -> StoreResult<Option<String>> {
        match self.primary.admin_secret_plaintext().await {
            Err(e) => fallback!(self, "admin_secret_plaintext", e, |store| store
                .admin_secret_plaintext()
                .await),
            ok => ok,
        }
    }

    async fn set_admin_secret_hash(&self, hash: &str) -> StoreResult<()> {
        self.primary.set_admin_secret_hash(hash).await
    }

    async fn replace_all(
        &self,
        settings: &Settings,
        registrations: &[WeeklyRegistration],
    ) -> StoreResult<()> {
        self.primary.replace_all(settings, registrations).await
    }
}
