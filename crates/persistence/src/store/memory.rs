//! In-memory store.
//!
//! Used for tests, for the `memory` storage backend, and as the secondary
//! tier behind PostgreSQL. A `BTreeMap` week index enforces one registration
//! per week the same way the unique index does in SQL.

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::models::{AuditKind, AuditLogEntry, Settings, WeeklyRegistration};
use domain::store::{ClubStore, StoreError, StoreResult};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Audit entries kept in memory; the oldest are dropped first.
pub const MAX_AUDIT_ENTRIES: usize = 1000;

#[derive(Debug, Default)]
struct Arena {
    settings: Option<Settings>,
    registrations: HashMap<Uuid, WeeklyRegistration>,
    weeks: BTreeMap<NaiveDate, Uuid>,
    audit_logs: VecDeque<AuditLogEntry>,
    secret_hash: Option<String>,
    legacy_plaintext: Option<String>,
}

impl Arena {
    fn insert(&mut self, registration: WeeklyRegistration) -> StoreResult<()> {
        if self.registrations.contains_key(&registration.id) {
            return Err(StoreError::Conflict(format!(
                "registration {} already exists",
                registration.id
            )));
        }
        if self.weeks.contains_key(&registration.week_start) {
            return Err(StoreError::Conflict(format!(
                "week starting {} is already registered",
                registration.week_start
            )));
        }
        self.weeks.insert(registration.week_start, registration.id);
        self.registrations.insert(registration.id, registration);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemoryClubStore {
    arena: RwLock<Arena>,
    available: AtomicBool,
    audit_capacity: usize,
}

impl Default for MemoryClubStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClubStore {
    pub fn new() -> Self {
        Self {
            arena: RwLock::new(Arena::default()),
            available: AtomicBool::new(true),
            audit_capacity: MAX_AUDIT_ENTRIES,
        }
    }

    /// Overrides how many audit entries are retained (at least one).
    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity.max(1);
        self
    }

    /// Seeds a legacy plaintext passcode, as carried over from older deployments.
    pub fn with_legacy_plaintext(mut self, code: impl Into<String>) -> Self {
        self.arena.get_mut().legacy_plaintext = Some(code.into());
        self
    }

    /// Simulates an outage: every call fails with `Unavailable` while false.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        }
    }
}

#[async_trait]
impl ClubStore for MemoryClubStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }

    async fn get_settings(&self) -> StoreResult<Option<Settings>> {
        self.check_available()?;
        Ok(self.arena.read().await.settings.clone())
    }

    async fn update_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.check_available()?;
        self.arena.write().await.settings = Some(settings.clone());
        Ok(())
    }

    async fn list_registrations(&self) -> StoreResult<Vec<WeeklyRegistration>> {
        self.check_available()?;
        let arena = self.arena.read().await;
        Ok(arena
            .weeks
            .values()
            .rev()
            .filter_map(|id| arena.registrations.get(id).cloned())
            .collect())
    }

    async fn get_registration(&self, id: Uuid) -> StoreResult<Option<WeeklyRegistration>> {
        self.check_available()?;
        Ok(self.arena.read().await.registrations.get(&id).cloned())
    }

    async fn create_registration(&self, registration: &WeeklyRegistration) -> StoreResult<()> {
        self.check_available()?;
        self.arena.write().await.insert(registration.clone())
    }

    async fn insert_registration_if_absent(
        &self,
        registration: &WeeklyRegistration,
    ) -> StoreResult<WeeklyRegistration> {
        self.check_available()?;
        self.arena.write().await.insert(registration.clone())?;
        Ok(registration.clone())
    }

    async fn update_registration(
        &self,
        id: Uuid,
        expected_revision: i64,
        registration: &WeeklyRegistration,
    ) -> StoreResult<WeeklyRegistration> {
        self.check_available()?;
        let mut arena = self.arena.write().await;
        let stored = arena.registrations.get_mut(&id).ok_or(StoreError::NotFound)?;
        if stored.revision != expected_revision {
            return Err(StoreError::Conflict(format!(
                "registration {} changed since revision {}",
                id, expected_revision
            )));
        }

        stored.players = registration.players.clone();
        stored.settings = registration.settings.clone();
        stored.updated_at = registration.updated_at;
        stored.revision += 1;
        Ok(stored.clone())
    }

    async fn delete_registration(&self, id: Uuid, expected_revision: i64) -> StoreResult<()> {
        self.check_available()?;
        let mut arena = self.arena.write().await;
        let stored = arena.registrations.get(&id).ok_or(StoreError::NotFound)?;
        if stored.revision != expected_revision {
            return Err(StoreError::Conflict(format!(
                "registration {} changed since revision {}",
                id, expected_revision
            )));
        }
        let removed = arena.registrations.remove(&id).ok_or(StoreError::NotFound)?;
        arena.weeks.remove(&removed.week_start);
        Ok(())
    }

    async fn append_audit_log(&self, entry: &AuditLogEntry) -> StoreResult<()> {
        self.check_available()?;
        let mut arena = self.arena.write().await;
        while arena.audit_logs.len() >= self.audit_capacity {
            arena.audit_logs.pop_front();
        }
        arena.audit_logs.push_back(entry.clone());
        Ok(())
    }

    async fn list_audit_logs(
        &self,
        kind: Option<AuditKind>,
        limit: usize,
    ) -> StoreResult<Vec<AuditLogEntry>> {
        self.check_available()?;
        let arena = self.arena.read().await;
        let mut entries: Vec<AuditLogEntry> = arena
            .audit_logs
            .iter()
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn admin_secret_hash(&self) -> StoreResult<Option<String>> {
        self.check_available()?;
        Ok(self.arena.read().await.secret_hash.clone())
    }

    async fn admin_secret_plaintext(&self) -> StoreResult<Option<String>> {
        self.check_available()?;
        Ok(self.arena.read().await.legacy_plaintext.clone())
    }

    async fn set_admin_secret_hash(&self, hash: &str) -> StoreResult<()> {
        self.check_available()?;
        let mut arena = self.arena.write().await;
        arena.secret_hash = Some(hash.to_string());
        arena.legacy_plaintext = None;
        Ok(())
    }

    async fn replace_all(
        &self,
        settings: &Settings,
        registrations: &[WeeklyRegistration],
    ) -> StoreResult<()> {
        self.check_available()?;

        let mut replacement = Arena::default();
        for registration in registrations {
            replacement.insert(registration.clone())?;
        }

        let mut arena = self.arena.write().await;
        arena.settings = Some(settings.clone());
        arena.registrations = replacement.registrations;
        arena.weeks = replacement.weeks;
        Ok(())
    }
}
