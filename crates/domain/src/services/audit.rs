//! Audit log construction.
//!
//! Route handlers describe what happened through [`AuditLogBuilder`] or the
//! [`audit_helpers`] shortcuts; the API layer persists the result without
//! blocking the request.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value as JsonValue};
use uuid::Uuid;

use crate::models::{AuditAction, AuditKind, AuditLogEntry, Settings};

/// Fluent builder for [`AuditLogEntry`].
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
    kind: AuditKind,
    action: AuditAction,
    details: Map<String, JsonValue>,
    session_id: Option<String>,
    user_agent: Option<String>,
    url: Option<String>,
}

impl AuditLogBuilder {
    fn new(kind: AuditKind, action: AuditAction) -> Self {
        Self {
            kind,
            action,
            details: Map::new(),
            session_id: None,
            user_agent: None,
            url: None,
        }
    }

    /// An entry in the admin stream.
    pub fn admin_action(action: AuditAction) -> Self {
        Self::new(AuditKind::Admin, action)
    }

    /// An entry in the security stream.
    pub fn security_event(action: AuditAction) -> Self {
        Self::new(AuditKind::Security, action)
    }

    /// An entry in whichever stream the action belongs to.
    pub fn for_action(action: AuditAction) -> Self {
        Self::new(action.kind(), action)
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Merge an object of details; non-object values are stored under `value`.
    pub fn with_details(mut self, details: JsonValue) -> Self {
        match details {
            JsonValue::Object(map) => self.details.extend(map),
            JsonValue::Null => {}
            other => {
                self.details.insert("value".to_string(), other);
            }
        }
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach whichever request context is known.
    pub fn with_request_context(
        mut self,
        session_id: Option<String>,
        user_agent: Option<String>,
        url: Option<String>,
    ) -> Self {
        self.session_id = session_id.or(self.session_id);
        self.user_agent = user_agent.or(self.user_agent);
        self.url = url.or(self.url);
        self
    }

    pub fn build(self, now: DateTime<Utc>) -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            kind: self.kind,
            action: self.action,
            details: JsonValue::Object(self.details),
            session_id: self.session_id,
            user_agent: self.user_agent,
            url: self.url,
            timestamp: now,
        }
    }
}

/// Convenience builders for the events the service records.
pub mod audit_helpers {
    use super::*;

    pub fn admin_login(session_id: &str) -> AuditLogBuilder {
        AuditLogBuilder::admin_action(AuditAction::AdminLogin).with_session(session_id)
    }

    pub fn admin_logout(session_id: &str) -> AuditLogBuilder {
        AuditLogBuilder::admin_action(AuditAction::AdminLogout).with_session(session_id)
    }

    /// Failed login. `redacted_input` must already be masked.
    pub fn login_failed(redacted_input: &str, reason: &str) -> AuditLogBuilder {
        AuditLogBuilder::security_event(AuditAction::AdminLoginFailed)
            .with_detail("attemptedCode", redacted_input)
            .with_detail("reason", reason)
    }

    /// An admin-only operation attempted without a valid session.
    pub fn unauthorized_admin_action(attempted: &str, reason: &str) -> AuditLogBuilder {
        AuditLogBuilder::security_event(AuditAction::UnauthorizedAdminAction)
            .with_detail("attemptedAction", attempted)
            .with_detail("reason", reason)
    }

    pub fn session_tampered(attempted: &str) -> AuditLogBuilder {
        AuditLogBuilder::security_event(AuditAction::SessionTampered)
            .with_detail("attemptedAction", attempted)
    }

    pub fn settings_updated(previous: &Settings, updated: &Settings) -> AuditLogBuilder {
        AuditLogBuilder::admin_action(AuditAction::SettingsUpdate)
            .with_detail("previous", json!(previous))
            .with_detail("updated", json!(updated))
    }

    pub fn passcode_changed() -> AuditLogBuilder {
        AuditLogBuilder::admin_action(AuditAction::PasscodeChange)
    }

    pub fn registration_deleted(
        registration_id: Uuid,
        week_start: NaiveDate,
        player_count: usize,
    ) -> AuditLogBuilder {
        AuditLogBuilder::admin_action(AuditAction::RegistrationDelete)
            .with_detail("registrationId", registration_id.to_string())
            .with_detail("weekStart", week_start.to_string())
            .with_detail("playerCount", player_count)
    }

    pub fn player_removed(
        registration_id: Uuid,
        player_id: Uuid,
        player_name: &str,
        registration_deleted: bool,
    ) -> AuditLogBuilder {
        AuditLogBuilder::admin_action(AuditAction::PlayerRemove)
            .with_detail("registrationId", registration_id.to_string())
            .with_detail("playerId", player_id.to_string())
            .with_detail("playerName", player_name)
            .with_detail("registrationDeleted", registration_deleted)
    }

    pub fn data_exported(total_registrations: usize, total_players: usize) -> AuditLogBuilder {
        AuditLogBuilder::admin_action(AuditAction::DataExport)
            .with_detail("totalRegistrations", total_registrations)
            .with_detail("totalPlayers", total_players)
    }

    pub fn data_imported(total_registrations: usize, total_players: usize) -> AuditLogBuilder {
        AuditLogBuilder::admin_action(AuditAction::DataImport)
            .with_detail("totalRegistrations", total_registrations)
            .with_detail("totalPlayers", total_players)
    }
}
