//! Audit log domain models.
//!
//! Admin actions and security events are written to the same append-only
//! collection, distinguished by [`AuditKind`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;

/// Which audit stream an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
    /// Authenticated admin mutations.
    Admin,
    /// Failed logins, rejected admin actions, tampered tokens.
    Security,
}

impl FromStr for AuditKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(AuditKind::Admin),
            "security" => Ok(AuditKind::Security),
            _ => Err(format!("Unknown audit kind: {}", s)),
        }
    }
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditKind::Admin => write!(f, "admin"),
            AuditKind::Security => write!(f, "security"),
        }
    }
}

/// Audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // Session
    AdminLogin,
    AdminLogout,
    AdminLoginFailed,
    UnauthorizedAdminAction,
    SessionTampered,

    // Admin mutations
    SettingsUpdate,
    PasscodeChange,
    RegistrationDelete,
    PlayerRemove,
    DataImport,
    DataExport,
}

impl AuditAction {
    /// The stream this action is recorded in.
    pub fn kind(&self) -> AuditKind {
        match self {
            AuditAction::AdminLoginFailed
            | AuditAction::UnauthorizedAdminAction
            | AuditAction::SessionTampered => AuditKind::Security,
            _ => AuditKind::Admin,
        }
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN_LOGIN" => Ok(AuditAction::AdminLogin),
            "ADMIN_LOGOUT" => Ok(AuditAction::AdminLogout),
            "ADMIN_LOGIN_FAILED" => Ok(AuditAction::AdminLoginFailed),
            "UNAUTHORIZED_ADMIN_ACTION" => Ok(AuditAction::UnauthorizedAdminAction),
            "SESSION_TAMPERED" => Ok(AuditAction::SessionTampered),
            "SETTINGS_UPDATE" => Ok(AuditAction::SettingsUpdate),
            "PASSCODE_CHANGE" => Ok(AuditAction::PasscodeChange),
            "REGISTRATION_DELETE" => Ok(AuditAction::RegistrationDelete),
            "PLAYER_REMOVE" => Ok(AuditAction::PlayerRemove),
            "DATA_IMPORT" => Ok(AuditAction::DataImport),
            "DATA_EXPORT" => Ok(AuditAction::DataExport),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::AdminLogin => "ADMIN_LOGIN",
            AuditAction::AdminLogout => "ADMIN_LOGOUT",
            AuditAction::AdminLoginFailed => "ADMIN_LOGIN_FAILED",
            AuditAction::UnauthorizedAdminAction => "UNAUTHORIZED_ADMIN_ACTION",
            AuditAction::SessionTampered => "SESSION_TAMPERED",
            AuditAction::SettingsUpdate => "SETTINGS_UPDATE",
            AuditAction::PasscodeChange => "PASSCODE_CHANGE",
            AuditAction::RegistrationDelete => "REGISTRATION_DELETE",
            AuditAction::PlayerRemove => "PLAYER_REMOVE",
            AuditAction::DataImport => "DATA_IMPORT",
            AuditAction::DataExport => "DATA_EXPORT",
        };
        write!(f, "{}", s)
    }
}

/// A stored audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub kind: AuditKind,
    pub action: AuditAction,
    pub details: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
}
