//! Audit log entity.

use chrono::{DateTime, Utc};
use domain::models::AuditLogEntry;
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for audit logs.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    pub id: Uuid,

    /// Stream: `admin` or `security`.
    pub kind: String,

    /// SCREAMING_SNAKE_CASE action name.
    pub action: String,

    pub details: serde_json::Value,
    pub session_id: Option<String>,
    pub user_agent: Option<String>,
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<AuditLogEntity> for AuditLogEntry {
    type Error = String;

    fn try_from(entity: AuditLogEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            kind: entity.kind.parse()?,
            action: entity.action.parse()?,
            details: entity.details,
            session_id: entity.session_id,
            user_agent: entity.user_agent,
            url: entity.url,
            timestamp: entity.timestamp,
        })
    }
}
