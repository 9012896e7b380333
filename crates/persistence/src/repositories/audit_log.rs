//! Audit log repository for database operations.

use domain::models::{AuditKind, AuditLogEntry};
use sqlx::PgPool;

use crate::entities::AuditLogEntity;
use crate::metrics::QueryTimer;

/// Repository for the append-only `audit_logs` table.
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &AuditLogEntry) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_audit_log");
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (id, kind, action, details, session_id, user_agent, url, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.kind.to_string())
        .bind(entry.action.to_string())
        .bind(&entry.details)
        .bind(entry.session_id.as_deref())
        .bind(entry.user_agent.as_deref())
        .bind(entry.url.as_deref())
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Most recent first, optionally restricted to one stream.
    pub async fn list(
        &self,
        kind: Option<AuditKind>,
        limit: i64,
    ) -> Result<Vec<AuditLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_audit_logs");
        let result = sqlx::query_as::<_, AuditLogEntity>(
            r#"
            SELECT id, kind, action, details, session_id, user_agent, url, timestamp
            FROM audit_logs
            WHERE ($1::text IS NULL OR kind = $1)
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(kind.map(|k| k.to_string()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
