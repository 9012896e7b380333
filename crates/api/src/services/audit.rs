//! Best-effort audit persistence.

use chrono::Utc;
use domain::models::AuditLogEntry;
use domain::services::AuditLogBuilder;
use domain::store::ClubStore;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::extractors::RequestContext;

/// Writes audit entries without holding up the request that produced them.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn ClubStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn ClubStore>) -> Self {
        Self { store }
    }

    /// Builds the entry now and persists it on a background task.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn log(&self, builder: AuditLogBuilder, ctx: Option<&RequestContext>) -> AuditLogEntry {
        let builder = match ctx {
            Some(ctx) => builder.with_request_context(None, ctx.user_agent.clone(), ctx.url.clone()),
            None => builder,
        };
        let entry = builder.build(Utc::now());

        metrics::counter!(
            "audit_events_total",
            "kind" => entry.kind.to_string(),
            "action" => entry.action.to_string()
        )
        .increment(1);

        let store = Arc::clone(&self.store);
        let to_write = entry.clone();
        tokio::spawn(async move {
            match store.append_audit_log(&to_write).await {
                Ok(()) => debug!(action = %to_write.action, "Audit entry written"),
                Err(e) => warn!(
                    action = %to_write.action,
                    kind = %to_write.kind,
                    error = %e,
                    "Failed to write audit entry"
                ),
            }
        });

        entry
    }
}
