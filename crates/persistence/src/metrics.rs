//! Postgres-side metrics for the club store.
//!
//! Every repository query is timed under a stable name such as
//! `insert_weekly_registration` or `list_audit_logs`, so the latency
//! histogram can be broken down per statement. Pool gauges are refreshed
//! whenever the Postgres store is pinged by the readiness check.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::{Duration, Instant};

const QUERY_DURATION: &str = "club_store_query_duration_seconds";

pub fn record_query_duration(query: &'static str, elapsed: Duration) {
    histogram!(QUERY_DURATION, "query" => query).record(elapsed.as_secs_f64());
}

/// Publishes connection counts for `pool`.
///
/// Busy connections are derived as `size - idle`; sqlx does not report them
/// directly.
pub fn record_pool_metrics(pool: &PgPool) {
    let open = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("club_store_connections_open").set(open as f64);
    gauge!("club_store_connections_idle").set(idle as f64);
    gauge!("club_store_connections_busy").set(open.saturating_sub(idle) as f64);
}

/// Latency sample for one repository statement, started on construction.
///
/// Call [`QueryTimer::record`] once the statement has completed, whether it
/// succeeded or not, so failing queries still show up in the histogram.
pub struct QueryTimer {
    query: &'static str,
    started: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            started: Instant::now(),
        }
    }

    /// Records the sample and returns the measured latency.
    pub fn record(self) -> Duration {
        let elapsed = self.started.elapsed();
        record_query_duration(self.query, elapsed);
        elapsed
    }
}
