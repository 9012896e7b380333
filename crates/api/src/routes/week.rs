//! Week calculator endpoint.

use axum::{extract::State, Json};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use domain::services::{format_range, next_week_range};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextWeekResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
    /// Monday 00:00 in club time.
    pub starts_at: Option<DateTime<FixedOffset>>,
    /// Sunday 23:59:59.999 in club time.
    pub ends_at: Option<DateTime<FixedOffset>>,
}

/// GET /api/v1/week/next
pub async fn next_week(State(state): State<AppState>) -> Json<NextWeekResponse> {
    Json(next_week_at(state.config.club_offset(), Utc::now()))
}

fn next_week_at(offset: FixedOffset, now: DateTime<Utc>) -> NextWeekResponse {
    let range = next_week_range(&now.with_timezone(&offset));
    NextWeekResponse {
        start: range.start,
        end: range.end,
        label: format_range(&range),
        starts_at: range.start_instant(offset),
        ends_at: range.end_instant(offset),
    }
}
