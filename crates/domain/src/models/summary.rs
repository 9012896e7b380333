//! Derived capacity and fee summary.

use serde::Serialize;

use super::FeeSharing;

/// Result of the capacity/fee computation for one week.
///
/// Always derived on demand; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSummary {
    pub total_players: u64,
    pub required_courts: u64,
    pub extra_courts: u64,
    pub extra_players_count: u64,
    pub total_extra_fee: f64,
    pub fee_per_player: f64,
    pub fee_sharing: FeeSharing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_info: Option<String>,
}

impl RegistrationSummary {
    pub fn with_week_info(mut self, week_info: impl Into<String>) -> Self {
        self.week_info = Some(week_info.into());
        self
    }

    /// Whether the registered players exceed the default courts.
    pub fn has_overflow(&self) -> bool {
        self.extra_courts > 0
    }
}
