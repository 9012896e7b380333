//! Club settings: court capacity, fees and registration gate.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// How the extra-court fee is divided once capacity overflows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeSharing {
    /// Split the total extra fee among every registered player.
    #[default]
    AllPlayers,
    /// Split the total extra fee only among players beyond default capacity.
    ExtraPlayersOnly,
}

impl FromStr for FeeSharing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allPlayers" | "all_players" => Ok(FeeSharing::AllPlayers),
            "extraPlayersOnly" | "extra_players_only" => Ok(FeeSharing::ExtraPlayersOnly),
            _ => Err(format!("Unknown fee sharing policy: {}", s)),
        }
    }
}

impl std::fmt::Display for FeeSharing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeSharing::AllPlayers => write!(f, "allPlayers"),
            FeeSharing::ExtraPlayersOnly => write!(f, "extraPlayersOnly"),
        }
    }
}

pub const DEFAULT_COURTS_COUNT: u32 = 2;
pub const DEFAULT_PLAYERS_PER_COURT: u32 = 4;
pub const DEFAULT_EXTRA_COURT_FEE: f64 = 100_000.0;

/// Process-wide club configuration.
///
/// Every [`WeeklyRegistration`](super::WeeklyRegistration) owns a value copy of
/// this struct taken at submission time, so later edits never change
/// historic fee calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[validate(range(min = 1, max = 100, message = "Courts count must be between 1 and 100"))]
    pub courts_count: u32,

    #[validate(range(min = 1, max = 20, message = "Players per court must be between 1 and 20"))]
    pub players_per_court: u32,

    #[validate(custom(function = "validate_extra_court_fee"))]
    pub extra_court_fee: f64,

    pub registration_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "Court name must be at most 200 characters"))]
    pub court_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "Court address must be at most 500 characters"))]
    pub court_address: Option<String>,

    #[serde(default)]
    pub fee_sharing: FeeSharing,
}

fn validate_extra_court_fee(fee: f64) -> Result<(), ValidationError> {
    shared::validation::validate_fee(fee)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            courts_count: DEFAULT_COURTS_COUNT,
            players_per_court: DEFAULT_PLAYERS_PER_COURT,
            extra_court_fee: DEFAULT_EXTRA_COURT_FEE,
            registration_enabled: true,
            court_name: None,
            court_address: None,
            fee_sharing: FeeSharing::default(),
        }
    }
}

impl Settings {
    /// Number of players the default courts can hold.
    pub fn capacity(&self) -> u64 {
        u64::from(self.courts_count) * u64::from(self.players_per_court)
    }
}
