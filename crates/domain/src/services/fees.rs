//! Capacity/fee engine.
//!
//! Pure and O(1); called live while players are being added and again when
//! rendering stored weeks, and both must agree.

use crate::models::{FeeSharing, RegistrationSummary, Settings, WeeklyRegistration};
use crate::services::week::format_range;

/// Computes courts and fees for `player_count` players under `settings`.
///
/// `week_info` is left empty; see [`summarize_registration`].
pub fn compute_summary(player_count: usize, settings: &Settings) -> RegistrationSummary {
    let players = player_count as u64;
    let per_court = u64::from(settings.players_per_court);
    let courts = u64::from(settings.courts_count);

    let extra_players_count = players.saturating_sub(settings.capacity());
    let extra_courts = if extra_players_count > 0 && per_court > 0 {
        extra_players_count.div_ceil(per_court)
    } else {
        0
    };
    let total_extra_fee = extra_courts as f64 * settings.extra_court_fee;

    let fee_per_player = match settings.fee_sharing {
        FeeSharing::AllPlayers if extra_courts > 0 && players > 0 => {
            total_extra_fee / players as f64
        }
        FeeSharing::ExtraPlayersOnly if extra_players_count > 0 => {
            total_extra_fee / extra_players_count as f64
        }
        _ => 0.0,
    };

    RegistrationSummary {
        total_players: players,
        required_courts: courts + extra_courts,
        extra_courts,
        extra_players_count,
        total_extra_fee,
        fee_per_player,
        fee_sharing: settings.fee_sharing,
        week_info: None,
    }
}

/// Summary of a stored week, using the settings snapshot it was registered under.
pub fn summarize_registration(registration: &WeeklyRegistration) -> RegistrationSummary {
    compute_summary(registration.player_count(), &registration.settings)
        .with_week_info(format_range(&registration.week()))
}
