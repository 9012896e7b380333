//! Registration merge rule.
//!
//! Decides whether a submission creates a new weekly record or is merged
//! into the existing record for the same week. Planning is pure; applying
//! the plan against a store is the caller's job.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Player, WeeklyRegistration};
use crate::services::week::same_week;
use shared::validation::{normalize_player_name, validate_player_name};

/// Submission rejected before any write.
#[derive(Debug, Error, PartialEq)]
pub enum SubmissionError {
    #[error("At least one player name is required")]
    Empty,

    #[error("Invalid player name '{name}': {message}")]
    InvalidName { name: String, message: String },

    #[error("Player '{0}' appears more than once in this submission")]
    DuplicateInSubmission(String),
}

/// Data-integrity problems found while planning or editing.
#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    #[error("{count} registrations exist for the week starting {week_start}")]
    DuplicateWeek { week_start: NaiveDate, count: usize },

    #[error("Player {0} is not part of this registration")]
    PlayerNotFound(Uuid),
}

/// Outcome of planning a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionPlan {
    /// No record for the week yet; persist the incoming one as-is.
    Create(WeeklyRegistration),
    /// Append the accepted players to the existing record.
    Merge {
        merged: WeeklyRegistration,
        accepted: Vec<Player>,
        rejected_duplicates: Vec<String>,
    },
    /// Every submitted name is already registered; nothing to write.
    NoOp {
        existing: WeeklyRegistration,
        rejected_duplicates: Vec<String>,
    },
}

impl SubmissionPlan {
    pub fn rejected_duplicates(&self) -> &[String] {
        match self {
            SubmissionPlan::Create(_) => &[],
            SubmissionPlan::Merge {
                rejected_duplicates,
                ..
            }
            | SubmissionPlan::NoOp {
                rejected_duplicates,
                ..
            } => rejected_duplicates,
        }
    }
}

/// Outcome of removing a player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerRemoval {
    /// Players remain; update the record in place.
    Updated(WeeklyRegistration),
    /// The last player was removed; delete the record.
    Emptied(Uuid),
}

/// Validates raw submitted names.
///
/// Rejects empty submissions, blank or over-long names, and names repeated
/// within the submission (case/whitespace-insensitive). Names are returned
/// unchanged so the stored display form matches what was typed.
pub fn validate_submission(names: &[String]) -> Result<Vec<String>, SubmissionError> {
    if names.is_empty() {
        return Err(SubmissionError::Empty);
    }

    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        validate_player_name(name).map_err(|e| SubmissionError::InvalidName {
            name: name.clone(),
            message: e
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string()),
        })?;
        if !seen.insert(normalize_player_name(name)) {
            return Err(SubmissionError::DuplicateInSubmission(name.trim().to_string()));
        }
    }

    Ok(names.to_vec())
}

/// Plans how `incoming` lands relative to the `existing` registrations.
pub fn plan_submission(
    incoming: WeeklyRegistration,
    existing: &[WeeklyRegistration],
    now: DateTime<Utc>,
) -> Result<SubmissionPlan, MergeError> {
    let week = incoming.week();
    let matches: Vec<&WeeklyRegistration> = existing
        .iter()
        .filter(|r| same_week(&r.week(), &week))
        .collect();

    let current = match matches.as_slice() {
        [] => return Ok(SubmissionPlan::Create(incoming)),
        [single] => *single,
        many => {
            return Err(MergeError::DuplicateWeek {
                week_start: week.start,
                count: many.len(),
            })
        }
    };

    let mut known: HashSet<String> = current.players.iter().map(Player::normalized_name).collect();
    let mut accepted = Vec::new();
    let mut rejected_duplicates = Vec::new();

    for player in incoming.players {
        if known.insert(player.normalized_name()) {
            accepted.push(player);
        } else {
            rejected_duplicates.push(player.name);
        }
    }

    if accepted.is_empty() {
        return Ok(SubmissionPlan::NoOp {
            existing: current.clone(),
            rejected_duplicates,
        });
    }

    let mut merged = current.clone();
    merged.players.extend(accepted.iter().cloned());
    merged.settings = incoming.settings;
    merged.updated_at = now;

    Ok(SubmissionPlan::Merge {
        merged,
        accepted,
        rejected_duplicates,
    })
}

/// Removes one player, reporting whether the record should be updated or deleted.
pub fn remove_player(
    registration: &WeeklyRegistration,
    player_id: Uuid,
    now: DateTime<Utc>,
) -> Result<PlayerRemoval, MergeError> {
    if !registration.players.iter().any(|p| p.id == player_id) {
        return Err(MergeError::PlayerNotFound(player_id));
    }

    let mut updated = registration.clone();
    updated.players.retain(|p| p.id != player_id);

    if updated.players.is_empty() {
        return Ok(PlayerRemoval::Emptied(registration.id));
    }

    updated.updated_at = now;
    Ok(PlayerRemoval::Updated(updated))
}
