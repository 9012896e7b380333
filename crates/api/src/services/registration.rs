//! Registration workflow.
//!
//! Plans a submission against the stored weeks and applies it with
//! conditional writes. A lost race (another request created the week or
//! bumped its revision first) re-reads and re-plans, up to
//! [`MAX_ATTEMPTS`] times.

use chrono::{DateTime, FixedOffset, Utc};
use domain::models::{Player, RegistrationSummary, WeeklyRegistration};
use domain::services::{
    next_week_range, plan_submission, remove_player, summarize_registration,
    validate_submission, MergeError, PlayerRemoval, SubmissionError, SubmissionPlan,
};
use domain::store::{settings_or_default, ClubStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

pub const MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Registration is currently closed")]
    Closed,

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Registration is being updated by another request, please retry")]
    Contention,
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Closed => ApiError::Validation(err.to_string()),
            RegistrationError::Submission(e) => e.into(),
            RegistrationError::Merge(e) => e.into(),
            RegistrationError::Store(e) => e.into(),
            RegistrationError::Contention => ApiError::Conflict(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionAction {
    Create,
    Merge,
}

/// What a submission did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub action: SubmissionAction,
    pub registration: WeeklyRegistration,
    pub summary: RegistrationSummary,
    pub added: usize,
    pub rejected_duplicates: Vec<String>,
}

impl SubmissionOutcome {
    fn new(
        action: SubmissionAction,
        registration: WeeklyRegistration,
        added: usize,
        rejected_duplicates: Vec<String>,
    ) -> Self {
        Self {
            action,
            summary: summarize_registration(&registration),
            registration,
            added,
            rejected_duplicates,
        }
    }
}

/// What removing a player did.
#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    pub player: Player,
    /// `None` when the week had no players left and was deleted.
    pub registration: Option<WeeklyRegistration>,
}

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn ClubStore>,
    offset: FixedOffset,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn ClubStore>, offset: FixedOffset) -> Self {
        Self { store, offset }
    }

    /// Registers `names` for next week, merging into an existing record.
    pub async fn submit(
        &self,
        names: &[String],
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, RegistrationError> {
        let names = validate_submission(names)?;

        let settings = settings_or_default(self.store.as_ref()).await?;
        if !settings.registration_enabled {
            return Err(RegistrationError::Closed);
        }

        let week = next_week_range(&now.with_timezone(&self.offset));

        for attempt in 1..=MAX_ATTEMPTS {
            let players = names.iter().map(|n| Player::new(n.as_str(), now)).collect();
            let incoming = WeeklyRegistration::new(week, players, settings.clone(), now);
            let existing = self.store.list_registrations().await?;

            match plan_submission(incoming, &existing, now)? {
                SubmissionPlan::Create(registration) => {
                    match self.store.insert_registration_if_absent(&registration).await {
                        Ok(saved) => {
                            info!(
                                registration_id = %saved.id,
                                week_start = %saved.week_start,
                                players = saved.player_count(),
                                "Weekly registration created"
                            );
                            metrics::counter!("registrations_created_total").increment(1);
                            metrics::counter!("players_added_total")
                                .increment(saved.player_count() as u64);
                            let added = saved.player_count();
                            return Ok(SubmissionOutcome::new(
                                SubmissionAction::Create,
                                saved,
                                added,
                                Vec::new(),
                            ));
                        }
                        Err(StoreError::Conflict(reason)) => {
                            debug!(attempt, %reason, "Week created concurrently, re-planning");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                SubmissionPlan::Merge {
                    merged,
                    accepted,
                    rejected_duplicates,
                } => {
                    match self
                        .store
                        .update_registration(merged.id, merged.revision, &merged)
                        .await
                    {
                        Ok(saved) => {
                            info!(
                                registration_id = %saved.id,
                                added = accepted.len(),
                                rejected = rejected_duplicates.len(),
                                "Players merged into weekly registration"
                            );
                            metrics::counter!("registrations_merged_total").increment(1);
                            metrics::counter!("players_added_total")
                                .increment(accepted.len() as u64);
                            record_duplicates(&rejected_duplicates);
                            return Ok(SubmissionOutcome::new(
                                SubmissionAction::Merge,
                                saved,
                                accepted.len(),
                                rejected_duplicates,
                            ));
                        }
                        Err(StoreError::Conflict(_)) | Err(StoreError::NotFound) => {
                            debug!(attempt, registration_id = %merged.id, "Revision moved, re-planning");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                SubmissionPlan::NoOp {
                    existing,
                    rejected_duplicates,
                } => {
                    warn!(
                        registration_id = %existing.id,
                        rejected = rejected_duplicates.len(),
                        "Every submitted player is already registered"
                    );
                    record_duplicates(&rejected_duplicates);
                    return Ok(SubmissionOutcome::new(
                        SubmissionAction::Merge,
                        existing,
                        0,
                        rejected_duplicates,
                    ));
                }
            }

            metrics::counter!("registration_conflict_retries_total").increment(1);
        }

        warn!(week_start = %week.start, "Gave up registering after repeated conflicts");
        Err(RegistrationError::Contention)
    }

    /// The registration for next week, if any.
    pub async fn current(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<WeeklyRegistration>, RegistrationError> {
        let week = next_week_range(&now.with_timezone(&self.offset));
        let registrations = self.store.list_registrations().await?;
        Ok(registrations
            .into_iter()
            .find(|r| domain::services::same_week(&r.week(), &week)))
    }

    /// Removes one player; deletes the week when it empties.
    pub async fn remove_player(
        &self,
        registration_id: Uuid,
        player_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RemovalOutcome, RegistrationError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let registration = self
                .store
                .get_registration(registration_id)
                .await?
                .ok_or(StoreError::NotFound)?;
            let player = registration
                .players
                .iter()
                .find(|p| p.id == player_id)
                .cloned()
                .ok_or(MergeError::PlayerNotFound(player_id))?;

            match remove_player(&registration, player_id, now)? {
                PlayerRemoval::Emptied(id) => {
                    match self.store.delete_registration(id, registration.revision).await {
                        Ok(()) => {
                            info!(registration_id = %id, "Last player removed, registration deleted");
                            return Ok(RemovalOutcome {
                                player,
                                registration: None,
                            });
                        }
                        Err(StoreError::Conflict(_)) => {
                            debug!(attempt, registration_id = %id, "Revision moved, retrying removal");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                PlayerRemoval::Updated(updated) => {
                    match self
                        .store
                        .update_registration(updated.id, registration.revision, &updated)
                        .await
                    {
                        Ok(saved) => {
                            info!(registration_id = %saved.id, player_id = %player_id, "Player removed");
                            return Ok(RemovalOutcome {
                                player,
                                registration: Some(saved),
                            });
                        }
                        Err(StoreError::Conflict(_)) => {
                            debug!(attempt, registration_id = %registration_id, "Revision moved, retrying removal");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Err(RegistrationError::Contention)
    }
}

fn record_duplicates(rejected: &[String]) {
    if !rejected.is_empty() {
        metrics::counter!("duplicate_players_rejected_total").increment(rejected.len() as u64);
    }
}
