//! Weekly registration entity.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{Player, Settings, WeeklyRegistration};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for weekly registrations. Players and the settings
/// snapshot are stored as JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct WeeklyRegistrationEntity {
    pub id: Uuid,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub players: Json<Vec<Player>>,
    pub settings: Json<Settings>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WeeklyRegistrationEntity> for WeeklyRegistration {
    fn from(entity: WeeklyRegistrationEntity) -> Self {
        Self {
            id: entity.id,
            week_start: entity.week_start,
            week_end: entity.week_end,
            players: entity.players.0,
            settings: entity.settings.0,
            revision: entity.revision,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
