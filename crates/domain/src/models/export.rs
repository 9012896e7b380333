//! Export/import document format.
//!
//! ```json
//! { "settings": {..}, "registrations": [..],
//!   "metadata": { "version", "createdAt", "lastUpdated", "totalRegistrations", "totalPlayers" } }
//! ```
//!
//! Dates are ISO-8601 strings on disk.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use thiserror::Error;
use validator::Validate;

use super::{Settings, WeeklyRegistration};

/// Current export format version.
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Sections every import document must carry.
const REQUIRED_SECTIONS: [&str; 3] = ["settings", "registrations", "metadata"];

#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("Import document must be a JSON object")]
    NotAnObject,

    #[error("Import document is missing the '{0}' section")]
    MissingSection(&'static str),

    #[error("Malformed import document: {0}")]
    Malformed(String),

    #[error("Invalid settings in import document: {0}")]
    InvalidSettings(String),

    #[error("Registration {0} does not cover a Monday-Sunday week")]
    InvalidWeek(uuid::Uuid),

    #[error("More than one registration for the week starting {0}")]
    DuplicateWeek(NaiveDate),

    #[error("Registration {0} has no players")]
    EmptyWeek(uuid::Uuid),

    #[error("Player '{name}' appears more than once in the week starting {week_start}")]
    DuplicatePlayer { week_start: NaiveDate, name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub total_registrations: usize,
    pub total_players: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub settings: Settings,
    pub registrations: Vec<WeeklyRegistration>,
    pub metadata: ExportMetadata,
}

impl ExportDocument {
    /// Builds an export snapshot.
    ///
    /// `createdAt` is the oldest registration's creation time and
    /// `lastUpdated` the newest update, both falling back to `now`.
    pub fn build(
        settings: Settings,
        registrations: Vec<WeeklyRegistration>,
        now: DateTime<Utc>,
    ) -> Self {
        let created_at = registrations
            .iter()
            .map(|r| r.created_at)
            .min()
            .unwrap_or(now);
        let last_updated = registrations
            .iter()
            .map(|r| r.updated_at)
            .max()
            .unwrap_or(now);
        let total_players = registrations.iter().map(|r| r.players.len()).sum();

        Self {
            metadata: ExportMetadata {
                version: EXPORT_FORMAT_VERSION.to_string(),
                created_at,
                last_updated,
                total_registrations: registrations.len(),
                total_players,
            },
            settings,
            registrations,
        }
    }

    /// Parses and validates an import document.
    pub fn from_json(value: JsonValue) -> Result<Self, ImportError> {
        let object = value.as_object().ok_or(ImportError::NotAnObject)?;
        for section in REQUIRED_SECTIONS {
            if !object.contains_key(section) {
                return Err(ImportError::MissingSection(section));
            }
        }

        let document: Self =
            serde_json::from_value(value).map_err(|e| ImportError::Malformed(e.to_string()))?;
        document.validate_contents()?;
        Ok(document)
    }

    /// Checks settings, week shapes, the one-registration-per-week rule and
    /// that every week holds at least one player with no repeated names.
    pub fn validate_contents(&self) -> Result<(), ImportError> {
        self.settings
            .validate()
            .map_err(|e| ImportError::InvalidSettings(e.to_string()))?;

        let mut seen = HashSet::new();
        for registration in &self.registrations {
            if !registration.week().is_canonical() {
                return Err(ImportError::InvalidWeek(registration.id));
            }
            registration
                .settings
                .validate()
                .map_err(|e| ImportError::InvalidSettings(e.to_string()))?;
            if !seen.insert(registration.week_start) {
                return Err(ImportError::DuplicateWeek(registration.week_start));
            }
            if registration.players.is_empty() {
                return Err(ImportError::EmptyWeek(registration.id));
            }
            let mut names = HashSet::new();
            for player in &registration.players {
                if !names.insert(player.normalized_name()) {
                    return Err(ImportError::DuplicatePlayer {
                        week_start: registration.week_start,
                        name: player.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, WeekRange};
    use serde_json::json;

    fn registration(start: NaiveDate, names: &[&str]) -> WeeklyRegistration {
        let now = Utc::now();
        WeeklyRegistration::new(
            WeekRange::containing(start),
            names.iter().map(|n| Player::new(*n, now)).collect(),
            Settings::default(),
            now,
        )
    }

    fn monday(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_build_metadata_counts() {
        let doc = ExportDocument::build(
            Settings::default(),
            vec![
                registration(monday(19), &["An", "Binh"]),
                registration(monday(26), &["Chi"]),
            ],
            Utc::now(),
        );
        assert_eq!(doc.metadata.version, EXPORT_FORMAT_VERSION);
        assert_eq!(doc.metadata.total_registrations, 2);
        assert_eq!(doc.metadata.total_players, 3);
        assert!(doc.metadata.created_at <= doc.metadata.last_updated);
    }

    #[test]
    fn test_roundtrip_through_json() {
        let doc = ExportDocument::build(
            Settings::default(),
            vec![registration(monday(19), &["An", "Binh"])],
            Utc::now(),
        );
        let text = serde_json::to_string(&doc).unwrap();
        let parsed = ExportDocument::from_json(serde_json::from_str(&text).unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_missing_sections_rejected() {
        let full = serde_json::to_value(ExportDocument::build(
            Settings::default(),
            vec![],
            Utc::now(),
        ))
        .unwrap();

        for section in ["settings", "registrations", "metadata"] {
            let mut value = full.clone();
            value.as_object_mut().unwrap().remove(section);
            assert_eq!(
                ExportDocument::from_json(value),
                Err(ImportError::MissingSection(section))
            );
        }
    }

    #[test]
    fn test_non_object_rejected() {
        assert_eq!(
            ExportDocument::from_json(json!([1, 2, 3])),
            Err(ImportError::NotAnObject)
        );
    }

    #[test]
    fn test_malformed_registration_rejected() {
        let value = json!({
            "settings": Settings::default(),
            "registrations": [{ "id": "not-a-uuid" }],
            "metadata": {
                "version": "1.0",
                "createdAt": "2026-10-19T00:00:00Z",
                "lastUpdated": "2026-10-19T00:00:00Z",
                "totalRegistrations": 1,
                "totalPlayers": 0
            }
        });
        assert!(matches!(
            ExportDocument::from_json(value),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn test_duplicate_week_rejected() {
        let doc = ExportDocument::build(
            Settings::default(),
            vec![
                registration(monday(19), &["An"]),
                registration(monday(21), &["Binh"]),
            ],
            Utc::now(),
        );
        assert_eq!(
            doc.validate_contents(),
            Err(ImportError::DuplicateWeek(monday(19)))
        );
    }

    #[test]
    fn test_non_canonical_week_rejected() {
        let mut reg = registration(monday(19), &["An"]);
        reg.week_start = monday(20);
        let id = reg.id;
        let doc = ExportDocument::build(Settings::default(), vec![reg], Utc::now());
        assert_eq!(doc.validate_contents(), Err(ImportError::InvalidWeek(id)));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut doc = ExportDocument::build(Settings::default(), vec![], Utc::now());
        doc.settings.courts_count = 0;
        assert!(matches!(
            doc.validate_contents(),
            Err(ImportError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_week_without_players_rejected() {
        let reg = registration(monday(19), &[]);
        let id = reg.id;
        let doc = ExportDocument::build(Settings::default(), vec![reg], Utc::now());
        assert_eq!(doc.validate_contents(), Err(ImportError::EmptyWeek(id)));
    }

    #[test]
    fn test_repeated_player_in_week_rejected() {
        let doc = ExportDocument::build(
            Settings::default(),
            vec![
                registration(monday(12), &["An", "Binh"]),
                registration(monday(19), &["An", "Chi", " an "]),
            ],
            Utc::now(),
        );
        assert_eq!(
            doc.validate_contents(),
            Err(ImportError::DuplicatePlayer {
                week_start: monday(19),
                name: " an ".to_string(),
            })
        );
    }
}
