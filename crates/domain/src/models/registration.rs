//! Weekly registration domain models.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Settings;

/// A single signup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Uuid,
    /// Display name exactly as submitted.
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

impl Player {
    pub fn new(name: impl Into<String>, registered_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            registered_at,
        }
    }

    /// Name form used for uniqueness checks within a week.
    pub fn normalized_name(&self) -> String {
        shared::validation::normalize_player_name(&self.name)
    }
}

/// Canonical Monday-to-Sunday week bucket, at day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    /// The week (Monday to Sunday) containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let offset = i64::from(date.weekday_from_monday());
        let start = date - Duration::days(offset);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    /// The week immediately after this one.
    pub fn next(&self) -> Self {
        Self {
            start: self.start + Duration::days(7),
            end: self.end + Duration::days(7),
        }
    }

    /// Whether this range has the canonical Monday..Sunday shape.
    pub fn is_canonical(&self) -> bool {
        *self == Self::containing(self.start)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Monday 00:00:00.000 in the given club offset.
    pub fn start_instant(&self, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
        offset
            .from_local_datetime(&self.start.and_time(NaiveTime::MIN))
            .single()
    }

    /// Sunday 23:59:59.999 in the given club offset.
    pub fn end_instant(&self, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
        offset
            .from_local_datetime(&self.end.and_time(end_of_day))
            .single()
    }
}

/// Small extension so week math reads naturally on `NaiveDate`.
trait WeekdayFromMonday {
    fn weekday_from_monday(&self) -> u32;
}

impl WeekdayFromMonday for NaiveDate {
    fn weekday_from_monday(&self) -> u32 {
        chrono::Datelike::weekday(self).num_days_from_monday()
    }
}

/// All signups for one week bucket, with the settings they were taken under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRegistration {
    pub id: Uuid,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub players: Vec<Player>,
    pub settings: Settings,
    /// Bumped by the store on every update; used for optimistic concurrency.
    #[serde(default)]
    pub revision: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl WeeklyRegistration {
    pub fn new(
        week: WeekRange,
        players: Vec<Player>,
        settings: Settings,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            week_start: week.start,
            week_end: week.end,
            players,
            settings,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn week(&self) -> WeekRange {
        WeekRange {
            start: self.week_start,
            end: self.week_end,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_containing_wednesday() {
        // 2026-10-21 is a Wednesday
        let week = WeekRange::containing(date(2026, 10, 21));
        assert_eq!(week.start, date(2026, 10, 19));
        assert_eq!(week.end, date(2026, 10, 25));
    }

    #[test]
    fn test_week_containing_monday_and_sunday() {
        assert_eq!(WeekRange::containing(date(2026, 10, 19)).start, date(2026, 10, 19));
        assert_eq!(WeekRange::containing(date(2026, 10, 25)).start, date(2026, 10, 19));
    }

    #[test]
    fn test_next_week() {
        let next = WeekRange::containing(date(2026, 12, 30)).next();
        assert_eq!(next.start, date(2027, 1, 4));
        assert_eq!(next.end, date(2027, 1, 10));
    }

    #[test]
    fn test_is_canonical() {
        assert!(WeekRange::containing(date(2026, 10, 21)).is_canonical());
        let shifted = WeekRange {
            start: date(2026, 10, 20),
            end: date(2026, 10, 26),
        };
        assert!(!shifted.is_canonical());
        let too_long = WeekRange {
            start: date(2026, 10, 19),
            end: date(2026, 10, 26),
        };
        assert!(!too_long.is_canonical());
    }

    #[test]
    fn test_contains() {
        let week = WeekRange::containing(date(2026, 10, 21));
        assert!(week.contains(date(2026, 10, 19)));
        assert!(week.contains(date(2026, 10, 25)));
        assert!(!week.contains(date(2026, 10, 26)));
    }

    #[test]
    fn test_instants_in_offset() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        let week = WeekRange::containing(date(2026, 10, 21));
        let start = week.start_instant(offset).unwrap();
        let end = week.end_instant(offset).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-10-19T00:00:00+07:00");
        assert_eq!(
            end.to_rfc3339_opts(chrono::SecondsFormat::Millis, false),
            "2026-10-25T23:59:59.999+07:00"
        );
    }

    #[test]
    fn test_player_normalized_name_keeps_display_name() {
        let player = Player::new(" Binh ", Utc::now());
        assert_eq!(player.name, " Binh ");
        assert_eq!(player.normalized_name(), "binh");
    }

    #[test]
    fn test_registration_serializes_iso_dates() {
        let week = WeekRange::containing(date(2026, 10, 21));
        let reg = WeeklyRegistration::new(week, vec![], Settings::default(), Utc::now());
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["weekStart"], "2026-10-19");
        assert_eq!(json["weekEnd"], "2026-10-25");
        assert_eq!(json["revision"], 0);
    }
}
