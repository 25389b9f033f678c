use std::path::Path;

use chrono::Weekday;
use serde::Deserialize;

use crate::error::ConfigError;

/// One song the schedule wants to play.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduledTrack {
    pub artist: String,
    pub title: String,
}

/// Songs to look up for each day of the week.
///
/// Read from TOML with one array of `{ artist, title }` tables per weekday:
///
/// ```toml
/// [[monday]]
/// artist = "Breskvica"
/// title = "Sava i Dunav"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeeklySchedule {
    monday: Vec<ScheduledTrack>,
    tuesday: Vec<ScheduledTrack>,
    wednesday: Vec<ScheduledTrack>,
    thursday: Vec<ScheduledTrack>,
    friday: Vec<ScheduledTrack>,
    saturday: Vec<ScheduledTrack>,
    sunday: Vec<ScheduledTrack>,
}

impl WeeklySchedule {
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML.
    pub fn from_toml_str(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: origin.clone(),
            source,
        })?;
        Self::from_toml_str(&raw, &origin)
    }

    #[must_use]
    pub fn for_weekday(&self, weekday: Weekday) -> &[ScheduledTrack] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

/// Croatian name of the weekday, used as the playlist's day label.
#[must_use]
pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "ponedjeljak",
        Weekday::Tue => "utorak",
        Weekday::Wed => "srijeda",
        Weekday::Thu => "četvrtak",
        Weekday::Fri => "petak",
        Weekday::Sat => "subota",
        Weekday::Sun => "nedjelja",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_days_and_leaves_the_rest_empty() {
        let schedule = WeeklySchedule::from_toml_str(
            r#"
            [[wednesday]]
            artist = "Senidah"
            title = "Beli svemir"

            [[wednesday]]
            artist = "Coby"
            title = "Rambo"
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(schedule.for_weekday(Weekday::Wed).len(), 2);
        assert_eq!(schedule.for_weekday(Weekday::Wed)[1].title, "Rambo");
        assert!(schedule.for_weekday(Weekday::Mon).is_empty());
    }

    #[test]
    fn unknown_day_is_rejected() {
        let err = WeeklySchedule::from_toml_str("[[funday]]\nartist = \"a\"\ntitle = \"b\"", "inline")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn day_names_are_croatian() {
        assert_eq!(day_name(Weekday::Thu), "četvrtak");
        assert_eq!(day_name(Weekday::Sun), "nedjelja");
    }
}
