use serde::{Deserialize, Serialize};

use super::session::SessionKind;
use crate::error::ValidationError;

/// Ritual lengths offered by the settings screen. Any positive value is accepted.
pub const RITUAL_PRESETS_SECS: [u32; 3] = [30, 60, 90];

/// Durable timer configuration. All values are positive.
///
/// Older stores used `workTime`/`shortBreak`/`longBreak`/`ritualTime`;
/// those names are still accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    #[serde(alias = "workTime", default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(alias = "shortBreak", default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(alias = "longBreak", default = "default_earned_break_minutes")]
    pub earned_break_minutes: u32,
    #[serde(alias = "ritualTime", default = "default_ritual_seconds")]
    pub ritual_seconds: u32,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_earned_break_minutes() -> u32 {
    15
}
fn default_ritual_seconds() -> u32 {
    30
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            earned_break_minutes: default_earned_break_minutes(),
            ritual_seconds: default_ritual_seconds(),
        }
    }
}

impl TimerSettings {
    /// Configured duration of a session kind, in seconds.
    ///
    /// Uses saturating arithmetic so absurd minute counts cannot overflow.
    pub fn duration_secs(&self, kind: SessionKind) -> u64 {
        let minutes = match kind {
            SessionKind::Focus => self.focus_minutes,
            SessionKind::ShortBreak => self.short_break_minutes,
            SessionKind::EarnedBreak => self.earned_break_minutes,
        };
        u64::from(minutes).saturating_mul(60)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("focus_minutes", self.focus_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("earned_break_minutes", self.earned_break_minutes),
            ("ritual_seconds", self.ritual_seconds),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: "must be at least 1".into(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let s = TimerSettings::default();
        assert_eq!(s.duration_secs(SessionKind::Focus), 1500);
        assert_eq!(s.duration_secs(SessionKind::ShortBreak), 300);
        assert_eq!(s.duration_secs(SessionKind::EarnedBreak), 900);
        assert_eq!(s.ritual_seconds, 30);
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let json = r#"{"workTime":50,"shortBreak":10,"longBreak":20,"ritualTime":60}"#;
        let s: TimerSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.focus_minutes, 50);
        assert_eq!(s.short_break_minutes, 10);
        assert_eq!(s.earned_break_minutes, 20);
        assert_eq!(s.ritual_seconds, 60);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let s: TimerSettings = serde_json::from_str(r#"{"focusMinutes":40}"#).unwrap();
        assert_eq!(s.focus_minutes, 40);
        assert_eq!(s.short_break_minutes, 5);
    }

    #[test]
    fn zero_values_are_rejected() {
        let s = TimerSettings {
            short_break_minutes: 0,
            ..TimerSettings::default()
        };
        assert!(s.validate().is_err());
        assert!(TimerSettings::default().validate().is_ok());
    }
}
