use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The three independently tracked countdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "work", alias = "focus")]
    Focus,
    #[serde(rename = "short_break")]
    ShortBreak,
    #[serde(rename = "earned_break")]
    EarnedBreak,
}

impl SessionKind {
    pub const ALL: [SessionKind; 3] = [
        SessionKind::Focus,
        SessionKind::ShortBreak,
        SessionKind::EarnedBreak,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Focus => "Focus Time",
            SessionKind::ShortBreak => "Short Break",
            SessionKind::EarnedBreak => "Earned Break",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionKind::Focus => "focus",
            SessionKind::ShortBreak => "short_break",
            SessionKind::EarnedBreak => "earned_break",
        };
        f.write_str(s)
    }
}

impl FromStr for SessionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "focus" | "work" => Ok(SessionKind::Focus),
            "short" | "short_break" | "short-break" => Ok(SessionKind::ShortBreak),
            "earned" | "earned_break" | "earned-break" | "long" => Ok(SessionKind::EarnedBreak),
            other => Err(ValidationError::InvalidValue {
                field: "session kind".into(),
                message: format!("'{other}' is not one of focus, short, earned"),
            }),
        }
    }
}

/// Countdown state for one session kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTimerState {
    pub time_left_seconds: u64,
    pub is_active: bool,
    /// Whether the current run is a clutch run. Only ever set on Focus.
    #[serde(default)]
    pub is_clutch: bool,
}

impl SessionTimerState {
    /// A fresh, inactive countdown at full duration.
    pub fn idle(duration_secs: u64) -> Self {
        Self {
            time_left_seconds: duration_secs,
            is_active: false,
            is_clutch: false,
        }
    }

    /// Active and flagged as a clutch run.
    pub fn is_engaged(&self) -> bool {
        self.is_active && self.is_clutch
    }
}

/// Display helper: `MM:SS`.
pub fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_with_storage_names() {
        assert_eq!(serde_json::to_string(&SessionKind::Focus).unwrap(), "\"work\"");
        assert_eq!(
            serde_json::to_string(&SessionKind::EarnedBreak).unwrap(),
            "\"earned_break\""
        );
        let parsed: SessionKind = serde_json::from_str("\"short_break\"").unwrap();
        assert_eq!(parsed, SessionKind::ShortBreak);
    }

    #[test]
    fn kind_parses_cli_aliases() {
        assert_eq!("work".parse::<SessionKind>().unwrap(), SessionKind::Focus);
        assert_eq!("Short".parse::<SessionKind>().unwrap(), SessionKind::ShortBreak);
        assert_eq!("long".parse::<SessionKind>().unwrap(), SessionKind::EarnedBreak);
        assert!("nap".parse::<SessionKind>().is_err());
    }

    #[test]
    fn format_pads_minutes_and_seconds() {
        assert_eq!(format_mm_ss(1500), "25:00");
        assert_eq!(format_mm_ss(61), "01:01");
        assert_eq!(format_mm_ss(0), "00:00");
    }
}
