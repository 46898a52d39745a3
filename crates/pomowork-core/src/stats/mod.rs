//! Daily aggregate statistics.
//!
//! A date-keyed map of per-day counters. Reads never insert: an unseen date
//! yields an all-zero entry. Writes go through copy-on-write helpers that
//! return a new map, so the reconciler can build the next state fully before
//! swapping it in.

mod heatmap;

pub use heatmap::{Heatmap, HeatmapCell, HeatmapHalf, Intensity};

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::timer::SessionKind;

/// Counters for one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyStatsEntry {
    #[serde(rename = "work")]
    pub focus_count: u32,
    #[serde(rename = "short_break")]
    pub short_break_count: u32,
    #[serde(rename = "earned_break")]
    pub earned_break_count: u32,
    #[serde(rename = "clutch_activations")]
    pub clutch_activations: u32,
}

impl DailyStatsEntry {
    pub fn count(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Focus => self.focus_count,
            SessionKind::ShortBreak => self.short_break_count,
            SessionKind::EarnedBreak => self.earned_break_count,
        }
    }
}

#[derive(Deserialize)]
struct EntryFields {
    #[serde(default, rename = "work")]
    focus_count: u32,
    #[serde(default, rename = "short_break")]
    short_break_count: u32,
    #[serde(default, rename = "earned_break")]
    earned_break_count: u32,
    #[serde(default, rename = "clutch_activations")]
    clutch_activations: u32,
}

/// Older stores kept a bare focus count per day.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Legacy(u32),
    Full(EntryFields),
}

impl<'de> Deserialize<'de> for DailyStatsEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredEntry::deserialize(deserializer)? {
            StoredEntry::Legacy(focus_count) => DailyStatsEntry {
                focus_count,
                ..DailyStatsEntry::default()
            },
            StoredEntry::Full(f) => DailyStatsEntry {
                focus_count: f.focus_count,
                short_break_count: f.short_break_count,
                earned_break_count: f.earned_break_count,
                clutch_activations: f.clutch_activations,
            },
        })
    }
}

/// Date key (`YYYY-MM-DD`, local) to counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyStats {
    days: BTreeMap<String, DailyStatsEntry>,
}

impl DailyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for a date, all-zero when the date has never been seen.
    pub fn entry_for(&self, date_key: &str) -> DailyStatsEntry {
        self.days.get(date_key).copied().unwrap_or_default()
    }

    pub fn clutch_activations(&self, date_key: &str) -> u32 {
        self.entry_for(date_key).clutch_activations
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DailyStatsEntry)> {
        self.days.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// New map with the counter for `kind` bumped on `date_key`.
    pub fn with_completion(&self, date_key: &str, kind: SessionKind) -> Self {
        self.with_updated(date_key, |e| match kind {
            SessionKind::Focus => e.focus_count += 1,
            SessionKind::ShortBreak => e.short_break_count += 1,
            SessionKind::EarnedBreak => e.earned_break_count += 1,
        })
    }

    /// New map with one more clutch activation on `date_key`.
    pub fn with_clutch_activation(&self, date_key: &str) -> Self {
        self.with_updated(date_key, |e| e.clutch_activations += 1)
    }

    fn with_updated(&self, date_key: &str, update: impl FnOnce(&mut DailyStatsEntry)) -> Self {
        let mut days = self.days.clone();
        let entry = days.entry(date_key.to_string()).or_default();
        update(entry);
        Self { days }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_date_reads_as_zero_without_inserting() {
        let stats = DailyStats::new();
        assert_eq!(stats.entry_for("2024-01-01"), DailyStatsEntry::default());
        assert!(stats.is_empty());
    }

    #[test]
    fn completion_bumps_exactly_one_counter() {
        let stats = DailyStats::new().with_completion("2024-01-01", SessionKind::ShortBreak);
        let entry = stats.entry_for("2024-01-01");
        assert_eq!(entry.short_break_count, 1);
        assert_eq!(entry.focus_count, 0);
        assert_eq!(entry.earned_break_count, 0);
        assert_eq!(entry.clutch_activations, 0);
    }

    #[test]
    fn updates_do_not_touch_the_original_map() {
        let before = DailyStats::new().with_completion("2024-01-01", SessionKind::Focus);
        let after = before.with_clutch_activation("2024-01-01");
        assert_eq!(before.clutch_activations("2024-01-01"), 0);
        assert_eq!(after.clutch_activations("2024-01-01"), 1);
        assert_eq!(after.entry_for("2024-01-01").focus_count, 1);
    }

    #[test]
    fn legacy_integer_entries_read_as_focus_counts() {
        let json = r#"{
            "2023-05-01": 4,
            "2023-05-02": {"work": 2, "short_break": 1, "earned_break": 0, "clutch_activations": 2},
            "2023-05-03": {"work": 1}
        }"#;
        let stats: DailyStats = serde_json::from_str(json).unwrap();
        assert_eq!(
            stats.entry_for("2023-05-01"),
            DailyStatsEntry {
                focus_count: 4,
                ..Default::default()
            }
        );
        assert_eq!(stats.clutch_activations("2023-05-02"), 2);
        assert_eq!(stats.entry_for("2023-05-03").short_break_count, 0);
    }

    #[test]
    fn serializes_with_storage_field_names() {
        let stats = DailyStats::new().with_completion("2024-02-02", SessionKind::EarnedBreak);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["2024-02-02"]["earned_break"], 1);
        assert_eq!(json["2024-02-02"]["work"], 0);
    }
}
