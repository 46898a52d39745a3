//! Append-only session history, most recent first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::SessionKind;

/// One consumed session. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub completed: bool,
    #[serde(default, rename = "task", skip_serializing_if = "Option::is_none")]
    pub task_label: Option<String>,
    #[serde(default)]
    pub is_clutch: bool,
}

impl SessionRecord {
    pub fn duration_secs(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    records: Vec<SessionRecord>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// New log with `record` in front of every existing entry.
    pub fn with_prepended(&self, record: SessionRecord) -> Self {
        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.push(record);
        records.extend(self.records.iter().cloned());
        Self { records }
    }

    pub fn latest(&self) -> Option<&SessionRecord> {
        self.records.first()
    }

    pub fn recent(&self, limit: usize) -> &[SessionRecord] {
        &self.records[..limit.min(self.records.len())]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str, kind: SessionKind) -> SessionRecord {
        let end = Utc::now();
        SessionRecord {
            id: id.into(),
            kind,
            start_time: end - Duration::minutes(25),
            end_time: end,
            completed: true,
            task_label: None,
            is_clutch: false,
        }
    }

    #[test]
    fn prepend_keeps_newest_first() {
        let log = HistoryLog::new()
            .with_prepended(record("a", SessionKind::Focus))
            .with_prepended(record("b", SessionKind::ShortBreak));
        let ids: Vec<_> = log.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(log.latest().unwrap().kind, SessionKind::ShortBreak);
        assert_eq!(log.recent(10).len(), 2);
        assert_eq!(log.recent(1)[0].id, "b");
    }

    #[test]
    fn reads_records_written_without_optional_fields() {
        let json = r#"[{"id":"k3j2h1","type":"work","startTime":"2024-05-01T09:00:00.000Z",
            "endTime":"2024-05-01T09:25:00.000Z","completed":true}]"#;
        let log: HistoryLog = serde_json::from_str(json).unwrap();
        let r = log.latest().unwrap();
        assert_eq!(r.kind, SessionKind::Focus);
        assert!(!r.is_clutch);
        assert!(r.task_label.is_none());
        assert_eq!(r.duration_secs(), 1500);
    }

    #[test]
    fn task_label_is_omitted_when_absent() {
        let json = serde_json::to_value(record("x", SessionKind::EarnedBreak)).unwrap();
        assert!(json.get("task").is_none());
        assert_eq!(json["type"], "earned_break");
    }
}
