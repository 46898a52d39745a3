use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::SurrenderRequest;
use crate::history::SessionRecord;
use crate::timer::{ClutchState, RitualPhase, SessionKind, SessionTimerState, TimerSettings};

/// Every state change in the engine produces an Event.
/// The shell prints them, maps some to sound cues, and persists after them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        kind: SessionKind,
        is_clutch: bool,
        time_left_seconds: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        kind: SessionKind,
        time_left_seconds: u64,
        at: DateTime<Utc>,
    },
    SessionReset {
        kind: SessionKind,
        at: DateTime<Utc>,
    },
    /// A session was consumed, by running out or by skip.
    SessionCompleted {
        record: SessionRecord,
        skipped: bool,
    },
    TabSelected {
        kind: SessionKind,
        at: DateTime<Utc>,
    },
    ClutchArmed {
        uses_remaining: u32,
        at: DateTime<Utc>,
    },
    ClutchDisarmed {
        at: DateTime<Utc>,
    },
    /// A focus run entered clutch mode and paid for it.
    ClutchEngaged {
        activations_today: u32,
        at: DateTime<Utc>,
    },
    SurrenderRequested {
        request: SurrenderRequest,
        at: DateTime<Utc>,
    },
    SurrenderConfirmed {
        request: SurrenderRequest,
        at: DateTime<Utc>,
    },
    SurrenderCancelled {
        request: SurrenderRequest,
        at: DateTime<Utc>,
    },
    RitualStarted {
        duration_secs: u32,
        clutch: bool,
        at: DateTime<Utc>,
    },
    RitualDisturbed {
        soft_resets: u32,
        at: DateTime<Utc>,
    },
    RitualRestarted {
        remaining: u32,
        at: DateTime<Utc>,
    },
    RitualSucceeded {
        at: DateTime<Utc>,
    },
    RitualCancelled {
        at: DateTime<Utc>,
    },
    SettingsChanged {
        settings: TimerSettings,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        selected: SessionKind,
        timers: Vec<TimerView>,
        clutch: ClutchState,
        clutch_uses_remaining: u32,
        pending_surrender: Option<SurrenderRequest>,
        ritual: Option<RitualPhase>,
        at: DateTime<Utc>,
    },
}

/// One countdown as shown in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerView {
    pub kind: SessionKind,
    #[serde(flatten)]
    pub state: SessionTimerState,
    pub duration_seconds: u64,
}
