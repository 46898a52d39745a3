//! Session timer bank.
//!
//! One countdown per [`SessionKind`], advanced by `tick()`. The bank knows
//! nothing about clutch quotas or history: it reports which kinds are due
//! for completion and the engine runs the reconciler for them within the
//! same tick.
//!
//! Several kinds may be active at once; the bank does not enforce a single
//! running session. Only Focus may carry the clutch flag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::session::{SessionKind, SessionTimerState};
use super::settings::TimerSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimerBank {
    states: BTreeMap<SessionKind, SessionTimerState>,
}

impl SessionTimerBank {
    /// All kinds idle at their configured durations.
    pub fn new(settings: &TimerSettings) -> Self {
        let states = SessionKind::ALL
            .iter()
            .map(|&k| (k, SessionTimerState::idle(settings.duration_secs(k))))
            .collect();
        Self { states }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, kind: SessionKind) -> SessionTimerState {
        self.states
            .get(&kind)
            .copied()
            .unwrap_or_else(|| SessionTimerState::idle(0))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SessionKind, SessionTimerState)> + '_ {
        self.states.iter().map(|(k, s)| (*k, *s))
    }

    pub fn any_active(&self) -> bool {
        self.states.values().any(|s| s.is_active)
    }

    /// The Focus run is active and clutch-flagged.
    pub fn clutch_engaged(&self) -> bool {
        self.get(SessionKind::Focus).is_engaged()
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Advance every active countdown by one second.
    ///
    /// Returns the kinds that must be completed in this tick: those that were
    /// already at zero and those that just reached it. The caller completes
    /// them, which resets their countdown, so a kind is never reported twice
    /// for the same run.
    pub fn tick(&mut self) -> Vec<SessionKind> {
        let mut due = Vec::new();
        for (kind, state) in self.states.iter_mut() {
            if !state.is_active {
                continue;
            }
            if state.time_left_seconds > 0 {
                state.time_left_seconds -= 1;
            }
            if state.time_left_seconds == 0 {
                due.push(*kind);
            }
        }
        due
    }

    /// Mark a kind running. `clutch` is ignored for anything but Focus.
    pub fn activate(&mut self, kind: SessionKind, clutch: bool) {
        let state = self.entry(kind);
        state.is_active = true;
        state.is_clutch = clutch && kind == SessionKind::Focus;
    }

    /// Stop a kind without touching its remaining time.
    pub fn pause(&mut self, kind: SessionKind) {
        let state = self.entry(kind);
        state.is_active = false;
    }

    /// Full duration, inactive, not clutch.
    pub fn restore(&mut self, kind: SessionKind, settings: &TimerSettings) {
        self.states
            .insert(kind, SessionTimerState::idle(settings.duration_secs(kind)));
    }

    /// Resize every inactive kind to the new durations. Running timers are
    /// never resized mid-flight.
    pub fn resize_inactive(&mut self, settings: &TimerSettings) {
        for kind in SessionKind::ALL {
            let state = self.entry(kind);
            if !state.is_active {
                state.time_left_seconds = settings.duration_secs(kind);
            }
        }
    }

    /// Re-insert any kind missing from a deserialized bank and drop clutch
    /// flags from kinds that cannot carry them.
    pub fn normalize(&mut self, settings: &TimerSettings) {
        for kind in SessionKind::ALL {
            self.states
                .entry(kind)
                .or_insert_with(|| SessionTimerState::idle(settings.duration_secs(kind)));
        }
        for (kind, state) in self.states.iter_mut() {
            if *kind != SessionKind::Focus {
                state.is_clutch = false;
            }
        }
    }

    fn entry(&mut self, kind: SessionKind) -> &mut SessionTimerState {
        self.states
            .entry(kind)
            .or_insert_with(|| SessionTimerState::idle(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TimerSettings {
        TimerSettings::default()
    }

    #[test]
    fn new_bank_is_idle_at_full_duration() {
        let bank = SessionTimerBank::new(&settings());
        for (kind, state) in bank.iter() {
            assert_eq!(state.time_left_seconds, settings().duration_secs(kind));
            assert!(!state.is_active);
            assert!(!state.is_clutch);
        }
    }

    #[test]
    fn tick_only_advances_active_kinds() {
        let mut bank = SessionTimerBank::new(&settings());
        bank.activate(SessionKind::ShortBreak, false);
        assert!(bank.tick().is_empty());
        assert_eq!(bank.get(SessionKind::ShortBreak).time_left_seconds, 299);
        assert_eq!(bank.get(SessionKind::Focus).time_left_seconds, 1500);
    }

    #[test]
    fn tick_reports_kind_reaching_zero() {
        let s = TimerSettings {
            short_break_minutes: 1,
            ..settings()
        };
        let mut bank = SessionTimerBank::new(&s);
        bank.activate(SessionKind::ShortBreak, false);
        for _ in 0..59 {
            assert!(bank.tick().is_empty());
        }
        assert_eq!(bank.tick(), vec![SessionKind::ShortBreak]);
        assert_eq!(bank.get(SessionKind::ShortBreak).time_left_seconds, 0);
    }

    #[test]
    fn clutch_flag_only_sticks_to_focus() {
        let mut bank = SessionTimerBank::new(&settings());
        bank.activate(SessionKind::EarnedBreak, true);
        assert!(!bank.get(SessionKind::EarnedBreak).is_clutch);
        bank.activate(SessionKind::Focus, true);
        assert!(bank.clutch_engaged());
    }

    #[test]
    fn pause_keeps_remaining_time() {
        let mut bank = SessionTimerBank::new(&settings());
        bank.activate(SessionKind::Focus, false);
        bank.tick();
        bank.pause(SessionKind::Focus);
        let state = bank.get(SessionKind::Focus);
        assert!(!state.is_active);
        assert_eq!(state.time_left_seconds, 1499);
    }

    #[test]
    fn resize_skips_running_kinds() {
        let mut bank = SessionTimerBank::new(&settings());
        bank.activate(SessionKind::ShortBreak, false);
        let longer = TimerSettings {
            focus_minutes: 30,
            short_break_minutes: 10,
            ..settings()
        };
        bank.resize_inactive(&longer);
        assert_eq!(bank.get(SessionKind::Focus).time_left_seconds, 1800);
        assert_eq!(bank.get(SessionKind::ShortBreak).time_left_seconds, 300);
    }

    #[test]
    fn normalize_fills_missing_kinds() {
        let json = r#"{"states":{"work":{"timeLeftSeconds":10,"isActive":true,"isClutch":true},
            "short_break":{"timeLeftSeconds":5,"isActive":false,"isClutch":true}}}"#;
        let mut bank: SessionTimerBank = serde_json::from_str(json).unwrap();
        bank.normalize(&settings());
        assert_eq!(bank.get(SessionKind::EarnedBreak).time_left_seconds, 900);
        assert!(!bank.get(SessionKind::ShortBreak).is_clutch);
        assert!(bank.clutch_engaged());
    }
}
