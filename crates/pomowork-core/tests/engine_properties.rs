//! Property tests for engine invariants under arbitrary command sequences.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use pomowork_core::{
    ClutchState, FocusEngine, ManualClock, PersistedState, Rejection, SessionKind, TimerSettings,
    CLUTCH_LIMIT_PER_DAY,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Command {
    Tick(u16),
    Toggle(SessionKind),
    Reset(SessionKind),
    Skip(SessionKind),
    Arm,
    Disarm,
    Confirm,
    Cancel,
    Ritual,
}

fn kind() -> impl Strategy<Value = SessionKind> {
    prop_oneof![
        Just(SessionKind::Focus),
        Just(SessionKind::ShortBreak),
        Just(SessionKind::EarnedBreak),
    ]
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (1u16..200).prop_map(Command::Tick),
        kind().prop_map(Command::Toggle),
        kind().prop_map(Command::Reset),
        kind().prop_map(Command::Skip),
        Just(Command::Arm),
        Just(Command::Disarm),
        Just(Command::Confirm),
        Just(Command::Cancel),
        Just(Command::Ritual),
    ]
}

fn small_settings() -> TimerSettings {
    TimerSettings {
        focus_minutes: 2,
        short_break_minutes: 1,
        earned_break_minutes: 3,
        ritual_seconds: 5,
    }
}

fn engine() -> FocusEngine {
    let clock = ManualClock::new(Local.with_ymd_and_hms(2024, 8, 20, 14, 0, 0).unwrap());
    let mut engine = FocusEngine::new(PersistedState::default(), Arc::new(clock));
    engine.apply_settings(small_settings()).unwrap();
    engine
}

fn apply(engine: &mut FocusEngine, command: &Command) {
    match *command {
        Command::Tick(n) => {
            for _ in 0..n {
                engine.tick();
            }
        }
        Command::Toggle(k) => {
            let _ = engine.toggle(k);
        }
        Command::Reset(k) => {
            let _ = engine.reset(k);
        }
        Command::Skip(k) => {
            let _ = engine.skip(k);
        }
        Command::Arm => {
            let _ = engine.arm_clutch();
        }
        Command::Disarm => {
            engine.disarm_clutch();
        }
        Command::Confirm => {
            let _ = engine.confirm_surrender();
        }
        Command::Cancel => {
            let _ = engine.cancel_surrender();
        }
        Command::Ritual => {
            let _ = engine.begin_ritual();
        }
    }
}

proptest! {
    #[test]
    fn clutch_quota_is_never_exceeded(commands in prop::collection::vec(command(), 1..80)) {
        let mut engine = engine();
        let today = engine.today_key();
        let mut previous = 0;
        for command in &commands {
            apply(&mut engine, command);
            let used = engine.stats().clutch_activations(&today);
            prop_assert!(used <= CLUTCH_LIMIT_PER_DAY);
            // Activations are only ever added.
            prop_assert!(used >= previous);
            previous = used;
        }
    }

    #[test]
    fn countdowns_stay_within_their_duration(commands in prop::collection::vec(command(), 1..80)) {
        let mut engine = engine();
        let settings = small_settings();
        for command in &commands {
            apply(&mut engine, command);
            for kind in SessionKind::ALL {
                let state = engine.timer(kind);
                prop_assert!(state.time_left_seconds <= settings.duration_secs(kind));
                if kind != SessionKind::Focus {
                    prop_assert!(!state.is_clutch);
                }
            }
        }
    }

    #[test]
    fn reset_of_a_stopped_timer_restores_duration(
        commands in prop::collection::vec(command(), 0..40),
        target in kind(),
    ) {
        let mut engine = engine();
        for command in &commands {
            apply(&mut engine, command);
        }
        let locked = target != SessionKind::Focus && engine.clutch_state() != ClutchState::Idle;
        if locked {
            prop_assert_eq!(engine.reset(target), Err(Rejection::TabLocked));
        } else if !engine.timer(target).is_active {
            engine.reset(target).unwrap();
            let state = engine.timer(target);
            prop_assert_eq!(state.time_left_seconds, small_settings().duration_secs(target));
            prop_assert!(!state.is_clutch);
        }
    }

    #[test]
    fn every_completion_is_recorded_once(commands in prop::collection::vec(command(), 1..60)) {
        let mut engine = engine();
        let today = engine.today_key();
        for command in &commands {
            apply(&mut engine, command);
        }
        let entry = engine.stats().entry_for(&today);
        let counted = entry.focus_count + entry.short_break_count + entry.earned_break_count;
        prop_assert_eq!(counted as usize, engine.history().len());
    }
}
