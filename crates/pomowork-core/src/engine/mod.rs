//! Focus engine -- the single owner of all timer, clutch, ritual, stats,
//! history and task state.
//!
//! Every user action and every tick is processed to completion before the
//! next one; nothing here blocks or awaits. Each call returns the events it
//! produced, and the engine remembers which persisted keys it changed so
//! the shell can save them afterwards (see [`FocusEngine::take_dirty`]).
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = FocusEngine::new(PersistedState::load(&store), Arc::new(SystemClock));
//! engine.toggle(SessionKind::Focus)?;
//! // Once a second:
//! let events = engine.tick();
//! PersistedState::save(&store, &engine, &engine.take_dirty())?;
//! ```

mod outcome;
mod reconcile;

pub use outcome::{Outcome, Rejection, SurrenderAction, SurrenderRequest};

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{date_key, Clock};
use crate::error::ValidationError;
use crate::events::{Event, TimerView};
use crate::history::HistoryLog;
use crate::stats::DailyStats;
use crate::storage::{PersistedState, StateKey};
use crate::task::{MoveDirection, Task, TaskBacklog};
use crate::timer::{
    ClutchGate, ClutchState, Disturbance, DisturbanceBus, RitualGate, RitualPhase, RitualTick,
    SessionKind, SessionTimerBank, SessionTimerState, TimerSettings,
};
use reconcile::{reconcile, CompletionInput};

/// Timer-side state saved between CLI invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub bank: SessionTimerBank,
    #[serde(default)]
    pub clutch: ClutchGate,
    #[serde(default = "default_selected")]
    pub selected: SessionKind,
    #[serde(default)]
    pub last_tick: Option<DateTime<Utc>>,
}

fn default_selected() -> SessionKind {
    SessionKind::Focus
}

pub struct FocusEngine {
    clock: Arc<dyn Clock>,
    settings: TimerSettings,
    bank: SessionTimerBank,
    clutch: ClutchGate,
    ritual: Option<RitualGate>,
    disturbances: DisturbanceBus,
    selected: SessionKind,
    stats: DailyStats,
    history: HistoryLog,
    tasks: TaskBacklog,
    last_tick: Option<DateTime<Local>>,
    dirty: BTreeSet<StateKey>,
}

impl FocusEngine {
    pub fn new(state: PersistedState, clock: Arc<dyn Clock>) -> Self {
        let PersistedState {
            settings,
            history,
            tasks,
            active_task_id,
            daily_stats,
            timers,
        } = state;

        let (bank, clutch, selected, last_tick) = match timers {
            Some(mut snap) => {
                snap.bank.normalize(&settings);
                (
                    snap.bank,
                    snap.clutch,
                    snap.selected,
                    snap.last_tick.map(|t| t.with_timezone(&Local)),
                )
            }
            None => (
                SessionTimerBank::new(&settings),
                ClutchGate::new(),
                SessionKind::Focus,
                None,
            ),
        };

        Self {
            clock,
            settings,
            bank,
            clutch,
            ritual: None,
            disturbances: DisturbanceBus::new(),
            selected,
            stats: daily_stats,
            history,
            tasks: TaskBacklog::new(tasks, active_task_id),
            last_tick,
            dirty: BTreeSet::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn timer(&self, kind: SessionKind) -> SessionTimerState {
        self.bank.get(kind)
    }

    pub fn bank(&self) -> &SessionTimerBank {
        &self.bank
    }

    pub fn selected(&self) -> SessionKind {
        self.selected
    }

    pub fn stats(&self) -> &DailyStats {
        &self.stats
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn tasks(&self) -> &TaskBacklog {
        &self.tasks
    }

    pub fn today_key(&self) -> String {
        date_key(self.clock.now())
    }

    pub fn clutch_state(&self) -> ClutchState {
        self.clutch.state(&self.bank)
    }

    pub fn clutch_armed(&self) -> bool {
        self.clutch.is_armed()
    }

    pub fn clutch_uses_remaining(&self) -> u32 {
        ClutchGate::uses_remaining(&self.stats, &self.today_key())
    }

    pub fn pending_surrender(&self) -> Option<SurrenderRequest> {
        self.clutch.pending()
    }

    pub fn ritual_phase(&self) -> Option<RitualPhase> {
        self.ritual.as_ref().map(RitualGate::phase)
    }

    /// Input sources publish pointer/visibility disturbances here; a running
    /// ritual listens for them.
    pub fn disturbance_bus(&self) -> &DisturbanceBus {
        &self.disturbances
    }

    /// Text the coach should be asked about, if any.
    pub fn coaching_label(&self) -> Option<&str> {
        self.tasks.coaching_label()
    }

    pub fn timer_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            bank: self.bank.clone(),
            clutch: self.clutch.clone(),
            selected: self.selected,
            last_tick: self.last_tick.map(|t| t.with_timezone(&Utc)),
        }
    }

    pub fn snapshot(&self) -> Event {
        let timers = self
            .bank
            .iter()
            .map(|(kind, state)| TimerView {
                kind,
                state,
                duration_seconds: self.settings.duration_secs(kind),
            })
            .collect();
        Event::StateSnapshot {
            selected: self.selected,
            timers,
            clutch: self.clutch_state(),
            clutch_uses_remaining: self.clutch_uses_remaining(),
            pending_surrender: self.clutch.pending(),
            ritual: self.ritual_phase(),
            at: self.now_utc(),
        }
    }

    /// Keys changed since the last call. The caller persists them.
    pub fn take_dirty(&mut self) -> BTreeSet<StateKey> {
        std::mem::take(&mut self.dirty)
    }

    // ── Clock ────────────────────────────────────────────────────────

    /// One nominal second has passed.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        self.tick_at(now)
    }

    /// Replay the whole seconds elapsed since the last recorded tick, e.g.
    /// after loading a snapshot in a fresh process. Stops early once no
    /// session is running.
    pub fn catch_up(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let mut events = Vec::new();
        let Some(last) = self.last_tick else {
            return events;
        };
        let elapsed = (now - last).num_seconds();
        if elapsed <= 0 {
            return events;
        }
        debug!(elapsed, "catching up on missed ticks");
        for i in 1..=elapsed {
            if !self.bank.any_active() {
                break;
            }
            events.extend(self.tick_at(last + Duration::seconds(i)));
        }
        if !self.bank.any_active() {
            self.last_tick = Some(now);
        }
        events
    }

    fn tick_at(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let mut events = Vec::new();

        if self.bank.any_active() {
            self.last_tick = Some(now);
            self.dirty.insert(StateKey::Timers);
        }
        for kind in self.bank.tick() {
            events.push(self.complete(kind, now, false));
        }

        let ritual_tick = self
            .ritual
            .as_mut()
            .map(|ritual| (ritual.tick(), ritual.soft_resets()));
        if let Some((tick, soft_resets)) = ritual_tick {
            let at = now.with_timezone(&Utc);
            match tick {
                RitualTick::Disturbed => events.push(Event::RitualDisturbed { soft_resets, at }),
                RitualTick::Restarted { remaining } => {
                    events.push(Event::RitualRestarted { remaining, at })
                }
                RitualTick::Succeeded => {
                    self.ritual = None;
                    events.push(Event::RitualSucceeded { at });
                    events.extend(self.start_after_ritual(now));
                }
                RitualTick::Counting { .. } | RitualTick::CoolingDown | RitualTick::Finished => {}
            }
        }

        events
    }

    // ── Session commands ─────────────────────────────────────────────

    /// Switch the selected tab. Other tabs are locked while clutch is armed
    /// or engaged.
    pub fn select(&mut self, kind: SessionKind) -> Result<Outcome, Rejection> {
        self.ensure_unlocked(kind)?;
        self.selected = kind;
        self.dirty.insert(StateKey::Timers);
        Ok(Outcome::Applied(vec![Event::TabSelected {
            kind,
            at: self.now_utc(),
        }]))
    }

    /// Start or pause a session.
    ///
    /// Stopping an engaged clutch run is deferred behind a surrender
    /// confirmation. Starting Focus while armed spends a clutch activation,
    /// or is refused when today's quota is gone.
    pub fn toggle(&mut self, kind: SessionKind) -> Result<Outcome, Rejection> {
        self.ensure_unlocked(kind)?;
        let state = self.bank.get(kind);
        if state.is_engaged() {
            return self.defer(kind, SurrenderAction::Toggle);
        }

        let at = self.now_utc();
        if state.is_active {
            self.bank.pause(kind);
            self.dirty.insert(StateKey::Timers);
            return Ok(Outcome::Applied(vec![Event::SessionPaused {
                kind,
                time_left_seconds: state.time_left_seconds,
                at,
            }]));
        }

        if kind == SessionKind::Focus && self.ritual.is_some() {
            return Err(Rejection::RitualInProgress);
        }
        let clutch = kind == SessionKind::Focus && self.clutch.is_armed();
        if clutch {
            ClutchGate::check_quota(&self.stats, &self.today_key())?;
        }
        Ok(Outcome::Applied(self.start(kind, clutch, self.clock.now())))
    }

    /// Put a session back to its full duration. An engaged clutch run needs
    /// a surrender confirmation first.
    pub fn reset(&mut self, kind: SessionKind) -> Result<Outcome, Rejection> {
        self.ensure_unlocked(kind)?;
        if self.bank.get(kind).is_engaged() {
            return self.defer(kind, SurrenderAction::Reset);
        }
        self.bank.restore(kind, &self.settings);
        self.dirty.insert(StateKey::Timers);
        Ok(Outcome::Applied(vec![Event::SessionReset {
            kind,
            at: self.now_utc(),
        }]))
    }

    /// Consume a session right now, running or not. Breaks stay locked while
    /// clutch is armed or engaged.
    pub fn skip(&mut self, kind: SessionKind) -> Result<Outcome, Rejection> {
        self.ensure_unlocked(kind)?;
        let now = self.clock.now();
        Ok(Outcome::Applied(vec![self.complete(kind, now, true)]))
    }

    fn ensure_unlocked(&self, kind: SessionKind) -> Result<(), Rejection> {
        if kind != SessionKind::Focus && self.clutch.is_locked(&self.bank) {
            return Err(Rejection::TabLocked);
        }
        Ok(())
    }

    /// Replace the settings. Stopped countdowns take the new durations;
    /// running ones keep going untouched.
    pub fn apply_settings(&mut self, settings: TimerSettings) -> Result<Vec<Event>, ValidationError> {
        settings.validate()?;
        self.settings = settings;
        self.bank.resize_inactive(&self.settings);
        self.dirty.insert(StateKey::Settings);
        self.dirty.insert(StateKey::Timers);
        Ok(vec![Event::SettingsChanged {
            settings,
            at: self.now_utc(),
        }])
    }

    // ── Clutch commands ──────────────────────────────────────────────

    pub fn arm_clutch(&mut self) -> Result<Outcome, Rejection> {
        let today = self.today_key();
        self.clutch.arm(&self.bank, &self.stats, &today)?;
        self.dirty.insert(StateKey::Timers);
        Ok(Outcome::Applied(vec![Event::ClutchArmed {
            uses_remaining: ClutchGate::uses_remaining(&self.stats, &today),
            at: self.now_utc(),
        }]))
    }

    pub fn disarm_clutch(&mut self) -> Outcome {
        if !self.clutch.is_armed() {
            return Outcome::Applied(Vec::new());
        }
        self.clutch.disarm();
        self.dirty.insert(StateKey::Timers);
        Outcome::Applied(vec![Event::ClutchDisarmed { at: self.now_utc() }])
    }

    /// Give up the engaged run: full duration, stopped, not clutch. The
    /// activation already spent stays spent.
    pub fn confirm_surrender(&mut self) -> Result<Outcome, Rejection> {
        let request = self.clutch.confirm_surrender()?;
        self.bank.restore(request.kind, &self.settings);
        self.dirty.insert(StateKey::Timers);
        let at = self.now_utc();
        debug!(kind = %request.kind, action = ?request.action, "clutch surrendered");
        Ok(Outcome::Applied(vec![
            Event::SurrenderConfirmed { request, at },
            Event::SessionReset {
                kind: request.kind,
                at,
            },
        ]))
    }

    pub fn cancel_surrender(&mut self) -> Result<Outcome, Rejection> {
        let request = self.clutch.cancel_surrender()?;
        self.dirty.insert(StateKey::Timers);
        Ok(Outcome::Applied(vec![Event::SurrenderCancelled {
            request,
            at: self.now_utc(),
        }]))
    }

    // ── Ritual commands ──────────────────────────────────────────────

    /// Begin the stillness ritual that leads into a Focus run. When clutch
    /// is armed the quota is checked now and again at success; it is only
    /// spent at success.
    pub fn begin_ritual(&mut self) -> Result<Outcome, Rejection> {
        if self.ritual.is_some() {
            return Err(Rejection::RitualInProgress);
        }
        if self.bank.get(SessionKind::Focus).is_active {
            return Err(Rejection::FocusRunning);
        }
        let clutch = self.clutch.is_armed();
        if clutch {
            ClutchGate::check_quota(&self.stats, &self.today_key())?;
        }
        let duration_secs = self.settings.ritual_seconds;
        self.ritual = Some(RitualGate::start(duration_secs, Some(&self.disturbances)));
        Ok(Outcome::Applied(vec![Event::RitualStarted {
            duration_secs,
            clutch,
            at: self.now_utc(),
        }]))
    }

    /// Report a disturbance to the running ritual.
    pub fn disturb(&mut self, disturbance: Disturbance) -> Result<Outcome, Rejection> {
        let ritual = self.ritual.as_mut().ok_or(Rejection::NoRitual)?;
        if ritual.disturb(disturbance) {
            let soft_resets = ritual.soft_resets();
            return Ok(Outcome::Applied(vec![Event::RitualDisturbed {
                soft_resets,
                at: self.now_utc(),
            }]));
        }
        Ok(Outcome::Applied(Vec::new()))
    }

    /// Abandon the ritual. Clutch state and the Focus countdown are untouched.
    pub fn cancel_ritual(&mut self) -> Result<Outcome, Rejection> {
        let ritual = self.ritual.take().ok_or(Rejection::NoRitual)?;
        ritual.cancel();
        Ok(Outcome::Applied(vec![Event::RitualCancelled {
            at: self.now_utc(),
        }]))
    }

    // ── Task commands ────────────────────────────────────────────────

    pub fn add_task(&mut self, text: &str) -> Result<Task, ValidationError> {
        let task = self.tasks.add(text)?.clone();
        self.dirty.insert(StateKey::Tasks);
        self.dirty.insert(StateKey::ActiveTask);
        Ok(task)
    }

    pub fn toggle_task(&mut self, id: &str) -> Result<bool, ValidationError> {
        let completed = self.tasks.toggle(id)?;
        self.dirty.insert(StateKey::Tasks);
        Ok(completed)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<Task, ValidationError> {
        let task = self.tasks.remove(id)?;
        self.dirty.insert(StateKey::Tasks);
        self.dirty.insert(StateKey::ActiveTask);
        Ok(task)
    }

    pub fn move_task(&mut self, id: &str, direction: MoveDirection) -> Result<(), ValidationError> {
        self.tasks.move_task(id, direction)?;
        self.dirty.insert(StateKey::Tasks);
        Ok(())
    }

    pub fn reorder_tasks(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        self.tasks.reorder(from, to)?;
        self.dirty.insert(StateKey::Tasks);
        Ok(())
    }

    pub fn shuffle_tasks(&mut self) {
        self.tasks.shuffle();
        self.dirty.insert(StateKey::Tasks);
    }

    pub fn set_active_task(&mut self, id: Option<&str>) -> Result<(), ValidationError> {
        self.tasks.set_active(id)?;
        self.dirty.insert(StateKey::ActiveTask);
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    fn defer(&mut self, kind: SessionKind, action: SurrenderAction) -> Result<Outcome, Rejection> {
        let request = self.clutch.request_surrender(kind, action)?;
        self.dirty.insert(StateKey::Timers);
        debug!(%kind, ?action, "surrender confirmation required");
        Ok(Outcome::Deferred(request))
    }

    /// Mark a kind running. For a clutch start the quota has already been
    /// checked; the activation is spent here.
    fn start(&mut self, kind: SessionKind, clutch: bool, now: DateTime<Local>) -> Vec<Event> {
        let at = now.with_timezone(&Utc);
        let mut events = Vec::new();

        if !self.bank.any_active() {
            self.last_tick = Some(now);
        }
        if clutch {
            let today = date_key(now);
            self.stats = self.clutch.consume_activation(&self.stats, &today);
            self.dirty.insert(StateKey::DailyStats);
            events.push(Event::ClutchEngaged {
                activations_today: self.stats.clutch_activations(&today),
                at,
            });
        }
        self.bank.activate(kind, clutch);
        self.dirty.insert(StateKey::Timers);

        let state = self.bank.get(kind);
        events.insert(
            0,
            Event::SessionStarted {
                kind,
                is_clutch: state.is_clutch,
                time_left_seconds: state.time_left_seconds,
                at,
            },
        );
        events
    }

    fn start_after_ritual(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let mut clutch = self.clutch.is_armed();
        if clutch && ClutchGate::check_quota(&self.stats, &date_key(now)).is_err() {
            // The quota ran out while the ritual was counting; start a plain run.
            warn!("clutch quota exhausted during ritual, starting without clutch");
            self.clutch.disarm();
            clutch = false;
        }
        self.start(SessionKind::Focus, clutch, now)
    }

    /// Run the reconciler for `kind` and swap in its results together with
    /// the countdown reset.
    fn complete(&mut self, kind: SessionKind, now: DateTime<Local>, skipped: bool) -> Event {
        let done = reconcile(CompletionInput {
            kind,
            now,
            run: self.bank.get(kind),
            settings: &self.settings,
            tasks: &self.tasks,
            history: &self.history,
            stats: &self.stats,
        });

        self.history = done.history;
        self.stats = done.stats;
        self.bank.restore(kind, &self.settings);
        if kind == SessionKind::Focus {
            // A run that ended on its own leaves Engaged without confirmation.
            self.clutch.discard_pending();
        }
        self.dirty
            .extend([StateKey::History, StateKey::DailyStats, StateKey::Timers]);

        Event::SessionCompleted {
            record: done.record,
            skipped,
        }
    }
}
