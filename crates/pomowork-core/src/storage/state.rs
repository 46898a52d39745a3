//! Durable engine state and its mapping onto kv keys.
//!
//! Each key is loaded on its own: a missing key means the default, and a
//! malformed one is logged and replaced by the default without affecting the
//! others.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::KvStore;
use crate::engine::{FocusEngine, TimerSnapshot};
use crate::error::CoreError;
use crate::history::HistoryLog;
use crate::stats::DailyStats;
use crate::task::Task;
use crate::timer::TimerSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateKey {
    Settings,
    History,
    Tasks,
    ActiveTask,
    DailyStats,
    Timers,
}

impl StateKey {
    pub const ALL: [StateKey; 6] = [
        StateKey::Settings,
        StateKey::History,
        StateKey::Tasks,
        StateKey::ActiveTask,
        StateKey::DailyStats,
        StateKey::Timers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StateKey::Settings => "settings",
            StateKey::History => "history",
            StateKey::Tasks => "tasks",
            StateKey::ActiveTask => "active_task_id",
            StateKey::DailyStats => "daily_stats",
            StateKey::Timers => "timers",
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine needs to resume where it left off.
#[derive(Debug, Clone, Default)]
pub struct PersistedState {
    pub settings: TimerSettings,
    pub history: HistoryLog,
    pub tasks: Vec<Task>,
    pub active_task_id: Option<String>,
    pub daily_stats: DailyStats,
    pub timers: Option<TimerSnapshot>,
}

impl PersistedState {
    pub fn load(store: &dyn KvStore) -> Self {
        let settings: TimerSettings = load_key(store, StateKey::Settings).unwrap_or_default();
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                warn!(error = %e, "stored settings out of range, using defaults");
                TimerSettings::default()
            }
        };

        Self {
            settings,
            history: load_key(store, StateKey::History).unwrap_or_default(),
            tasks: load_key(store, StateKey::Tasks).unwrap_or_default(),
            active_task_id: load_key(store, StateKey::ActiveTask),
            daily_stats: load_key(store, StateKey::DailyStats).unwrap_or_default(),
            timers: load_key(store, StateKey::Timers),
        }
    }

    /// Write the given keys from the engine's current state.
    ///
    /// # Errors
    /// Returns the first storage or serialization failure; keys before it
    /// have already been written.
    pub fn save(
        store: &dyn KvStore,
        engine: &FocusEngine,
        keys: &BTreeSet<StateKey>,
    ) -> Result<(), CoreError> {
        for &key in keys {
            match key {
                StateKey::Settings => put(store, key, engine.settings())?,
                StateKey::History => put(store, key, engine.history())?,
                StateKey::Tasks => put(store, key, engine.tasks().tasks())?,
                StateKey::ActiveTask => match engine.tasks().active_id() {
                    Some(id) => put(store, key, id)?,
                    None => store.delete(key.as_str())?,
                },
                StateKey::DailyStats => put(store, key, engine.stats())?,
                StateKey::Timers => put(store, key, &engine.timer_snapshot())?,
            }
            debug!(%key, "state saved");
        }
        Ok(())
    }

    /// Write every key.
    pub fn save_all(store: &dyn KvStore, engine: &FocusEngine) -> Result<(), CoreError> {
        let all: BTreeSet<StateKey> = StateKey::ALL.into_iter().collect();
        Self::save(store, engine, &all)
    }
}

fn load_key<T: DeserializeOwned>(store: &dyn KvStore, key: StateKey) -> Option<T> {
    let raw = match store.get(key.as_str()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(%key, error = %e, "failed to read stored state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%key, error = %e, "malformed stored state, using default");
            None
        }
    }
}

fn put<T: Serialize + ?Sized>(store: &dyn KvStore, key: StateKey, value: &T) -> Result<(), CoreError> {
    let json = serde_json::to_string(value)?;
    store.set(key.as_str(), &json)?;
    Ok(())
}
