//! # Pomowork Core Library
//!
//! This library provides the core logic for the Pomowork focus timer. All
//! operations are available through the standalone CLI binary; the library
//! holds every rule so any front end stays a thin layer over it.
//!
//! ## Architecture
//!
//! - **Focus Engine**: a tick-driven state machine owning three independent
//!   countdowns (Focus, Short Break, Earned Break), the clutch gate, the
//!   stillness ritual, and the completion reconciler
//! - **Storage**: SQLite key-value persistence and TOML configuration
//! - **Advice**: debounced, cancellable coaching requests
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: the single owner of timer state
//! - [`PersistedState`]: load/save of durable state through a [`KvStore`]
//! - [`Config`]: application configuration management
//! - [`AdviceDebouncer`]: coach requests with stale-result discarding

pub mod advice;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod sound;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use advice::{Advice, AdviceDebouncer, AdviceProvider, AdviceUpdate, GeminiCoach};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{FocusEngine, Outcome, Rejection, SurrenderAction, SurrenderRequest, TimerSnapshot};
pub use error::{AdviceError, ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use history::{HistoryLog, SessionRecord};
pub use stats::{DailyStats, DailyStatsEntry, Heatmap, HeatmapHalf, Intensity};
pub use storage::{Config, Database, KvStore, MemoryStore, PersistedState, StateKey};
pub use task::{MoveDirection, Task, TaskBacklog};
pub use timer::{
    ClutchState, Disturbance, SessionKind, SessionTimerState, TimerSettings, CLUTCH_LIMIT_PER_DAY,
};
