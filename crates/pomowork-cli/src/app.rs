//! Loading and saving the engine around a command.

use std::sync::Arc;

use pomowork_core::events::Event;
use pomowork_core::{Config, CoreError, Database, FocusEngine, PersistedState, SystemClock};

pub struct App {
    pub config: Config,
    pub db: Database,
    pub engine: FocusEngine,
}

impl App {
    /// Open config and database, restore the engine, and replay the seconds
    /// that passed since the last run. Returns any events the replay produced.
    pub fn open() -> Result<(Self, Vec<Event>), CoreError> {
        let config = Config::load_or_default();
        let db = Database::open_at(config.database_path()?)?;
        let mut engine = FocusEngine::new(PersistedState::load(&db), Arc::new(SystemClock));
        let caught_up = engine.catch_up();
        let mut app = Self { config, db, engine };
        app.persist()?;
        Ok((app, caught_up))
    }

    /// Save whatever the engine changed since the last save.
    pub fn persist(&mut self) -> Result<(), CoreError> {
        let dirty = self.engine.take_dirty();
        if dirty.is_empty() {
            return Ok(());
        }
        PersistedState::save(&self.db, &self.engine, &dirty)
    }
}
