//! Audible cues for session completion and ritual success.

use std::io::Write;

use tracing::debug;

use crate::events::Event;
use crate::storage::SoundConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    SessionComplete,
    RitualSuccess,
}

/// The cue an event should play, if any.
pub fn cue_for(event: &Event) -> Option<Cue> {
    match event {
        Event::SessionCompleted { .. } => Some(Cue::SessionComplete),
        Event::RitualSucceeded { .. } => Some(Cue::RitualSuccess),
        _ => None,
    }
}

/// Plays cues. Failures are never fatal.
pub trait Chime: Send {
    fn play(&mut self, cue: Cue) -> std::io::Result<()>;
}

/// Rings the terminal bell, twice for a completed session.
pub struct TerminalBell<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> Chime for TerminalBell<W> {
    fn play(&mut self, cue: Cue) -> std::io::Result<()> {
        let bell = match cue {
            Cue::SessionComplete => "\x07\x07",
            Cue::RitualSuccess => "\x07",
        };
        self.out.write_all(bell.as_bytes())?;
        self.out.flush()
    }
}

pub struct Silent;

impl Chime for Silent {
    fn play(&mut self, _cue: Cue) -> std::io::Result<()> {
        Ok(())
    }
}

/// Pick a chime from config.
pub fn chime_from_config(config: &SoundConfig) -> Box<dyn Chime> {
    if config.enabled && config.terminal_bell {
        Box::new(TerminalBell::new(std::io::stderr()))
    } else {
        Box::new(Silent)
    }
}

/// Play whatever cues `events` call for.
pub fn play_cues(chime: &mut dyn Chime, events: &[Event]) {
    for cue in events.iter().filter_map(cue_for) {
        if let Err(e) = chime.play(cue) {
            debug!(?cue, error = %e, "cue playback failed");
        }
    }
}
