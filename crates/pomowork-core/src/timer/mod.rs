mod bank;
mod clutch;
mod ritual;
mod session;
mod settings;

pub use bank::SessionTimerBank;
pub use clutch::{ClutchGate, ClutchState, CLUTCH_LIMIT_PER_DAY};
pub use ritual::{
    Disturbance, DisturbanceBus, RitualGate, RitualPhase, RitualTick, POINTER_THRESHOLD_PX,
    RITUAL_COOLDOWN_TICKS,
};
pub use session::{format_mm_ss, SessionKind, SessionTimerState};
pub use settings::{TimerSettings, RITUAL_PRESETS_SECS};
