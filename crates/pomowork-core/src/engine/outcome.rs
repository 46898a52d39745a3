use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::Event;
use crate::timer::SessionKind;

/// The user action waiting behind a surrender confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurrenderAction {
    Toggle,
    Reset,
}

/// A stop/reset of an engaged clutch run, parked until confirmed or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurrenderRequest {
    pub kind: SessionKind,
    pub action: SurrenderAction,
}

/// Result of an accepted user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The action ran; these are the resulting events, in order.
    Applied(Vec<Event>),
    /// The action needs a surrender confirmation first. Nothing changed yet.
    Deferred(SurrenderRequest),
}

impl Outcome {
    pub fn events(&self) -> &[Event] {
        match self {
            Outcome::Applied(events) => events,
            Outcome::Deferred(_) => &[],
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Outcome::Deferred(_))
    }
}

/// A user action the engine refused. State is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Daily limit for Clutch Mode reached ({used}/{limit}). Rest up for tomorrow.")]
    ClutchLimitReached { used: u32, limit: u32 },

    #[error("The focus timer is already running")]
    FocusRunning,

    #[error("A surrender confirmation is already pending")]
    ConfirmationPending,

    #[error("Nothing is waiting for confirmation")]
    NothingToConfirm,

    #[error("Session tabs are locked while Clutch Mode is armed or engaged")]
    TabLocked,

    #[error("A ritual is already in progress")]
    RitualInProgress,

    #[error("No ritual is in progress")]
    NoRitual,
}
