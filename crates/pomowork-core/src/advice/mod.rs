//! Coaching advice for the task at hand.
//!
//! Advice is advisory only: it never feeds back into timer state, and a
//! failed request just means nothing is shown.

mod debounce;
mod gemini;

pub use debounce::{AdviceDebouncer, AdviceUpdate};
pub use gemini::GeminiCoach;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AdviceError;

/// One piece of coaching for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advice {
    pub tip: String,
    pub strategy: String,
    pub focus_mantra: String,
}

/// Something that can turn a task description into [`Advice`].
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    async fn advise(&self, task: &str) -> Result<Advice, AdviceError>;
}

/// Reject descriptions too short to be worth a request.
pub fn check_task_length(task: &str, min_chars: usize) -> Result<(), AdviceError> {
    if task.trim().chars().count() < min_chars {
        return Err(AdviceError::TooShort { min: min_chars });
    }
    Ok(())
}
