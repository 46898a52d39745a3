//! Clutch Gate -- rate-limited high-commitment focus runs.
//!
//! ## States
//!
//! ```text
//! Idle -> Armed -> Engaged -> Idle      (completion, or confirmed surrender)
//!         Armed -> Idle                 (disarm, or limit blocks the start)
//! ```
//!
//! The gate itself stores only the arm flag and the pending surrender
//! request. "Engaged" is read off the Focus countdown, and the daily
//! activation count lives in the daily stats; the gate is the only code that
//! increments it.
//!
//! An activation is paid for at entry: surrendering or resetting a clutch
//! run never gives it back.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::bank::SessionTimerBank;
use super::session::SessionKind;
use crate::engine::{Rejection, SurrenderAction, SurrenderRequest};
use crate::stats::DailyStats;

/// Clutch activations allowed per local calendar day.
pub const CLUTCH_LIMIT_PER_DAY: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClutchState {
    Idle,
    Armed,
    Engaged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClutchGate {
    armed: bool,
    #[serde(default)]
    pending: Option<SurrenderRequest>,
}

impl ClutchGate {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self, bank: &SessionTimerBank) -> ClutchState {
        if bank.clutch_engaged() {
            ClutchState::Engaged
        } else if self.armed {
            ClutchState::Armed
        } else {
            ClutchState::Idle
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Armed for the next start, or already engaged. Other tabs are locked.
    pub fn is_locked(&self, bank: &SessionTimerBank) -> bool {
        self.armed || bank.clutch_engaged()
    }

    pub fn pending(&self) -> Option<SurrenderRequest> {
        self.pending
    }

    pub fn uses_remaining(stats: &DailyStats, today: &str) -> u32 {
        CLUTCH_LIMIT_PER_DAY.saturating_sub(stats.clutch_activations(today))
    }

    pub fn check_quota(stats: &DailyStats, today: &str) -> Result<(), Rejection> {
        let used = stats.clutch_activations(today);
        if used >= CLUTCH_LIMIT_PER_DAY {
            debug!(used, "clutch quota exhausted");
            return Err(Rejection::ClutchLimitReached {
                used,
                limit: CLUTCH_LIMIT_PER_DAY,
            });
        }
        Ok(())
    }

    // ── Arm flag ─────────────────────────────────────────────────────

    /// Pre-select clutch for the next Focus start.
    pub fn arm(
        &mut self,
        bank: &SessionTimerBank,
        stats: &DailyStats,
        today: &str,
    ) -> Result<(), Rejection> {
        if bank.get(SessionKind::Focus).is_active {
            return Err(Rejection::FocusRunning);
        }
        Self::check_quota(stats, today)?;
        self.armed = true;
        Ok(())
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Spend one activation for `today`. Called exactly once per entry into
    /// Engaged, and it also clears the arm flag.
    pub fn consume_activation(&mut self, stats: &DailyStats, today: &str) -> DailyStats {
        self.armed = false;
        let next = stats.with_clutch_activation(today);
        info!(
            date = today,
            used = next.clutch_activations(today),
            "clutch activation consumed"
        );
        next
    }

    // ── Surrender checkpoint ─────────────────────────────────────────

    /// Park a stop/reset of an engaged run. Only one request may wait at a
    /// time; a second one is refused rather than queued.
    pub fn request_surrender(
        &mut self,
        kind: SessionKind,
        action: SurrenderAction,
    ) -> Result<SurrenderRequest, Rejection> {
        if self.pending.is_some() {
            return Err(Rejection::ConfirmationPending);
        }
        let request = SurrenderRequest { kind, action };
        self.pending = Some(request);
        Ok(request)
    }

    /// Take the pending request for confirmation. Clears the arm flag so a
    /// half-entered intent does not linger.
    pub fn confirm_surrender(&mut self) -> Result<SurrenderRequest, Rejection> {
        let request = self.pending.take().ok_or(Rejection::NothingToConfirm)?;
        self.armed = false;
        Ok(request)
    }

    pub fn cancel_surrender(&mut self) -> Result<SurrenderRequest, Rejection> {
        self.pending.take().ok_or(Rejection::NothingToConfirm)
    }

    /// Drop a request whose run has already ended on its own.
    pub fn discard_pending(&mut self) -> Option<SurrenderRequest> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerSettings;

    const TODAY: &str = "2024-06-01";

    fn bank() -> SessionTimerBank {
        SessionTimerBank::new(&TimerSettings::default())
    }

    #[test]
    fn arm_requires_stopped_focus() {
        let mut gate = ClutchGate::new();
        let mut bank = bank();
        bank.activate(SessionKind::Focus, false);
        assert_eq!(
            gate.arm(&bank, &DailyStats::new(), TODAY),
            Err(Rejection::FocusRunning)
        );
        assert!(!gate.is_armed());
    }

    #[test]
    fn arm_is_blocked_at_the_daily_limit() {
        let mut gate = ClutchGate::new();
        let mut stats = DailyStats::new();
        stats = gate.consume_activation(&stats, TODAY);
        stats = gate.consume_activation(&stats, TODAY);
        assert_eq!(
            gate.arm(&bank(), &stats, TODAY),
            Err(Rejection::ClutchLimitReached { used: 2, limit: 2 })
        );
        assert_eq!(ClutchGate::uses_remaining(&stats, TODAY), 0);
        // A new day has a fresh quota.
        assert!(gate.arm(&bank(), &stats, "2024-06-02").is_ok());
    }

    #[test]
    fn consuming_disarms_and_counts() {
        let mut gate = ClutchGate::new();
        gate.arm(&bank(), &DailyStats::new(), TODAY).unwrap();
        let stats = gate.consume_activation(&DailyStats::new(), TODAY);
        assert!(!gate.is_armed());
        assert_eq!(stats.clutch_activations(TODAY), 1);
    }

    #[test]
    fn state_reflects_arm_flag_and_focus_run() {
        let mut gate = ClutchGate::new();
        let mut bank = bank();
        assert_eq!(gate.state(&bank), ClutchState::Idle);
        gate.arm(&bank, &DailyStats::new(), TODAY).unwrap();
        assert_eq!(gate.state(&bank), ClutchState::Armed);
        assert!(gate.is_locked(&bank));
        gate.disarm();
        bank.activate(SessionKind::Focus, true);
        assert_eq!(gate.state(&bank), ClutchState::Engaged);
        assert!(gate.is_locked(&bank));
    }

    #[test]
    fn only_one_surrender_may_wait() {
        let mut gate = ClutchGate::new();
        gate.request_surrender(SessionKind::Focus, SurrenderAction::Reset)
            .unwrap();
        assert_eq!(
            gate.request_surrender(SessionKind::Focus, SurrenderAction::Toggle),
            Err(Rejection::ConfirmationPending)
        );
        let confirmed = gate.confirm_surrender().unwrap();
        assert_eq!(confirmed.action, SurrenderAction::Reset);
        assert_eq!(gate.confirm_surrender(), Err(Rejection::NothingToConfirm));
    }

    #[test]
    fn cancel_leaves_arm_flag_alone() {
        let mut gate = ClutchGate::new();
        gate.arm(&bank(), &DailyStats::new(), TODAY).unwrap();
        gate.request_surrender(SessionKind::Focus, SurrenderAction::Toggle)
            .unwrap();
        gate.cancel_surrender().unwrap();
        assert!(gate.is_armed());
        assert!(gate.pending().is_none());
    }
}
