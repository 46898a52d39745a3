//! Ritual Gate -- a stillness countdown before a focus run.
//!
//! The ritual counts down once per tick. A disqualifying disturbance (pointer
//! moved past the threshold, the app hidden or unfocused) triggers a soft
//! reset: a one-tick cooldown, then the countdown starts over from the full
//! duration. Queued disturbances are checked before each decrement, so one
//! that lands during the final second still resets. Once the countdown has
//! reached zero, success fires exactly once and later disturbances are moot.
//!
//! Disturbances arrive either through [`RitualGate::disturb`] or from a
//! [`DisturbanceBus`] the ritual subscribes to when it starts. The
//! subscription is dropped as soon as the ritual succeeds or is cancelled.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Pointer travel, in pixels along either axis, that counts as movement.
pub const POINTER_THRESHOLD_PX: i32 = 15;

/// Ticks spent in cooldown after a soft reset.
pub const RITUAL_COOLDOWN_TICKS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Disturbance {
    PointerMoved { dx: i32, dy: i32 },
    VisibilityLost,
    FocusLost,
}

impl Disturbance {
    pub fn disqualifies(&self) -> bool {
        match *self {
            Disturbance::PointerMoved { dx, dy } => {
                dx.abs() > POINTER_THRESHOLD_PX || dy.abs() > POINTER_THRESHOLD_PX
            }
            Disturbance::VisibilityLost | Disturbance::FocusLost => true,
        }
    }
}

/// Fan-out of input disturbances to whichever ritual is listening.
#[derive(Debug, Clone)]
pub struct DisturbanceBus {
    tx: broadcast::Sender<Disturbance>,
}

impl Default for DisturbanceBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DisturbanceBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Publish a disturbance. Returns how many rituals received it.
    pub fn emit(&self, disturbance: Disturbance) -> usize {
        self.tx.send(disturbance).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Disturbance> {
        self.tx.subscribe()
    }

    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RitualPhase {
    Counting { remaining: u32 },
    Cooldown { remaining: u32 },
    Succeeded,
}

/// What a single tick did to the ritual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RitualTick {
    Counting { remaining: u32 },
    /// A disturbance was pending; the countdown went into cooldown.
    Disturbed,
    CoolingDown,
    /// Cooldown over, counting again from the full duration.
    Restarted { remaining: u32 },
    /// Reached zero. Fires once per ritual.
    Succeeded,
    /// Already succeeded earlier; nothing left to do.
    Finished,
}

#[derive(Debug)]
pub struct RitualGate {
    duration_secs: u32,
    phase: RitualPhase,
    soft_resets: u32,
    disturbances: Option<broadcast::Receiver<Disturbance>>,
}

impl RitualGate {
    pub fn start(duration_secs: u32, bus: Option<&DisturbanceBus>) -> Self {
        debug!(duration_secs, "ritual started");
        Self {
            duration_secs,
            phase: RitualPhase::Counting {
                remaining: duration_secs,
            },
            soft_resets: 0,
            disturbances: bus.map(DisturbanceBus::subscribe),
        }
    }

    pub fn phase(&self) -> RitualPhase {
        self.phase
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn soft_resets(&self) -> u32 {
        self.soft_resets
    }

    pub fn is_subscribed(&self) -> bool {
        self.disturbances.is_some()
    }

    /// Apply a disturbance immediately. Returns true if it caused a soft reset.
    pub fn disturb(&mut self, disturbance: Disturbance) -> bool {
        if !disturbance.disqualifies() {
            return false;
        }
        match self.phase {
            RitualPhase::Counting { .. } => {
                self.soft_reset();
                true
            }
            RitualPhase::Cooldown { .. } | RitualPhase::Succeeded => false,
        }
    }

    pub fn tick(&mut self) -> RitualTick {
        match self.phase {
            RitualPhase::Succeeded => RitualTick::Finished,
            RitualPhase::Cooldown { remaining } => {
                // Anything that arrived while resetting is moot.
                self.drain_disturbances();
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.phase = RitualPhase::Counting {
                        remaining: self.duration_secs,
                    };
                    RitualTick::Restarted {
                        remaining: self.duration_secs,
                    }
                } else {
                    self.phase = RitualPhase::Cooldown { remaining };
                    RitualTick::CoolingDown
                }
            }
            RitualPhase::Counting { remaining } => {
                if self.drain_disturbances() {
                    self.soft_reset();
                    return RitualTick::Disturbed;
                }
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.phase = RitualPhase::Succeeded;
                    self.disturbances = None;
                    debug!(soft_resets = self.soft_resets, "ritual succeeded");
                    return RitualTick::Succeeded;
                }
                self.phase = RitualPhase::Counting { remaining };
                RitualTick::Counting { remaining }
            }
        }
    }

    /// Abandon the ritual. Dropping the gate releases its subscription.
    pub fn cancel(self) {
        debug!(phase = ?self.phase, "ritual cancelled");
    }

    fn soft_reset(&mut self) {
        self.soft_resets += 1;
        self.phase = RitualPhase::Cooldown {
            remaining: RITUAL_COOLDOWN_TICKS,
        };
        debug!(soft_resets = self.soft_resets, "ritual disturbed");
    }

    /// Empty the subscription; true if any queued disturbance disqualifies.
    fn drain_disturbances(&mut self) -> bool {
        let Some(rx) = self.disturbances.as_mut() else {
            return false;
        };
        let mut disqualified = false;
        loop {
            match rx.try_recv() {
                Ok(d) => disqualified |= d.disqualifies(),
                Err(broadcast::error::TryRecvError::Lagged(_)) => disqualified = true,
                Err(_) => break,
            }
        }
        disqualified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until_done(gate: &mut RitualGate, max: usize) -> Vec<RitualTick> {
        let mut out = Vec::new();
        for _ in 0..max {
            let t = gate.tick();
            out.push(t);
            if t == RitualTick::Succeeded {
                break;
            }
        }
        out
    }

    #[test]
    fn undisturbed_ritual_succeeds_after_duration_ticks() {
        let mut gate = RitualGate::start(3, None);
        assert_eq!(gate.tick(), RitualTick::Counting { remaining: 2 });
        assert_eq!(gate.tick(), RitualTick::Counting { remaining: 1 });
        assert_eq!(gate.tick(), RitualTick::Succeeded);
        assert_eq!(gate.tick(), RitualTick::Finished);
        assert_eq!(gate.tick(), RitualTick::Finished);
    }

    #[test]
    fn small_pointer_jitter_is_tolerated() {
        let mut gate = RitualGate::start(5, None);
        assert!(!gate.disturb(Disturbance::PointerMoved { dx: 15, dy: -15 }));
        assert!(gate.disturb(Disturbance::PointerMoved { dx: 0, dy: 16 }));
    }

    #[test]
    fn disturbance_soft_resets_after_cooldown() {
        let mut gate = RitualGate::start(3, None);
        gate.tick();
        assert!(gate.disturb(Disturbance::VisibilityLost));
        // Further disturbances during cooldown are ignored.
        assert!(!gate.disturb(Disturbance::FocusLost));
        assert_eq!(gate.tick(), RitualTick::Restarted { remaining: 3 });
        let ticks = run_until_done(&mut gate, 10);
        assert_eq!(ticks.len(), 3);
        assert_eq!(gate.soft_resets(), 1);
    }

    #[test]
    fn bus_disturbances_are_seen_on_tick() {
        let bus = DisturbanceBus::new();
        let mut gate = RitualGate::start(10, Some(&bus));
        assert_eq!(bus.listeners(), 1);
        gate.tick();
        bus.emit(Disturbance::PointerMoved { dx: 2, dy: 1 });
        assert_eq!(gate.tick(), RitualTick::Counting { remaining: 8 });
        bus.emit(Disturbance::FocusLost);
        assert_eq!(gate.tick(), RitualTick::Disturbed);
        assert_eq!(gate.tick(), RitualTick::Restarted { remaining: 10 });
    }

    #[test]
    fn final_second_disturbance_resets_on_bus_and_direct_paths() {
        let bus = DisturbanceBus::new();
        let mut via_bus = RitualGate::start(2, Some(&bus));
        via_bus.tick();
        bus.emit(Disturbance::PointerMoved { dx: 200, dy: 0 });
        assert_eq!(via_bus.tick(), RitualTick::Disturbed);
        assert_eq!(via_bus.tick(), RitualTick::Restarted { remaining: 2 });

        let mut direct = RitualGate::start(2, None);
        direct.tick();
        assert!(direct.disturb(Disturbance::PointerMoved { dx: 200, dy: 0 }));
        assert_eq!(direct.tick(), RitualTick::Restarted { remaining: 2 });

        assert_eq!(via_bus.soft_resets(), direct.soft_resets());
        assert_eq!(via_bus.phase(), direct.phase());
    }

    #[test]
    fn disturbances_after_success_are_ignored() {
        let bus = DisturbanceBus::new();
        let mut gate = RitualGate::start(1, Some(&bus));
        assert_eq!(gate.tick(), RitualTick::Succeeded);
        bus.emit(Disturbance::VisibilityLost);
        assert!(!gate.disturb(Disturbance::VisibilityLost));
        assert_eq!(gate.tick(), RitualTick::Finished);
        assert_eq!(gate.phase(), RitualPhase::Succeeded);
        assert_eq!(gate.soft_resets(), 0);
    }

    #[test]
    fn subscription_is_released_on_success_and_cancel() {
        let bus = DisturbanceBus::new();
        let mut gate = RitualGate::start(1, Some(&bus));
        assert_eq!(gate.tick(), RitualTick::Succeeded);
        assert!(!gate.is_subscribed());
        assert_eq!(bus.listeners(), 0);

        let gate = RitualGate::start(30, Some(&bus));
        assert_eq!(bus.listeners(), 1);
        gate.cancel();
        assert_eq!(bus.listeners(), 0);
    }
}
