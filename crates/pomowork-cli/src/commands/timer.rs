use clap::Subcommand;
use pomowork_core::SessionKind;

use crate::app::App;
use crate::output::{print_events, print_outcome};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print all three countdowns and the clutch state
    Status,
    /// Start or pause a session (defaults to the selected tab)
    Toggle { kind: Option<SessionKind> },
    /// Restore a session to its full duration
    Reset { kind: Option<SessionKind> },
    /// Count a session as done right now
    Skip { kind: Option<SessionKind> },
    /// Arm clutch mode for the next focus start
    Arm,
    /// Disarm clutch mode
    Disarm,
    /// Confirm abandoning the clutch run
    Surrender,
    /// Keep the clutch run going
    Hold,
    /// Switch the selected tab
    Select { kind: SessionKind },
}

pub fn run(action: TimerAction, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (mut app, caught_up) = App::open()?;
    print_events(&caught_up, json)?;
    let engine = &mut app.engine;
    let selected = engine.selected();

    let outcome = match action {
        TimerAction::Status => {
            print_events(&[engine.snapshot()], json)?;
            return Ok(());
        }
        TimerAction::Toggle { kind } => engine.toggle(kind.unwrap_or(selected))?,
        TimerAction::Reset { kind } => engine.reset(kind.unwrap_or(selected))?,
        TimerAction::Skip { kind } => engine.skip(kind.unwrap_or(selected))?,
        TimerAction::Arm => engine.arm_clutch()?,
        TimerAction::Disarm => engine.disarm_clutch(),
        TimerAction::Surrender => engine.confirm_surrender()?,
        TimerAction::Hold => engine.cancel_surrender()?,
        TimerAction::Select { kind } => engine.select(kind)?,
    };

    print_outcome(&outcome, json)?;
    app.persist()?;
    Ok(())
}
