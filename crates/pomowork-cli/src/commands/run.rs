//! Interactive shell: one actor owns the engine and handles ticks, typed
//! commands and coach replies one at a time.

use std::sync::Arc;
use std::time::Duration;

use pomowork_core::advice::{AdviceDebouncer, GeminiCoach};
use pomowork_core::engine::{Outcome, Rejection};
use pomowork_core::sound::{chime_from_config, play_cues, Chime};
use pomowork_core::timer::Disturbance;
use pomowork_core::SessionKind;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::app::App;
use crate::output::{describe, print_events, print_outcome};

const HELP: &str = "commands: toggle [kind] | reset [kind] | skip [kind] | tab <kind> | arm | disarm \
| ritual | move <dx> <dy> | blur | abort | surrender | hold | status | quit";

enum Command {
    Toggle(Option<SessionKind>),
    Reset(Option<SessionKind>),
    Skip(Option<SessionKind>),
    Tab(SessionKind),
    Arm,
    Disarm,
    Ritual,
    Move { dx: i32, dy: i32 },
    Blur,
    Abort,
    Surrender,
    Hold,
    Status,
    Help,
    Quit,
}

fn parse_kind(word: Option<&str>) -> Result<Option<SessionKind>, String> {
    word.map(|w| w.parse::<SessionKind>().map_err(|e| e.to_string()))
        .transpose()
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let command = match head {
        "toggle" | "t" => Command::Toggle(parse_kind(arg)?),
        "reset" => Command::Reset(parse_kind(arg)?),
        "skip" => Command::Skip(parse_kind(arg)?),
        "tab" => Command::Tab(parse_kind(arg)?.ok_or("tab needs a kind")?),
        "arm" => Command::Arm,
        "disarm" => Command::Disarm,
        "ritual" => Command::Ritual,
        "move" => {
            let dx = arg.and_then(|v| v.parse().ok()).ok_or("move needs <dx> <dy>")?;
            let dy = words
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or("move needs <dx> <dy>")?;
            Command::Move { dx, dy }
        }
        "blur" => Command::Blur,
        "abort" => Command::Abort,
        "surrender" => Command::Surrender,
        "hold" => Command::Hold,
        "status" | "s" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(command))
}

/// Returns false when the shell should exit. Completions triggered by a
/// command chime the same way tick completions do.
fn handle(
    app: &mut App,
    command: Command,
    chime: &mut dyn Chime,
) -> Result<bool, Box<dyn std::error::Error>> {
    let engine = &mut app.engine;
    let selected = engine.selected();

    let result: Result<Outcome, Rejection> = match command {
        Command::Toggle(kind) => engine.toggle(kind.unwrap_or(selected)),
        Command::Reset(kind) => engine.reset(kind.unwrap_or(selected)),
        Command::Skip(kind) => engine.skip(kind.unwrap_or(selected)),
        Command::Tab(kind) => engine.select(kind),
        Command::Arm => engine.arm_clutch(),
        Command::Disarm => Ok(engine.disarm_clutch()),
        Command::Ritual => engine.begin_ritual(),
        Command::Move { dx, dy } => {
            engine
                .disturbance_bus()
                .emit(Disturbance::PointerMoved { dx, dy });
            return Ok(true);
        }
        Command::Blur => {
            engine.disturbance_bus().emit(Disturbance::FocusLost);
            return Ok(true);
        }
        Command::Abort => engine.cancel_ritual(),
        Command::Surrender => engine.confirm_surrender(),
        Command::Hold => engine.cancel_surrender(),
        Command::Status => {
            println!("{}", describe(&engine.snapshot()));
            return Ok(true);
        }
        Command::Help => {
            println!("{HELP}");
            return Ok(true);
        }
        Command::Quit => return Ok(false),
    };

    match result {
        Ok(outcome) => {
            print_outcome(&outcome, false)?;
            play_cues(chime, outcome.events());
        }
        Err(rejection) => println!("{rejection}"),
    }
    Ok(true)
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(shell())
}

async fn shell() -> Result<(), Box<dyn std::error::Error>> {
    let (mut app, caught_up) = App::open()?;
    print_events(&caught_up, false)?;
    println!("{}", describe(&app.engine.snapshot()));
    println!("{HELP}");

    let mut chime = chime_from_config(&app.config.sound);

    let (mut debouncer, mut advice_rx) = match GeminiCoach::from_config(&app.config.advice) {
        Ok(coach) => {
            let (d, rx) = AdviceDebouncer::new(
                Arc::new(coach),
                Duration::from_millis(app.config.advice.debounce_ms),
                app.config.advice.min_task_chars,
            );
            (Some(d), Some(rx))
        }
        Err(e) => {
            debug!(error = %e, "coach unavailable");
            (None, None)
        }
    };
    if let Some(d) = debouncer.as_mut() {
        d.request(app.engine.coaching_label());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let events = app.engine.tick();
                print_events(&events, false)?;
                play_cues(chime.as_mut(), &events);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if !handle(&mut app, command, chime.as_mut())? {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => println!("{message}"),
                }
            }
            Some(update) = recv_advice(&mut advice_rx) => {
                if let Some(advice) = debouncer.as_ref().and_then(|d| d.accept(update)) {
                    println!("coach: {}", advice.tip);
                    println!("  strategy: {}", advice.strategy);
                    println!("  mantra: {}", advice.focus_mantra);
                }
            }
        }

        if let Some(d) = debouncer.as_mut() {
            d.request(app.engine.coaching_label());
        }
        if let Err(e) = app.persist() {
            warn!(error = %e, "failed to save state");
        }
    }

    if let Some(d) = debouncer.as_mut() {
        d.cancel();
    }
    app.persist()?;
    Ok(())
}

async fn recv_advice<T>(rx: &mut Option<tokio::sync::mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
