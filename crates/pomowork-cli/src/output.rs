//! Human and JSON rendering of engine output.

use pomowork_core::engine::{Outcome, SurrenderAction};
use pomowork_core::events::Event;
use pomowork_core::timer::{format_mm_ss, ClutchState, RitualPhase};

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_events(events: &[Event], json: bool) -> Result<(), serde_json::Error> {
    for event in events {
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{}", describe(event));
        }
    }
    Ok(())
}

pub fn print_outcome(outcome: &Outcome, json: bool) -> Result<(), serde_json::Error> {
    match outcome {
        Outcome::Applied(events) => print_events(events, json),
        Outcome::Deferred(request) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "type": "confirmation_required", "request": request })
                );
            } else {
                let verb = match request.action {
                    SurrenderAction::Toggle => "stop",
                    SurrenderAction::Reset => "reset",
                };
                println!(
                    "clutch run in progress: confirm to {verb} {} (surrender) or keep going (hold)",
                    request.kind
                );
            }
            Ok(())
        }
    }
}

pub fn describe(event: &Event) -> String {
    match event {
        Event::SessionStarted {
            kind,
            is_clutch,
            time_left_seconds,
            ..
        } => {
            let clutch = if *is_clutch { " [clutch]" } else { "" };
            format!("{} started, {} left{clutch}", kind.label(), format_mm_ss(*time_left_seconds))
        }
        Event::SessionPaused {
            kind,
            time_left_seconds,
            ..
        } => format!("{} paused at {}", kind.label(), format_mm_ss(*time_left_seconds)),
        Event::SessionReset { kind, .. } => format!("{} reset", kind.label()),
        Event::SessionCompleted { record, skipped } => {
            let how = if *skipped { "skipped" } else { "completed" };
            match &record.task_label {
                Some(task) => format!("{} {how}: {task}", record.kind.label()),
                None => format!("{} {how}", record.kind.label()),
            }
        }
        Event::TabSelected { kind, .. } => format!("selected {}", kind.label()),
        Event::ClutchArmed { uses_remaining, .. } => {
            format!("clutch armed ({uses_remaining} left today)")
        }
        Event::ClutchDisarmed { .. } => "clutch disarmed".to_string(),
        Event::ClutchEngaged {
            activations_today, ..
        } => format!("clutch engaged ({activations_today} used today)"),
        Event::SurrenderRequested { request, .. } => {
            format!("surrender requested for {}", request.kind)
        }
        Event::SurrenderConfirmed { request, .. } => {
            format!("surrendered {}", request.kind.label())
        }
        Event::SurrenderCancelled { .. } => "holding on".to_string(),
        Event::RitualStarted {
            duration_secs,
            clutch,
            ..
        } => {
            let clutch = if *clutch { " into clutch" } else { "" };
            format!("ritual started{clutch}: stay still for {duration_secs}s")
        }
        Event::RitualDisturbed { soft_resets, .. } => {
            format!("movement detected, ritual restarting (#{soft_resets})")
        }
        Event::RitualRestarted { remaining, .. } => format!("ritual counting again, {remaining}s"),
        Event::RitualSucceeded { .. } => "ritual complete".to_string(),
        Event::RitualCancelled { .. } => "ritual abandoned".to_string(),
        Event::SettingsChanged { settings, .. } => format!(
            "settings: focus {}m, short break {}m, earned break {}m, ritual {}s",
            settings.focus_minutes,
            settings.short_break_minutes,
            settings.earned_break_minutes,
            settings.ritual_seconds
        ),
        Event::StateSnapshot {
            selected,
            timers,
            clutch,
            clutch_uses_remaining,
            pending_surrender,
            ritual,
            ..
        } => {
            let mut lines = Vec::new();
            for view in timers {
                let marker = if view.kind == *selected { ">" } else { " " };
                let mut line = format!(
                    "{marker} {:<13} {}",
                    view.kind.label(),
                    format_mm_ss(view.state.time_left_seconds)
                );
                if view.state.is_active {
                    line.push_str("  running");
                }
                if view.state.is_clutch {
                    line.push_str(" [clutch]");
                }
                lines.push(line);
            }
            let clutch = match clutch {
                ClutchState::Idle => "idle",
                ClutchState::Armed => "armed",
                ClutchState::Engaged => "engaged",
            };
            lines.push(format!(
                "clutch: {clutch} ({clutch_uses_remaining} left today)"
            ));
            if let Some(request) = pending_surrender {
                lines.push(format!("awaiting surrender confirmation for {}", request.kind));
            }
            match ritual {
                Some(RitualPhase::Counting { remaining }) => {
                    lines.push(format!("ritual: {remaining}s to go"))
                }
                Some(RitualPhase::Cooldown { .. }) => lines.push("ritual: resetting".to_string()),
                Some(RitualPhase::Succeeded) | None => {}
            }
            lines.join("\n")
        }
    }
}
