use clap::Subcommand;
use pomowork_core::timer::RITUAL_PRESETS_SECS;

use crate::app::App;
use crate::output::{print_events, print_json};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current durations
    Show,
    /// Change one or more durations
    Set {
        /// Focus minutes
        #[arg(long)]
        focus: Option<u32>,
        /// Short break minutes
        #[arg(long)]
        short_break: Option<u32>,
        /// Earned break minutes
        #[arg(long)]
        earned_break: Option<u32>,
        /// Ritual seconds (30, 60 and 90 are the usual choices)
        #[arg(long)]
        ritual: Option<u32>,
    },
}

pub fn run(action: SettingsAction, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (mut app, _) = App::open()?;

    match action {
        SettingsAction::Show => {
            let settings = app.engine.settings();
            if json {
                print_json(settings)?;
            } else {
                println!("focus         {}m", settings.focus_minutes);
                println!("short break   {}m", settings.short_break_minutes);
                println!("earned break  {}m", settings.earned_break_minutes);
                println!("ritual        {}s", settings.ritual_seconds);
            }
        }
        SettingsAction::Set {
            focus,
            short_break,
            earned_break,
            ritual,
        } => {
            let mut settings = *app.engine.settings();
            if let Some(v) = focus {
                settings.focus_minutes = v;
            }
            if let Some(v) = short_break {
                settings.short_break_minutes = v;
            }
            if let Some(v) = earned_break {
                settings.earned_break_minutes = v;
            }
            if let Some(v) = ritual {
                if !RITUAL_PRESETS_SECS.contains(&v) {
                    tracing::info!(ritual = v, "using a non-preset ritual length");
                }
                settings.ritual_seconds = v;
            }
            let events = app.engine.apply_settings(settings)?;
            print_events(&events, json)?;
            app.persist()?;
        }
    }
    Ok(())
}
