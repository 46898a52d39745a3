use clap::{Subcommand, ValueEnum};
use chrono::{Datelike, Local};
use pomowork_core::stats::{Heatmap, HeatmapHalf, Intensity};

use crate::app::App;
use crate::output::print_json;

#[derive(Clone, Copy, ValueEnum)]
pub enum Half {
    First,
    Second,
}

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's counts and clutch uses left
    Today,
    /// Focus heatmap for a year
    Heatmap {
        /// Year to show (defaults to the current one)
        #[arg(long)]
        year: Option<i32>,
        /// Half-year to show (defaults to the one containing today)
        #[arg(long, value_enum)]
        half: Option<Half>,
    },
}

fn shade(intensity: Intensity) -> char {
    match intensity {
        Intensity::Empty => '.',
        Intensity::Low => '░',
        Intensity::Medium => '▒',
        Intensity::High => '█',
    }
}

pub fn run(action: StatsAction, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (app, _) = App::open()?;
    let engine = &app.engine;

    match action {
        StatsAction::Today => {
            let today = engine.today_key();
            let entry = engine.stats().entry_for(&today);
            if json {
                print_json(&serde_json::json!({
                    "date": today,
                    "entry": entry,
                    "clutchUsesRemaining": engine.clutch_uses_remaining(),
                }))?;
            } else {
                println!("{today}");
                println!("focus          {}", entry.focus_count);
                println!("short breaks   {}", entry.short_break_count);
                println!("earned breaks  {}", entry.earned_break_count);
                println!(
                    "clutch         {} used, {} left",
                    entry.clutch_activations,
                    engine.clutch_uses_remaining()
                );
            }
        }
        StatsAction::Heatmap { year, half } => {
            let now = Local::now().date_naive();
            let year = year.unwrap_or(now.year());
            let heatmap = Heatmap::for_year(engine.stats(), year)
                .ok_or_else(|| format!("year {year} is out of range"))?;
            let half = match half {
                Some(Half::First) => HeatmapHalf::First,
                Some(Half::Second) => HeatmapHalf::Second,
                None => HeatmapHalf::containing(now),
            };
            let weeks = heatmap.half(half);

            if json {
                print_json(&serde_json::json!({
                    "year": year,
                    "half": half,
                    "weeks": weeks,
                    "totalFocus": heatmap.total_focus(),
                }))?;
                return Ok(());
            }

            println!("{year} ({} focus sessions)", heatmap.total_focus());
            for (day, name) in ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
                .iter()
                .enumerate()
            {
                let row: String = weeks.iter().map(|week| shade(week[day].intensity)).collect();
                println!("{name} {row}");
            }
        }
    }
    Ok(())
}
