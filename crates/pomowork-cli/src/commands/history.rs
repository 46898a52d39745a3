use pomowork_core::timer::format_mm_ss;

use crate::app::App;
use crate::output::print_json;

pub fn run(limit: usize, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (app, _) = App::open()?;
    let records = app.engine.history().recent(limit);

    if json {
        print_json(records)?;
        return Ok(());
    }
    if records.is_empty() {
        println!("no sessions yet");
        return Ok(());
    }
    for record in records {
        let local = record.end_time.with_timezone(&chrono::Local);
        let clutch = if record.is_clutch { " [clutch]" } else { "" };
        println!(
            "{}  {:<13} {}{clutch}  {}",
            local.format("%Y-%m-%d %H:%M"),
            record.kind.label(),
            format_mm_ss(u64::try_from(record.duration_secs()).unwrap_or(0)),
            record.task_label.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
