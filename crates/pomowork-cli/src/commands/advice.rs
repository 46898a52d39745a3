use pomowork_core::advice::{check_task_length, AdviceProvider, GeminiCoach};

use crate::app::App;
use crate::output::print_json;

pub fn run(task: Vec<String>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (app, _) = App::open()?;
    let task = if task.is_empty() {
        app.engine
            .coaching_label()
            .map(str::to_string)
            .ok_or("no task given and no open task in the backlog")?
    } else {
        task.join(" ")
    };

    check_task_length(&task, app.config.advice.min_task_chars)?;
    let coach = GeminiCoach::from_config(&app.config.advice)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let advice = runtime.block_on(coach.advise(&task))?;

    if json {
        print_json(&advice)?;
    } else {
        println!("Tip:       {}", advice.tip);
        println!("Strategy:  {}", advice.strategy);
        println!("Mantra:    {}", advice.focus_mantra);
    }
    Ok(())
}
