use clap::Subcommand;
use pomowork_core::task::{MoveDirection, TaskBacklog};

use crate::app::App;
use crate::output::print_json;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task (the first task is pinned automatically)
    Add {
        /// Task text
        text: Vec<String>,
    },
    /// List tasks in order
    List,
    /// Toggle a task's done flag
    Done { id: String },
    /// Remove a task
    Rm { id: String },
    /// Move a task one place up
    Up { id: String },
    /// Move a task one place down
    Down { id: String },
    /// Move the task at position FROM to position TO (1-based)
    Move { from: usize, to: usize },
    /// Shuffle the backlog
    Shuffle,
    /// Pin a task as the one being worked on
    Pin { id: String },
    /// Clear the pinned task
    Unpin,
}

/// Accept a full id or any unambiguous prefix of one.
fn resolve_id(backlog: &TaskBacklog, needle: &str) -> Result<String, String> {
    let mut matches = backlog.tasks().iter().filter(|t| t.id.starts_with(needle));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task.id.clone()),
        (Some(_), Some(_)) => Err(format!("task id '{needle}' is ambiguous")),
        (None, _) => Err(format!("no task with id '{needle}'")),
    }
}

fn print_list(backlog: &TaskBacklog, json: bool) -> Result<(), serde_json::Error> {
    if json {
        return print_json(&serde_json::json!({
            "tasks": backlog.tasks(),
            "activeTaskId": backlog.active_id(),
        }));
    }
    if backlog.tasks().is_empty() {
        println!("no tasks");
    }
    for (i, task) in backlog.tasks().iter().enumerate() {
        let pin = if backlog.active_id() == Some(task.id.as_str()) {
            "*"
        } else {
            " "
        };
        let done = if task.completed { "x" } else { " " };
        let short: String = task.id.chars().take(8).collect();
        println!("{pin}{:>3}. [{done}] {short}  {}", i + 1, task.text);
    }
    Ok(())
}

pub fn run(action: TaskAction, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (mut app, _) = App::open()?;
    let engine = &mut app.engine;

    match action {
        TaskAction::Add { text } => {
            let task = engine.add_task(&text.join(" "))?;
            if json {
                print_json(&task)?;
            } else {
                println!("added {}  {}", &task.id[..8.min(task.id.len())], task.text);
            }
        }
        TaskAction::List => {
            print_list(engine.tasks(), json)?;
            return Ok(());
        }
        TaskAction::Done { id } => {
            let id = resolve_id(engine.tasks(), &id)?;
            let completed = engine.toggle_task(&id)?;
            println!("{}", if completed { "done" } else { "reopened" });
        }
        TaskAction::Rm { id } => {
            let id = resolve_id(engine.tasks(), &id)?;
            let task = engine.remove_task(&id)?;
            println!("removed {}", task.text);
        }
        TaskAction::Up { id } => {
            let id = resolve_id(engine.tasks(), &id)?;
            engine.move_task(&id, MoveDirection::Up)?;
            print_list(engine.tasks(), json)?;
        }
        TaskAction::Down { id } => {
            let id = resolve_id(engine.tasks(), &id)?;
            engine.move_task(&id, MoveDirection::Down)?;
            print_list(engine.tasks(), json)?;
        }
        TaskAction::Move { from, to } => {
            if from == 0 || to == 0 {
                return Err("positions start at 1".into());
            }
            engine.reorder_tasks(from - 1, to - 1)?;
            print_list(engine.tasks(), json)?;
        }
        TaskAction::Shuffle => {
            engine.shuffle_tasks();
            print_list(engine.tasks(), json)?;
        }
        TaskAction::Pin { id } => {
            let id = resolve_id(engine.tasks(), &id)?;
            engine.set_active_task(Some(&id))?;
            println!("pinned");
        }
        TaskAction::Unpin => {
            engine.set_active_task(None)?;
            println!("unpinned");
        }
    }

    app.persist()?;
    Ok(())
}
