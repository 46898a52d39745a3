use clap::{ArgAction, Parser, Subcommand};

mod app;
mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "pomowork", version, about = "Pomowork focus timer")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive timer shell
    Run,
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Task backlog management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Daily statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Completed sessions, most recent first
    History {
        /// Maximum number of records to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Timer durations
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Ask the coach about a task (defaults to the pinned task)
    Advice {
        task: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let json = cli.json;
    let result = match cli.command {
        Commands::Run => commands::run::run(),
        Commands::Timer { action } => commands::timer::run(action, json),
        Commands::Task { action } => commands::task::run(action, json),
        Commands::Stats { action } => commands::stats::run(action, json),
        Commands::History { limit } => commands::history::run(limit, json),
        Commands::Settings { action } => commands::settings::run(action, json),
        Commands::Config { action } => commands::config::run(action, json),
        Commands::Advice { task } => commands::advice::run(task, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
