use clap::{Parser, Subcommand};
use eyre::Result;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tasklist::config::{Backend, load_config, load_config_from_path};
use tasklist::{TaskId, TaskStore, view};
use tracing::Level;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "Tasklist CLI - a persistent to-do list")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the task storage (overrides config)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Storage key holding the task list (overrides config)
    #[arg(short, long)]
    key: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show all tasks
    List,

    /// Add a task
    Add {
        /// Task text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Mark a task done, or not done again
    Toggle {
        #[arg(allow_negative_numbers = true)]
        id: TaskId,
    },

    /// Delete a task
    Delete {
        #[arg(allow_negative_numbers = true)]
        id: TaskId,
    },

    /// Delete all completed tasks
    ClearCompleted,

    /// Delete every task
    ClearAll {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => load_config()?,
    };
    if let Some(path) = cli.store_path {
        config.store_path = Some(path);
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(key) = cli.key {
        config.key = key;
    }

    let storage = config.open_storage()?;
    let mut store = TaskStore::open(storage, config.key.clone())?.with_date_format(config.date_format.clone());

    let tasks = match cli.command {
        Commands::List => store.tasks(),
        Commands::Add { text } => store.create(&text.join(" ")),
        Commands::Toggle { id } => store.toggle(id),
        Commands::Delete { id } => store.delete(id),
        Commands::ClearCompleted => store.clear_completed(),
        Commands::ClearAll { yes } => {
            if yes || confirm("Delete all tasks?")? {
                store.clear_all()
            } else {
                println!("Cancelled");
                store.tasks()
            }
        }
    };

    println!("{}", view::render(tasks));
    Ok(())
}

/// Ask a yes/no question on stdin; anything but y/yes means no
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_delete_accept_negative_ids() {
        let cli = Cli::try_parse_from(["tasklist", "toggle", "-5"]).unwrap();
        assert!(matches!(cli.command, Commands::Toggle { id: -5 }));

        let cli = Cli::try_parse_from(["tasklist", "delete", "-7"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { id: -7 }));
    }

    #[test]
    fn test_add_joins_words() {
        let cli = Cli::try_parse_from(["tasklist", "add", "Buy", "milk"]).unwrap();
        match cli.command {
            Commands::Add { text } => assert_eq!(text.join(" "), "Buy milk"),
            _ => panic!("expected add"),
        }
    }
}
