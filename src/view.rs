// Terminal rendering of the task list

use crate::task::{Stats, Task};
use colored::Colorize;

pub const EMPTY_MESSAGE: &str = "No tasks yet, add one!";

/// Render the counts line
pub fn render_stats(stats: Stats) -> String {
    format!(
        "Total: {}  Completed: {}",
        stats.total.to_string().bold(),
        stats.completed.to_string().green().bold()
    )
}

/// Render one line per task, or the empty-state message
pub fn render_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return EMPTY_MESSAGE.dimmed().to_string();
    }

    tasks.iter().map(render_task).collect::<Vec<_>>().join("\n")
}

fn render_task(task: &Task) -> String {
    let (mark, text) = if task.completed {
        ("[x]".green(), task.text.strikethrough().dimmed())
    } else {
        ("[ ]".normal(), task.text.normal())
    };

    format!(
        "{} {} {}  {}",
        mark,
        task.id.to_string().cyan(),
        text,
        task.created_at.dimmed()
    )
}

/// Full view: task lines followed by the counts
pub fn render(tasks: &[Task]) -> String {
    format!("{}\n\n{}", render_tasks(tasks), render_stats(Stats::of(tasks)))
}
