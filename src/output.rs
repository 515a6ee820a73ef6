use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::error::Result;
use crate::model::{Task, TaskFields};
use crate::syntax;
use crate::views::{CalendarDay, Labels};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn print_task(task: &Task, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(task)?,
        Format::Pretty => print_pretty(task),
        Format::Minimal => println!("{}", minimal_row(task)),
    }
    Ok(())
}

pub fn print_tasks(tasks: &[Task], format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(tasks)?,
        Format::Pretty => {
            if tasks.is_empty() {
                println!("{}", "No tasks.".dimmed());
            }
            for task in tasks {
                print_pretty(task);
                println!();
            }
        }
        Format::Minimal => {
            println!("{:>4} {:1} {:24} {:10} CONTEXT", "ID", "", "TITLE", "DUE");
            println!("{}", "-".repeat(50));
            for task in tasks {
                println!("{}", minimal_row(task));
            }
        }
    }
    Ok(())
}

fn print_pretty(task: &Task) {
    let mark = if task.completed {
        "✓".green().to_string()
    } else {
        " ".to_string()
    };
    let title = if task.completed {
        task.title.dimmed().to_string()
    } else {
        task.title.bold().to_string()
    };
    println!("[{}] {} {}", task.id, mark, title);

    let mut meta = Vec::new();
    if let Some(ctx) = task.context.as_deref() {
        meta.push(format!("{} @{ctx}", "context:".dimmed()));
    }
    if let Some(project) = task.project.as_deref() {
        meta.push(format!("{} {project}", "project:".dimmed()));
    }
    if let Some(due) = task.due_date.as_deref() {
        meta.push(format!("{} {}", "due:".dimmed(), due.yellow()));
    }
    if !meta.is_empty() {
        println!("  {}", meta.join(" | "));
    }
    if !task.tags.is_empty() {
        let tags: Vec<String> = task.tags.iter().map(|t| format!("+{t}")).collect();
        println!("  {} {}", "tags:".dimmed(), tags.join(" ").cyan());
    }
    for line in task.notes.lines() {
        println!("  {} {line}", "|".dimmed());
    }
}

fn minimal_row(task: &Task) -> String {
    format!(
        "{:>4} {:1} {:24} {:10} {}",
        task.id,
        if task.completed { "x" } else { "" },
        truncate_title(&task.title, 24),
        task.due_date.as_deref().unwrap_or("-"),
        task.context.as_deref().unwrap_or("-"),
    )
}

pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() > max_len {
        let truncated: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    } else {
        title.to_string()
    }
}

pub fn print_calendar(days: &[CalendarDay], format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(days)?,
        Format::Pretty => {
            if days.is_empty() {
                println!("{}", "Nothing due.".dimmed());
            }
            for day in days {
                println!("{}", day.label.bold());
                for task in &day.tasks {
                    let ctx = task
                        .context
                        .as_deref()
                        .map(|c| format!(" @{c}").dimmed().to_string())
                        .unwrap_or_default();
                    println!("  [{}] {}{}", task.id, task.title, ctx);
                }
            }
        }
        Format::Minimal => {
            for day in days {
                for task in &day.tasks {
                    println!("{} {:>4} {}", day.date, task.id, task.title);
                }
            }
        }
    }
    Ok(())
}

/// Which label set a `contexts` / `tags` / `projects` command prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Contexts,
    Tags,
    Projects,
}

pub fn print_labels(labels: &Labels, kind: LabelKind, format: Format) -> Result<()> {
    let (values, prefix) = match kind {
        LabelKind::Contexts => (&labels.contexts, "@"),
        LabelKind::Tags => (&labels.tags, "+"),
        LabelKind::Projects => (&labels.projects, "pro:"),
    };
    match format {
        Format::Json => print_json(values)?,
        Format::Pretty => {
            for value in values {
                println!("{}{}", prefix.dimmed(), value);
            }
        }
        Format::Minimal => {
            for value in values {
                println!("{value}");
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ParsePreview<'a> {
    #[serde(flatten)]
    fields: &'a TaskFields,
    canonical: String,
}

pub fn print_parsed(fields: &TaskFields, format: Format) -> Result<()> {
    let canonical = syntax::format(fields);
    match format {
        Format::Json => print_json(&ParsePreview { fields, canonical })?,
        Format::Pretty => {
            println!("{} {}", "title:".dimmed(), fields.title.bold());
            if let Some(ctx) = fields.context.as_deref() {
                println!("{} {ctx}", "context:".dimmed());
            }
            if let Some(project) = fields.project.as_deref() {
                println!("{} {project}", "project:".dimmed());
            }
            if !fields.tags.is_empty() {
                println!("{} {}", "tags:".dimmed(), fields.tags.join(", "));
            }
            if let Some(due) = fields.due_date.as_deref() {
                println!("{} {due}", "due:".dimmed());
            }
            println!("{} {canonical}", "canonical:".dimmed());
        }
        Format::Minimal => println!("{canonical}"),
    }
    Ok(())
}
