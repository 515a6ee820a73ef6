//! Read-only projections over stored tasks: filtered lists, the due-date
//! calendar and the distinct label sets.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::model::Task;
use crate::syntax::DATE_FORMAT;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Any,
    Active,
    Completed,
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub context: Option<String>,
    pub tag: Option<String>,
    pub project: Option<String>,
    pub state: State,
    /// Only tasks that have a due date.
    pub due_only: bool,
}

impl Filter {
    pub fn matches(&self, task: &Task) -> bool {
        let context = self.context.as_deref().map(|c| c.trim_start_matches(['+', '@']));
        let tag = self.tag.as_deref().map(|t| t.trim_start_matches('+'));

        context.is_none_or(|c| task.context.as_deref() == Some(c))
            && tag.is_none_or(|t| task.tags.iter().any(|have| have == t))
            && self
                .project
                .as_deref()
                .is_none_or(|p| task.project.as_deref() == Some(p))
            && match self.state {
                State::Any => true,
                State::Active => !task.completed,
                State::Completed => task.completed,
            }
            && (!self.due_only || task.due_date.is_some())
    }

    /// Keep matching tasks, ordered by id.
    pub fn apply(&self, mut tasks: Vec<Task>) -> Vec<Task> {
        tasks.retain(|t| self.matches(t));
        tasks.sort_by_key(|t| t.id);
        tasks
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    /// The due date as stored.
    pub date: String,
    pub label: String,
    pub tasks: Vec<Task>,
}

/// Group tasks with a due date by that date, earliest first.
pub fn calendar(tasks: &[Task], today: NaiveDate, include_completed: bool) -> Vec<CalendarDay> {
    let mut days: BTreeMap<&str, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        if task.completed && !include_completed {
            continue;
        }
        if let Some(due) = task.due_date.as_deref() {
            days.entry(due).or_default().push(task.clone());
        }
    }

    days.into_iter()
        .map(|(date, mut tasks)| {
            tasks.sort_by_key(|t| t.id);
            CalendarDay {
                label: day_label(date, today),
                date: date.to_string(),
                tasks,
            }
        })
        .collect()
}

fn day_label(date: &str, today: NaiveDate) -> String {
    let Ok(day) = NaiveDate::parse_from_str(date, DATE_FORMAT) else {
        return date.to_string();
    };
    if day == today {
        format!("Today – {}", day.format("%b %-d"))
    } else if today.checked_add_days(Days::new(1)) == Some(day) {
        format!("Tomorrow – {}", day.format("%b %-d"))
    } else {
        day.format("%A, %B %-d").to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Labels {
    pub contexts: Vec<String>,
    pub tags: Vec<String>,
    pub projects: Vec<String>,
}

/// Distinct contexts, tags and projects in use, each sorted.
pub fn labels(tasks: &[Task]) -> Labels {
    let mut contexts = BTreeSet::new();
    let mut tags = BTreeSet::new();
    let mut projects = BTreeSet::new();
    for task in tasks {
        contexts.extend(task.context.clone());
        projects.extend(task.project.clone());
        tags.extend(task.tags.iter().cloned());
    }
    Labels {
        contexts: contexts.into_iter().collect(),
        tags: tags.into_iter().collect(),
        projects: projects.into_iter().collect(),
    }
}
