use chrono::Utc;

use crate::error::{GtdError, Result};
use crate::model::TaskFields;
use crate::output::{self, Format};
use crate::store::TaskStore;
use crate::syntax;

/// Requested changes. `syntax` is applied first, explicit fields after it.
#[derive(Debug, Default, Clone)]
pub struct EditArgs {
    pub syntax: Option<String>,
    pub title: Option<String>,
    pub context: Option<String>,
    pub project: Option<String>,
    pub tags: Option<Vec<String>>,
    pub due: Option<String>,
    pub notes: Option<String>,
    pub clear_context: bool,
    pub clear_project: bool,
    pub clear_tags: bool,
    pub clear_due: bool,
}

impl EditArgs {
    fn apply(self, fields: &mut TaskFields) -> Result<()> {
        if let Some(line) = self.syntax {
            let parsed = syntax::parse_task(&line)?;
            fields.title = parsed.title;
            fields.context = parsed.context;
            fields.project = parsed.project;
            fields.tags = parsed.tags;
            fields.due_date = parsed.due_date;
        }

        if let Some(title) = self.title {
            fields.title = title;
        }
        if let Some(context) = self.context {
            let context = context.trim().trim_start_matches(['+', '@']);
            syntax::validate_marker("context", context)?;
            fields.context = Some(context.to_string());
        }
        if let Some(project) = self.project {
            let project = project.trim();
            syntax::validate_marker("project", project)?;
            fields.project = Some(project.to_string());
        }
        if let Some(tags) = self.tags {
            let mut replaced = Vec::with_capacity(tags.len());
            for tag in &tags {
                let tag = tag.trim().trim_start_matches('+');
                if tag.is_empty() {
                    continue;
                }
                // `@name` reads back as a context, not a tag.
                syntax::validate_marker("tag", tag)?;
                replaced.push(tag.to_string());
            }
            fields.tags = replaced;
        }
        if let Some(due) = self.due {
            syntax::validate_due_date(due.trim())?;
            fields.due_date = Some(due);
        }
        if let Some(notes) = self.notes {
            fields.notes = notes;
        }

        if self.clear_context {
            fields.context = None;
        }
        if self.clear_project {
            fields.project = None;
        }
        if self.clear_tags {
            fields.tags.clear();
        }
        if self.clear_due {
            fields.due_date = None;
        }

        fields.normalize();
        if fields.title.is_empty() {
            return Err(GtdError::EmptyTitle);
        }
        Ok(())
    }
}

pub fn run(store: &dyn TaskStore, id: u64, args: EditArgs, format: Format) -> Result<()> {
    let mut task = store.read(id)?;
    args.apply(&mut task.fields)?;
    task.updated_at = Utc::now();
    store.write(&task)?;
    log::info!("event=task_edited id={id}");
    output::print_task(&task, format)
}
