use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured task record produced by the syntax engine and the importer,
/// and consumed by the store.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFields {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: u64,
    #[serde(flatten)]
    pub fields: TaskFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskFields {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Trim whitespace, drop empty tags, then deduplicate keeping first-seen order.
    /// Tags that restate the context (`ctx` or `@ctx`) are removed.
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        for value in [&mut self.context, &mut self.project, &mut self.due_date] {
            if let Some(v) = value.as_deref() {
                let trimmed = v.trim();
                *value = if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                };
            }
        }

        let mut seen = Vec::with_capacity(self.tags.len());
        for tag in self.tags.drain(..) {
            let trimmed = tag.trim();
            if !trimmed.is_empty() && !seen.iter().any(|t: &String| t == trimmed) {
                seen.push(trimmed.to_string());
            }
        }
        self.tags = seen;
        self.drop_context_tags();
    }

    pub(crate) fn drop_context_tags(&mut self) {
        if let Some(ctx) = self.context.as_deref() {
            let at_ctx = format!("@{ctx}");
            self.tags.retain(|t| t != ctx && *t != at_ctx);
        }
    }
}

impl std::ops::Deref for Task {
    type Target = TaskFields;

    fn deref(&self) -> &TaskFields {
        &self.fields
    }
}
