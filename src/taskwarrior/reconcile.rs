//! Turn one external record into [`TaskFields`].
//!
//! Signals are merged in a fixed order: markers in the description, then
//! explicit `tags`/`project`/`due` fields, then context hints from
//! annotations, `@`-prefixed tags and `tags_<name>` keys. Everything without
//! a structural home lands in `notes`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::timestamp;
use crate::model::TaskFields;
use crate::syntax;

pub const UNTITLED: &str = "Untitled Task";

/// Fields copied into notes as `<field>: <value>` after ID and priority.
const METADATA_FIELDS: [&str; 4] = ["entry", "modified", "imask", "parent"];
const COMPLETED_STATUSES: [&str; 3] = ["completed", "done", "deleted"];

static CONTEXT_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?@([A-Za-z0-9_]+)").expect("valid context marker regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAnObject,
    MissingDescription,
    Unbuildable,
}

#[derive(Debug)]
pub enum Reconciled {
    Full(TaskFields),
    /// Structured fields could not be built; only title, completion and notes survive.
    Minimal(TaskFields),
    Skipped(SkipReason),
}

#[derive(Debug, Error)]
enum FieldError {
    #[error("tag at position {0} is not a string")]
    NonStringTag(usize),
    #[error("tags must be a string or a list of strings")]
    TagsShape,
    #[error("project must be a string")]
    ProjectShape,
}

pub fn reconcile(raw: &Value) -> Reconciled {
    let Some(record) = raw.as_object() else {
        return Reconciled::Skipped(SkipReason::NotAnObject);
    };
    let Some(description) = record
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
    else {
        return Reconciled::Skipped(SkipReason::MissingDescription);
    };

    let completed = is_completed(record);
    let notes = build_notes(record);

    match build_fields(record, description, completed, &notes) {
        Ok(fields) => Reconciled::Full(fields),
        Err(err) => {
            log::debug!("event=import_field_fallback reason=\"{err}\"");
            match minimal_record(description, completed, notes) {
                Some(fields) => Reconciled::Minimal(fields),
                None => Reconciled::Skipped(SkipReason::Unbuildable),
            }
        }
    }
}

fn build_fields(
    record: &Map<String, Value>,
    description: &str,
    completed: bool,
    notes: &str,
) -> Result<TaskFields, FieldError> {
    let explicit_tags = explicit_tags(record.get("tags"))?;
    let explicit_project = explicit_project(record.get("project"))?;

    let annotated_context = restated_context(record, description);

    let mut restated: Vec<(&str, &str)> = Vec::new();
    if let Some(tags) = &explicit_tags {
        restated.extend(tags.iter().map(|tag| ("+", tag.as_str())));
    }
    if let Some(project) = &explicit_project {
        restated.push(("pro:", project.as_str()));
    }
    if let Some(context) = &annotated_context {
        restated.push(("+@", context.as_str()));
    }
    let cleaned = strip_restated_tokens(description, &restated);
    let parsed = syntax::parse(&cleaned);

    let mut fields = TaskFields {
        title: title_or_untitled(parsed.title),
        context: annotated_context.or(parsed.context),
        project: explicit_project.or(parsed.project),
        tags: explicit_tags.unwrap_or(parsed.tags),
        due_date: parsed.due_date.filter(|d| syntax::is_valid_date(d)),
        notes: notes.to_string(),
        completed,
    };

    if let Some(due) = record
        .get("due")
        .and_then(Value::as_str)
        .and_then(timestamp::to_due_date)
    {
        fields.due_date = Some(due);
    }

    for key in record.keys() {
        if let Some(name) = key.strip_prefix("tags_")
            && !name.is_empty()
            && !fields.tags.iter().any(|t| t == name)
        {
            fields.tags.push(name.to_string());
        }
    }

    if fields.context.is_none() {
        fields.context = context_from_annotations(record);
    }
    if fields.context.is_none() {
        fields.context = fields
            .tags
            .iter()
            .filter_map(|t| t.strip_prefix('@'))
            .find(|name| !name.is_empty())
            .map(str::to_string);
    }

    fields.drop_context_tags();
    Ok(fields)
}

fn minimal_record(description: &str, completed: bool, notes: String) -> Option<TaskFields> {
    let title = title_or_untitled(syntax::parse(description).title);
    if title.trim().is_empty() {
        return None;
    }
    Some(TaskFields {
        title,
        completed,
        notes,
        ..TaskFields::default()
    })
}

fn title_or_untitled(title: String) -> String {
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

fn explicit_tags(value: Option<&Value>) -> Result<Option<Vec<String>>, FieldError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(tag)) => Ok(Some(
            Some(tag.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .into_iter()
                .collect(),
        )),
        Some(Value::Array(items)) => {
            let mut tags = Vec::with_capacity(items.len());
            for (position, item) in items.iter().enumerate() {
                let tag = item.as_str().ok_or(FieldError::NonStringTag(position))?;
                let tag = tag.trim();
                if !tag.is_empty() {
                    tags.push(tag.to_string());
                }
            }
            Ok(Some(tags))
        }
        Some(_) => Err(FieldError::TagsShape),
    }
}

fn explicit_project(value: Option<&Value>) -> Result<Option<String>, FieldError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(project)) => {
            let project = project.trim();
            Ok((!project.is_empty()).then(|| project.to_string()))
        }
        Some(_) => Err(FieldError::ProjectShape),
    }
}

/// Drop marker runs that restate an explicit value, so values with non-word
/// characters or spaces leave no residue in the title. A value of several
/// words spans as many tokens (`+two words`, `pro:my project`).
fn strip_restated_tokens(description: &str, restated: &[(&str, &str)]) -> String {
    if restated.is_empty() {
        return description.to_string();
    }
    let mut tokens: Vec<&str> = description.split_whitespace().collect();
    for (marker, value) in restated {
        let words: Vec<&str> = value.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        let mut start = 0;
        while start + words.len() <= tokens.len() {
            if restates(&tokens[start..start + words.len()], marker, &words) {
                tokens.drain(start..start + words.len());
            } else {
                start += 1;
            }
        }
    }
    tokens.join(" ")
}

/// `window` is `marker` glued to the first word, followed by the rest.
/// The marker compares case-insensitively.
fn restates(window: &[&str], marker: &str, words: &[&str]) -> bool {
    let (Some((first, rest)), Some((head, tail))) = (window.split_first(), words.split_first())
    else {
        return false;
    };
    first
        .get(..marker.len())
        .is_some_and(|m| m.eq_ignore_ascii_case(marker))
        && first.get(marker.len()..) == Some(*head)
        && rest == tail
}

/// Context carried as a whole `+@<ctx>` annotation that the description
/// restates verbatim. This is how exported records carry contexts the word
/// markers cannot express, such as `home-office` or `home office`.
fn restated_context(record: &Map<String, Value>, description: &str) -> Option<String> {
    let tokens: Vec<&str> = description.split_whitespace().collect();
    annotation_texts(record).iter().find_map(|text| {
        let value = text.trim().strip_prefix("+@")?;
        let words: Vec<&str> = value.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }
        tokens
            .windows(words.len())
            .any(|window| restates(window, "+@", &words))
            .then(|| words.join(" "))
    })
}

fn is_completed(record: &Map<String, Value>) -> bool {
    let by_status = record
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase())
        .is_some_and(|s| COMPLETED_STATUSES.contains(&s.as_str()));
    let has_end = record.get("end").is_some_and(|v| !v.is_null());
    let flagged = record.get("completed").and_then(Value::as_bool) == Some(true);
    by_status || has_end || flagged
}

/// Annotation texts in order. Accepts a single string, a list of strings, or
/// TaskWarrior's `{entry, description}` objects (`value` in some exports).
fn annotation_texts(record: &Map<String, Value>) -> Vec<String> {
    match record.get("annotations") {
        Some(Value::String(text)) => vec![text.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.clone()),
                Value::Object(obj) => obj
                    .get("description")
                    .or_else(|| obj.get("value"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn context_from_annotations(record: &Map<String, Value>) -> Option<String> {
    annotation_texts(record).iter().find_map(|text| {
        CONTEXT_MARKER_RE
            .captures(text)
            .map(|caps| caps[1].to_string())
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn build_notes(record: &Map<String, Value>) -> String {
    let mut lines = Vec::new();

    let external_id = record
        .get("uuid")
        .and_then(scalar_text)
        .or_else(|| record.get("id").and_then(scalar_text));
    if let Some(id) = external_id {
        lines.push(format!("TaskWarrior ID: {id}"));
    }
    if let Some(priority) = record.get("priority").and_then(scalar_text) {
        lines.push(format!("Priority: {priority}"));
    }
    for field in METADATA_FIELDS {
        if let Some(value) = record.get(field).and_then(scalar_text) {
            lines.push(format!("{field}: {value}"));
        }
    }

    let mut paragraphs: Vec<String> = annotation_texts(record)
        .into_iter()
        .filter(|text| !text.trim().is_empty() && !CONTEXT_MARKER_RE.is_match(text))
        .collect();
    paragraphs.extend(record.iter().filter_map(|(key, value)| {
        key.starts_with("annotation_")
            .then(|| value.as_str())
            .flatten()
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
    }));

    let mut notes = lines.join("\n");
    for paragraph in paragraphs {
        if !notes.is_empty() {
            notes.push_str("\n\n");
        }
        notes.push_str(paragraph.trim());
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full(raw: Value) -> TaskFields {
        match reconcile(&raw) {
            Reconciled::Full(fields) => fields,
            other => panic!("expected full record, got {other:?}"),
        }
    }

    #[test]
    fn description_markers_populate_fields() {
        let fields = full(json!({
            "description": "Buy milk +errands @home pro:house due:2025-04-01"
        }));
        assert_eq!(fields.title, "Buy milk");
        assert_eq!(fields.tags, vec!["errands"]);
        assert_eq!(fields.context.as_deref(), Some("home"));
        assert_eq!(fields.project.as_deref(), Some("house"));
        assert_eq!(fields.due_date.as_deref(), Some("2025-04-01"));
        assert!(!fields.completed);
        assert_eq!(fields.notes, "");
    }

    #[test]
    fn missing_or_blank_description_is_skipped() {
        assert!(matches!(
            reconcile(&json!({"status": "pending"})),
            Reconciled::Skipped(SkipReason::MissingDescription)
        ));
        assert!(matches!(
            reconcile(&json!({"description": "   "})),
            Reconciled::Skipped(SkipReason::MissingDescription)
        ));
        assert!(matches!(
            reconcile(&json!({"description": 42})),
            Reconciled::Skipped(SkipReason::MissingDescription)
        ));
        assert!(matches!(
            reconcile(&json!(["description"])),
            Reconciled::Skipped(SkipReason::NotAnObject)
        ));
    }

    #[test]
    fn completion_vocabulary() {
        for status in ["completed", "done", "deleted", "Completed"] {
            assert!(full(json!({"description": "x", "status": status})).completed);
        }
        assert!(!full(json!({"description": "x", "status": "pending"})).completed);
        assert!(full(json!({"description": "x", "end": "20240101T000000Z"})).completed);
        assert!(full(json!({"description": "x", "completed": true})).completed);
        assert!(!full(json!({"description": "x", "end": null})).completed);
    }

    #[test]
    fn explicit_fields_override_markers() {
        let fields = full(json!({
            "description": "File taxes +old pro:marker due:2025-01-01",
            "tags": ["finance", "yearly"],
            "project": "admin",
            "due": "20250415T000000Z"
        }));
        assert_eq!(fields.title, "File taxes");
        assert_eq!(fields.tags, vec!["finance", "yearly"]);
        assert_eq!(fields.project.as_deref(), Some("admin"));
        assert_eq!(fields.due_date.as_deref(), Some("2025-04-15"));
    }

    #[test]
    fn restated_tokens_with_punctuation_leave_no_residue() {
        let fields = full(json!({
            "description": "Plant bulbs +to-do pro:home.garden",
            "tags": ["to-do"],
            "project": "home.garden"
        }));
        assert_eq!(fields.title, "Plant bulbs");
        assert_eq!(fields.tags, vec!["to-do"]);
        assert_eq!(fields.project.as_deref(), Some("home.garden"));
    }

    #[test]
    fn unparseable_due_keeps_marker_date() {
        let fields = full(json!({
            "description": "Ship it due:2025-06-01",
            "due": "someday"
        }));
        assert_eq!(fields.due_date.as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn impossible_marker_date_is_dropped() {
        let fields = full(json!({"description": "Odd due:2025-13-99"}));
        assert_eq!(fields.due_date, None);
        assert_eq!(fields.title, "Odd");
    }

    #[test]
    fn context_recovered_from_annotations_in_order() {
        let fields = full(json!({
            "description": "Call plumber",
            "annotations": [
                {"entry": "20240101T000000Z", "description": "left a voicemail"},
                {"entry": "20240102T000000Z", "description": "try again +@phone"},
                {"entry": "20240103T000000Z", "description": "@office later"}
            ]
        }));
        assert_eq!(fields.context.as_deref(), Some("phone"));
        assert_eq!(fields.notes, "left a voicemail");
    }

    #[test]
    fn description_context_beats_annotations() {
        let fields = full(json!({
            "description": "Call plumber @home",
            "annotations": "@office"
        }));
        assert_eq!(fields.context.as_deref(), Some("home"));
    }

    #[test]
    fn context_recovered_from_at_tag() {
        let fields = full(json!({
            "description": "Sort mail",
            "tags": ["admin", "@desk"]
        }));
        assert_eq!(fields.context.as_deref(), Some("desk"));
        assert_eq!(fields.tags, vec!["admin"]);
    }

    #[test]
    fn tag_prefixed_keys_add_tags_and_context() {
        let fields = full(json!({
            "description": "Mow lawn",
            "tags_weekend": "x",
            "tags_@yard": "x"
        }));
        assert_eq!(fields.context.as_deref(), Some("yard"));
        assert_eq!(fields.tags, vec!["weekend"]);
    }

    #[test]
    fn string_tags_become_single_tag() {
        let fields = full(json!({"description": "Read", "tags": "books"}));
        assert_eq!(fields.tags, vec!["books"]);
    }

    #[test]
    fn notes_carry_metadata_in_fixed_order() {
        let fields = full(json!({
            "description": "Renew license",
            "uuid": "a1b2c3d4-0000-4000-8000-000000000001",
            "priority": "H",
            "modified": "20240102T000000Z",
            "entry": "20240101T000000Z",
            "annotation_1699962011": "bring the old card",
            "annotations": [{"description": "check hours first"}]
        }));
        assert_eq!(
            fields.notes,
            "TaskWarrior ID: a1b2c3d4-0000-4000-8000-000000000001\n\
             Priority: H\n\
             entry: 20240101T000000Z\n\
             modified: 20240102T000000Z\n\
             \n\
             check hours first\n\
             \n\
             bring the old card"
        );
    }

    #[test]
    fn numeric_id_used_when_uuid_missing() {
        let fields = full(json!({"description": "x", "id": 12}));
        assert_eq!(fields.notes, "TaskWarrior ID: 12");
    }

    #[test]
    fn non_string_tags_fall_back_to_minimal_record() {
        let raw = json!({
            "description": "Fix bike +repair @garage pro:cycling",
            "status": "completed",
            "uuid": "u-1",
            "tags": ["ok", 7]
        });
        match reconcile(&raw) {
            Reconciled::Minimal(fields) => {
                assert_eq!(fields.title, "Fix bike");
                assert!(fields.completed);
                assert!(fields.tags.is_empty());
                assert_eq!(fields.context, None);
                assert_eq!(fields.project, None);
                assert_eq!(fields.notes, "TaskWarrior ID: u-1");
            }
            other => panic!("expected minimal record, got {other:?}"),
        }
    }

    #[test]
    fn non_string_project_falls_back_to_minimal_record() {
        assert!(matches!(
            reconcile(&json!({"description": "x", "project": {"name": "p"}})),
            Reconciled::Minimal(_)
        ));
    }

    #[test]
    fn marker_only_description_gets_placeholder_title() {
        let fields = full(json!({"description": "+solo"}));
        assert_eq!(fields.title, UNTITLED);
        assert_eq!(fields.tags, vec!["solo"]);
    }

    #[test]
    fn restated_context_annotation_keeps_non_word_context() {
        let fields = full(json!({
            "description": "Call bank +@home-office",
            "annotations": ["+@home-office"]
        }));
        assert_eq!(fields.title, "Call bank");
        assert_eq!(fields.context.as_deref(), Some("home-office"));
        assert_eq!(fields.notes, "");
    }

    #[test]
    fn multi_word_values_are_stripped_as_runs() {
        let fields = full(json!({
            "description": "Call bank +two words +@home office pro:my project",
            "annotations": ["+@home office"],
            "tags": ["two words"],
            "project": "my project"
        }));
        assert_eq!(fields.title, "Call bank");
        assert_eq!(fields.tags, vec!["two words"]);
        assert_eq!(fields.project.as_deref(), Some("my project"));
        assert_eq!(fields.context.as_deref(), Some("home office"));
    }

    #[test]
    fn context_annotation_not_in_description_uses_word_marker() {
        let fields = full(json!({
            "description": "Call bank",
            "annotations": ["+@home-office"]
        }));
        assert_eq!(fields.title, "Call bank");
        assert_eq!(fields.context.as_deref(), Some("home"));
    }
}
