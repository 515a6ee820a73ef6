//! GTD inline syntax.
//!
//! A task line mixes plain words with markers:
//!
//! - `+@word` or `@word`: context (one per line, compound form preferred)
//! - `+word`: tag (any number, kept in order)
//! - `pro:word`: project
//! - `due:YYYY-MM-DD`: due date
//!
//! Example: `Pay bills +finance +@home due:2025-04-01 pro:personal`.
//!
//! [`parse`] never fails; callers that need a usable task go through
//! [`parse_task`], which rejects an empty title or an impossible date.
//! Prose that happens to look like a marker (`pro:active`, an e-mail
//! address) is read as a marker.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{GtdError, Result};
use crate::model::TaskFields;

static COMPOUND_CONTEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+@([A-Za-z0-9_]+)").expect("valid compound context regex"));
static BARE_CONTEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("valid context regex"));
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+([A-Za-z0-9_]+)").expect("valid tag regex"));
static PROJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bpro:([A-Za-z0-9_]+)").expect("valid project regex"));
static DUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdue:([0-9]{4}-[0-9]{2}-[0-9]{2})").expect("valid due regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Split a free-text line into structured fields.
pub fn parse(line: &str) -> TaskFields {
    let mut text = line.to_string();

    let context = take_first(&COMPOUND_CONTEXT_RE, &mut text)
        .or_else(|| take_first(&BARE_CONTEXT_RE, &mut text));

    let mut tags: Vec<String> = TAG_RE
        .captures_iter(&text)
        .map(|caps| caps[1].to_string())
        .collect();
    if !tags.is_empty() {
        text = TAG_RE.replace_all(&text, "").into_owned();
    }

    let project = take_first(&PROJECT_RE, &mut text);
    let due_date = take_first(&DUE_RE, &mut text);

    if let Some(ctx) = context.as_deref() {
        tags.retain(|t| t != ctx);
    }

    TaskFields {
        title: collapse_whitespace(&text),
        context,
        project,
        tags,
        due_date,
        notes: String::new(),
        completed: false,
    }
}

/// Parse a line and enforce what a stored task needs: a non-empty title and,
/// when present, a due date that exists on the calendar.
pub fn parse_task(line: &str) -> Result<TaskFields> {
    let fields = parse(line);
    if fields.title.is_empty() {
        return Err(GtdError::EmptyTitle);
    }
    if let Some(due) = fields.due_date.as_deref() {
        validate_due_date(due)?;
    }
    Ok(fields)
}

/// Render fields back into a single line: title, tags, context, project, due.
pub fn format(fields: &TaskFields) -> String {
    let mut line = fields.title.clone();
    for tag in &fields.tags {
        line.push_str(" +");
        line.push_str(tag);
    }
    if let Some(ctx) = fields.context.as_deref() {
        line.push_str(" +@");
        line.push_str(ctx);
    }
    if let Some(project) = fields.project.as_deref() {
        line.push_str(" pro:");
        line.push_str(project);
    }
    if let Some(due) = fields.due_date.as_deref() {
        line.push_str(" due:");
        line.push_str(due);
    }
    line
}

pub fn is_valid_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}

pub fn validate_due_date(value: &str) -> Result<()> {
    if is_valid_date(value) {
        Ok(())
    } else {
        Err(GtdError::InvalidDueDate(value.to_string()))
    }
}

/// True when `value` survives as a `+tag`, `+@context` or `pro:project`
/// marker, i.e. it is a single word of `[A-Za-z0-9_]`.
pub fn is_marker_word(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_marker(field: &'static str, value: &str) -> Result<()> {
    if is_marker_word(value) {
        Ok(())
    } else {
        Err(GtdError::InvalidMarker {
            field,
            value: value.to_string(),
        })
    }
}

fn take_first(re: &Regex, text: &mut String) -> Option<String> {
    let (range, value) = {
        let caps = re.captures(text.as_str())?;
        let whole = caps.get(0)?;
        (whole.range(), caps[1].to_string())
    };
    text.replace_range(range, "");
    Some(value)
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_example() {
        let fields = parse("Pay bills +finance +@home due:2025-04-01 pro:personal");
        assert_eq!(fields.title, "Pay bills");
        assert_eq!(fields.context.as_deref(), Some("home"));
        assert_eq!(fields.tags, vec!["finance"]);
        assert_eq!(fields.project.as_deref(), Some("personal"));
        assert_eq!(fields.due_date.as_deref(), Some("2025-04-01"));
        assert!(!fields.completed);
        assert!(fields.notes.is_empty());
    }

    #[test]
    fn plain_text_has_no_markers() {
        let fields = parse("  Water   the plants  ");
        assert_eq!(fields.title, "Water the plants");
        assert_eq!(fields, TaskFields::new("Water the plants"));
    }

    #[test]
    fn compound_context_is_never_a_tag() {
        let fields = parse("Call mom +@phone +family");
        assert_eq!(fields.context.as_deref(), Some("phone"));
        assert_eq!(fields.tags, vec!["family"]);
        assert_eq!(fields.title, "Call mom");
    }

    #[test]
    fn compound_context_wins_over_earlier_bare_context() {
        let fields = parse("Fix sink @garage +@home");
        assert_eq!(fields.context.as_deref(), Some("home"));
        // The bare marker is left for the reader; only one context is taken.
        assert_eq!(fields.title, "Fix sink @garage");
    }

    #[test]
    fn bare_context_takes_leftmost() {
        let fields = parse("Print @office then @home");
        assert_eq!(fields.context.as_deref(), Some("office"));
        assert_eq!(fields.title, "Print then @home");
    }

    #[test]
    fn tags_keep_left_to_right_order() {
        let fields = parse("+zeta plan +alpha trip +mid");
        assert_eq!(fields.tags, vec!["zeta", "alpha", "mid"]);
        assert_eq!(fields.title, "plan trip");
    }

    #[test]
    fn tag_restating_the_context_is_dropped() {
        let fields = parse("Sweep @home +home +chores");
        assert_eq!(fields.context.as_deref(), Some("home"));
        assert_eq!(fields.tags, vec!["chores"]);
    }

    #[test]
    fn project_literal_is_case_insensitive() {
        let fields = parse("Draft PRO:Thesis outline");
        assert_eq!(fields.project.as_deref(), Some("Thesis"));
        assert_eq!(fields.title, "Draft outline");
    }

    #[test]
    fn only_first_project_and_due_are_taken() {
        let fields = parse("A pro:one pro:two due:2025-01-01 due:2026-01-01");
        assert_eq!(fields.project.as_deref(), Some("one"));
        assert_eq!(fields.due_date.as_deref(), Some("2025-01-01"));
        assert_eq!(fields.title, "A pro:two due:2026-01-01");
    }

    #[test]
    fn due_date_is_kept_verbatim() {
        let fields = parse("Renew passport DUE:2025-04-01");
        assert_eq!(fields.due_date.as_deref(), Some("2025-04-01"));
    }

    #[test]
    fn due_date_digit_pattern_only() {
        let fields = parse("Odd due:2025-13-99");
        assert_eq!(fields.due_date.as_deref(), Some("2025-13-99"));

        let fields = parse("Loose due:2025-4-1");
        assert_eq!(fields.due_date, None);
        assert_eq!(fields.title, "Loose due:2025-4-1");
    }

    #[test]
    fn marker_only_line_yields_empty_title() {
        let fields = parse("+tag @ctx pro:p");
        assert_eq!(fields.title, "");
        assert!(matches!(parse_task("+tag @ctx pro:p"), Err(GtdError::EmptyTitle)));
    }

    #[test]
    fn parse_task_rejects_impossible_date() {
        let err = parse_task("Odd due:2025-02-30").unwrap_err();
        assert!(matches!(err, GtdError::InvalidDueDate(ref d) if d == "2025-02-30"));
        assert!(parse_task("Fine due:2024-02-29").is_ok());
    }

    #[test]
    fn format_uses_fixed_order() {
        let fields = TaskFields {
            title: "Pay bills".into(),
            context: Some("home".into()),
            project: Some("personal".into()),
            tags: vec!["finance".into(), "monthly".into()],
            due_date: Some("2025-04-01".into()),
            ..TaskFields::default()
        };
        assert_eq!(
            format(&fields),
            "Pay bills +finance +monthly +@home pro:personal due:2025-04-01"
        );
    }

    #[test]
    fn format_of_bare_title_is_the_title() {
        assert_eq!(format(&TaskFields::new("Just this")), "Just this");
    }

    #[test]
    fn parse_inverts_format() {
        let samples = vec![
            TaskFields::new("Nothing else"),
            TaskFields {
                title: "Buy milk".into(),
                tags: vec!["errands".into(), "weekly".into()],
                context: Some("store".into()),
                project: Some("house".into()),
                due_date: Some("2025-04-01".into()),
                ..TaskFields::default()
            },
            TaskFields {
                title: "Review the budget".into(),
                project: Some("finance_2025".into()),
                ..TaskFields::default()
            },
            TaskFields {
                title: "Stretch".into(),
                context: Some("gym".into()),
                due_date: Some("2026-10-18".into()),
                ..TaskFields::default()
            },
        ];
        for fields in samples {
            assert_eq!(parse(&format(&fields)), fields, "line: {}", format(&fields));
        }
    }

    #[test]
    fn is_valid_date_requires_padded_calendar_date() {
        assert!(is_valid_date("2025-04-01"));
        assert!(!is_valid_date("2025-4-01"));
        assert!(!is_valid_date("2025-04-31"));
        assert!(!is_valid_date(""));
    }

    #[test]
    fn marker_words_are_what_the_markers_can_hold() {
        for value in ["home", "finance_2025", "A1"] {
            assert!(is_marker_word(value), "{value}");
        }
        for value in ["", "home-office", "my project", "@desk", "café"] {
            assert!(!is_marker_word(value), "{value}");
        }
        assert!(matches!(
            validate_marker("context", "home-office"),
            Err(GtdError::InvalidMarker { field: "context", .. })
        ));
    }
}
