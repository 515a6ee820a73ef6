use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::error::Result;
use crate::model::TaskFields;
use crate::syntax;

/// Suggested file name for `gtd export --output`.
pub const EXPORT_FILE_NAME: &str = "taskwarrior-export.json";

static EXTERNAL_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^TaskWarrior ID:\s*(\S+)").expect("valid external id regex")
});
static PRIORITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Priority:\s*([HML])\b").expect("valid priority regex"));

/// One line of `task import` input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub uuid: String,
    pub description: String,
    pub status: String,
    pub entry: String,
    pub modified: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

pub fn denormalize(records: &[TaskFields]) -> Vec<ExternalRecord> {
    denormalize_at(records, Utc::now())
}

/// Like [`denormalize`] with a fixed clock for `entry`, `modified` and
/// synthesized IDs.
pub fn denormalize_at(records: &[TaskFields], now: DateTime<Utc>) -> Vec<ExternalRecord> {
    let stamp = timestamp::to_compact(now);
    records
        .iter()
        .enumerate()
        .map(|(position, fields)| ExternalRecord {
            uuid: recover_external_id(&fields.notes)
                .unwrap_or_else(|| synthesize_id(now, position)),
            description: syntax::format(fields),
            status: if fields.completed { "completed" } else { "pending" }.to_string(),
            entry: stamp.clone(),
            modified: stamp.clone(),
            annotations: fields
                .context
                .iter()
                .map(|ctx| format!("+@{ctx}"))
                .collect(),
            due: fields
                .due_date
                .as_deref()
                .and_then(timestamp::date_to_compact),
            project: fields.project.clone(),
            tags: fields.tags.clone(),
            priority: PRIORITY_RE
                .captures(&fields.notes)
                .map(|caps| caps[1].to_string()),
        })
        .collect()
}

/// One JSON object per line, newline-terminated.
pub fn to_ndjson(records: &[ExternalRecord]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

fn recover_external_id(notes: &str) -> Option<String> {
    EXTERNAL_ID_RE
        .captures(notes)
        .map(|caps| caps[1].to_string())
}

/// `tw-<unix-millis>-<n>` where `n` is the record position plus a random
/// suffix, so IDs stay distinct within one export.
fn synthesize_id(now: DateTime<Utc>, position: usize) -> String {
    let mut bytes = [0u8; 4];
    let suffix = match getrandom::fill(&mut bytes) {
        Ok(()) => u32::from_le_bytes(bytes) % 10_000,
        Err(err) => {
            log::debug!("event=export_random_unavailable reason=\"{err}\"");
            now.timestamp_subsec_nanos() % 10_000
        }
    };
    format!("tw-{}-{position}{suffix:04}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taskwarrior::normalize;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    fn full_fields() -> TaskFields {
        TaskFields {
            title: "Pay bills".into(),
            context: Some("home".into()),
            project: Some("personal".into()),
            tags: vec!["finance".into()],
            due_date: Some("2025-04-01".into()),
            notes: "TaskWarrior ID: 5e1f-77aa\nPriority: H".into(),
            completed: true,
        }
    }

    #[test]
    fn record_fields_follow_the_task() {
        let records = denormalize_at(&[full_fields()], fixed_now());
        let record = &records[0];
        assert_eq!(record.uuid, "5e1f-77aa");
        assert_eq!(
            record.description,
            "Pay bills +finance +@home pro:personal due:2025-04-01"
        );
        assert_eq!(record.status, "completed");
        assert_eq!(record.entry, "20250314T092653Z");
        assert_eq!(record.modified, "20250314T092653Z");
        assert_eq!(record.annotations, vec!["+@home"]);
        assert_eq!(record.due.as_deref(), Some("20250401T000000Z"));
        assert_eq!(record.project.as_deref(), Some("personal"));
        assert_eq!(record.tags, vec!["finance"]);
        assert_eq!(record.priority.as_deref(), Some("H"));
    }

    #[test]
    fn missing_id_is_synthesized_and_distinct() {
        let records = denormalize_at(
            &[TaskFields::new("One"), TaskFields::new("Two")],
            fixed_now(),
        );
        let prefix = format!("tw-{}-", fixed_now().timestamp_millis());
        assert!(records[0].uuid.starts_with(&prefix));
        assert!(records[1].uuid.starts_with(&prefix));
        assert_ne!(records[0].uuid, records[1].uuid);
        assert_eq!(records[0].status, "pending");
        assert!(records[0].annotations.is_empty());
        assert_eq!(records[0].priority, None);
    }

    #[test]
    fn priority_must_be_a_known_level() {
        let fields = TaskFields {
            notes: "Priority: Urgent".into(),
            ..TaskFields::new("x")
        };
        assert_eq!(denormalize_at(&[fields], fixed_now())[0].priority, None);
    }

    #[test]
    fn ndjson_key_order_and_omissions() {
        let records = denormalize_at(&[TaskFields::new("Bare")], fixed_now());
        let text = to_ndjson(&records).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
        let line = text.lines().next().unwrap();
        assert!(line.starts_with("{\"uuid\":\"tw-"));
        assert!(line.contains("\"description\":\"Bare\",\"status\":\"pending\""));
        assert!(!line.contains("annotations"));
        assert!(!line.contains("due"));
        assert!(!line.contains("tags"));
    }

    #[test]
    fn export_then_import_keeps_structure() {
        let source = full_fields();
        let text = to_ndjson(&denormalize_at(&[source.clone()], fixed_now())).unwrap();
        let batch = normalize(text.as_bytes(), Some(EXPORT_FILE_NAME)).unwrap();
        assert_eq!(batch.records.len(), 1);

        let back = &batch.records[0];
        assert_eq!(back.title, source.title);
        assert_eq!(back.tags, source.tags);
        assert_eq!(back.project, source.project);
        assert_eq!(back.context, source.context);
        assert_eq!(back.due_date, source.due_date);
        assert_eq!(back.completed, source.completed);
        assert!(back.notes.starts_with("TaskWarrior ID: 5e1f-77aa\nPriority: H"));
    }

    #[test]
    fn synthesized_id_survives_a_second_round_trip() {
        let first = denormalize_at(&[TaskFields::new("Loop")], fixed_now());
        let text = to_ndjson(&first).unwrap();
        let batch = normalize(text.as_bytes(), None).unwrap();
        let second = denormalize_at(&batch.records, fixed_now());
        assert_eq!(second[0].uuid, first[0].uuid);
    }

    #[test]
    fn values_beyond_word_markers_survive_the_round_trip() {
        let samples = vec![
            TaskFields {
                title: "Call bank".into(),
                context: Some("home-office".into()),
                ..TaskFields::default()
            },
            TaskFields {
                title: "Call bank".into(),
                context: Some("home office".into()),
                project: Some("my project".into()),
                tags: vec!["two words".into(), "@desk".into()],
                ..TaskFields::default()
            },
            TaskFields {
                title: "Call bank".into(),
                tags: vec!["to-do".into()],
                project: Some("home.garden".into()),
                ..TaskFields::default()
            },
        ];
        let text = to_ndjson(&denormalize_at(&samples, fixed_now())).unwrap();
        let batch = normalize(text.as_bytes(), Some(EXPORT_FILE_NAME)).unwrap();
        assert_eq!(batch.records.len(), samples.len());

        for (back, source) in batch.records.iter().zip(&samples) {
            assert_eq!(back.title, source.title);
            assert_eq!(back.context, source.context);
            assert_eq!(back.project, source.project);
            assert_eq!(back.tags, source.tags);
        }
    }
}
