//! TaskChampion / SQLite replica reader.
//!
//! The upload is copied to a private temp file and opened read-only. Both
//! the connection and the temp file are released by `Drop` on every path.
//! Rows come back as JSON objects already shaped like `task export`
//! records, so the normal reconciliation applies to them unchanged.

use std::io::Write;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{ImportLimits, timestamp};
use crate::syntax;

const SQLITE_MAGIC: &[u8] = b"SQLite";
const SQLITE_EXTENSIONS: [&str; 3] = [".sqlite", ".sqlite3", ".db"];

const EXACT_TABLE_NAMES: [&str; 8] = [
    "tasks", "task", "Tasks", "Task", "TASKS", "TASK", "TaskRC", "taskrc",
];
const TASK_LIKE_COLUMNS: [&str; 4] = ["title", "description", "completed", "status"];
const DESCRIPTION_COLUMNS: [&str; 6] = ["description", "title", "summary", "name", "text", "task"];
const PASSTHROUGH_COLUMNS: [&str; 6] = ["entry", "modified", "end", "priority", "imask", "parent"];

#[derive(Debug, Error)]
pub enum SqliteImportError {
    #[error("could not stage database file: {0}")]
    Stage(#[from] std::io::Error),
    #[error("not a readable SQLite database: {0}")]
    Open(#[from] rusqlite::Error),
    #[error("no task-like table found")]
    NoTaskTable,
    #[error("table '{0}' has no rows")]
    Empty(String),
}

/// Whether the upload should take the SQLite branch.
pub fn looks_like_sqlite(blob: &[u8], source_hint: Option<&str>) -> bool {
    let magic = blob
        .get(..16)
        .is_some_and(|header| header.windows(SQLITE_MAGIC.len()).any(|w| w == SQLITE_MAGIC));
    let by_name = source_hint.is_some_and(|name| {
        let name = name.to_ascii_lowercase();
        SQLITE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    });
    magic || by_name
}

/// Ways of picking the task table, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStrategy {
    /// One of the well-known table names.
    ExactName,
    /// First table whose name contains "task".
    FuzzyName,
    /// First table with a title/description/completed/status column.
    ColumnHeuristic,
}

impl TableStrategy {
    pub const ORDER: [TableStrategy; 3] = [
        TableStrategy::ExactName,
        TableStrategy::FuzzyName,
        TableStrategy::ColumnHeuristic,
    ];

    pub fn select(self, conn: &Connection, tables: &[String]) -> Option<String> {
        match self {
            Self::ExactName => EXACT_TABLE_NAMES
                .iter()
                .find(|name| tables.iter().any(|t| t == *name))
                .map(|name| name.to_string()),
            Self::FuzzyName => tables
                .iter()
                .find(|t| t.to_lowercase().contains("task"))
                .cloned(),
            Self::ColumnHeuristic => tables
                .iter()
                .find(|t| {
                    table_columns(conn, t).is_ok_and(|columns| {
                        columns
                            .iter()
                            .any(|c| TASK_LIKE_COLUMNS.contains(&c.to_lowercase().as_str()))
                    })
                })
                .cloned(),
        }
    }
}

/// Read the task table of a SQLite upload as external-record-shaped objects.
pub fn read_task_rows(
    blob: &[u8],
    limits: &ImportLimits,
) -> Result<Vec<Value>, SqliteImportError> {
    let mut staged = tempfile::Builder::new()
        .prefix("gtd-import-")
        .suffix(".sqlite3")
        .tempfile()?;
    staged.write_all(blob)?;
    staged.flush()?;

    let conn = Connection::open_with_flags(
        staged.path(),
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let tables = list_tables(&conn)?;
    let (strategy, table) = TableStrategy::ORDER
        .iter()
        .find_map(|s| s.select(&conn, &tables).map(|t| (*s, t)))
        .ok_or(SqliteImportError::NoTaskTable)?;
    log::debug!("event=sqlite_table table={table} strategy={strategy:?}");

    let rows = read_rows(&conn, &table, limits.max_rows)?;
    if rows.is_empty() {
        return Err(SqliteImportError::Empty(table));
    }

    let rows = expand_champion_rows(rows);
    Ok(rows.iter().map(map_row).collect())
}

fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY rowid")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn read_rows(
    conn: &Connection,
    table: &str,
    max_rows: usize,
) -> rusqlite::Result<Vec<Map<String, Value>>> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT ?1", quote_ident(table)))?;
    let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let limit = i64::try_from(max_rows).unwrap_or(i64::MAX);

    let mut rows = stmt.query([limit])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Map::new();
        for (idx, name) in names.iter().enumerate() {
            record.insert(name.clone(), sql_to_json(row.get_ref(idx)?));
        }
        out.push(record);
    }
    Ok(out)
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// TaskChampion keeps each task as `uuid` plus a JSON `data` object.
fn expand_champion_rows(rows: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
    let has_pair = rows.first().is_some_and(|row| {
        let keys: Vec<String> = row.keys().map(|k| k.to_lowercase()).collect();
        keys.iter().any(|k| k == "uuid") && keys.iter().any(|k| k == "data")
    });
    if !has_pair {
        return rows;
    }

    rows.into_iter()
        .map(|row| {
            let lower = lowercase_keys(&row);
            let expanded = lower
                .get("data")
                .and_then(Value::as_str)
                .and_then(|data| serde_json::from_str::<Value>(data).ok());
            match expanded {
                Some(Value::Object(mut data)) => {
                    if let Some(uuid) = lower.get("uuid") {
                        data.insert("uuid".into(), uuid.clone());
                    }
                    data
                }
                _ => row,
            }
        })
        .collect()
}

fn lowercase_keys(row: &Map<String, Value>) -> Map<String, Value> {
    row.iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect()
}

fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

fn push_unique(tags: &mut Vec<Value>, tag: &str) {
    if !tags.iter().any(|t| t.as_str() == Some(tag)) {
        tags.push(Value::String(tag.to_string()));
    }
}

fn is_context_annotation(annotation: &Value) -> bool {
    annotation.as_str().is_some_and(|text| text.starts_with('@'))
}

/// Map one row with an unknown schema onto the `task export` record shape.
fn map_row(row: &Map<String, Value>) -> Value {
    let lower = lowercase_keys(row);
    let mut mapped = Map::new();

    let description = DESCRIPTION_COLUMNS
        .iter()
        .find_map(|col| lower.get(*col).and_then(non_empty_text));

    let status = match lower.get("status").and_then(non_empty_text) {
        Some(status) => status,
        None if truthy(lower.get("completed")) || truthy(lower.get("done")) => "completed".into(),
        None => "pending".into(),
    };
    mapped.insert("status".into(), Value::String(status));

    let mut tags: Vec<Value> = Vec::new();
    let mut annotations: Vec<Value> = Vec::new();

    if let Some(description) = description {
        let markers = syntax::parse(&description);
        if let Some(ctx) = markers.context {
            annotations.push(Value::String(format!("@{ctx}")));
        }
        if let Some(project) = markers.project {
            mapped.insert("project".into(), Value::String(project));
        }
        tags.extend(markers.tags.into_iter().map(Value::String));
        if let Some(due) = markers.due_date.as_deref().and_then(timestamp::date_to_compact) {
            mapped.insert("due".into(), Value::String(due));
        }
        mapped.insert("description".into(), Value::String(description));
    }

    annotations.extend(
        lower
            .iter()
            .filter(|(k, _)| k.starts_with("annotation_"))
            .filter_map(|(_, v)| non_empty_text(v).map(Value::String)),
    );

    for key in ["uuid", "due"] {
        if let Some(value) = lower.get(key).filter(|v| !v.is_null()) {
            mapped.insert(key.into(), value.clone());
        }
    }

    if let Some(project) = lower.get("project").and_then(non_empty_text) {
        if project.contains('.') {
            let parts: Vec<&str> = project.split('.').filter(|p| !p.is_empty()).collect();
            if let Some(first) = parts.first() {
                mapped.insert("project".into(), Value::String(first.to_string()));
            }
            for part in parts {
                push_unique(&mut tags, part);
            }
        } else {
            mapped.insert("project".into(), Value::String(project));
        }
    }

    match lower.get("tags") {
        Some(Value::String(raw)) if !raw.trim().is_empty() => {
            tags = match serde_json::from_str::<Value>(raw) {
                Ok(Value::Array(items)) => items,
                _ => raw
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| Value::String(t.to_string()))
                    .collect(),
            };
        }
        Some(Value::Array(items)) => tags = items.clone(),
        _ => {}
    }

    for key in lower.keys() {
        if let Some(name) = key.strip_prefix("tags_").filter(|n| !n.is_empty()) {
            push_unique(&mut tags, name);
            if name.starts_with('@') && !annotations.iter().any(is_context_annotation) {
                annotations.push(Value::String(name.to_string()));
            }
        }
    }

    if !tags.is_empty() {
        mapped.insert("tags".into(), Value::Array(tags));
    }
    if !annotations.is_empty() {
        mapped.insert("annotations".into(), Value::Array(annotations));
    }
    for key in PASSTHROUGH_COLUMNS {
        if let Some(value) = lower.get(key).filter(|v| !v.is_null()) {
            mapped.insert(key.into(), value.clone());
        }
    }

    Value::Object(mapped)
}
