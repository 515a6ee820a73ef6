use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::ImportLimits;

static FLAT_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("valid object fragment regex"));

/// How an import blob was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// TaskChampion / SQLite replica.
    Sqlite,
    /// One JSON object, or a bare JSON array of objects.
    SingleValue,
    /// One JSON object per line (`task export` output).
    Ndjson,
    /// Comma-separated objects without the surrounding brackets.
    JoinedObjects,
    /// `{...}` fragments fished out of otherwise broken text.
    Salvaged,
}

impl Shape {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::SingleValue => "single_value",
            Self::Ndjson => "ndjson",
            Self::JoinedObjects => "joined_objects",
            Self::Salvaged => "salvaged",
        }
    }
}

/// Ways of reading a text blob, tried in [`TEXT_LADDER`] order.
#[derive(Debug, Clone, Copy)]
enum TextStrategy {
    SingleValue,
    Ndjson,
    JoinedObjects,
    Salvaged,
}

const TEXT_LADDER: [TextStrategy; 4] = [
    TextStrategy::SingleValue,
    TextStrategy::Ndjson,
    TextStrategy::JoinedObjects,
    TextStrategy::Salvaged,
];

impl TextStrategy {
    fn shape(self) -> Shape {
        match self {
            Self::SingleValue => Shape::SingleValue,
            Self::Ndjson => Shape::Ndjson,
            Self::JoinedObjects => Shape::JoinedObjects,
            Self::Salvaged => Shape::Salvaged,
        }
    }

    /// Try this strategy on `text`; `None` when it does not apply.
    fn attempt(self, text: &str, limits: &ImportLimits) -> Option<Vec<Value>> {
        match self {
            Self::SingleValue => match serde_json::from_str::<Value>(text).ok()? {
                Value::Object(obj) => Some(vec![Value::Object(obj)]),
                Value::Array(items) => Some(items),
                _ => None,
            },
            Self::Ndjson => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| serde_json::from_str::<Value>(line).ok().filter(Value::is_object))
                .collect(),
            Self::JoinedObjects => {
                match serde_json::from_str::<Value>(&format!("[{text}]")).ok()? {
                    Value::Array(items) => items.iter().all(Value::is_object).then_some(items),
                    _ => None,
                }
            }
            Self::Salvaged => Some(
                FLAT_OBJECT_RE
                    .find_iter(text)
                    .take(limits.max_salvage_fragments)
                    .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
                    .filter(|v| v.get("description").is_some())
                    .collect(),
            ),
        }
    }
}

/// Walk the text ladder; the first strategy yielding at least one record wins.
pub fn detect_json(text: &str, limits: &ImportLimits) -> Option<(Shape, Vec<Value>)> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return None;
    }
    TEXT_LADDER.iter().find_map(|&strategy| {
        strategy
            .attempt(text, limits)
            .filter(|records| !records.is_empty())
            .map(|records| (strategy.shape(), records))
    })
}
