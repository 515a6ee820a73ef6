use thiserror::Error;

#[derive(Debug, Error)]
pub enum GtdError {
    #[error("not a gtd directory (run `gtd init` first)")]
    NotInitialized,

    #[error("gtd already initialized in this directory")]
    AlreadyInitialized,

    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("task title is empty once markers are removed")]
    EmptyTitle,

    #[error("invalid due date '{0}' (expected a calendar date as YYYY-MM-DD)")]
    InvalidDueDate(String),

    #[error("invalid {field} '{value}' (expected letters, digits or underscores)")]
    InvalidMarker { field: &'static str, value: String },

    #[error("invalid import data: {0}")]
    ImportFormat(String),

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GtdError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::TaskNotFound(_) => "task_not_found",
            Self::EmptyTitle => "empty_title",
            Self::InvalidDueDate(_) => "invalid_due_date",
            Self::InvalidMarker { .. } => "invalid_marker",
            Self::ImportFormat(_) => "import_format_error",
            Self::Locked(_) => "locked",
            Self::Config(_) => "config_error",
            Self::Logging(_) => "logging_error",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, GtdError>;
