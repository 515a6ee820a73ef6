//! Diagnostic logging to stderr.
//!
//! Events are `key=value` metadata (`event=import_shape shape=ndjson`).
//! Task contents only appear at debug level or below. `RUST_LOG` takes
//! precedence over the `--log-level` flag.

use flexi_logger::{Logger, LoggerHandle};
use once_cell::sync::OnceCell;

use crate::error::{GtdError, Result};

pub const DEFAULT_LEVEL: &str = "warn";
const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

/// Start the logger once per process. Later calls are no-ops.
pub fn init(level: &str) -> Result<()> {
    let level = normalize_level(level)?;
    LOGGER.get_or_try_init(|| {
        let handle = Logger::try_with_env_or_str(level)
            .map_err(|err| GtdError::Logging(format!("invalid log spec `{level}`: {err}")))?
            .log_to_stderr()
            .format(flexi_logger::default_format)
            .start()
            .map_err(|err| GtdError::Logging(format!("failed to start logger: {err}")))?;
        log::debug!(
            "event=logging_init level={level} version={}",
            crate::build_info::long_version()
        );
        Ok::<_, GtdError>(handle)
    })?;
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str> {
    let wanted = level.trim().to_ascii_lowercase();
    LEVELS
        .iter()
        .find(|known| **known == wanted)
        .copied()
        .ok_or_else(|| {
            GtdError::Logging(format!(
                "unsupported log level `{level}` (expected one of {})",
                LEVELS.join(", ")
            ))
        })
}
