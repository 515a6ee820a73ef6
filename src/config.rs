use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GtdError, Result};
use crate::taskwarrior::ImportLimits;

pub const CONFIG_FILE: &str = "config.json";
pub const CONFIG_VERSION: u32 = 1;

/// Contents of `.gtd/config.json`. Every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub import: ImportLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            import: ImportLimits::default(),
        }
    }
}

impl Config {
    /// Read the config from a `.gtd` directory; a missing file means defaults.
    pub fn load(gtd_dir: &Path) -> Result<Self> {
        let path = gtd_dir.join(CONFIG_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_str(&text)
            .map_err(|err| GtdError::Config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, gtd_dir: &Path) -> Result<()> {
        fs::write(
            gtd_dir.join(CONFIG_FILE),
            serde_json::to_string_pretty(self)?,
        )?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.version > CONFIG_VERSION {
            return Err(GtdError::Config(format!(
                "config version {} is newer than supported version {CONFIG_VERSION}",
                self.version
            )));
        }
        if self.import.max_rows == 0 || self.import.max_salvage_fragments == 0 {
            return Err(GtdError::Config(
                "import limits must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
