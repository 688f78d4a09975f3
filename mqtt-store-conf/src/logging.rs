use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::logger::{self, Logger};

/// The `[log]` section: where records go and the lowest level that is written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Log {
    pub to: To,
    #[serde(deserialize_with = "deserialize_level")]
    pub level: slog::Level,
    pub dir: PathBuf,
    pub file: String,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            to: To::default(),
            level: slog::Level::Info,
            dir: PathBuf::from("/var/log/mqtt-store"),
            file: String::from("mqtt-store.log"),
        }
    }
}

impl Log {
    /// Log file location, `None` when `file` is empty.
    #[inline]
    pub fn path(&self) -> Option<PathBuf> {
        (!self.file.is_empty()).then(|| self.dir.join(&self.file))
    }

    /// Root logger for this section, see [`logger::config_logger`].
    #[inline]
    pub fn logger(&self) -> Result<Logger> {
        logger::config_logger(self)
    }

    /// Builds the root logger and routes the `log` facade into it. Works once per process.
    pub fn init(&self) -> Result<Logger> {
        let logger = self.logger()?;
        logger::logger_init(logger.clone(), self.level)?;
        Ok(logger)
    }
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum To {
    Off,
    File,
    #[default]
    Console,
    Both,
}

impl To {
    #[inline]
    pub fn file(&self) -> bool {
        matches!(self, To::Both | To::File)
    }

    #[inline]
    pub fn console(&self) -> bool {
        matches!(self, To::Both | To::Console)
    }
}

impl FromStr for To {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(To::Off),
            "file" => Ok(To::File),
            "console" => Ok(To::Console),
            "both" => Ok(To::Both),
            _ => Err(anyhow!("unknown log destination `{s}`, expected off, file, console or both")),
        }
    }
}

impl TryFrom<String> for To {
    type Error = anyhow::Error;

    #[inline]
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<slog::Level, D::Error>
where
    D: Deserializer<'de>,
{
    let level = String::deserialize(deserializer)?;
    slog::Level::from_str(&level).map_err(|_| {
        de::Error::invalid_value(de::Unexpected::Str(&level), &"trace, debug, info, warn, error or critical")
    })
}
