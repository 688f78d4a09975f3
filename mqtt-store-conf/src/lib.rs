//! Configuration and logging setup for `mqtt-store`
//!
//! Settings are read with the `config` crate from TOML sources; every field has a default, so an
//! absent file is the same as an empty one:
//!
//! ```toml
//! [store]
//! max_topic_levels = 0   # 0 = unlimited
//! max_entries = 0        # 0 = unlimited
//!
//! [log]
//! to = "console"         # off | file | console | both
//! level = "info"
//! dir = "/var/log/mqtt-store"
//! file = "mqtt-store.log"
//! ```
//!
//! ```
//! use mqtt_store_conf::Settings;
//!
//! let settings = Settings::from_toml("[store]\nmax_entries = 10").unwrap();
//! let store = settings.build_store::<String>();
//! assert_eq!(store.options().max_entries, 10);
//! ```

#![deny(unsafe_code)]

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use anyhow::Result;
use config::{Config, File, FileFormat};
use serde::Deserialize;

use mqtt_store::{SharedStore, StoreOptions};

pub use self::logging::{Log, To};

pub mod logger;
pub mod logging;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CFG_NAME: &str = "mqtt-store";

#[derive(Clone)]
pub struct Settings(Arc<Inner>);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inner {
    #[serde(default)]
    pub store: StoreOptions,
    #[serde(default)]
    pub log: Log,
}

impl Deref for Settings {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self(Arc::new(Inner::default()))
    }
}

impl Settings {
    /// Reads `mqtt-store.toml` from the working directory, then `cfg_name` on top of it. Both
    /// files are optional.
    pub fn new(cfg_name: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::with_name(DEFAULT_CFG_NAME).required(false));
        if let Some(cfg) = cfg_name {
            builder = builder.add_source(File::with_name(cfg).required(false));
        }
        Self::build(builder)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(s, FileFormat::Toml)))
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let inner: Inner = builder.build()?.try_deserialize()?;
        Ok(Self(Arc::new(inner)))
    }

    #[inline]
    pub fn logs(&self) {
        log::debug!("Config info is {:?}", self.0);
        log::info!("store.max_topic_levels is {}", self.store.max_topic_levels);
        log::info!("store.max_entries is {}", self.store.max_entries);
        log::info!("log config is: {:?}, path: {:?}", self.log, self.log.path());
    }

    /// Root logger for the configured destination and level.
    #[inline]
    pub fn logger(&self) -> Result<logger::Logger> {
        self.log.logger()
    }

    #[inline]
    pub fn build_store<V>(&self) -> SharedStore<V> {
        SharedStore::new(self.store.clone())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Settings ...")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{Settings, To};
    use mqtt_store::StoreError;

    #[test]
    fn defaults() {
        let s = Settings::from_toml("").unwrap();
        assert_eq!(s.store.max_topic_levels, 0);
        assert_eq!(s.store.max_entries, 0);
        assert_eq!(s.log.to, To::Console);
        assert_eq!(s.log.level, slog::Level::Info);
        assert_eq!(s.log.path(), Some(PathBuf::from("/var/log/mqtt-store/mqtt-store.log")));

        let s = Settings::new(Some("/nonexistent/mqtt-store-test")).unwrap();
        assert_eq!(s.store.max_entries, 0);
    }

    #[test]
    fn parse() {
        let s = Settings::from_toml(
            r#"
            [store]
            max_topic_levels = 3
            max_entries = 2

            [log]
            to = "Off"
            level = "debug"
            dir = ""
            file = "store.log"
            "#,
        )
        .unwrap();
        s.logs();
        assert_eq!(s.store.max_topic_levels, 3);
        assert_eq!(s.log.to, To::Off);
        assert_eq!(s.log.level, slog::Level::Debug);
        assert_eq!(s.log.path(), Some(PathBuf::from("store.log")));
        assert!(s.logger().is_ok());

        let store = s.build_store::<u8>();
        store.put("a/b/c", 1).unwrap();
        assert!(matches!(store.put("a/b/c/d", 1), Err(StoreError::TooManyTopicLevels(_))));
        store.put("a/b", 2).unwrap();
        assert_eq!(store.put("a", 3), Err(StoreError::TooManyEntries(2)));
    }

    #[test]
    fn invalid() {
        assert!(Settings::from_toml("[log]\nto = \"somewhere\"").is_err());
        assert!(Settings::from_toml("[log]\nlevel = \"loud\"").is_err());
        assert!(Settings::from_toml("[store]\nmax_entries = \"many\"").is_err());
    }
}
