//! JSON configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Load `schedulable.json` from a base directory, writing defaults when it
//!   does not exist yet.
//! - Resolve database/log paths relative to the base directory.
//!
//! # Invariants
//! - A loaded config has passed `validate()`.
//! - Missing optional fields fall back to documented defaults.

use crate::db::schema::MAX_SCHEDULE_AT_PRECISION;
use crate::db::OpenOptions;
use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "schedulable.json";
const DEFAULT_DATABASE_NAME: &str = "schedulable.sqlite";
const DEFAULT_LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "config io `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "config parse `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulableConfig {
    /// SQLite file; relative paths resolve against the base directory.
    pub database_path: Option<String>,
    /// `trace|debug|info|warn|error`; defaults per build mode.
    pub log_level: Option<String>,
    /// Log directory; relative paths resolve against the base directory.
    pub log_dir: Option<String>,
    /// Fractional-second precision for newly added visibility columns.
    pub schedule_at_precision: Option<u8>,
}

impl SchedulableConfig {
    pub fn with_defaults() -> Self {
        Self {
            database_path: Some(DEFAULT_DATABASE_NAME.to_string()),
            log_level: Some(default_log_level().to_string()),
            log_dir: Some(DEFAULT_LOG_DIR_NAME.to_string()),
            schedule_at_precision: Some(0),
        }
    }

    /// Reads and validates a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `<base_dir>/schedulable.json`, creating it with defaults first
    /// when absent.
    pub fn load_or_init(base_dir: &Path) -> ConfigResult<Self> {
        fs::create_dir_all(base_dir).map_err(|source| ConfigError::Io {
            path: base_dir.to_path_buf(),
            source,
        })?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            return Self::load(&config_path);
        }

        let defaults = Self::with_defaults();
        let payload = serde_json::to_string_pretty(&defaults).map_err(|source| {
            ConfigError::Parse {
                path: config_path.clone(),
                source,
            }
        })?;
        fs::write(&config_path, payload).map_err(|source| ConfigError::Io {
            path: config_path,
            source,
        })?;
        Ok(defaults)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(level) = self.log_level.as_deref() {
            normalize_level(level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        if let Some(precision) = self.schedule_at_precision {
            if precision > MAX_SCHEDULE_AT_PRECISION {
                return Err(ConfigError::Invalid(format!(
                    "schedule_at_precision {precision} exceeds {MAX_SCHEDULE_AT_PRECISION}"
                )));
            }
        }
        Ok(())
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> PathBuf {
        resolve(
            base_dir,
            self.database_path.as_deref().unwrap_or(DEFAULT_DATABASE_NAME),
        )
    }

    pub fn log_dir(&self, base_dir: &Path) -> PathBuf {
        resolve(
            base_dir,
            self.log_dir.as_deref().unwrap_or(DEFAULT_LOG_DIR_NAME),
        )
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or_else(|| default_log_level())
    }

    /// Connection bootstrap options; pass to `db::open_db_with`.
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            schedule_at_precision: self.schedule_at_precision.unwrap_or(0),
        }
    }
}

fn resolve(base_dir: &Path, value: &str) -> PathBuf {
    let candidate = PathBuf::from(value);
    if candidate.is_absolute() {
        candidate
    } else {
        base_dir.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SchedulableConfig, DEFAULT_CONFIG_NAME};
    use std::fs;

    #[test]
    fn load_or_init_writes_defaults_then_reads_them_back() {
        let dir = tempfile::tempdir().unwrap();

        let first = SchedulableConfig::load_or_init(dir.path()).unwrap();
        assert_eq!(first, SchedulableConfig::with_defaults());
        assert!(dir.path().join(DEFAULT_CONFIG_NAME).exists());

        let second = SchedulableConfig::load_or_init(dir.path()).unwrap();
        assert_eq!(second, first);
        assert_eq!(
            second.sqlite_path(dir.path()),
            dir.path().join("schedulable.sqlite")
        );
        assert_eq!(second.log_dir(dir.path()), dir.path().join("logs"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: SchedulableConfig = serde_json::from_str("{}").unwrap();
        let base = std::path::Path::new("/srv/app");

        assert_eq!(config.sqlite_path(base), base.join("schedulable.sqlite"));
        assert_eq!(config.open_options().schedule_at_precision, 0);
        assert!(!config.log_level().is_empty());
    }

    #[test]
    fn absolute_paths_are_kept() {
        let config = SchedulableConfig {
            database_path: Some("/var/data/posts.sqlite".to_string()),
            ..SchedulableConfig::default()
        };
        assert_eq!(
            config.sqlite_path(std::path::Path::new("/srv/app")),
            std::path::PathBuf::from("/var/data/posts.sqlite")
        );
    }

    #[test]
    fn rejects_bad_level_and_precision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_NAME);

        fs::write(&path, r#"{"log_level":"loud"}"#).unwrap();
        assert!(matches!(
            SchedulableConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));

        fs::write(&path, r#"{"schedule_at_precision":9}"#).unwrap();
        assert!(matches!(
            SchedulableConfig::load(&path),
            Err(ConfigError::Invalid(message)) if message.contains("exceeds")
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            SchedulableConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
