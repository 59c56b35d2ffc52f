//! Database connection configuration.
//!
//! The configuration names the SQLite database file and the per-command
//! operation timeout. It lives as pretty-printed JSON in the user's config
//! directory:
//!
//! ```json
//! {
//!   "db_path": "/home/me/.local/share/jobtracker/jobtracker.db",
//!   "timeout_secs": 30
//! }
//! ```
//!
//! [`resolve`] decides which configuration a command uses: `JOBTRACKER_DB`
//! (plus optional `JOBTRACKER_TIMEOUT_SECS`) wins over the file, and having
//! neither is [`ConfigError::Missing`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Overrides the config file location.
pub const ENV_CONFIG_PATH: &str = "JOBTRACKER_CONFIG";
/// Database path taking precedence over the config file.
pub const ENV_DB_PATH: &str = "JOBTRACKER_DB";
/// Timeout used together with [`ENV_DB_PATH`].
pub const ENV_TIMEOUT_SECS: &str = "JOBTRACKER_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const APP_DIR: &str = "jobtracker";
const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "jobtracker.db";

/// Connection settings for one database.
///
/// # Examples
///
/// ```
/// use jobtracker_config::ConnectionConfig;
///
/// let config = ConnectionConfig::new("/tmp/jobs.db");
/// assert_eq!(config.timeout().as_secs(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Upper bound for the database work of a single command.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ConnectionConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks that the database path is set and the timeout is non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(
                "db_path cannot be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the file does not exist,
    /// [`IoError`](ConfigError::IoError) if it cannot be read, and
    /// [`JsonError`](ConfigError::JsonError) if parsing fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes configuration as JSON, creating the parent directory.
    ///
    /// On Unix the file is readable by its owner only.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw + "\n")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %path.display(), "saved connection configuration");
        Ok(())
    }

    /// Loads configuration from [`default_config_path`].
    pub fn load() -> Result<Self> {
        Self::load_from_path(default_config_path()?)
    }

    /// Saves configuration to [`default_config_path`] and returns that path.
    pub fn save(&self) -> Result<PathBuf> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }
}

/// Where a resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Environment,
    File(PathBuf),
}

/// A configuration together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub config: ConnectionConfig,
    pub source: ConfigSource,
}

/// Location of the config file: `$JOBTRACKER_CONFIG`, or
/// `<config dir>/jobtracker/config.json`.
pub fn default_config_path() -> Result<PathBuf> {
    config_path_with(&process_env)
}

/// Suggested database location: `<data dir>/jobtracker/jobtracker.db`.
pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir_with(&process_env)?.join(APP_DIR).join(DB_FILE))
}

/// Resolves the configuration for the current process environment.
pub fn resolve() -> Result<ResolvedConfig> {
    resolve_with(&process_env)
}

/// Resolves configuration using `env` to look up environment variables.
///
/// # Examples
///
/// ```
/// use jobtracker_config::{ConfigSource, resolve_with};
///
/// let resolved = resolve_with(&|key| match key {
///     "JOBTRACKER_DB" => Some("/tmp/jobs.db".to_string()),
///     "JOBTRACKER_TIMEOUT_SECS" => Some("5".to_string()),
///     _ => None,
/// })
/// .unwrap();
/// assert_eq!(resolved.source, ConfigSource::Environment);
/// assert_eq!(resolved.config.timeout_secs, 5);
/// ```
pub fn resolve_with(env: &dyn Fn(&str) -> Option<String>) -> Result<ResolvedConfig> {
    if let Some(db_path) = non_empty(env(ENV_DB_PATH)) {
        let timeout_secs = match non_empty(env(ENV_TIMEOUT_SECS)) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(format!("{ENV_TIMEOUT_SECS} must be an integer, got {raw:?}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let config = ConnectionConfig::new(db_path).with_timeout_secs(timeout_secs);
        config.validate()?;
        debug!(db_path = %config.db_path.display(), "using connection from environment");
        return Ok(ResolvedConfig {
            config,
            source: ConfigSource::Environment,
        });
    }

    let path = config_path_with(env)?;
    let config = ConnectionConfig::load_from_path(&path)?;
    debug!(path = %path.display(), "using connection from config file");
    Ok(ResolvedConfig {
        config,
        source: ConfigSource::File(path),
    })
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn config_path_with(env: &dyn Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(path) = non_empty(env(ENV_CONFIG_PATH)) {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir_with(env)?.join(APP_DIR).join(CONFIG_FILE))
}

fn config_dir_with(env: &dyn Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if cfg!(windows) {
        if let Some(path) = non_empty(env("APPDATA")) {
            return Ok(PathBuf::from(path));
        }
    } else if let Some(path) = non_empty(env("XDG_CONFIG_HOME")) {
        return Ok(PathBuf::from(path));
    }
    home_dir_with(env)
        .map(|home| home.join(".config"))
        .ok_or(ConfigError::NoConfigDir)
}

fn data_dir_with(env: &dyn Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if cfg!(windows) {
        if let Some(path) = non_empty(env("LOCALAPPDATA")) {
            return Ok(PathBuf::from(path));
        }
    } else if let Some(path) = non_empty(env("XDG_DATA_HOME")) {
        return Ok(PathBuf::from(path));
    }
    home_dir_with(env)
        .map(|home| home.join(".local").join("share"))
        .ok_or(ConfigError::NoConfigDir)
}

fn home_dir_with(env: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    non_empty(env("HOME"))
        .or_else(|| non_empty(env("USERPROFILE")))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ConnectionConfig::new("/data/jobs.db").with_timeout_secs(12);

        config.save_to_path(&path).unwrap();
        let loaded = ConnectionConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        ConnectionConfig::new("/data/jobs.db")
            .save_to_path(&path)
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_timeout_defaults_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "db_path": "/data/jobs.db" }"#).unwrap();

        let loaded = ConnectionConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = ConnectionConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
        assert!(err.to_string().contains("jobtracker configure"));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ConnectionConfig::load_from_path(&path),
            Err(ConfigError::JsonError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout_and_empty_path() {
        assert!(ConnectionConfig::new("").validate().is_err());
        assert!(
            ConnectionConfig::new("/data/jobs.db")
                .with_timeout_secs(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_resolve_prefers_environment() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        ConnectionConfig::new("/from/file.db")
            .save_to_path(&config_path)
            .unwrap();

        let config_path = config_path.to_string_lossy().into_owned();
        let env = env_of(&[
            (ENV_CONFIG_PATH, config_path.as_str()),
            (ENV_DB_PATH, "/from/env.db"),
        ]);
        let resolved = resolve_with(&env).unwrap();
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.config.db_path, PathBuf::from("/from/env.db"));
        assert_eq!(resolved.config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_resolve_falls_back_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        ConnectionConfig::new("/from/file.db")
            .with_timeout_secs(9)
            .save_to_path(&config_path)
            .unwrap();

        let config_str = config_path.to_string_lossy().into_owned();
        let env = env_of(&[(ENV_CONFIG_PATH, config_str.as_str()), (ENV_DB_PATH, "  ")]);
        let resolved = resolve_with(&env).unwrap();
        assert_eq!(resolved.source, ConfigSource::File(config_path));
        assert_eq!(resolved.config.timeout_secs, 9);
    }

    #[test]
    fn test_resolve_without_any_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().to_string_lossy().into_owned();
        let env = env_of(&[("HOME", home.as_str()), ("USERPROFILE", home.as_str())]);
        assert!(matches!(
            resolve_with(&env),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_bad_env_timeout() {
        let env = env_of(&[(ENV_DB_PATH, "/tmp/jobs.db"), (ENV_TIMEOUT_SECS, "soon")]);
        assert!(matches!(
            resolve_with(&env),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_config_path_lookup_order() {
        let env = env_of(&[("HOME", "/home/me")]);
        assert_eq!(
            config_path_with(&env).unwrap(),
            PathBuf::from("/home/me/.config/jobtracker/config.json")
        );

        let env = env_of(&[("HOME", "/home/me"), ("XDG_CONFIG_HOME", "/xdg")]);
        assert_eq!(
            config_path_with(&env).unwrap(),
            PathBuf::from("/xdg/jobtracker/config.json")
        );

        let env = env_of(&[("XDG_CONFIG_HOME", "/xdg"), (ENV_CONFIG_PATH, "/etc/jt.json")]);
        assert_eq!(config_path_with(&env).unwrap(), PathBuf::from("/etc/jt.json"));

        assert!(matches!(
            config_path_with(&env_of(&[])),
            Err(ConfigError::NoConfigDir)
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_data_dir_lookup_order() {
        let env = env_of(&[("HOME", "/home/me")]);
        assert_eq!(
            data_dir_with(&env).unwrap(),
            PathBuf::from("/home/me/.local/share")
        );
        let env = env_of(&[("HOME", "/home/me"), ("XDG_DATA_HOME", "/data")]);
        assert_eq!(data_dir_with(&env).unwrap(), PathBuf::from("/data"));
    }
}
