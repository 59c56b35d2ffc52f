//! Connection configuration for jobtracker.
//!
//! A command needs two things before it can touch the database: where the
//! SQLite file lives and how long its database work may take. Both come from
//! [`resolve`], which reads the environment first and the JSON config file
//! written by `jobtracker configure` second.
//!
//! ```no_run
//! use jobtracker_config::{ConnectionConfig, resolve};
//!
//! ConnectionConfig::new("/var/lib/jobtracker/jobs.db").save()?;
//! let resolved = resolve()?;
//! println!("{}", resolved.config.db_path.display());
//! # Ok::<(), jobtracker_config::ConfigError>(())
//! ```

mod config;
mod error;

pub use config::{
    ConfigSource, ConnectionConfig, DEFAULT_TIMEOUT_SECS, ENV_CONFIG_PATH, ENV_DB_PATH,
    ENV_TIMEOUT_SECS, ResolvedConfig, default_config_path, default_db_path, resolve, resolve_with,
};
pub use error::{ConfigError, Result};
