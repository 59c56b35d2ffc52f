//! SQLite storage for tracked job applications.
//!
//! This crate owns everything that talks to the database:
//!
//! - **`connection`**: opening a connection bounded by a command timeout
//! - **`migration`**: versioned, embedded schema scripts
//! - **`query`**: the [`ApplicationStore`] record operations
//! - **`statement`**: validated sort and update clauses
//!
//! Identifiers in dynamically built SQL are always
//! [`Column`](jobtracker_core::Column) values that passed the column
//! validator; user input never reaches SQL text unchecked.
//!
//! # Quick start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use jobtracker_sqlite::{ApplicationStore, Migration, open};
//!
//! let conn = open("jobs.db", Duration::from_secs(30))?;
//! Migration::new(&conn)?.run()?;
//!
//! let store = ApplicationStore::new(&conn);
//! store.add("Acme", "Engineer", "Applied")?;
//! for app in store.search("acme")? {
//!     println!("{} {}", app.id, app.position);
//! }
//! # Ok::<(), jobtracker_sqlite::StoreError>(())
//! ```

mod connection;
mod convert;
mod error;
mod migration;
mod query;
mod schema;
mod statement;

pub use connection::{apply_timeout, open, ping, register_functions, table_exists};
pub use error::{Result, StoreError};
pub use migration::{
    Migration, MigrationReport, MigrationScript, MigrationState, ScriptStatus, embedded_scripts,
};
pub use query::ApplicationStore;
pub use schema::{APPLICATIONS_TABLE, MIGRATIONS_TABLE};
pub use statement::{OrderBy, UpdatePlan};
