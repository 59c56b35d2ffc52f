//! Versioned schema migrations.
//!
//! Scripts are plain SQL files named so that lexical order is apply order
//! (`001_create_applications.sql`, `002_...`). The scripts under
//! `sqlite/migrations/` are embedded into the binary at build time.
//!
//! [`Migration::run`] applies every script whose name is not yet recorded in
//! `schema_migrations`, each inside its own transaction. A failing script is
//! rolled back and stops the run; scripts applied before it stay applied.
//!
//! # Example
//!
//! ```no_run
//! use jobtracker_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("jobs.db").unwrap();
//! let migration = Migration::new(&conn).unwrap();
//!
//! let report = migration.run().unwrap();
//! for name in &report.applied {
//!     println!("applied {name}");
//! }
//! ```

use std::collections::HashSet;

use include_dir::{Dir, include_dir};
use rusqlite::{Connection, params};
use tracing::{debug, info, warn};

use crate::connection::table_exists;
use crate::error::{Result, StoreError, is_interrupted};
use crate::schema::{CREATE_MIGRATIONS_TABLE_SQL, MIGRATIONS_TABLE};

static EMBEDDED_MIGRATIONS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/migrations");

/// One named migration script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    name: String,
    sql: String,
}

impl MigrationScript {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }

    /// Version identifier recorded once the script is applied.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// The `.sql` scripts compiled into this crate, sorted by name.
pub fn embedded_scripts() -> Vec<MigrationScript> {
    let mut scripts: Vec<MigrationScript> = EMBEDDED_MIGRATIONS
        .files()
        .filter(|file| file.path().extension().is_some_and(|ext| ext == "sql"))
        .filter_map(|file| {
            let name = file.path().file_name()?.to_str()?;
            Some(MigrationScript::new(name, file.contents_utf8()?))
        })
        .collect();
    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    scripts
}

/// Applies migration scripts to a borrowed connection.
pub struct Migration<'a> {
    conn: &'a Connection,
    scripts: Vec<MigrationScript>,
}

impl<'a> Migration<'a> {
    /// Creates a runner for the embedded scripts.
    pub fn new(conn: &'a Connection) -> Result<Self> {
        Self::with_scripts(conn, embedded_scripts())
    }

    /// Creates a runner for an explicit set of scripts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateMigration`] if two scripts share a name.
    pub fn with_scripts(conn: &'a Connection, mut scripts: Vec<MigrationScript>) -> Result<Self> {
        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = scripts.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(StoreError::DuplicateMigration(pair[0].name.clone()));
        }
        Ok(Self { conn, scripts })
    }

    /// Known scripts in apply order.
    pub fn scripts(&self) -> &[MigrationScript] {
        &self.scripts
    }

    /// Applies every pending script in order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Migration`] naming the first script that failed.
    /// That script's changes are rolled back; earlier scripts stay applied.
    pub fn run(&self) -> Result<MigrationReport> {
        self.conn.execute_batch(CREATE_MIGRATIONS_TABLE_SQL)?;
        let applied = self.applied_versions()?;

        let mut report = MigrationReport::default();
        for script in self.scripts.iter().filter(|s| !applied.contains(&s.name)) {
            self.apply(script)?;
            report.applied.push(script.name.clone());
        }

        if report.applied.is_empty() {
            debug!("schema is up to date");
        }
        Ok(report)
    }

    /// Reports whether each known script has been applied.
    ///
    /// Does not create the tracking table.
    pub fn status(&self) -> Result<Vec<ScriptStatus>> {
        let applied = if table_exists(self.conn, MIGRATIONS_TABLE)? {
            self.applied_versions()?
        } else {
            HashSet::new()
        };

        Ok(self
            .scripts
            .iter()
            .map(|script| ScriptStatus {
                name: script.name.clone(),
                state: if applied.contains(&script.name) {
                    MigrationState::Applied
                } else {
                    MigrationState::Pending
                },
            })
            .collect())
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }

    fn apply(&self, script: &MigrationScript) -> Result<()> {
        let failed = |source: rusqlite::Error| {
            warn!(version = %script.name, error = %source, "migration rolled back");
            if is_interrupted(&source) {
                StoreError::Timeout
            } else {
                StoreError::Migration {
                    version: script.name.clone(),
                    source,
                }
            }
        };

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&script.sql).map_err(failed)?;
        tx.execute(
            &format!("INSERT INTO {MIGRATIONS_TABLE} (version) VALUES (?1)"),
            params![script.name],
        )
        .map_err(failed)?;
        tx.commit().map_err(failed)?;

        info!(version = %script.name, "applied migration");
        Ok(())
    }

    fn applied_versions(&self) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT version FROM {MIGRATIONS_TABLE}"))?;
        let versions = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(versions)
    }
}

/// Scripts applied by one [`Migration::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Names of the scripts applied, in order.
    pub applied: Vec<String>,
}

impl MigrationReport {
    pub fn is_up_to_date(&self) -> bool {
        self.applied.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Pending,
    Applied,
}

/// State of one script, as returned by [`Migration::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStatus {
    pub name: String,
    pub state: MigrationState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripts() -> Vec<MigrationScript> {
        vec![
            MigrationScript::new(
                "002_add_index.sql",
                "CREATE INDEX idx_items_name ON items(name);",
            ),
            MigrationScript::new(
                "001_init.sql",
                "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
            ),
        ]
    }

    fn recorded(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_with_scripts_sorts_by_name() {
        let conn = Connection::open_in_memory().unwrap();
        let migration = Migration::with_scripts(&conn, scripts()).unwrap();
        let names: Vec<&str> = migration.scripts().iter().map(MigrationScript::name).collect();
        assert_eq!(names, ["001_init.sql", "002_add_index.sql"]);
        assert!(migration.scripts()[0].sql().starts_with("CREATE TABLE items"));
    }

    #[test]
    fn test_embedded_scripts_are_sorted() {
        let names: Vec<String> = embedded_scripts()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(
            names,
            ["001_create_applications.sql", "002_index_applications.sql"]
        );
        assert!(
            embedded_scripts()[0]
                .sql()
                .contains("CREATE TABLE applications")
        );
    }

    #[test]
    fn test_run_applies_in_order_and_records() {
        let conn = Connection::open_in_memory().unwrap();
        let migration = Migration::with_scripts(&conn, scripts()).unwrap();

        let report = migration.run().unwrap();
        assert_eq!(report.applied, ["001_init.sql", "002_add_index.sql"]);
        assert_eq!(recorded(&conn), ["001_init.sql", "002_add_index.sql"]);
        assert!(table_exists(&conn, "items").unwrap());
    }

    #[test]
    fn test_run_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let migration = Migration::with_scripts(&conn, scripts()).unwrap();
        migration.run().unwrap();

        let report = migration.run().unwrap();
        assert!(report.is_up_to_date());
        assert_eq!(recorded(&conn).len(), 2);
    }

    #[test]
    fn test_failing_script_rolls_back_and_stops() {
        let conn = Connection::open_in_memory().unwrap();
        let migration = Migration::with_scripts(
            &conn,
            vec![
                MigrationScript::new("001_init.sql", "CREATE TABLE items (id INTEGER PRIMARY KEY);"),
                MigrationScript::new(
                    "002_broken.sql",
                    "CREATE TABLE extra (id INTEGER); INSERT INTO nowhere VALUES (1);",
                ),
                MigrationScript::new("003_later.sql", "CREATE TABLE later (id INTEGER);"),
            ],
        )
        .unwrap();

        let err = migration.run().unwrap_err();
        match err {
            StoreError::Migration { version, .. } => assert_eq!(version, "002_broken.sql"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(recorded(&conn), ["001_init.sql"]);
        assert!(table_exists(&conn, "items").unwrap());
        assert!(!table_exists(&conn, "extra").unwrap());
        assert!(!table_exists(&conn, "later").unwrap());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let result = Migration::with_scripts(
            &conn,
            vec![
                MigrationScript::new("001_init.sql", "SELECT 1;"),
                MigrationScript::new("001_init.sql", "SELECT 2;"),
            ],
        );
        assert!(matches!(
            result,
            Err(StoreError::DuplicateMigration(name)) if name == "001_init.sql"
        ));
    }

    #[test]
    fn test_status_before_and_after_run() {
        let conn = Connection::open_in_memory().unwrap();
        let migration = Migration::with_scripts(&conn, scripts()).unwrap();

        let states: Vec<MigrationState> =
            migration.status().unwrap().iter().map(|s| s.state).collect();
        assert_eq!(states, [MigrationState::Pending, MigrationState::Pending]);
        assert!(!table_exists(&conn, MIGRATIONS_TABLE).unwrap());

        Migration::with_scripts(&conn, vec![scripts().remove(1)])
            .unwrap()
            .run()
            .unwrap();
        let status = migration.status().unwrap();
        assert_eq!(status[0].name, "001_init.sql");
        assert_eq!(status[0].state, MigrationState::Applied);
        assert_eq!(status[1].state, MigrationState::Pending);
    }

    #[test]
    fn test_no_scripts_is_up_to_date() {
        let conn = Connection::open_in_memory().unwrap();
        let report = Migration::with_scripts(&conn, Vec::new()).unwrap().run().unwrap();
        assert!(report.is_up_to_date());
        assert!(table_exists(&conn, MIGRATIONS_TABLE).unwrap());
    }
}
