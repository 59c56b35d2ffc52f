//! Opening a database connection bounded by a command deadline.
//!
//! Every command gets one connection from [`open`]. Two mechanisms enforce
//! the configured timeout:
//!
//! - SQLite's busy timeout bounds how long a statement waits on a lock.
//! - A progress handler interrupts any statement still running once the
//!   deadline (open time plus timeout) has passed. The interrupted statement
//!   fails with [`StoreError::Timeout`](crate::StoreError::Timeout).

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use tracing::debug;

use crate::error::Result;

/// Virtual machine steps between deadline checks.
const PROGRESS_STEPS: i32 = 1_000;

/// SQL name of the Unicode-aware lower-casing function.
pub(crate) const UNICODE_LOWER: &str = "unicode_lower";

/// Opens the database at `path`, creating its parent directory if needed.
///
/// The returned connection has already answered `SELECT 1`.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// let conn = jobtracker_sqlite::open("jobs.db", Duration::from_secs(30))?;
/// # Ok::<(), jobtracker_sqlite::StoreError>(())
/// ```
pub fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    apply_timeout(&conn, timeout)?;
    ping(&conn)?;
    debug!(path = %path.display(), timeout_ms = timeout.as_millis() as u64, "opened database");
    Ok(conn)
}

/// Sets the busy timeout and installs the deadline handler on `conn`.
pub fn apply_timeout(conn: &Connection, timeout: Duration) -> Result<()> {
    conn.busy_timeout(timeout)?;
    let deadline = Instant::now().checked_add(timeout);
    conn.progress_handler(
        PROGRESS_STEPS,
        deadline.map(|deadline| move || Instant::now() >= deadline),
    );
    Ok(())
}

/// Registers `unicode_lower(text)` on `conn`.
///
/// SQLite's `lower()` and `LIKE` fold ASCII letters only.
pub fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|value| value.to_lowercase())),
    )?;
    Ok(())
}

/// Round-trips a trivial query.
pub fn ping(conn: &Connection) -> Result<()> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

/// Checks whether a table with the given name exists.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
    let count: i64 = stmt.query_row([name], |row| row.get(0))?;
    Ok(count > 0)
}
