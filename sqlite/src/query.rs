//! Record store for job applications.
//!
//! [`ApplicationStore`] borrows a live connection for the duration of one
//! command. Every caller-supplied identifier goes through the column
//! validator before SQL text is assembled; every value is bound.
//!
//! # Example
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
//! let id = store.add("Acme", "Engineer", "")?;
//! store.update_status(id, "Interview")?;
//!
//! for app in store.list(Some("company"), false)? {
//!     println!("{} {} {}", app.id, app.company, app.status);
//! }
//! # Ok::<(), jobtracker_sqlite::StoreError>(())
//! ```

use jobtracker_core::{Application, Column, NewApplication, require_non_empty};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::connection::{UNICODE_LOWER, register_functions};
use crate::convert::RawApplication;
use crate::error::Result;
use crate::schema::{APPLICATIONS_TABLE, NOW_SQL, select_list};
use crate::statement::{OrderBy, UpdatePlan};

/// Query interface for reading and writing job applications.
pub struct ApplicationStore<'a> {
    conn: &'a Connection,
}

impl<'a> ApplicationStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts a new application and returns its id.
    ///
    /// A blank status becomes `"Applied"`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`](crate::StoreError::Validation) if
    /// company or position is blank.
    pub fn add(&self, company: &str, position: &str, status: &str) -> Result<i64> {
        let new = NewApplication::new(company, position, status)?;
        self.conn.execute(
            &format!(
                "INSERT INTO {APPLICATIONS_TABLE} (company, position, status, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, {NOW_SQL}, {NOW_SQL})"
            ),
            params![new.company(), new.position(), new.status()],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, "inserted application");
        Ok(id)
    }

    /// Loads one application by id.
    pub fn get(&self, id: i64) -> Result<Option<Application>> {
        let raw = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM {APPLICATIONS_TABLE} WHERE id = ?1",
                    select_list()
                ),
                params![id],
                RawApplication::from_row,
            )
            .optional()?;
        raw.map(RawApplication::into_application).transpose()
    }

    /// Returns every application.
    ///
    /// `sort` names the column to order by; it is validated before any query
    /// runs. Without one, records come back in id order. `descending`
    /// reverses the order in both cases.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidColumn`](crate::StoreError::InvalidColumn)
    /// for a sort key outside the allowed columns.
    pub fn list(&self, sort: Option<&str>, descending: bool) -> Result<Vec<Application>> {
        let order = match sort.filter(|key| !key.trim().is_empty()) {
            Some(key) => OrderBy::parse(key, descending)?,
            None => OrderBy::new(Column::Id, descending),
        };
        debug!(order = %order.render(), "listing applications");
        self.select_where("", &order, &[])
    }

    /// Sets the status of one application and refreshes `updated_at`.
    ///
    /// Returns the number of rows changed; 0 means no such id.
    pub fn update_status(&self, id: i64, status: &str) -> Result<usize> {
        let status = require_non_empty("status", status)?;
        self.update(id, [("status", status)])
    }

    /// Applies a partial update from `(column name, value)` pairs.
    ///
    /// See [`UpdatePlan::from_fields`] for how keys and values are checked.
    /// When nothing is left to assign, returns 0 without touching the
    /// database.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use jobtracker_sqlite::ApplicationStore;
    /// # let conn = rusqlite::Connection::open("jobs.db").unwrap();
    /// # let store = ApplicationStore::new(&conn);
    /// let changed = store.update(7, [("company", "Initech"), ("status", "Offer")])?;
    /// if changed == 0 {
    ///     println!("no application with id 7");
    /// }
    /// # Ok::<(), jobtracker_sqlite::StoreError>(())
    /// ```
    pub fn update<I, K, V>(&self, id: i64, fields: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let plan = UpdatePlan::from_fields(fields)?;
        if plan.is_empty() {
            debug!(id, "nothing to update");
            return Ok(0);
        }

        let mut values: Vec<&dyn ToSql> = plan.values().iter().map(|v| v as &dyn ToSql).collect();
        values.push(&id);
        let rows = self.conn.execute(&plan.render(), values.as_slice())?;
        debug!(id, columns = ?plan.columns(), rows, "updated application");
        Ok(rows)
    }

    /// Deletes one application. Returns 0 if the id does not exist.
    pub fn delete(&self, id: i64) -> Result<usize> {
        let rows = self.conn.execute(
            &format!("DELETE FROM {APPLICATIONS_TABLE} WHERE id = ?1"),
            params![id],
        )?;
        debug!(id, rows, "deleted application");
        Ok(rows)
    }

    /// Removes every application and restarts id assignment at 1.
    ///
    /// Returns the number of records removed.
    pub fn clear(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute(&format!("DELETE FROM {APPLICATIONS_TABLE}"), [])?;
        tx.execute(
            "DELETE FROM sqlite_sequence WHERE name = ?1",
            params![APPLICATIONS_TABLE],
        )?;
        tx.commit()?;
        debug!(rows, "cleared applications");
        Ok(rows)
    }

    /// Finds applications whose company, position or status contains
    /// `keyword`, ignoring case.
    ///
    /// Both sides are lower-cased with Unicode rules before matching.
    /// Wildcard characters in the keyword match literally.
    pub fn search(&self, keyword: &str) -> Result<Vec<Application>> {
        let keyword = require_non_empty("keyword", keyword)?;
        register_functions(self.conn)?;

        let pattern = format!("%{}%", escape_like(&keyword.to_lowercase()));
        debug!(%pattern, "searching applications");
        self.select_where(
            &format!(
                "WHERE {UNICODE_LOWER}(company) LIKE ?1 ESCAPE '\\' \
                 OR {UNICODE_LOWER}(position) LIKE ?1 ESCAPE '\\' \
                 OR {UNICODE_LOWER}(status) LIKE ?1 ESCAPE '\\'"
            ),
            &OrderBy::default(),
            &[&pattern as &dyn ToSql],
        )
    }

    /// Number of stored applications.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {APPLICATIONS_TABLE}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }

    fn select_where(
        &self,
        filter: &str,
        order: &OrderBy,
        params: &[&dyn ToSql],
    ) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT {} FROM {APPLICATIONS_TABLE} {filter} {}",
            select_list(),
            order.render()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params, RawApplication::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawApplication::into_application).collect()
    }
}

/// Escapes `LIKE` wildcards with a backslash.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
