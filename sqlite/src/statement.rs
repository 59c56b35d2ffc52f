//! Validated building blocks for dynamically assembled statements.
//!
//! Sort keys and update targets come from user input, and SQL cannot bind
//! identifiers as parameters. [`OrderBy`] and [`UpdatePlan`] therefore hold
//! only [`Column`] values, produced by the column validator, and render SQL
//! text as the very last step. Values are never rendered; they are bound by
//! placeholder.

use std::collections::BTreeMap;

use jobtracker_core::{Column, ColumnError, ValidationError, validate_name, validate_names};

use crate::error::Result;
use crate::schema::{APPLICATIONS_TABLE, NOW_SQL};

/// Sort order for listing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    column: Column,
    descending: bool,
}

impl OrderBy {
    pub fn new(column: Column, descending: bool) -> Self {
        Self { column, descending }
    }

    /// Validates a user-supplied sort key.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobtracker_sqlite::OrderBy;
    ///
    /// let order = OrderBy::parse(" Company ", true).unwrap();
    /// assert_eq!(order.render(), "ORDER BY company DESC, id ASC");
    /// assert!(OrderBy::parse("id; DROP TABLE applications", false).is_err());
    /// ```
    pub fn parse(name: &str, descending: bool) -> std::result::Result<Self, ColumnError> {
        Ok(Self::new(validate_name(name)?, descending))
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Renders the `ORDER BY` clause. Ties break on ascending id.
    pub fn render(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        if self.column == Column::Id {
            format!("ORDER BY id {direction}")
        } else {
            format!("ORDER BY {} {direction}, id ASC", self.column)
        }
    }
}

impl Default for OrderBy {
    fn default() -> Self {
        Self::new(Column::Id, false)
    }
}

/// Column assignments for a partial update.
///
/// Assignments are kept in [`Column`] declaration order, so the same input
/// always renders the same statement regardless of the order keys arrive in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    columns: Vec<Column>,
    values: Vec<String>,
}

impl UpdatePlan {
    /// Builds a plan from `(column name, value)` pairs.
    ///
    /// Every key is validated before anything else is looked at. Blank values
    /// are skipped; the rest are trimmed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidColumn`](crate::StoreError::InvalidColumn) for
    ///   the first key outside the allowed columns.
    /// - [`ValidationError::ImmutableColumn`] for `id`, `created_at` or
    ///   `updated_at`.
    /// - [`ValidationError::DuplicateColumn`] when two keys name the same
    ///   column.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobtracker_sqlite::UpdatePlan;
    ///
    /// let plan = UpdatePlan::from_fields([("status", "Offer"), ("Company", "Acme")]).unwrap();
    /// assert_eq!(plan.values(), ["Acme", "Offer"]);
    /// assert_eq!(
    ///     plan.render(),
    ///     "UPDATE applications SET company = ?1, status = ?2, \
    ///      updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?3"
    /// );
    /// ```
    pub fn from_fields<I, K, V>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let fields: Vec<(K, V)> = fields.into_iter().collect();
        let columns = validate_names(fields.iter().map(|(key, _)| key.as_ref()))?;

        let mut seen = Vec::with_capacity(columns.len());
        let mut assignments = BTreeMap::new();
        for (column, (_, value)) in columns.into_iter().zip(&fields) {
            if !column.is_mutable() {
                return Err(ValidationError::ImmutableColumn(column).into());
            }
            if seen.contains(&column) {
                return Err(ValidationError::DuplicateColumn(column).into());
            }
            seen.push(column);

            let value = value.as_ref().trim();
            if !value.is_empty() {
                assignments.insert(column, value.to_string());
            }
        }

        let (columns, values) = assignments.into_iter().unzip();
        Ok(Self { columns, values })
    }

    /// True when no column would change.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Values in the same order as [`columns`](Self::columns).
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Renders the `UPDATE` statement.
    ///
    /// Placeholders `?1..?n` take the values; the last placeholder takes the
    /// record id. `updated_at` is always refreshed.
    pub fn render(&self) -> String {
        let mut assignments: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect();
        assignments.push(format!("{} = {NOW_SQL}", Column::UpdatedAt));

        format!(
            "UPDATE {APPLICATIONS_TABLE} SET {} WHERE id = ?{}",
            assignments.join(", "),
            self.columns.len() + 1
        )
    }
}
