//! Table names and SQL fragments shared by the store and the runner.

use jobtracker_core::Column;

/// Table holding job applications.
pub const APPLICATIONS_TABLE: &str = "applications";

/// Table recording which migration scripts have been applied.
pub const MIGRATIONS_TABLE: &str = "schema_migrations";

/// Current UTC time as RFC 3339 text with milliseconds.
pub(crate) const NOW_SQL: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

pub(crate) const CREATE_MIGRATIONS_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS schema_migrations (version TEXT PRIMARY KEY)";

/// Comma-separated column list in [`Column::ALL`] order.
///
/// Row conversion reads columns by this position.
pub(crate) fn select_list() -> String {
    Column::ALL
        .iter()
        .map(|column| column.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
