//! Column whitelist for dynamically assembled SQL.
//!
//! Placeholders bind values, not identifiers, so sort keys and update targets
//! have to be written into the statement text. Every such identifier goes
//! through [`validate_name`] first and comes out as a [`Column`], the only
//! type the storage layer knows how to render.
//!
//! # Examples
//!
//! ```
//! use jobtracker_core::{Column, ColumnError, validate_name, validate_names};
//!
//! assert_eq!(validate_name("  Company ").unwrap(), Column::Company);
//! assert_eq!(validate_name("   "), Err(ColumnError::Empty));
//! assert!(matches!(
//!     validate_name("id; DROP TABLE applications"),
//!     Err(ColumnError::Invalid(_))
//! ));
//!
//! let columns = validate_names(["status", "UPDATED_AT"]).unwrap();
//! assert_eq!(columns, vec![Column::Status, Column::UpdatedAt]);
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A column of the `applications` table.
///
/// Declaration order is the table's column order; it also orders the
/// assignments of generated `UPDATE` statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Id,
    Company,
    Position,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl Column {
    /// The fixed allow-set.
    pub const ALL: [Column; 6] = [
        Column::Id,
        Column::Company,
        Column::Position,
        Column::Status,
        Column::CreatedAt,
        Column::UpdatedAt,
    ];

    /// SQL identifier of the column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Company => "company",
            Column::Position => "position",
            Column::Status => "status",
            Column::CreatedAt => "created_at",
            Column::UpdatedAt => "updated_at",
        }
    }

    /// Whether the update path may assign this column.
    ///
    /// `id` and `created_at` never change, and `updated_at` is refreshed by
    /// the store itself on every mutation.
    pub const fn is_mutable(self) -> bool {
        matches!(self, Column::Company | Column::Position | Column::Status)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = ColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_name(s)
    }
}

/// A rejected column identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    /// Nothing left after trimming.
    #[error("column name cannot be empty")]
    Empty,
    /// Not in the allow-set. Carries the name exactly as supplied.
    #[error("invalid column name: {0:?} (allowed: {allowed})", allowed = allowed_columns())]
    Invalid(String),
}

/// Comma-separated allow-set, as shown in error messages.
pub fn allowed_columns() -> String {
    Column::ALL
        .iter()
        .map(|column| column.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validates a single column name.
///
/// Surrounding whitespace is ignored and matching is case-insensitive.
pub fn validate_name(name: &str) -> Result<Column, ColumnError> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(ColumnError::Empty);
    }

    Column::ALL
        .into_iter()
        .find(|column| column.as_str() == normalized)
        .ok_or_else(|| ColumnError::Invalid(name.to_string()))
}

/// Validates a sequence of column names, stopping at the first bad one.
///
/// An empty sequence is valid and yields no columns.
pub fn validate_names<I, S>(names: I) -> Result<Vec<Column>, ColumnError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| validate_name(name.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_every_allowed_column() {
        for column in Column::ALL {
            assert_eq!(validate_name(column.as_str()), Ok(column));
        }
    }

    #[test]
    fn test_accepts_case_variations() {
        assert_eq!(validate_name("ID"), Ok(Column::Id));
        assert_eq!(validate_name("COMPANY"), Ok(Column::Company));
        assert_eq!(validate_name("Company"), Ok(Column::Company));
        assert_eq!(validate_name("CreaTed_At"), Ok(Column::CreatedAt));
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(validate_name(" company"), Ok(Column::Company));
        assert_eq!(validate_name("company "), Ok(Column::Company));
        assert_eq!(validate_name(" position "), Ok(Column::Position));
        assert_eq!(validate_name("\t status \n"), Ok(Column::Status));
    }

    #[test]
    fn test_rejects_unknown_and_injected_names() {
        let rejected = [
            "invalid_column",
            "email",
            "id; DROP TABLE applications",
            "id--",
            "1=1 OR",
            "id/* comment */",
            "id OR 1=1",
            "company name",
            "@#$%",
            "SELECT",
            "comp",
            "created at",
        ];
        for name in rejected {
            assert_eq!(
                validate_name(name),
                Err(ColumnError::Invalid(name.to_string())),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_names_have_distinct_reason() {
        assert_eq!(validate_name(""), Err(ColumnError::Empty));
        assert_eq!(validate_name("   "), Err(ColumnError::Empty));
        assert!(
            ColumnError::Empty
                .to_string()
                .contains("cannot be empty")
        );
    }

    #[test]
    fn test_invalid_message_names_input_and_allow_set() {
        let message = validate_name("invalid_field").unwrap_err().to_string();
        assert!(message.starts_with("invalid column name"));
        assert!(message.contains("invalid_field"));
        for column in Column::ALL {
            assert!(message.contains(column.as_str()), "{message}");
        }
    }

    #[test]
    fn test_validate_names() {
        assert_eq!(validate_names(Vec::<String>::new()), Ok(vec![]));
        assert_eq!(
            validate_names(["ID", "Company", "STATUS"]),
            Ok(vec![Column::Id, Column::Company, Column::Status])
        );
        assert_eq!(
            validate_names([" id ", "company", "  position  "]),
            Ok(vec![Column::Id, Column::Company, Column::Position])
        );
        assert_eq!(validate_names(Column::ALL.map(Column::as_str)), Ok(Column::ALL.to_vec()));
    }

    #[test]
    fn test_validate_names_reports_first_offender() {
        assert_eq!(
            validate_names(["id", "invalid1", "invalid2"]),
            Err(ColumnError::Invalid("invalid1".to_string()))
        );
        assert_eq!(
            validate_names(["id", "company; DROP TABLE applications"]),
            Err(ColumnError::Invalid(
                "company; DROP TABLE applications".to_string()
            ))
        );
        assert_eq!(validate_names(["id", "", "company"]), Err(ColumnError::Empty));
    }

    #[test]
    fn test_from_str_and_display() {
        let column: Column = " Updated_At ".parse().unwrap();
        assert_eq!(column, Column::UpdatedAt);
        assert_eq!(column.to_string(), "updated_at");
        assert!("nope".parse::<Column>().is_err());
    }

    #[test]
    fn test_only_data_columns_are_mutable() {
        let mutable: Vec<_> = Column::ALL.into_iter().filter(|c| c.is_mutable()).collect();
        assert_eq!(mutable, vec![Column::Company, Column::Position, Column::Status]);
    }
}
