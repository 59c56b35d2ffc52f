//! Input validation that runs before any storage access.

use thiserror::Error;

use crate::Column;

/// Input rejected before it reached the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is blank.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    /// An update targets a column the update path never writes.
    #[error("column {0} cannot be updated")]
    ImmutableColumn(Column),
    /// Two update keys name the same column.
    #[error("column {0} given more than once")]
    DuplicateColumn(Column),
    /// Record ids start at 1.
    #[error("invalid id {0}: must be a positive integer")]
    InvalidId(i64),
}

/// Returns the trimmed value, or [`ValidationError::EmptyField`] when blank.
///
/// # Examples
///
/// ```
/// use jobtracker_core::{ValidationError, require_non_empty};
///
/// assert_eq!(require_non_empty("keyword", " rust "), Ok("rust"));
/// assert_eq!(
///     require_non_empty("keyword", "  "),
///     Err(ValidationError::EmptyField("keyword"))
/// );
/// ```
pub fn require_non_empty<'a>(
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, ValidationError> {
    match value.trim() {
        "" => Err(ValidationError::EmptyField(field)),
        trimmed => Ok(trimmed),
    }
}

/// Rejects ids that can never exist.
pub fn validate_id(id: i64) -> Result<i64, ValidationError> {
    if id < 1 {
        return Err(ValidationError::InvalidId(id));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty() {
        assert_eq!(require_non_empty("status", "Offer"), Ok("Offer"));
        assert_eq!(require_non_empty("status", "\tOffer\n"), Ok("Offer"));
        assert_eq!(
            require_non_empty("status", ""),
            Err(ValidationError::EmptyField("status"))
        );
    }

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id(1), Ok(1));
        assert_eq!(validate_id(999_999), Ok(999_999));
        assert_eq!(validate_id(0), Err(ValidationError::InvalidId(0)));
        assert_eq!(validate_id(-3), Err(ValidationError::InvalidId(-3)));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::EmptyField("company").to_string(),
            "company cannot be empty"
        );
        assert_eq!(
            ValidationError::ImmutableColumn(Column::CreatedAt).to_string(),
            "column created_at cannot be updated"
        );
        assert_eq!(
            ValidationError::DuplicateColumn(Column::Status).to_string(),
            "column status given more than once"
        );
    }
}
