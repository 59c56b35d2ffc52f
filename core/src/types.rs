//! Record types for tracked job applications.
//!
//! [`Application`] is a persisted row; [`NewApplication`] is the validated
//! input of the creation path. Both serialize with [`serde`] using the
//! column names as field names.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, require_non_empty};

/// Status assigned when none is given at creation.
pub const DEFAULT_STATUS: &str = "Applied";

/// A stored job application.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use jobtracker_core::Application;
///
/// let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
/// let app = Application {
///     id: 1,
///     company: "Google".into(),
///     position: "Software Engineer".into(),
///     status: "Applied".into(),
///     created_at: at,
///     updated_at: at,
/// };
/// assert_eq!(app.to_row()[4], "2026-01-15T10:30:00Z");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Renders the record as display cells, in column order.
    ///
    /// Timestamps use RFC 3339 with whole seconds.
    pub fn to_row(&self) -> [String; 6] {
        [
            self.id.to_string(),
            self.company.clone(),
            self.position.clone(),
            self.status.clone(),
            self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ]
    }
}

/// Input for creating an application.
///
/// Construction trims every field, rejects a blank company or position and
/// falls back to [`DEFAULT_STATUS`] for a blank status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    company: String,
    position: String,
    status: String,
}

impl NewApplication {
    /// Validates creation input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] naming the first blank
    /// required field.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobtracker_core::{NewApplication, ValidationError};
    ///
    /// let new = NewApplication::new("Acme", "Engineer", "").unwrap();
    /// assert_eq!(new.status(), "Applied");
    ///
    /// let err = NewApplication::new(" ", "Engineer", "").unwrap_err();
    /// assert_eq!(err, ValidationError::EmptyField("company"));
    /// ```
    pub fn new(company: &str, position: &str, status: &str) -> Result<Self, ValidationError> {
        let company = require_non_empty("company", company)?;
        let position = require_non_empty("position", position)?;
        let status = match status.trim() {
            "" => DEFAULT_STATUS,
            status => status,
        };

        Ok(Self {
            company: company.to_string(),
            position: position.to_string(),
            status: status.to_string(),
        })
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}
