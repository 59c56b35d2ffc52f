//! Core types for tracking job applications.
//!
//! This crate holds everything that does not touch a database:
//!
//! - [`Application`]: a stored record, and [`NewApplication`], the validated
//!   input of the creation path.
//! - [`Column`]: the closed set of `applications` columns. [`validate_name`]
//!   and [`validate_names`] turn untrusted strings into columns and are the
//!   only way a caller-supplied identifier can end up in SQL text.
//! - [`ValidationError`]: input problems caught before any storage access.
//!
//! # Example
//!
//! ```
//! use jobtracker_core::*;
//!
//! let new = NewApplication::new("Acme", "Engineer", "").unwrap();
//! assert_eq!(new.status(), DEFAULT_STATUS);
//!
//! let sort = validate_name("Created_At").unwrap();
//! assert_eq!(sort.as_str(), "created_at");
//! assert!(validate_name("id OR 1=1").is_err());
//! ```

mod column;
mod types;
mod validate;

pub use column::{Column, ColumnError, allowed_columns, validate_name, validate_names};
pub use types::{Application, DEFAULT_STATUS, NewApplication};
pub use validate::{ValidationError, require_non_empty, validate_id};
