//! Core data types for the storage layer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CirculateError, Result};

/// A catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Row id
    pub id: i64,

    /// Book title
    pub title: String,

    /// Book author
    pub author: String,

    /// 13-digit ISBN
    pub isbn: String,

    /// Copies owned by the library
    pub total_copies: i64,

    /// Copies currently on the shelf, in [0, total_copies]
    pub available_copies: i64,
}

/// Fields for a book about to enter the catalog.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub total_copies: i64,
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        total_copies: i64,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            total_copies,
        }
    }
}

/// A borrow record, optionally joined with catalog fields.
///
/// Timestamps are carried as the ISO-8601 strings the store returned and
/// parsed lazily via [`Loan::borrowed_at`] and friends. That keeps the
/// decision about what to do with a corrupt record (fail the lookup, or skip
/// it during aggregation) with the caller instead of the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    /// Row id
    pub id: i64,

    /// 6-digit patron card number
    pub patron_id: String,

    /// Borrowed book
    pub book_id: i64,

    /// When the loan was opened (ISO-8601)
    pub borrow_date: String,

    /// When the book is due back (ISO-8601)
    pub due_date: String,

    /// When the book came back; `None` means the loan is active
    pub return_date: Option<String>,

    /// Joined book title, where the catalog row still exists
    pub title: Option<String>,

    /// Joined book author
    pub author: Option<String>,

    /// Joined ISBN
    pub isbn: Option<String>,
}

impl Loan {
    /// An active loan has no return date recorded.
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// Parse the borrow timestamp.
    pub fn borrowed_at(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.borrow_date)
    }

    /// Parse the due timestamp.
    pub fn due_at(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.due_date)
    }

    /// Parse the return timestamp, if the loan is closed.
    pub fn returned_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.return_date.as_deref().map(parse_timestamp).transpose()
    }
}

/// Parse a stored timestamp. Accepts RFC 3339, a naive date-time, or a bare
/// date (interpreted as midnight UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }
    Err(CirculateError::Data(format!(
        "Invalid timestamp: {:?}",
        value
    )))
}
