//! Library store trait definition.
//!
//! The `LibraryStore` trait is the data-access collaborator consumed by the
//! domain layer. Operations take it as an explicit parameter, so any backend
//! (or a test double) can stand in without the core logic changing.

use chrono::{DateTime, Utc};

use super::types::{Book, Loan, NewBook};
use crate::error::Result;

/// Data-access interface for books and borrow records.
///
/// Lookups return `Ok(None)` / empty vectors for missing data; `Err` is
/// reserved for backend failures. No retries, no held connections: each call
/// acquires and releases whatever resources it needs before returning.
pub trait LibraryStore: Send + Sync {
    // --- Catalog operations ---

    /// Insert a new book, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `CirculateError::Storage` on constraint violations (duplicate
    /// ISBN) or backend failure. Field validation happens in the domain
    /// layer, not here.
    fn insert_book(&mut self, book: &NewBook) -> Result<i64>;

    /// Get a book by id.
    fn get_book_by_id(&self, id: i64) -> Result<Option<Book>>;

    /// Get a book by its ISBN.
    fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;

    /// List the whole catalog, ordered by id.
    fn list_books(&self) -> Result<Vec<Book>>;

    /// Adjust a book's available copies by `delta` (-1 on borrow, +1 on
    /// return), keeping the count within [0, total_copies].
    ///
    /// # Errors
    ///
    /// Returns `CirculateError::Storage` if the book does not exist or the
    /// adjustment would leave the count out of range.
    fn adjust_availability(&mut self, book_id: i64, delta: i64) -> Result<()>;

    // --- Loan operations ---

    /// Open a loan, returning its id.
    fn insert_loan(
        &mut self,
        patron_id: &str,
        book_id: i64,
        borrow_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Result<i64>;

    /// Record the return date on the active loan for (patron, book).
    ///
    /// Returns `Ok(false)` if there is no active loan to close.
    fn close_active_loan(
        &mut self,
        patron_id: &str,
        book_id: i64,
        return_date: DateTime<Utc>,
    ) -> Result<bool>;

    /// Number of loans a patron currently has open.
    fn count_active_loans(&self, patron_id: &str) -> Result<i64>;

    /// The active loan for (patron, book), if any.
    fn find_active_loan(&self, patron_id: &str, book_id: i64) -> Result<Option<Loan>>;

    /// The most recent loan for (patron, book), active or not, judged by
    /// return date where present and borrow date otherwise.
    fn find_most_recent_loan(&self, patron_id: &str, book_id: i64) -> Result<Option<Loan>>;

    /// All active loans for a patron, newest borrow first, joined with
    /// catalog fields.
    fn find_active_loans(&self, patron_id: &str) -> Result<Vec<Loan>>;

    /// The most recently returned loans for a patron, newest return first.
    fn find_recent_returns(&self, patron_id: &str, limit: usize) -> Result<Vec<Loan>>;

    /// Total number of borrow records ever for a patron, any status.
    fn count_lifetime_loans(&self, patron_id: &str) -> Result<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_usable_as_object() {
        fn _accepts_store(_store: &dyn LibraryStore) {}
    }
}
