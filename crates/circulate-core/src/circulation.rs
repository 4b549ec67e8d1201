//! Borrow and return workflows.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{CirculateError, Result};
use crate::fees::LOAN_PERIOD_DAYS;
use crate::storage::LibraryStore;
use crate::validation::validate_patron_id;

/// Maximum number of loans a patron may have open at once.
pub const MAX_CONCURRENT_LOANS: i64 = 5;

/// Outcome of a successful borrow.
#[derive(Debug, Clone, Serialize)]
pub struct BorrowReceipt {
    pub loan_id: i64,
    pub book_id: i64,
    pub title: String,
    pub due_date: DateTime<Utc>,
}

/// Outcome of a successful return.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnReceipt {
    pub book_id: i64,
    pub title: String,
    pub returned_at: DateTime<Utc>,
}

/// Borrow a book, opening a loan due [`LOAN_PERIOD_DAYS`] from now.
pub fn borrow_book(
    store: &mut dyn LibraryStore,
    patron_id: &str,
    book_id: i64,
) -> Result<BorrowReceipt> {
    borrow_book_at(store, patron_id, book_id, Utc::now())
}

/// Borrow a book at an explicit instant. The receipt's due date is
/// `now + LOAN_PERIOD_DAYS`.
pub fn borrow_book_at(
    store: &mut dyn LibraryStore,
    patron_id: &str,
    book_id: i64,
    now: DateTime<Utc>,
) -> Result<BorrowReceipt> {
    validate_patron_id(patron_id)?;

    let book = store
        .get_book_by_id(book_id)?
        .ok_or_else(|| CirculateError::NotFound("Book not found.".to_string()))?;
    if book.available_copies <= 0 {
        return Err(CirculateError::Validation(
            "This book is currently not available.".to_string(),
        ));
    }

    if store.count_active_loans(patron_id)? >= MAX_CONCURRENT_LOANS {
        return Err(CirculateError::Validation(format!(
            "You have reached the maximum borrowing limit of {} books.",
            MAX_CONCURRENT_LOANS
        )));
    }

    let due_date = now + Duration::days(LOAN_PERIOD_DAYS);
    let loan_id = store.insert_loan(patron_id, book_id, now, due_date)?;
    store.adjust_availability(book_id, -1)?;
    debug!(patron_id, book_id, loan_id, "opened loan");

    Ok(BorrowReceipt {
        loan_id,
        book_id,
        title: book.title,
        due_date,
    })
}

/// Return a book, closing the active loan for (patron, book).
pub fn return_book(
    store: &mut dyn LibraryStore,
    patron_id: &str,
    book_id: i64,
) -> Result<ReturnReceipt> {
    return_book_at(store, patron_id, book_id, Utc::now())
}

/// Return a book at an explicit instant.
pub fn return_book_at(
    store: &mut dyn LibraryStore,
    patron_id: &str,
    book_id: i64,
    now: DateTime<Utc>,
) -> Result<ReturnReceipt> {
    validate_patron_id(patron_id)?;

    let book = store
        .get_book_by_id(book_id)?
        .ok_or_else(|| CirculateError::NotFound("Book not found.".to_string()))?;

    if !store.close_active_loan(patron_id, book_id, now)? {
        return Err(CirculateError::NotFound(
            "No active loan found for this patron and book.".to_string(),
        ));
    }
    store.adjust_availability(book_id, 1)?;
    debug!(patron_id, book_id, "closed loan");

    Ok(ReturnReceipt {
        book_id,
        title: book.title,
        returned_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewBook, SqliteStore};

    fn store_with_books(count: i64) -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().expect("in-memory store");
        for i in 0..count {
            store
                .insert_book(&NewBook::new(
                    format!("Book {}", i),
                    "Author",
                    format!("978000000{:04}", i),
                    1,
                ))
                .expect("insert book");
        }
        store
    }

    #[test]
    fn test_borrow_decrements_availability() {
        let mut store = store_with_books(1);
        let receipt = borrow_book(&mut store, "123456", 1).unwrap();
        assert_eq!(receipt.book_id, 1);
        assert_eq!(store.get_book_by_id(1).unwrap().unwrap().available_copies, 0);

        let err = borrow_book(&mut store, "654321", 1).unwrap_err();
        assert!(matches!(err, CirculateError::Validation(_)));
    }

    #[test]
    fn test_borrow_due_two_weeks_out() {
        let mut store = store_with_books(1);
        let now = Utc::now();
        let receipt = borrow_book_at(&mut store, "123456", 1, now).unwrap();
        assert_eq!(receipt.due_date - now, Duration::days(14));
    }

    #[test]
    fn test_borrow_rejects_bad_patron_before_lookup() {
        let mut store = store_with_books(1);
        let err = borrow_book(&mut store, "12ab56", 1).unwrap_err();
        assert!(matches!(err, CirculateError::Validation(_)));
        assert_eq!(store.get_book_by_id(1).unwrap().unwrap().available_copies, 1);
    }

    #[test]
    fn test_borrow_unknown_book() {
        let mut store = store_with_books(0);
        let err = borrow_book(&mut store, "123456", 42).unwrap_err();
        assert!(matches!(err, CirculateError::NotFound(_)));
    }

    #[test]
    fn test_borrow_limit_enforced_at_five() {
        let mut store = store_with_books(6);
        for book_id in 1..=5 {
            borrow_book(&mut store, "123456", book_id).unwrap();
        }
        let err = borrow_book(&mut store, "123456", 6).unwrap_err();
        assert!(matches!(err, CirculateError::Validation(_)));

        // Another patron is unaffected.
        borrow_book(&mut store, "654321", 6).unwrap();
    }

    #[test]
    fn test_return_closes_loan_and_restores_availability() {
        let mut store = store_with_books(1);
        borrow_book(&mut store, "123456", 1).unwrap();
        let receipt = return_book(&mut store, "123456", 1).unwrap();
        assert_eq!(receipt.book_id, 1);
        assert_eq!(store.get_book_by_id(1).unwrap().unwrap().available_copies, 1);

        let err = return_book(&mut store, "123456", 1).unwrap_err();
        assert!(matches!(err, CirculateError::NotFound(_)));
    }
}
