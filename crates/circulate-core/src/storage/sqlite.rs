//! SQLite storage backend.
//!
//! Plain on-disk (or in-memory) SQLite via rusqlite. Timestamps are stored
//! as RFC 3339 text and handed back unparsed; see [`Loan`] for why.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::{CirculateError, Result};
use crate::storage::traits::LibraryStore;
use crate::storage::types::{Book, Loan, NewBook};

const LOAN_COLUMNS: &str = "br.id, br.patron_id, br.book_id, br.borrow_date, br.due_date, \
     br.return_date, b.title, b.author, b.isbn";

/// SQLite-backed library store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new library database at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `CirculateError::Storage` if the file already exists or the
    /// schema cannot be initialized.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(CirculateError::Storage(
                "Library file already exists".to_string(),
            ));
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        debug!(path = %path.display(), "created library database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing library database.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CirculateError::NotFound(format!(
                "No library file at {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!(path = %path.display(), "opened library database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a fresh in-memory store. Used by tests and demos.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                isbn TEXT NOT NULL UNIQUE,
                total_copies INTEGER NOT NULL,
                available_copies INTEGER NOT NULL
            );

            CREATE TABLE borrow_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patron_id TEXT NOT NULL,
                book_id INTEGER NOT NULL,
                borrow_date TEXT NOT NULL,
                due_date TEXT NOT NULL,
                return_date TEXT,

                FOREIGN KEY(book_id) REFERENCES books(id)
            );

            CREATE INDEX borrow_records_patron ON borrow_records (patron_id);
            "#,
        )?;
        Ok(())
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CirculateError::Storage("SQLite connection poisoned".to_string()))
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
        total_copies: row.get(4)?,
        available_copies: row.get(5)?,
    })
}

fn loan_from_row(row: &Row<'_>) -> rusqlite::Result<Loan> {
    Ok(Loan {
        id: row.get(0)?,
        patron_id: row.get(1)?,
        book_id: row.get(2)?,
        borrow_date: row.get(3)?,
        due_date: row.get(4)?,
        return_date: row.get(5)?,
        title: row.get(6)?,
        author: row.get(7)?,
        isbn: row.get(8)?,
    })
}

impl LibraryStore for SqliteStore {
    fn insert_book(&mut self, book: &NewBook) -> Result<i64> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO books (title, author, isbn, total_copies, available_copies)
            VALUES (?, ?, ?, ?, ?)
            "#,
            (
                &book.title,
                &book.author,
                &book.isbn,
                book.total_copies,
                book.total_copies,
            ),
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_book_by_id(&self, id: i64) -> Result<Option<Book>> {
        let conn = self.lock_conn()?;
        let book = conn
            .query_row(
                "SELECT id, title, author, isbn, total_copies, available_copies FROM books WHERE id = ?",
                [id],
                book_from_row,
            )
            .optional()?;
        Ok(book)
    }

    fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let conn = self.lock_conn()?;
        let book = conn
            .query_row(
                "SELECT id, title, author, isbn, total_copies, available_copies FROM books WHERE isbn = ?",
                [isbn],
                book_from_row,
            )
            .optional()?;
        Ok(book)
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, author, isbn, total_copies, available_copies FROM books ORDER BY id",
        )?;
        let rows = stmt.query_map([], book_from_row)?;

        let mut books = Vec::new();
        for row in rows {
            books.push(row?);
        }
        Ok(books)
    }

    fn adjust_availability(&mut self, book_id: i64, delta: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        // The guard clause keeps available_copies inside [0, total_copies].
        let updated = conn.execute(
            r#"
            UPDATE books
            SET available_copies = available_copies + ?1
            WHERE id = ?2
              AND available_copies + ?1 BETWEEN 0 AND total_copies
            "#,
            (delta, book_id),
        )?;
        if updated == 0 {
            return Err(CirculateError::Storage(format!(
                "Availability update failed for book {}",
                book_id
            )));
        }
        Ok(())
    }

    fn insert_loan(
        &mut self,
        patron_id: &str,
        book_id: i64,
        borrow_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO borrow_records (patron_id, book_id, borrow_date, due_date, return_date)
            VALUES (?, ?, ?, ?, NULL)
            "#,
            (
                patron_id,
                book_id,
                borrow_date.to_rfc3339(),
                due_date.to_rfc3339(),
            ),
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn close_active_loan(
        &mut self,
        patron_id: &str,
        book_id: i64,
        return_date: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.lock_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE borrow_records
            SET return_date = ?
            WHERE id = (
                SELECT id FROM borrow_records
                WHERE patron_id = ? AND book_id = ? AND return_date IS NULL
                ORDER BY borrow_date DESC
                LIMIT 1
            )
            "#,
            (return_date.to_rfc3339(), patron_id, book_id),
        )?;
        Ok(updated > 0)
    }

    fn count_active_loans(&self, patron_id: &str) -> Result<i64> {
        let conn = self.lock_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM borrow_records WHERE patron_id = ? AND return_date IS NULL",
            [patron_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn find_active_loan(&self, patron_id: &str, book_id: i64) -> Result<Option<Loan>> {
        let conn = self.lock_conn()?;
        let loan = conn
            .query_row(
                &format!(
                    r#"
                    SELECT {LOAN_COLUMNS}
                    FROM borrow_records br
                    LEFT JOIN books b ON b.id = br.book_id
                    WHERE br.patron_id = ? AND br.book_id = ? AND br.return_date IS NULL
                    ORDER BY br.borrow_date DESC
                    LIMIT 1
                    "#
                ),
                (patron_id, book_id),
                loan_from_row,
            )
            .optional()?;
        Ok(loan)
    }

    fn find_most_recent_loan(&self, patron_id: &str, book_id: i64) -> Result<Option<Loan>> {
        let conn = self.lock_conn()?;
        let loan = conn
            .query_row(
                &format!(
                    r#"
                    SELECT {LOAN_COLUMNS}
                    FROM borrow_records br
                    LEFT JOIN books b ON b.id = br.book_id
                    WHERE br.patron_id = ? AND br.book_id = ?
                    ORDER BY COALESCE(br.return_date, br.borrow_date) DESC
                    LIMIT 1
                    "#
                ),
                (patron_id, book_id),
                loan_from_row,
            )
            .optional()?;
        Ok(loan)
    }

    fn find_active_loans(&self, patron_id: &str) -> Result<Vec<Loan>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {LOAN_COLUMNS}
            FROM borrow_records br
            LEFT JOIN books b ON b.id = br.book_id
            WHERE br.patron_id = ? AND br.return_date IS NULL
            ORDER BY br.borrow_date DESC
            "#
        ))?;
        let rows = stmt.query_map([patron_id], loan_from_row)?;

        let mut loans = Vec::new();
        for row in rows {
            loans.push(row?);
        }
        Ok(loans)
    }

    fn find_recent_returns(&self, patron_id: &str, limit: usize) -> Result<Vec<Loan>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {LOAN_COLUMNS}
            FROM borrow_records br
            LEFT JOIN books b ON b.id = br.book_id
            WHERE br.patron_id = ? AND br.return_date IS NOT NULL
            ORDER BY br.return_date DESC
            LIMIT ?
            "#
        ))?;
        let rows = stmt.query_map((patron_id, limit as i64), loan_from_row)?;

        let mut loans = Vec::new();
        for row in rows {
            loans.push(row?);
        }
        Ok(loans)
    }

    fn count_lifetime_loans(&self, patron_id: &str) -> Result<i64> {
        let conn = self.lock_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM borrow_records WHERE patron_id = ?",
            [patron_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn seeded_store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().expect("in-memory store");
        store
            .insert_book(&NewBook::new("Dune", "Frank Herbert", "9780441172719", 2))
            .expect("insert book");
        store
    }

    #[test]
    fn test_insert_and_lookup_book() {
        let store = seeded_store();
        let book = store.get_book_by_id(1).unwrap().expect("book exists");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.available_copies, 2);
        assert!(store.get_book_by_id(99).unwrap().is_none());
        assert!(store.get_book_by_isbn("9780441172719").unwrap().is_some());
    }

    #[test]
    fn test_availability_stays_in_range() {
        let mut store = seeded_store();
        store.adjust_availability(1, -1).unwrap();
        store.adjust_availability(1, -1).unwrap();
        assert!(store.adjust_availability(1, -1).is_err());
        store.adjust_availability(1, 1).unwrap();
        store.adjust_availability(1, 1).unwrap();
        assert!(store.adjust_availability(1, 1).is_err());
        assert!(store.adjust_availability(99, -1).is_err());
    }

    #[test]
    fn test_loan_round_trip() {
        let mut store = seeded_store();
        let now = Utc::now();
        let due = now + Duration::days(14);

        store.insert_loan("123456", 1, now, due).unwrap();
        assert_eq!(store.count_active_loans("123456").unwrap(), 1);
        assert_eq!(store.count_lifetime_loans("123456").unwrap(), 1);

        let active = store
            .find_active_loan("123456", 1)
            .unwrap()
            .expect("active loan");
        assert!(active.is_active());
        assert_eq!(active.title.as_deref(), Some("Dune"));

        assert!(store.close_active_loan("123456", 1, now).unwrap());
        assert!(!store.close_active_loan("123456", 1, now).unwrap());
        assert_eq!(store.count_active_loans("123456").unwrap(), 0);
        assert_eq!(store.count_lifetime_loans("123456").unwrap(), 1);

        let returns = store.find_recent_returns("123456", 5).unwrap();
        assert_eq!(returns.len(), 1);
        assert!(!returns[0].is_active());
    }

    #[test]
    fn test_most_recent_loan_prefers_latest_activity() {
        let mut store = seeded_store();
        let old = Utc::now() - Duration::days(60);
        store
            .insert_loan("123456", 1, old, old + Duration::days(14))
            .unwrap();
        store
            .close_active_loan("123456", 1, old + Duration::days(10))
            .unwrap();

        let recent = Utc::now() - Duration::days(3);
        store
            .insert_loan("123456", 1, recent, recent + Duration::days(14))
            .unwrap();

        let loan = store
            .find_most_recent_loan("123456", 1)
            .unwrap()
            .expect("loan");
        assert!(loan.is_active());
        assert_eq!(loan.borrow_date, recent.to_rfc3339());
    }
}
