//! Book cataloging and search.

use tracing::debug;

use crate::error::{CirculateError, Result};
use crate::storage::{Book, LibraryStore, NewBook};
use crate::validation::validate_new_book;

/// Which book field a catalog search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Author,
    Isbn,
}

impl SearchField {
    /// Parse a field name, defaulting to title for anything unrecognized.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "author" => SearchField::Author,
            "isbn" => SearchField::Isbn,
            _ => SearchField::Title,
        }
    }
}

/// Add a new book to the catalog.
///
/// Validates the fields, rejects duplicate ISBNs, and inserts with all
/// copies available. Title and author are stored trimmed.
pub fn add_book_to_catalog(store: &mut dyn LibraryStore, book: &NewBook) -> Result<Book> {
    validate_new_book(book)?;

    if store.get_book_by_isbn(&book.isbn)?.is_some() {
        return Err(CirculateError::Validation(
            "A book with this ISBN already exists.".to_string(),
        ));
    }

    let trimmed = NewBook {
        title: book.title.trim().to_string(),
        author: book.author.trim().to_string(),
        isbn: book.isbn.clone(),
        total_copies: book.total_copies,
    };
    let id = store.insert_book(&trimmed)?;
    debug!(id, title = %trimmed.title, "added book to catalog");

    Ok(Book {
        id,
        title: trimmed.title,
        author: trimmed.author,
        isbn: trimmed.isbn,
        total_copies: trimmed.total_copies,
        available_copies: trimmed.total_copies,
    })
}

/// Search the catalog.
///
/// Title and author searches are case-insensitive substring matches; ISBN
/// search compares digits only. A blank term matches nothing. Results come
/// back sorted by title then author, case-insensitively.
pub fn search_catalog(
    store: &dyn LibraryStore,
    term: &str,
    field: SearchField,
) -> Result<Vec<Book>> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(Vec::new());
    }

    let books = store.list_books()?;
    let mut results: Vec<Book> = match field {
        SearchField::Title => {
            let needle = term.to_lowercase();
            books
                .into_iter()
                .filter(|b| b.title.to_lowercase().contains(&needle))
                .collect()
        }
        SearchField::Author => {
            let needle = term.to_lowercase();
            books
                .into_iter()
                .filter(|b| b.author.to_lowercase().contains(&needle))
                .collect()
        }
        SearchField::Isbn => {
            let needle = digits_only(term);
            if needle.is_empty() {
                return Ok(Vec::new());
            }
            books
                .into_iter()
                .filter(|b| digits_only(&b.isbn).contains(&needle))
                .collect()
        }
    };

    results.sort_by(|a, b| {
        (a.title.to_lowercase(), a.author.to_lowercase())
            .cmp(&(b.title.to_lowercase(), b.author.to_lowercase()))
    });
    Ok(results)
}

fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}
