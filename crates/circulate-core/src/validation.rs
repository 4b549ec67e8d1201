//! Input validation for patron ids and catalog fields.
//!
//! These checks run before any data access; a failure short-circuits the
//! calling operation with `CirculateError::Validation`.

use crate::error::{CirculateError, Result};
use crate::storage::NewBook;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum author length in characters.
pub const MAX_AUTHOR_CHARS: usize = 100;

/// ISBN-13 length in digits.
pub const ISBN_DIGITS: usize = 13;

/// Check that a patron id is exactly 6 ASCII digits.
pub fn validate_patron_id(patron_id: &str) -> Result<()> {
    if patron_id.len() == 6 && patron_id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CirculateError::Validation(
            "Invalid patron ID. Must be exactly 6 digits.".to_string(),
        ))
    }
}

/// Validate the fields of a book before it enters the catalog.
///
/// Title and author are judged after trimming; the caller is expected to
/// store the trimmed values.
pub fn validate_new_book(book: &NewBook) -> Result<()> {
    let title = book.title.trim();
    if title.is_empty() {
        return Err(CirculateError::Validation("Title is required.".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(CirculateError::Validation(format!(
            "Title must be less than {} characters.",
            MAX_TITLE_CHARS
        )));
    }

    let author = book.author.trim();
    if author.is_empty() {
        return Err(CirculateError::Validation(
            "Author is required.".to_string(),
        ));
    }
    if author.chars().count() > MAX_AUTHOR_CHARS {
        return Err(CirculateError::Validation(format!(
            "Author must be less than {} characters.",
            MAX_AUTHOR_CHARS
        )));
    }

    if book.isbn.len() != ISBN_DIGITS || !book.isbn.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CirculateError::Validation(format!(
            "ISBN must be exactly {} digits.",
            ISBN_DIGITS
        )));
    }

    if book.total_copies <= 0 {
        return Err(CirculateError::Validation(
            "Total copies must be a positive integer.".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str, isbn: &str, copies: i64) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            total_copies: copies,
        }
    }

    #[test]
    fn test_valid_patron_id() {
        assert!(validate_patron_id("123456").is_ok());
        assert!(validate_patron_id("000000").is_ok());
    }

    #[test]
    fn test_invalid_patron_ids() {
        for bad in ["", "12345", "1234567", "12345a", "abcdef", "12 456", "１２３４５６"] {
            assert!(validate_patron_id(bad).is_err(), "accepted {:?}", bad);
        }
    }

    fn valid(book: &NewBook) -> bool {
        validate_new_book(book).is_ok()
    }

    #[test]
    fn test_valid_book() {
        assert!(valid(&book("Dune", "Frank Herbert", "9780441172719", 3)));
    }

    #[test]
    fn test_rejects_blank_title_and_author() {
        assert!(!valid(&book("", "Author", "9780441172719", 1)));
        assert!(!valid(&book("   ", "Author", "9780441172719", 1)));
        assert!(!valid(&book("Title", "", "9780441172719", 1)));
        assert!(!valid(&book("Title", "  ", "9780441172719", 1)));
    }

    #[test]
    fn test_rejects_overlong_fields() {
        assert!(!valid(&book(&"t".repeat(201), "Author", "9780441172719", 1)));
        assert!(valid(&book(&"t".repeat(200), "Author", "9780441172719", 1)));
        assert!(!valid(&book("Title", &"a".repeat(101), "9780441172719", 1)));
    }

    #[test]
    fn test_rejects_bad_isbn() {
        assert!(!valid(&book("Title", "Author", "123", 1)));
        assert!(!valid(&book("Title", "Author", "97804411727199", 1)));
        assert!(!valid(&book("Title", "Author", "97804411727a9", 1)));
    }

    #[test]
    fn test_rejects_non_positive_copies() {
        assert!(!valid(&book("Title", "Author", "9780441172719", 0)));
        assert!(!valid(&book("Title", "Author", "9780441172719", -2)));
    }
}
