//! Storage layer: the library store trait and its SQLite implementation.

mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteStore;
pub use traits::LibraryStore;
pub use types::{Book, Loan, NewBook};
