use circulate_core::storage::{LibraryStore, NewBook, SqliteStore};

#[test]
fn test_create_rejects_existing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("library.db");

    SqliteStore::create(&path).expect("create should succeed");
    assert!(path.exists());

    let result = SqliteStore::create(&path);
    assert!(result.is_err());
}

#[test]
fn test_open_missing_file_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing.db");

    let result = SqliteStore::open(&path);
    assert!(result.is_err());
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("library.db");

    {
        let mut store = SqliteStore::create(&path).expect("create should succeed");
        store
            .insert_book(&NewBook::new("Dune", "Frank Herbert", "9780441172719", 2))
            .expect("insert should succeed");
    }

    let store = SqliteStore::open(&path).expect("open should succeed");
    let book = store
        .get_book_by_isbn("9780441172719")
        .expect("lookup should succeed")
        .expect("book should exist");
    assert_eq!(book.title, "Dune");
    assert_eq!(book.available_copies, 2);
}

#[test]
fn test_duplicate_isbn_rejected_by_schema() {
    let mut store = SqliteStore::open_in_memory().expect("in-memory store");
    store
        .insert_book(&NewBook::new("Dune", "Frank Herbert", "9780441172719", 1))
        .expect("first insert should succeed");
    let result = store.insert_book(&NewBook::new("Dune", "Frank Herbert", "9780441172719", 1));
    assert!(result.is_err());
}
