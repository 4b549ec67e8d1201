//! # Circulate Core
//!
//! Core library for Circulate - a library circulation system: cataloging,
//! borrowing and returning, late-fee accrual, and patron status reporting.
//!
//! This crate provides the domain logic and storage abstractions independent
//! of the CLI interface.
//!
//! ## Architecture
//!
//! - **storage**: Library store trait and SQLite implementation
//! - **fees**: Overdue-day derivation and tiered late-fee computation
//! - **catalog**: Book cataloging and search
//! - **circulation**: Borrow and return workflows
//! - **report**: Single-loan fee lookup and patron status aggregation
//! - **validation**: Patron-id and book-field checks
//!
//! All operations take the store as an explicit parameter; there is no
//! ambient connection state.

pub mod catalog;
pub mod circulation;
pub mod error;
pub mod fees;
pub mod report;
pub mod storage;
pub mod validation;

pub use error::{CirculateError, Result};
pub use storage::LibraryStore;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
