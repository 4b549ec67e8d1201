//! Circulate CLI - library circulation from the command line.
//!
//! This is a thin interface over `circulate-core`: it resolves the library
//! database path, forwards to the domain operations, and renders results as
//! text or JSON.

use std::path::Path;

use clap::{Parser, Subcommand};

use circulate_core::catalog::{self, SearchField};
use circulate_core::circulation;
use circulate_core::report;
use circulate_core::storage::{NewBook, SqliteStore};
use circulate_core::{LibraryStore, VERSION};

/// Circulate - book cataloging, borrowing, late fees, and patron reports
#[derive(Parser)]
#[command(name = "circulate")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the library database file
    #[arg(short, long, global = true, env = "CIRCULATE_LIBRARY")]
    library: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new library database
    Init {
        /// Path where the database will be created
        #[arg(value_name = "PATH")]
        path: Option<String>,
    },

    /// Add a book to the catalog
    AddBook {
        /// Book title
        title: String,

        /// Book author
        author: String,

        /// 13-digit ISBN
        isbn: String,

        /// Number of copies
        #[arg(long, default_value_t = 1)]
        copies: i64,
    },

    /// Borrow a book for a patron
    Borrow {
        /// 6-digit patron card number
        #[arg(value_name = "PATRON")]
        patron_id: String,

        /// Book id
        #[arg(value_name = "BOOK")]
        book_id: i64,
    },

    /// Return a borrowed book
    Return {
        /// 6-digit patron card number
        #[arg(value_name = "PATRON")]
        patron_id: String,

        /// Book id
        #[arg(value_name = "BOOK")]
        book_id: i64,
    },

    /// Show the late fee for a patron's loan of a book
    Fee {
        /// 6-digit patron card number
        #[arg(value_name = "PATRON")]
        patron_id: String,

        /// Book id
        #[arg(value_name = "BOOK")]
        book_id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a patron's full status report
    Report {
        /// 6-digit patron card number
        #[arg(value_name = "PATRON")]
        patron_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the catalog
    Search {
        /// Search term
        #[arg(value_name = "TERM")]
        term: String,

        /// Field to search (title, author, isbn)
        #[arg(long, default_value = "title")]
        field: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the whole catalog
    Books {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path }) => {
            let target = path.or(cli.library).ok_or_else(|| {
                anyhow::anyhow!("No library path provided. Use --library or pass a path.")
            })?;
            SqliteStore::create(Path::new(&target))?;
            if !cli.quiet {
                println!("Initialized new library at {}", target);
            }
        }
        Some(Commands::AddBook {
            title,
            author,
            isbn,
            copies,
        }) => {
            let mut store = open_store(&cli.library)?;
            let book =
                catalog::add_book_to_catalog(&mut store, &NewBook::new(title, author, isbn, copies))?;
            if !cli.quiet {
                println!(
                    "Added \"{}\" by {} (id {}, {} copies)",
                    book.title, book.author, book.id, book.total_copies
                );
            }
        }
        Some(Commands::Borrow { patron_id, book_id }) => {
            let mut store = open_store(&cli.library)?;
            let receipt = circulation::borrow_book(&mut store, &patron_id, book_id)?;
            if !cli.quiet {
                println!(
                    "Borrowed \"{}\". Due date: {}.",
                    receipt.title,
                    receipt.due_date.date_naive()
                );
            }
        }
        Some(Commands::Return { patron_id, book_id }) => {
            let mut store = open_store(&cli.library)?;
            let receipt = circulation::return_book(&mut store, &patron_id, book_id)?;
            if !cli.quiet {
                println!("Returned \"{}\".", receipt.title);
            }
        }
        Some(Commands::Fee {
            patron_id,
            book_id,
            json,
        }) => {
            let store = open_store(&cli.library)?;
            let fee = report::compute_fee_for_loan(&store, &patron_id, book_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&fee)?);
            } else {
                if !cli.quiet {
                    println!("Due: {}", fee.due_date);
                    println!("Days overdue: {}", fee.days_overdue);
                }
                println!("Fee: ${:.2}", fee.fee_amount);
            }
        }
        Some(Commands::Report { patron_id, json }) => {
            let store = open_store(&cli.library)?;
            let status = report::patron_status_report(&store, &patron_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_report(&status, cli.quiet);
            }
        }
        Some(Commands::Search { term, field, json }) => {
            let store = open_store(&cli.library)?;
            let books = catalog::search_catalog(&store, &term, SearchField::parse(&field))?;
            print_books(&books, json, cli.quiet)?;
        }
        Some(Commands::Books { json }) => {
            let store = open_store(&cli.library)?;
            let books = store.list_books()?;
            print_books(&books, json, cli.quiet)?;
        }
        None => {
            println!("Circulate v{}", VERSION);
            println!("\nRun `circulate --help` for usage information.");
        }
    }

    Ok(())
}

fn open_store(library: &Option<String>) -> anyhow::Result<SqliteStore> {
    let target = library.as_ref().ok_or_else(|| {
        anyhow::anyhow!("No library path provided. Use --library or set CIRCULATE_LIBRARY.")
    })?;
    Ok(SqliteStore::open(Path::new(target))?)
}

fn print_books(
    books: &[circulate_core::storage::Book],
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(books)?);
        return Ok(());
    }
    if !quiet {
        println!("ID | TITLE | AUTHOR | ISBN | AVAILABLE");
    }
    for book in books {
        println!(
            "{} | {} | {} | {} | {}/{}",
            book.id, book.title, book.author, book.isbn, book.available_copies, book.total_copies
        );
    }
    Ok(())
}

fn print_report(status: &circulate_core::report::PatronStatusReport, quiet: bool) {
    if !quiet {
        println!("Patron: {}", status.patron_id);
        println!(
            "Active: {} ({} overdue) | Accrued fees: ${:.2} | Lifetime loans: {}",
            status.summary.active_count,
            status.summary.overdue_count,
            status.summary.total_accrued_fee,
            status.summary.lifetime_loans
        );
        println!();
    }

    if !status.active_loans.is_empty() {
        println!("Active loans:");
        for loan in &status.active_loans {
            let title = loan.title.as_deref().unwrap_or("(unknown title)");
            if loan.days_overdue > 0 {
                println!(
                    "  [{}] {} - due {}, {} days overdue, ${:.2}",
                    loan.book_id, title, loan.due_date, loan.days_overdue, loan.accrued_fee
                );
            } else {
                println!("  [{}] {} - due {}", loan.book_id, title, loan.due_date);
            }
        }
    }

    if !status.recent_returns.is_empty() {
        println!("Recent returns:");
        for ret in &status.recent_returns {
            let title = ret.title.as_deref().unwrap_or("(unknown title)");
            let late = if ret.was_late {
                format!(", late ({} days, ${:.2})", ret.days_overdue, ret.fee_at_return)
            } else {
                String::new()
            };
            println!(
                "  [{}] {} - returned {}{}",
                ret.book_id,
                title,
                ret.returned_at.date_naive(),
                late
            );
        }
    }
}
