//! Single-loan fee lookup and patron status aggregation.
//!
//! Both entry points validate the patron id before touching the store and
//! exist in `_at` form taking an explicit reference instant, with thin
//! wrappers passing `Utc::now()`.
//!
//! Corrupt timestamps are handled asymmetrically on purpose: a single-loan
//! fee lookup fails with `CirculateError::Data`, while the multi-loan report
//! drops the offending record and keeps going. Long-standing behavior;
//! callers depend on reports never failing over one bad row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::{CirculateError, Result};
use crate::fees;
use crate::storage::{LibraryStore, Loan};
use crate::validation::validate_patron_id;

/// How many closed loans a status report includes.
pub const RECENT_RETURNS_LIMIT: usize = 5;

/// Fee assessment for one loan.
#[derive(Debug, Clone, Serialize)]
pub struct LoanFee {
    pub patron_id: String,
    pub book_id: i64,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub fee_amount: f64,
    /// The reference instant the fee was judged against: the return date for
    /// a closed loan, otherwise now.
    pub calculated_at: DateTime<Utc>,
}

/// An open loan annotated with its accrued fee.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveLoan {
    pub book_id: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub accrued_fee: f64,
}

/// A closed loan annotated with its late status.
///
/// `days_overdue` and `fee_at_return` are judged against the report's
/// reference date ("now"), not the recorded return date. A return that was
/// on time when it happened reads as late once today is past its due date.
/// Debatable, but it is the established policy and downstream reports
/// expect it; see DESIGN.md before changing.
#[derive(Debug, Clone, Serialize)]
pub struct RecentReturn {
    pub book_id: i64,
    pub title: Option<String>,
    pub returned_at: DateTime<Utc>,
    pub was_late: bool,
    pub days_overdue: i64,
    pub fee_at_return: f64,
}

/// Aggregate counters for a patron.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub active_count: usize,
    pub overdue_count: usize,
    pub total_accrued_fee: f64,
    pub lifetime_loans: i64,
}

/// Full status report for a patron.
#[derive(Debug, Clone, Serialize)]
pub struct PatronStatusReport {
    pub patron_id: String,
    pub summary: ReportSummary,
    pub active_loans: Vec<ActiveLoan>,
    pub recent_returns: Vec<RecentReturn>,
}

/// Compute the late fee for a patron's loan of a book.
pub fn compute_fee_for_loan(
    store: &dyn LibraryStore,
    patron_id: &str,
    book_id: i64,
) -> Result<LoanFee> {
    compute_fee_for_loan_at(store, patron_id, book_id, Utc::now())
}

/// Compute the late fee for a patron's loan of a book, judged at `now`.
///
/// Prefers the active loan; falls back to the most recent historical one.
/// The reference date is the return date for a closed loan and `now` for an
/// active one.
///
/// # Errors
///
/// - `CirculateError::Validation` for a malformed patron id (no data access)
/// - `CirculateError::NotFound` when the patron never borrowed the book
/// - `CirculateError::Data` when the record's timestamps do not parse
pub fn compute_fee_for_loan_at(
    store: &dyn LibraryStore,
    patron_id: &str,
    book_id: i64,
    now: DateTime<Utc>,
) -> Result<LoanFee> {
    validate_patron_id(patron_id)?;

    let loan = match store.find_active_loan(patron_id, book_id)? {
        Some(loan) => loan,
        None => store
            .find_most_recent_loan(patron_id, book_id)?
            .ok_or_else(|| {
                CirculateError::NotFound("No loan found for this patron/book.".to_string())
            })?,
    };

    // Any corrupt timestamp on the record fails the lookup, borrow date
    // included, even though only due/return feed the computation.
    loan.borrowed_at()?;
    let due_at = loan.due_at()?;
    let reference = loan.returned_at()?.unwrap_or(now);

    let fee = fees::assess(due_at, reference);
    Ok(LoanFee {
        patron_id: patron_id.to_string(),
        book_id,
        due_date: due_at.date_naive(),
        days_overdue: fee.days_overdue,
        fee_amount: fee.fee_amount,
        calculated_at: reference,
    })
}

/// Build the status report for a patron.
pub fn patron_status_report(
    store: &dyn LibraryStore,
    patron_id: &str,
) -> Result<PatronStatusReport> {
    patron_status_report_at(store, patron_id, Utc::now())
}

/// Build the status report for a patron, with overdue status judged at `now`
/// for active loans and recent returns alike.
///
/// Records with unparsable timestamps are dropped from the report (with a
/// warning) rather than failing it.
pub fn patron_status_report_at(
    store: &dyn LibraryStore,
    patron_id: &str,
    now: DateTime<Utc>,
) -> Result<PatronStatusReport> {
    validate_patron_id(patron_id)?;

    let mut active_loans = Vec::new();
    let mut overdue_count = 0;
    let mut total_accrued_fee = 0.0;

    for loan in store.find_active_loans(patron_id)? {
        let (borrowed_at, due_at) = match (loan.borrowed_at(), loan.due_at()) {
            (Ok(b), Ok(d)) => (b, d),
            _ => {
                warn_skipped(&loan, "active loan");
                continue;
            }
        };
        let fee = fees::assess(due_at, now);
        if fee.days_overdue > 0 {
            overdue_count += 1;
            total_accrued_fee += fee.fee_amount;
        }
        active_loans.push(ActiveLoan {
            book_id: loan.book_id,
            title: loan.title,
            author: loan.author,
            isbn: loan.isbn,
            borrowed_at,
            due_date: due_at.date_naive(),
            days_overdue: fee.days_overdue,
            accrued_fee: fee.fee_amount,
        });
    }

    let mut recent_returns = Vec::new();
    for loan in store.find_recent_returns(patron_id, RECENT_RETURNS_LIMIT)? {
        let (due_at, returned_at) = match (loan.due_at(), loan.returned_at()) {
            (Ok(d), Ok(Some(r))) => (d, r),
            _ => {
                warn_skipped(&loan, "returned loan");
                continue;
            }
        };
        // Late status judged against now, not the recorded return date.
        let fee = fees::assess(due_at, now);
        recent_returns.push(RecentReturn {
            book_id: loan.book_id,
            title: loan.title,
            returned_at,
            was_late: fee.days_overdue > 0,
            days_overdue: fee.days_overdue,
            fee_at_return: fee.fee_amount,
        });
    }

    let summary = ReportSummary {
        active_count: active_loans.len(),
        overdue_count,
        total_accrued_fee: fees::round_currency(total_accrued_fee),
        lifetime_loans: store.count_lifetime_loans(patron_id)?,
    };

    Ok(PatronStatusReport {
        patron_id: patron_id.to_string(),
        summary,
        active_loans,
        recent_returns,
    })
}

fn warn_skipped(loan: &Loan, kind: &str) {
    warn!(
        loan_id = loan.id,
        book_id = loan.book_id,
        kind,
        "skipping record with unparsable timestamps"
    );
}
