//! Concrete record types and the macros that define them

pub mod expense;
pub mod macros;
pub mod message;
pub mod post;
pub mod transaction;

pub use expense::Expense;
pub use message::Message;
pub use post::Post;
pub use transaction::{Transaction, TransactionKind};

use chrono::{DateTime, NaiveDate, Utc};

/// Midnight UTC on the given day; the epoch for an impossible date
pub(crate) fn day_start(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// Midnight UTC of `date`
pub(crate) fn date_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
