//! Accounting periods and date windows
//!
//! Ledger queries are expressed over entry dates (calendar dates, no time
//! component). A [`Period`] is an inclusive `[from, to]` range; a
//! [`DateWindow`] describes which entry dates contribute to a balance.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },
}

/// An inclusive accounting period `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    from: NaiveDate,
    to: NaiveDate,
}

impl Period {
    /// Creates a new period, rejecting ranges where `from` is after `to`
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, TemporalError> {
        if from > to {
            return Err(TemporalError::InvalidPeriod {
                start: from.to_string(),
                end: to.to_string(),
            });
        }
        Ok(Self { from, to })
    }

    /// A single-day period
    pub fn day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    /// First day of the period
    pub fn from(&self) -> NaiveDate {
        self.from
    }

    /// Last day of the period (inclusive)
    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Returns true if the date falls inside the period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Window of all activity strictly before this period starts
    pub fn opening_window(&self) -> DateWindow {
        DateWindow::Before(self.from)
    }

    /// Window of all activity up to and including the last day
    pub fn cumulative_window(&self) -> DateWindow {
        DateWindow::Through(self.to)
    }

    /// Window of activity inside the period only
    pub fn activity_window(&self) -> DateWindow {
        DateWindow::Within(*self)
    }
}

/// Selects which entry dates contribute to a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// Entry date strictly before the given date
    Before(NaiveDate),
    /// Entry date on or before the given date
    Through(NaiveDate),
    /// Entry date inside the period (inclusive on both ends)
    Within(Period),
}

impl DateWindow {
    /// Returns true if an entry on `date` falls inside this window
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            DateWindow::Before(bound) => date < *bound,
            DateWindow::Through(bound) => date <= *bound,
            DateWindow::Within(period) => period.contains(date),
        }
    }

    /// Lower bound (inclusive), if any
    pub fn lower_bound(&self) -> Option<NaiveDate> {
        match self {
            DateWindow::Within(period) => Some(period.from()),
            _ => None,
        }
    }

    /// Upper limit and whether it is inclusive
    pub fn upper_limit(&self) -> (NaiveDate, bool) {
        match self {
            DateWindow::Before(bound) => (*bound, false),
            DateWindow::Through(bound) => (*bound, true),
            DateWindow::Within(period) => (period.to(), true),
        }
    }
}
