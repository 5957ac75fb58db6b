//! Journal voucher and posting request types
//!
//! A [`JournalEntryRequest`] is what callers hand to the posting service:
//! lines that reference accounts either by code or by system role. A
//! [`JournalVoucher`] is what the ledger stores once the request is posted.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Currency, TenantId, VoucherId};
use crate::account::{Side, SystemRole};
use crate::error::LedgerError;

/// Reference to a ledger account, either literal or by functional role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRef {
    /// A tenant account code such as "1200"
    Code(String),
    /// A system role resolved through the account directory
    Role(SystemRole),
}

impl From<&str> for AccountRef {
    fn from(code: &str) -> Self {
        AccountRef::Code(code.to_string())
    }
}

impl From<String> for AccountRef {
    fn from(code: String) -> Self {
        AccountRef::Code(code)
    }
}

impl From<SystemRole> for AccountRef {
    fn from(role: SystemRole) -> Self {
        AccountRef::Role(role)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Code(code) => write!(f, "{}", code),
            AccountRef::Role(role) => write!(f, "role:{}", role),
        }
    }
}

/// Business source of a voucher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoucherSource {
    Manual,
    Production,
    Purchase,
    Sales,
    Adjustment,
}

impl VoucherSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherSource::Manual => "Manual",
            VoucherSource::Production => "Production",
            VoucherSource::Purchase => "Purchase",
            VoucherSource::Sales => "Sales",
            VoucherSource::Adjustment => "Adjustment",
        }
    }
}

impl fmt::Display for VoucherSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoucherSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Manual" => Ok(VoucherSource::Manual),
            "Production" => Ok(VoucherSource::Production),
            "Purchase" => Ok(VoucherSource::Purchase),
            "Sales" => Ok(VoucherSource::Sales),
            "Adjustment" => Ok(VoucherSource::Adjustment),
            other => Err(format!("unknown voucher source: {}", other)),
        }
    }
}

/// Voucher lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherStatus {
    Draft,
    Posted,
}

/// One requested debit or credit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryLine {
    /// Account to post to
    pub account: AccountRef,
    /// Debit or credit
    pub side: Side,
    /// Amount (must be positive)
    pub amount: Decimal,
    /// Optional line description
    pub description: Option<String>,
    /// Optional payee reference
    pub payee_ref: Option<String>,
}

impl EntryLine {
    pub fn new(account: impl Into<AccountRef>, side: Side, amount: Decimal) -> Self {
        Self {
            account: account.into(),
            side,
            amount,
            description: None,
            payee_ref: None,
        }
    }

    /// Adds a description to the line
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a payee reference to the line
    pub fn with_payee(mut self, payee_ref: impl Into<String>) -> Self {
        self.payee_ref = Some(payee_ref.into());
        self
    }
}

/// A request to post a balanced journal voucher
///
/// Requests must always balance: total debits = total credits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntryRequest {
    /// Tenant the voucher belongs to
    pub tenant_id: TenantId,
    /// User or system that creates the voucher
    pub created_by: String,
    /// Source/category tag
    pub source: VoucherSource,
    /// Narration shown on the voucher
    pub narration: String,
    /// Optional originating business document
    pub reference_id: Option<String>,
    /// Entry date; defaults to today when not set
    pub entry_date: Option<NaiveDate>,
    /// Requested lines
    pub lines: Vec<EntryLine>,
}

impl JournalEntryRequest {
    /// Creates a new request without lines
    pub fn new(
        tenant_id: TenantId,
        created_by: impl Into<String>,
        source: VoucherSource,
        narration: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            created_by: created_by.into(),
            source,
            narration: narration.into(),
            reference_id: None,
            entry_date: None,
            lines: Vec::new(),
        }
    }

    /// Sets the entry date
    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.entry_date = Some(date);
        self
    }

    /// Sets the originating document reference
    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    /// Adds a debit line
    pub fn debit(mut self, account: impl Into<AccountRef>, amount: Decimal) -> Self {
        self.lines.push(EntryLine::new(account, Side::Debit, amount));
        self
    }

    /// Adds a credit line
    pub fn credit(mut self, account: impl Into<AccountRef>, amount: Decimal) -> Self {
        self.lines.push(EntryLine::new(account, Side::Credit, amount));
        self
    }

    /// Adds a prepared line
    pub fn line(mut self, line: EntryLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Entry date, falling back to the current UTC date
    pub fn effective_date(&self) -> NaiveDate {
        self.entry_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Validates shape and balance without touching storage
    ///
    /// Amounts are compared after rounding to the currency's minor unit.
    ///
    /// # Returns
    ///
    /// The (rounded) voucher total, equal on both sides
    ///
    /// # Errors
    ///
    /// - `EmptyEntry` if fewer than two lines or any amount is not positive
    /// - `UnbalancedEntry` if debits differ from credits
    pub fn validate(&self, currency: Currency) -> Result<Decimal, LedgerError> {
        if self.lines.len() < 2 {
            return Err(LedgerError::EmptyEntry(format!(
                "a voucher needs at least two lines, got {}",
                self.lines.len()
            )));
        }

        let mut debits = Decimal::ZERO;
        let mut credits = Decimal::ZERO;

        for (index, line) in self.lines.iter().enumerate() {
            let amount = currency.round(line.amount);
            if amount <= Decimal::ZERO {
                return Err(LedgerError::EmptyEntry(format!(
                    "line {} ({}) has non-positive amount {}",
                    index + 1,
                    line.account,
                    line.amount
                )));
            }
            match line.side {
                Side::Debit => debits += amount,
                Side::Credit => credits += amount,
            }
        }

        if debits != credits {
            return Err(LedgerError::UnbalancedEntry { debits, credits });
        }

        Ok(debits)
    }
}

/// A persisted journal voucher with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalVoucher {
    pub id: VoucherId,
    pub tenant_id: TenantId,
    pub voucher_number: String,
    pub source: VoucherSource,
    pub reference_id: Option<String>,
    pub narration: String,
    pub entry_date: NaiveDate,
    pub status: VoucherStatus,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<JournalVoucherLine>,
}

impl JournalVoucher {
    /// Checks the posted-voucher invariant against the stored lines
    pub fn is_balanced(&self) -> bool {
        let debits: Decimal = self.lines.iter().map(|l| l.debit).sum();
        let credits: Decimal = self.lines.iter().map(|l| l.credit).sum();
        debits == credits && debits == self.total_debit && credits == self.total_credit
    }
}

/// A stored voucher line; exactly one of debit/credit is nonzero
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalVoucherLine {
    pub line_no: i32,
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
    pub payee_ref: Option<String>,
}

/// Durable voucher number derived from the entry date and the row id
///
/// The id is only known once the header row exists, which is why posting
/// writes a placeholder number first and assigns this one afterwards.
pub fn voucher_number(entry_date: NaiveDate, voucher_id: VoucherId) -> String {
    format!("JV-{}-{:06}", entry_date.format("%Y%m%d"), voucher_id.value())
}

/// Unique placeholder used between header insert and number assignment
pub(crate) fn placeholder_number() -> String {
    format!("PENDING-{}", uuid::Uuid::new_v4().simple())
}
