//! Storage ports for the ledger domain
//!
//! A [`LedgerStore`] opens [`LedgerSession`]s. Each session is one unit of
//! work: reads see the session's own uncommitted writes, and nothing is
//! visible to other sessions until [`UnitOfWork::commit`] succeeds.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{DateWindow, DomainPort, Period, PortError, TenantId, UnitOfWork, VoucherId};
use crate::account::{Account, SystemRole};
use crate::voucher::{JournalVoucher, VoucherSource, VoucherStatus};

/// Voucher header as written by the posting service
#[derive(Debug, Clone)]
pub struct NewVoucher {
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
}

/// Voucher line as written by the posting service
#[derive(Debug, Clone)]
pub struct NewVoucherLine {
    pub line_no: i32,
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
    pub payee_ref: Option<String>,
}

/// A posted line of one account, joined with its voucher header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub voucher_id: VoucherId,
    pub voucher_number: String,
    pub line_no: i32,
    pub entry_date: NaiveDate,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Debit and credit sums of posted lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub debit: Decimal,
    pub credit: Decimal,
}

impl AccountTotals {
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self { debit, credit }
    }

    /// Debit minus credit
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Adds one line's amounts
    pub fn add(&mut self, debit: Decimal, credit: Decimal) {
        self.debit += debit;
        self.credit += credit;
    }
}

/// Factory for ledger units of work
#[async_trait]
pub trait LedgerStore: DomainPort {
    /// Session type handed out by this store
    type Session: LedgerSession;

    /// Opens a new unit of work
    async fn begin(&self) -> Result<Self::Session, PortError>;
}

/// Operations available inside one ledger unit of work
///
/// All queries only consider vouchers in `Posted` status.
#[async_trait]
pub trait LedgerSession: UnitOfWork {
    /// Looks up an account by code, active or not
    async fn find_account(
        &mut self,
        tenant_id: TenantId,
        code: &str,
    ) -> Result<Option<Account>, PortError>;

    /// Looks up the active account tagged with a role
    async fn find_account_by_role(
        &mut self,
        tenant_id: TenantId,
        role: SystemRole,
    ) -> Result<Option<Account>, PortError>;

    /// Lists the tenant's chart, ordered by code
    async fn list_accounts(&mut self, tenant_id: TenantId) -> Result<Vec<Account>, PortError>;

    /// Persists a new account
    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError>;

    /// Inserts a voucher header and returns its monotonic id
    async fn insert_voucher_header(&mut self, header: &NewVoucher) -> Result<VoucherId, PortError>;

    /// Inserts one line of an existing voucher
    async fn insert_voucher_line(
        &mut self,
        voucher_id: VoucherId,
        line: &NewVoucherLine,
    ) -> Result<(), PortError>;

    /// Replaces the placeholder number with the durable one
    async fn assign_voucher_number(
        &mut self,
        voucher_id: VoucherId,
        voucher_number: &str,
    ) -> Result<(), PortError>;

    /// Loads a voucher with its lines
    async fn find_voucher(
        &mut self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
    ) -> Result<Option<JournalVoucher>, PortError>;

    /// Sums posted lines of one account inside a date window
    async fn posted_totals(
        &mut self,
        tenant_id: TenantId,
        account_code: &str,
        window: DateWindow,
    ) -> Result<AccountTotals, PortError>;

    /// Posted lines of one account in a period
    ///
    /// Ordered by (entry date, voucher id, line number).
    async fn posted_entries(
        &mut self,
        tenant_id: TenantId,
        account_code: &str,
        period: Period,
    ) -> Result<Vec<LedgerEntry>, PortError>;

    /// Sums posted lines per account code inside a date window
    async fn posted_totals_by_account(
        &mut self,
        tenant_id: TenantId,
        window: DateWindow,
    ) -> Result<HashMap<String, AccountTotals>, PortError>;
}
