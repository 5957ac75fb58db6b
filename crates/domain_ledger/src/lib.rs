//! Ledger Domain - Double-Entry Journal and Ledger Queries
//!
//! This crate implements the accounting core of the manufacturing system:
//! balanced journal vouchers, account resolution by system role, running
//! ledgers and trial balances.
//!
//! # Double-Entry Accounting Principles
//!
//! Every voucher records balanced debits and credits:
//! - Debits increase asset, expense and cost-of-goods-sold accounts
//! - Credits increase liability, equity and revenue accounts
//! - The sum of all debits must equal the sum of all credits
//!
//! # Components
//!
//! - [`AccountDirectory`]: resolves system roles and codes to tenant accounts
//! - [`JournalPostingService`]: validates and atomically persists vouchers
//! - [`LedgerQueryService`]: account activity with running balance, trial balance
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{JournalEntryRequest, JournalPostingService, SystemRole, VoucherSource};
//!
//! let request = JournalEntryRequest::new(tenant_id, "clerk-7", VoucherSource::Manual, "Opening stock")
//!     .dated(entry_date)
//!     .debit(SystemRole::InventoryRawMaterial, dec!(500))
//!     .credit("3000", dec!(500));
//!
//! let posted = posting_service.post(request).await?;
//! ```

pub mod account;
pub mod directory;
pub mod voucher;
pub mod posting;
pub mod ledger;
pub mod ports;
pub mod error;

pub use account::{Account, AccountClass, Side, SystemRole, ManufacturingChartOfAccounts};
pub use directory::AccountDirectory;
pub use voucher::{
    AccountRef, EntryLine, JournalEntryRequest, JournalVoucher, JournalVoucherLine,
    VoucherSource, VoucherStatus, voucher_number,
};
pub use posting::{JournalPostingService, PostedVoucher, post_in_session};
pub use ledger::{
    AccountActivity, ActivityLine, LedgerQueryService, Replay, SidedBalance, TrialBalance,
    TrialBalanceEntry, build_trial_balance, replay_activity,
};
pub use ports::{AccountTotals, LedgerEntry, LedgerSession, LedgerStore, NewVoucher, NewVoucherLine};
pub use error::LedgerError;
