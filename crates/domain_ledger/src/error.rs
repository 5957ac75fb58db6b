//! Ledger domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{PortError, TemporalError, VoucherId};
use crate::account::SystemRole;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Debit and credit totals differ at the currency's minor unit
    #[error("Unbalanced entry: debits={debits}, credits={credits}")]
    UnbalancedEntry {
        debits: Decimal,
        credits: Decimal,
    },

    /// Too few lines, or a line without a positive amount
    #[error("Empty entry: {0}")]
    EmptyEntry(String),

    /// No active account in the tenant carries the role
    #[error("No active account is configured for system role {role}")]
    AccountNotConfigured {
        role: SystemRole,
    },

    /// Account code not found in the tenant's chart
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account exists but is inactive
    #[error("Account is inactive: {0}")]
    InactiveAccount(String),

    /// Account definition is malformed
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Account code used more than once in a chart
    #[error("Duplicate account code: {0}")]
    DuplicateAccount(String),

    /// More than one active account tagged with the same role
    #[error("System role {0} is assigned to more than one active account")]
    DuplicateRole(SystemRole),

    /// Voucher not found for the tenant
    #[error("Journal voucher not found: {0}")]
    VoucherNotFound(VoucherId),

    /// Query period is inverted
    #[error(transparent)]
    InvalidPeriod(#[from] TemporalError),

    /// The replayed running balance disagrees with the period totals
    #[error("Running balance {running} does not match closing balance {closing}")]
    BalanceMismatch {
        running: Decimal,
        closing: Decimal,
    },

    /// Storage failure; the unit of work has been rolled back
    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

impl LedgerError {
    /// Returns true for errors caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::UnbalancedEntry { .. }
                | LedgerError::EmptyEntry(_)
                | LedgerError::InactiveAccount(_)
                | LedgerError::InvalidAccount(_)
                | LedgerError::DuplicateAccount(_)
                | LedgerError::DuplicateRole(_)
                | LedgerError::InvalidPeriod(_)
        )
    }

    /// Returns true for incomplete tenant setup or unknown references
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::AccountNotConfigured { .. }
                | LedgerError::AccountNotFound(_)
                | LedgerError::VoucherNotFound(_)
        )
    }
}
