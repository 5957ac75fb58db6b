//! Ledger queries: account activity with running balance, and trial balance
//!
//! Both reports are derived from posted voucher lines only. The pure
//! functions [`replay_activity`] and [`build_trial_balance`] do the
//! arithmetic; [`LedgerQueryService`] feeds them from a store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{instrument, warn};

use core_kernel::{Period, TenantId, VoucherId};
use crate::account::{Account, AccountClass, Side};
use crate::directory::AccountDirectory;
use crate::error::LedgerError;
use crate::ports::{AccountTotals, LedgerEntry, LedgerSession, LedgerStore};

/// A raw debit-minus-credit balance presented on a side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidedBalance {
    /// Absolute amount
    pub amount: Decimal,
    /// Side the amount sits on
    pub side: Side,
}

impl SidedBalance {
    /// Presents a raw balance for an account with the given natural side
    ///
    /// A zero balance is shown on the natural side; otherwise the sign of
    /// the net picks the column.
    pub fn present(net: Decimal, natural: Side) -> Self {
        if net.is_zero() {
            Self { amount: Decimal::ZERO, side: natural }
        } else if net > Decimal::ZERO {
            Self { amount: net, side: Side::Debit }
        } else {
            Self { amount: -net, side: Side::Credit }
        }
    }

    /// Returns true if the balance sits on the account's abnormal side
    pub fn is_contra(&self, natural: Side) -> bool {
        !self.amount.is_zero() && self.side != natural
    }
}

/// One replayed line of an account ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLine {
    pub entry_date: NaiveDate,
    pub voucher_id: VoucherId,
    pub voucher_number: String,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Debit-minus-credit balance after this line
    pub running_balance: Decimal,
}

/// Account ledger for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountActivity {
    pub account_code: String,
    pub account_name: String,
    pub class: AccountClass,
    pub natural_side: Side,
    pub period: Period,
    /// Debit-minus-credit balance before the period
    pub opening_balance: Decimal,
    pub opening: SidedBalance,
    pub lines: Vec<ActivityLine>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// Debit-minus-credit balance at the end of the period
    pub closing_balance: Decimal,
    pub closing: SidedBalance,
}

/// Result of replaying a period's lines over an opening balance
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub lines: Vec<ActivityLine>,
    pub totals: AccountTotals,
    pub closing_balance: Decimal,
}

/// Replays ledger entries over an opening balance
///
/// Entries are ordered by (entry date, voucher id, line number) before the
/// fold, so the result does not depend on the order the store returned them.
///
/// # Errors
///
/// `BalanceMismatch` if the last running balance differs from
/// `opening + debits - credits`
pub fn replay_activity(
    opening_balance: Decimal,
    mut entries: Vec<LedgerEntry>,
) -> Result<Replay, LedgerError> {
    entries.sort_by(|a, b| {
        (a.entry_date, a.voucher_id, a.line_no).cmp(&(b.entry_date, b.voucher_id, b.line_no))
    });

    let mut running = opening_balance;
    let mut totals = AccountTotals::default();
    let mut lines = Vec::with_capacity(entries.len());

    for entry in entries {
        running += entry.debit - entry.credit;
        totals.add(entry.debit, entry.credit);
        lines.push(ActivityLine {
            entry_date: entry.entry_date,
            voucher_id: entry.voucher_id,
            voucher_number: entry.voucher_number,
            reference_id: entry.reference_id,
            description: entry.description,
            debit: entry.debit,
            credit: entry.credit,
            running_balance: running,
        });
    }

    let closing_balance = opening_balance + totals.net();
    let last = lines.last().map(|l| l.running_balance).unwrap_or(opening_balance);
    if last != closing_balance {
        return Err(LedgerError::BalanceMismatch {
            running: last,
            closing: closing_balance,
        });
    }

    Ok(Replay {
        lines,
        totals,
        closing_balance,
    })
}

/// One row of a trial balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceEntry {
    pub account_code: String,
    pub account_name: String,
    pub class: AccountClass,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Trial balance for a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub period: Period,
    pub entries: Vec<TrialBalanceEntry>,
    pub total_debits: Decimal,
    pub total_credits: Decimal,
    pub is_balanced: bool,
}

/// Builds a trial balance from per-account totals
///
/// Balance-sheet accounts take their cumulative totals through the end of
/// the period; flow accounts take their totals within the period. Accounts
/// whose net is zero are omitted. Rows are ordered by account code.
pub fn build_trial_balance(
    period: Period,
    accounts: &[Account],
    cumulative: &HashMap<String, AccountTotals>,
    within_period: &HashMap<String, AccountTotals>,
) -> TrialBalance {
    let mut entries: Vec<TrialBalanceEntry> = accounts
        .iter()
        .filter_map(|account| {
            let source = if account.class.is_balance_sheet() {
                cumulative
            } else {
                within_period
            };
            let net = source.get(&account.code).map(AccountTotals::net).unwrap_or_default();
            if net.is_zero() {
                return None;
            }

            let (debit, credit) = if net > Decimal::ZERO {
                (net, Decimal::ZERO)
            } else {
                (Decimal::ZERO, -net)
            };
            Some(TrialBalanceEntry {
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                class: account.class,
                debit,
                credit,
            })
        })
        .collect();

    entries.sort_by(|a, b| a.account_code.cmp(&b.account_code));

    let total_debits: Decimal = entries.iter().map(|e| e.debit).sum();
    let total_credits: Decimal = entries.iter().map(|e| e.credit).sum();

    TrialBalance {
        period,
        entries,
        total_debits,
        total_credits,
        is_balanced: total_debits == total_credits,
    }
}

/// Read-only queries over posted vouchers
#[derive(Debug, Clone)]
pub struct LedgerQueryService<S> {
    store: S,
}

impl<S: LedgerStore> LedgerQueryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Account ledger with opening balance, running balance and totals
    ///
    /// # Errors
    ///
    /// - `InvalidPeriod` if `from > to`
    /// - `AccountNotFound` if the code is unknown to the tenant
    #[instrument(skip(self))]
    pub async fn account_activity(
        &self,
        tenant_id: TenantId,
        account_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<AccountActivity, LedgerError> {
        let period = Period::new(from, to)?;
        let mut session = self.store.begin().await?;

        let account = AccountDirectory::find(&mut session, tenant_id, account_code)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_code.to_string()))?;

        let opening_balance = session
            .posted_totals(tenant_id, account_code, period.opening_window())
            .await?
            .net();
        let entries = session.posted_entries(tenant_id, account_code, period).await?;
        let replay = replay_activity(opening_balance, entries)?;

        let natural_side = account.natural_side();
        Ok(AccountActivity {
            account_code: account.code,
            account_name: account.name,
            class: account.class,
            natural_side,
            period,
            opening_balance,
            opening: SidedBalance::present(opening_balance, natural_side),
            lines: replay.lines,
            total_debit: replay.totals.debit,
            total_credit: replay.totals.credit,
            closing_balance: replay.closing_balance,
            closing: SidedBalance::present(replay.closing_balance, natural_side),
        })
    }

    /// Trial balance across the tenant's chart
    ///
    /// An unbalanced result is returned with `is_balanced = false` and
    /// logged, rather than raised as an error.
    #[instrument(skip(self))]
    pub async fn trial_balance(
        &self,
        tenant_id: TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<TrialBalance, LedgerError> {
        let period = Period::new(from, to)?;
        let mut session = self.store.begin().await?;

        let accounts = session.list_accounts(tenant_id).await?;
        let cumulative = session
            .posted_totals_by_account(tenant_id, period.cumulative_window())
            .await?;
        let within_period = session
            .posted_totals_by_account(tenant_id, period.activity_window())
            .await?;

        let report = build_trial_balance(period, &accounts, &cumulative, &within_period);
        if !report.is_balanced {
            warn!(
                total_debits = %report.total_debits,
                total_credits = %report.total_credits,
                "Trial balance does not balance"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(day: u32, voucher: i64, debit: Decimal, credit: Decimal) -> LedgerEntry {
        LedgerEntry {
            voucher_id: VoucherId::new(voucher),
            voucher_number: format!("JV-{}", voucher),
            line_no: 1,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            reference_id: None,
            description: None,
            debit,
            credit,
        }
    }

    #[test]
    fn test_replay_orders_by_date_then_voucher() {
        let entries = vec![
            entry(5, 9, dec!(0), dec!(30)),
            entry(2, 4, dec!(100), dec!(0)),
            entry(5, 7, dec!(20), dec!(0)),
        ];

        let replay = replay_activity(dec!(10), entries).unwrap();
        let order: Vec<i64> = replay.lines.iter().map(|l| l.voucher_id.value()).collect();
        let running: Vec<Decimal> = replay.lines.iter().map(|l| l.running_balance).collect();

        assert_eq!(order, vec![4, 7, 9]);
        assert_eq!(running, vec![dec!(110), dec!(130), dec!(100)]);
        assert_eq!(replay.closing_balance, dec!(100));
    }

    #[test]
    fn test_replay_without_lines_closes_at_opening() {
        let replay = replay_activity(dec!(-25), Vec::new()).unwrap();
        assert!(replay.lines.is_empty());
        assert_eq!(replay.closing_balance, dec!(-25));
    }

    #[test]
    fn test_sided_balance_presentation() {
        assert_eq!(
            SidedBalance::present(dec!(-40), Side::Credit),
            SidedBalance { amount: dec!(40), side: Side::Credit }
        );
        assert_eq!(
            SidedBalance::present(dec!(0), Side::Credit),
            SidedBalance { amount: dec!(0), side: Side::Credit }
        );
        let contra = SidedBalance::present(dec!(15), Side::Credit);
        assert!(contra.is_contra(Side::Credit));
    }
}
