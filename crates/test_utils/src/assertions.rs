//! Custom Test Assertions
//!
//! Assertion helpers for ledger invariants with descriptive failure messages.

use rust_decimal::Decimal;

use core_kernel::Currency;
use domain_ledger::{JournalVoucher, TrialBalance};

/// Asserts that a stored voucher balances and each line has one side
pub fn assert_voucher_balanced(voucher: &JournalVoucher) {
    let debits: Decimal = voucher.lines.iter().map(|l| l.debit).sum();
    let credits: Decimal = voucher.lines.iter().map(|l| l.credit).sum();

    assert_eq!(
        debits, credits,
        "Voucher {} is unbalanced: debits={}, credits={}",
        voucher.voucher_number, debits, credits
    );
    for line in &voucher.lines {
        assert!(
            line.debit.is_zero() != line.credit.is_zero(),
            "Voucher {} line {} must have exactly one nonzero side",
            voucher.voucher_number,
            line.line_no
        );
    }
}

/// Asserts that both trial balance columns sum equal
pub fn assert_trial_balance_balanced(report: &TrialBalance) {
    let debits: Decimal = report.entries.iter().map(|e| e.debit).sum();
    let credits: Decimal = report.entries.iter().map(|e| e.credit).sum();

    assert_eq!(
        debits, credits,
        "Trial balance columns differ: debits={}, credits={}",
        debits, credits
    );
    assert!(report.is_balanced, "Trial balance reports is_balanced = false");
}

/// Asserts two amounts are equal at the currency's minor unit
pub fn assert_amount_eq(actual: Decimal, expected: Decimal, currency: Currency) {
    assert!(
        currency.amounts_equal(actual, expected),
        "Amounts differ at {} precision: actual={}, expected={}",
        currency,
        actual,
        expected
    );
}
