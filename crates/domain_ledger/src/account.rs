//! Account types for the chart of accounts
//!
//! This module defines the account structure for double-entry bookkeeping,
//! the natural balance side of each account class, and the closed set of
//! system roles used to find functional accounts programmatically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::TenantId;

/// Debit or credit side of a posting or of an account's natural balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Debit (left) side
    Debit,
    /// Credit (right) side
    Credit,
}

impl Side {
    /// Returns the other side
    pub fn opposite(&self) -> Side {
        match self {
            Side::Debit => Side::Credit,
            Side::Credit => Side::Debit,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Debit => write!(f, "debit"),
            Side::Credit => write!(f, "credit"),
        }
    }
}

/// Classes of accounts in the chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClass {
    /// Asset accounts (debit normal balance)
    Asset,
    /// Liability accounts (credit normal balance)
    Liability,
    /// Equity accounts (credit normal balance)
    Equity,
    /// Revenue accounts (credit normal balance)
    Revenue,
    /// Expense accounts (debit normal balance)
    Expense,
    /// Cost of goods sold (debit normal balance)
    CostOfGoodsSold,
}

impl AccountClass {
    /// Returns the side on which this class normally carries its balance
    pub fn natural_side(&self) -> Side {
        match self {
            AccountClass::Asset | AccountClass::Expense | AccountClass::CostOfGoodsSold => Side::Debit,
            AccountClass::Liability | AccountClass::Equity | AccountClass::Revenue => Side::Credit,
        }
    }

    /// Returns true if this class has a debit normal balance
    pub fn is_debit_normal(&self) -> bool {
        self.natural_side() == Side::Debit
    }

    /// Balance-sheet classes report point-in-time balances; the rest are
    /// flow accounts reported for a period only
    pub fn is_balance_sheet(&self) -> bool {
        matches!(
            self,
            AccountClass::Asset | AccountClass::Liability | AccountClass::Equity
        )
    }
}

impl AccountClass {
    /// Stable tag stored alongside the account
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountClass::Asset => "asset",
            AccountClass::Liability => "liability",
            AccountClass::Equity => "equity",
            AccountClass::Revenue => "revenue",
            AccountClass::Expense => "expense",
            AccountClass::CostOfGoodsSold => "cost_of_goods_sold",
        }
    }
}

impl FromStr for AccountClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset" => Ok(AccountClass::Asset),
            "liability" => Ok(AccountClass::Liability),
            "equity" => Ok(AccountClass::Equity),
            "revenue" => Ok(AccountClass::Revenue),
            "expense" => Ok(AccountClass::Expense),
            "cost_of_goods_sold" => Ok(AccountClass::CostOfGoodsSold),
            other => Err(format!("unknown account class: {}", other)),
        }
    }
}

/// Machine-readable roles used to look up functional accounts
///
/// Each role resolves to at most one active account per tenant. Roles are a
/// closed set: an unknown role string is rejected when it is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemRole {
    InventoryRawMaterial,
    InventoryWorkInProgress,
    InventoryFinishedGoods,
    CostOfGoodsSold,
    ManufacturingOverheadApplied,
    Cash,
    AccountsReceivable,
    AccountsPayable,
    SalesRevenue,
    RetainedEarnings,
}

impl SystemRole {
    /// All known roles
    pub const ALL: [SystemRole; 10] = [
        SystemRole::InventoryRawMaterial,
        SystemRole::InventoryWorkInProgress,
        SystemRole::InventoryFinishedGoods,
        SystemRole::CostOfGoodsSold,
        SystemRole::ManufacturingOverheadApplied,
        SystemRole::Cash,
        SystemRole::AccountsReceivable,
        SystemRole::AccountsPayable,
        SystemRole::SalesRevenue,
        SystemRole::RetainedEarnings,
    ];

    /// Stable tag stored alongside the account
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemRole::InventoryRawMaterial => "INVENTORY_RAW_MATERIAL",
            SystemRole::InventoryWorkInProgress => "INVENTORY_WORK_IN_PROGRESS",
            SystemRole::InventoryFinishedGoods => "INVENTORY_FINISHED_GOODS",
            SystemRole::CostOfGoodsSold => "COST_OF_GOODS_SOLD",
            SystemRole::ManufacturingOverheadApplied => "MANUFACTURING_OVERHEAD_APPLIED",
            SystemRole::Cash => "CASH",
            SystemRole::AccountsReceivable => "ACCOUNTS_RECEIVABLE",
            SystemRole::AccountsPayable => "ACCOUNTS_PAYABLE",
            SystemRole::SalesRevenue => "SALES_REVENUE",
            SystemRole::RetainedEarnings => "RETAINED_EARNINGS",
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SystemRole::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown system role: {}", s))
    }
}

/// An account in the chart of accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Account code, unique within the tenant (e.g., "1200")
    pub code: String,
    /// Display name
    pub name: String,
    /// Account class
    pub class: AccountClass,
    /// Optional system role tag for programmatic lookup
    pub system_role: Option<SystemRole>,
    /// Description
    pub description: Option<String>,
    /// Whether account is active
    pub is_active: bool,
}

impl Account {
    /// Creates a new active account
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - Owning tenant
    /// * `code` - Account code
    /// * `name` - Account name
    /// * `class` - Class of account
    pub fn new(tenant_id: TenantId, code: impl Into<String>, name: impl Into<String>, class: AccountClass) -> Self {
        Self {
            tenant_id,
            code: code.into(),
            name: name.into(),
            class,
            system_role: None,
            description: None,
            is_active: true,
        }
    }

    /// Tags the account with a system role
    pub fn with_role(mut self, role: SystemRole) -> Self {
        self.system_role = Some(role);
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the account inactive
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Natural balance side derived from the class
    pub fn natural_side(&self) -> Side {
        self.class.natural_side()
    }
}

/// Standard chart of accounts for a manufacturing tenant
pub struct ManufacturingChartOfAccounts;

impl ManufacturingChartOfAccounts {
    /// Creates the standard accounts with system roles pre-tagged
    pub fn standard_accounts(tenant_id: TenantId) -> Vec<Account> {
        vec![
            // Assets
            Account::new(tenant_id, "1000", "Cash", AccountClass::Asset)
                .with_role(SystemRole::Cash),
            Account::new(tenant_id, "1100", "Accounts Receivable", AccountClass::Asset)
                .with_role(SystemRole::AccountsReceivable),
            Account::new(tenant_id, "1200", "Raw Materials Inventory", AccountClass::Asset)
                .with_role(SystemRole::InventoryRawMaterial),
            Account::new(tenant_id, "1210", "Work in Progress", AccountClass::Asset)
                .with_role(SystemRole::InventoryWorkInProgress),
            Account::new(tenant_id, "1220", "Finished Goods Inventory", AccountClass::Asset)
                .with_role(SystemRole::InventoryFinishedGoods),

            // Liabilities
            Account::new(tenant_id, "2000", "Accounts Payable", AccountClass::Liability)
                .with_role(SystemRole::AccountsPayable),
            Account::new(tenant_id, "2100", "Accrued Wages", AccountClass::Liability),

            // Equity
            Account::new(tenant_id, "3000", "Owner's Capital", AccountClass::Equity),
            Account::new(tenant_id, "3100", "Retained Earnings", AccountClass::Equity)
                .with_role(SystemRole::RetainedEarnings),

            // Revenue
            Account::new(tenant_id, "4000", "Sales Revenue", AccountClass::Revenue)
                .with_role(SystemRole::SalesRevenue),

            // Cost of sales
            Account::new(tenant_id, "5000", "Cost of Goods Sold", AccountClass::CostOfGoodsSold)
                .with_role(SystemRole::CostOfGoodsSold),

            // Expenses
            Account::new(tenant_id, "5100", "Manufacturing Overhead Applied", AccountClass::Expense)
                .with_role(SystemRole::ManufacturingOverheadApplied),
            Account::new(tenant_id, "6000", "Factory Utilities", AccountClass::Expense),
            Account::new(tenant_id, "6100", "Direct Labor", AccountClass::Expense),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_sides() {
        assert_eq!(AccountClass::Asset.natural_side(), Side::Debit);
        assert_eq!(AccountClass::Expense.natural_side(), Side::Debit);
        assert_eq!(AccountClass::CostOfGoodsSold.natural_side(), Side::Debit);
        assert_eq!(AccountClass::Liability.natural_side(), Side::Credit);
        assert_eq!(AccountClass::Equity.natural_side(), Side::Credit);
        assert_eq!(AccountClass::Revenue.natural_side(), Side::Credit);
    }

    #[test]
    fn test_role_round_trip_through_tag() {
        for role in SystemRole::ALL {
            assert_eq!(role.as_str().parse::<SystemRole>(), Ok(role));
        }
        assert!("INVENTORY_SCRAP".parse::<SystemRole>().is_err());
    }

    #[test]
    fn test_standard_chart_has_production_roles() {
        let accounts = ManufacturingChartOfAccounts::standard_accounts(TenantId::new());
        for role in [SystemRole::InventoryRawMaterial, SystemRole::InventoryFinishedGoods] {
            assert_eq!(
                accounts.iter().filter(|a| a.system_role == Some(role)).count(),
                1
            );
        }
    }
}
