//! Account directory
//!
//! Resolves system roles and account codes to concrete tenant accounts.
//! Resolution always runs inside the caller's session so that a posting
//! sees the same chart it writes against.

use std::collections::HashSet;
use tracing::{debug, warn};

use core_kernel::TenantId;
use crate::account::{Account, AccountClass, Side, SystemRole};
use crate::error::LedgerError;
use crate::ports::LedgerSession;
use crate::voucher::AccountRef;

/// Lookup functions over a tenant's chart of accounts
pub struct AccountDirectory;

impl AccountDirectory {
    /// Resolves a system role to the tenant's active account
    ///
    /// # Errors
    ///
    /// `AccountNotConfigured` if no active account carries the role
    pub async fn resolve<S>(
        session: &mut S,
        tenant_id: TenantId,
        role: SystemRole,
    ) -> Result<Account, LedgerError>
    where
        S: LedgerSession + ?Sized,
    {
        match session.find_account_by_role(tenant_id, role).await? {
            Some(account) => {
                debug!(%tenant_id, %role, code = %account.code, "Resolved system role");
                Ok(account)
            }
            None => {
                warn!(%tenant_id, %role, "No active account configured for role");
                Err(LedgerError::AccountNotConfigured { role })
            }
        }
    }

    /// Looks up an account by code, returning it whether active or not
    pub async fn find<S>(
        session: &mut S,
        tenant_id: TenantId,
        code: &str,
    ) -> Result<Option<Account>, LedgerError>
    where
        S: LedgerSession + ?Sized,
    {
        Ok(session.find_account(tenant_id, code).await?)
    }

    /// Resolves a line's account reference to an active account
    ///
    /// # Errors
    ///
    /// - `AccountNotConfigured` for a role with no active account
    /// - `AccountNotFound` for an unknown code
    /// - `InactiveAccount` for a code whose account is inactive
    pub async fn resolve_ref<S>(
        session: &mut S,
        tenant_id: TenantId,
        reference: &AccountRef,
    ) -> Result<Account, LedgerError>
    where
        S: LedgerSession + ?Sized,
    {
        match reference {
            AccountRef::Role(role) => Self::resolve(session, tenant_id, *role).await,
            AccountRef::Code(code) => {
                let account = Self::find(session, tenant_id, code)
                    .await?
                    .ok_or_else(|| LedgerError::AccountNotFound(code.clone()))?;
                if !account.is_active {
                    return Err(LedgerError::InactiveAccount(code.clone()));
                }
                Ok(account)
            }
        }
    }

    /// Natural balance side of an account class
    pub fn natural_side(class: AccountClass) -> Side {
        class.natural_side()
    }

    /// Checks chart-level invariants
    ///
    /// Codes must be unique and non-empty, and each system role may be
    /// carried by at most one active account.
    pub fn validate_chart(accounts: &[Account]) -> Result<(), LedgerError> {
        let mut codes = HashSet::new();
        let mut roles = HashSet::new();

        for account in accounts {
            if account.code.trim().is_empty() {
                return Err(LedgerError::InvalidAccount(format!(
                    "account '{}' has an empty code",
                    account.name
                )));
            }
            if !codes.insert(account.code.as_str()) {
                return Err(LedgerError::DuplicateAccount(account.code.clone()));
            }
            if let (true, Some(role)) = (account.is_active, account.system_role) {
                if !roles.insert(role) {
                    return Err(LedgerError::DuplicateRole(role));
                }
            }
        }

        Ok(())
    }

    /// Adds accounts to a tenant's chart after checking them against the
    /// accounts already present
    pub async fn register<S>(
        session: &mut S,
        tenant_id: TenantId,
        accounts: &[Account],
    ) -> Result<(), LedgerError>
    where
        S: LedgerSession + ?Sized,
    {
        let mut combined = session.list_accounts(tenant_id).await?;
        combined.extend(accounts.iter().cloned());
        Self::validate_chart(&combined)?;

        for account in accounts {
            session.insert_account(account).await?;
        }

        debug!(%tenant_id, count = accounts.len(), "Registered accounts");
        Ok(())
    }

    /// Roles with no active account in the given chart
    pub fn missing_roles(accounts: &[Account]) -> Vec<SystemRole> {
        SystemRole::ALL
            .iter()
            .copied()
            .filter(|role| {
                !accounts
                    .iter()
                    .any(|a| a.is_active && a.system_role == Some(*role))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::ManufacturingChartOfAccounts;

    #[test]
    fn test_standard_chart_is_valid() {
        let accounts = ManufacturingChartOfAccounts::standard_accounts(TenantId::new());
        assert!(AccountDirectory::validate_chart(&accounts).is_ok());
        assert!(AccountDirectory::missing_roles(&accounts).is_empty());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let tenant = TenantId::new();
        let accounts = vec![
            Account::new(tenant, "1200", "Raw", AccountClass::Asset),
            Account::new(tenant, "1200", "Raw again", AccountClass::Asset),
        ];
        assert!(matches!(
            AccountDirectory::validate_chart(&accounts),
            Err(LedgerError::DuplicateAccount(code)) if code == "1200"
        ));
    }

    #[test]
    fn test_duplicate_active_role_rejected() {
        let tenant = TenantId::new();
        let accounts = vec![
            Account::new(tenant, "1000", "Cash", AccountClass::Asset).with_role(SystemRole::Cash),
            Account::new(tenant, "1001", "Petty cash", AccountClass::Asset).with_role(SystemRole::Cash),
        ];
        assert!(matches!(
            AccountDirectory::validate_chart(&accounts),
            Err(LedgerError::DuplicateRole(SystemRole::Cash))
        ));
    }

    #[test]
    fn test_inactive_role_holder_does_not_conflict() {
        let tenant = TenantId::new();
        let accounts = vec![
            Account::new(tenant, "1000", "Cash", AccountClass::Asset).with_role(SystemRole::Cash),
            Account::new(tenant, "1001", "Old cash", AccountClass::Asset)
                .with_role(SystemRole::Cash)
                .deactivated(),
        ];
        assert!(AccountDirectory::validate_chart(&accounts).is_ok());
    }
}
