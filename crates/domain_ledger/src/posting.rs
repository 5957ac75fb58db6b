//! Journal posting service
//!
//! Validates balanced vouchers and persists header and lines atomically.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use core_kernel::{Currency, TenantId, UnitOfWork, VoucherId};
use crate::account::Side;
use crate::directory::AccountDirectory;
use crate::error::LedgerError;
use crate::ports::{LedgerSession, LedgerStore, NewVoucher, NewVoucherLine};
use crate::voucher::{
    placeholder_number, voucher_number, JournalEntryRequest, JournalVoucher, VoucherStatus,
};

/// Result of a successful posting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedVoucher {
    pub voucher_id: VoucherId,
    pub voucher_number: String,
    /// Voucher total (equal on both sides)
    pub total: Decimal,
}

/// Service that posts journal vouchers
///
/// # Invariants
///
/// - Every persisted voucher balances at the currency's minor unit
/// - A failed posting leaves no header or line behind
#[derive(Debug, Clone)]
pub struct JournalPostingService<S> {
    store: S,
    currency: Currency,
}

impl<S: LedgerStore> JournalPostingService<S> {
    /// Creates a posting service over a store
    ///
    /// # Arguments
    ///
    /// * `store` - Ledger storage port
    /// * `currency` - Ledger currency whose minor unit governs rounding
    pub fn new(store: S, currency: Currency) -> Self {
        Self { store, currency }
    }

    /// Ledger currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Posts a voucher in its own unit of work
    ///
    /// # Errors
    ///
    /// - `EmptyEntry` / `UnbalancedEntry` before anything is written
    /// - `AccountNotConfigured`, `AccountNotFound`, `InactiveAccount` while
    ///   resolving lines
    /// - `Storage` if the write fails; nothing is persisted
    #[instrument(skip(self, request), fields(tenant_id = %request.tenant_id, source = %request.source))]
    pub async fn post(&self, request: JournalEntryRequest) -> Result<PostedVoucher, LedgerError> {
        request.validate(self.currency)?;

        let mut session = self.store.begin().await?;
        let posted = post_in_session(&mut session, &request, self.currency).await?;
        session.commit().await?;

        info!(
            voucher_id = %posted.voucher_id,
            voucher_number = %posted.voucher_number,
            total = %posted.total,
            "Posted journal voucher"
        );
        Ok(posted)
    }

    /// Loads a voucher with its lines
    ///
    /// # Errors
    ///
    /// `VoucherNotFound` if the voucher does not exist for the tenant
    pub async fn get_voucher(
        &self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
    ) -> Result<JournalVoucher, LedgerError> {
        let mut session = self.store.begin().await?;
        session
            .find_voucher(tenant_id, voucher_id)
            .await?
            .ok_or(LedgerError::VoucherNotFound(voucher_id))
    }
}

/// Posts a voucher inside an existing session without committing
///
/// Used by callers that must post together with their own writes, such as
/// production order completion. The caller commits or drops the session.
pub async fn post_in_session<S>(
    session: &mut S,
    request: &JournalEntryRequest,
    currency: Currency,
) -> Result<PostedVoucher, LedgerError>
where
    S: LedgerSession + ?Sized,
{
    let total = request.validate(currency)?;
    let tenant_id = request.tenant_id;

    // Resolve every line before the first write
    let mut lines = Vec::with_capacity(request.lines.len());
    for (index, line) in request.lines.iter().enumerate() {
        let account = AccountDirectory::resolve_ref(session, tenant_id, &line.account).await?;
        let amount = currency.round(line.amount);
        let (debit, credit) = match line.side {
            Side::Debit => (amount, Decimal::ZERO),
            Side::Credit => (Decimal::ZERO, amount),
        };
        lines.push(NewVoucherLine {
            line_no: index as i32 + 1,
            account_code: account.code,
            debit,
            credit,
            description: line.description.clone(),
            payee_ref: line.payee_ref.clone(),
        });
    }

    let entry_date = request.effective_date();
    let header = NewVoucher {
        tenant_id,
        voucher_number: placeholder_number(),
        source: request.source,
        reference_id: request.reference_id.clone(),
        narration: request.narration.clone(),
        entry_date,
        status: VoucherStatus::Posted,
        total_debit: total,
        total_credit: total,
        created_by: request.created_by.clone(),
    };

    let voucher_id = session.insert_voucher_header(&header).await?;
    for line in &lines {
        session.insert_voucher_line(voucher_id, line).await?;
    }

    let number = voucher_number(entry_date, voucher_id);
    session.assign_voucher_number(voucher_id, &number).await?;

    debug!(%voucher_id, voucher_number = %number, lines = lines.len(), "Voucher written");

    Ok(PostedVoucher {
        voucher_id,
        voucher_number: number,
        total,
    })
}
