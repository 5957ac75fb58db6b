//! Ledger handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use core_kernel::{TenantId, UnitOfWork, VoucherId};
use domain_ledger::{
    AccountActivity, AccountDirectory, JournalVoucher, LedgerStore, TrialBalance,
};
use domain_production::ProductionSession;

use crate::dto::ledger::*;
use crate::{error::ApiError, AppState};

/// Adds accounts to a tenant's chart
pub async fn register_accounts<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<RegisterAccountsRequest>,
) -> Result<(StatusCode, Json<RegisterAccountsResponse>), ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let (tenant_id, accounts) = request.into_accounts();

    let mut session = state.store.begin().await?;
    AccountDirectory::register(&mut session, tenant_id, &accounts).await?;
    session.commit().await?;

    let missing = AccountDirectory::missing_roles(&accounts);
    if !missing.is_empty() {
        info!(%tenant_id, ?missing, "Chart registered without some system roles");
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterAccountsResponse {
            registered: accounts.len(),
        }),
    ))
}

/// Posts a balanced journal entry
pub async fn post_journal_entry<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<PostJournalEntryRequest>,
) -> Result<(StatusCode, Json<PostJournalEntryResponse>), ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let posted = state.posting.post(request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(PostJournalEntryResponse {
            voucher_id: posted.voucher_id.value(),
            voucher_number: posted.voucher_number,
            total: posted.total,
        }),
    ))
}

/// Gets a voucher with its lines
pub async fn get_voucher<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<JournalVoucher>, ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let voucher = state
        .posting
        .get_voucher(TenantId::from_uuid(query.tenant_id), VoucherId::new(id))
        .await?;
    Ok(Json(voucher))
}

/// Running ledger of one account over a period
pub async fn account_activity<S>(
    State(state): State<AppState<S>>,
    Path(account_code): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<AccountActivity>, ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let activity = state
        .ledger
        .account_activity(
            TenantId::from_uuid(query.tenant_id),
            &account_code,
            query.from,
            query.to,
        )
        .await?;
    Ok(Json(activity))
}

/// Trial balance for a period
pub async fn trial_balance<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<TrialBalance>, ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let report = state
        .ledger
        .trial_balance(TenantId::from_uuid(query.tenant_id), query.from, query.to)
        .await?;
    Ok(Json(report))
}
