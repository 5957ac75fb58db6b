//! Ledger DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::TenantId;
use domain_ledger::{Account, AccountClass, EntryLine, JournalEntryRequest, SystemRole, VoucherSource};

#[derive(Debug, Deserialize)]
pub struct TenantQuery {
    pub tenant_id: Uuid,
}

/// Tenant plus an inclusive date range
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub tenant_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AccountInput {
    pub code: String,
    pub name: String,
    pub class: AccountClass,
    pub system_role: Option<SystemRole>,
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RegisterAccountsRequest {
    pub tenant_id: Uuid,
    pub accounts: Vec<AccountInput>,
}

impl RegisterAccountsRequest {
    pub fn into_accounts(self) -> (TenantId, Vec<Account>) {
        let tenant_id = TenantId::from_uuid(self.tenant_id);
        let accounts = self
            .accounts
            .into_iter()
            .map(|input| Account {
                tenant_id,
                code: input.code,
                name: input.name,
                class: input.class,
                system_role: input.system_role,
                description: input.description,
                is_active: input.is_active,
            })
            .collect();
        (tenant_id, accounts)
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterAccountsResponse {
    pub registered: usize,
}

/// Journal entry as submitted over HTTP
#[derive(Debug, Deserialize)]
pub struct PostJournalEntryRequest {
    pub tenant_id: Uuid,
    pub actor_id: String,
    pub source: VoucherSource,
    pub narration: String,
    pub reference_id: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub lines: Vec<EntryLine>,
}

impl From<PostJournalEntryRequest> for JournalEntryRequest {
    fn from(body: PostJournalEntryRequest) -> Self {
        JournalEntryRequest {
            tenant_id: TenantId::from_uuid(body.tenant_id),
            created_by: body.actor_id,
            source: body.source,
            narration: body.narration,
            reference_id: body.reference_id,
            entry_date: body.entry_date,
            lines: body.lines,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostJournalEntryResponse {
    pub voucher_id: i64,
    pub voucher_number: String,
    pub total: Decimal,
}
