//! In-memory store
//!
//! Implements the ledger and production session ports with the same
//! transactional behaviour as the PostgreSQL adapter: a session works on a
//! private copy of the state and publishes it only on commit. Sessions are
//! serialised by an owned async mutex, which also gives `lock_order` its
//! row-lock semantics.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::{
    AdapterHealth, BomId, DateWindow, DomainPort, HealthCheckResult, HealthCheckable,
    MaterialId, Period, PortError, ProductionOrderId, TenantId, UnitOfWork, VoucherId,
};
use domain_ledger::{
    Account, AccountTotals, JournalVoucher, JournalVoucherLine, LedgerEntry, LedgerSession,
    LedgerStore, NewVoucher, NewVoucherLine, SystemRole, VoucherStatus,
};
use domain_production::{
    BillOfMaterials, Consumption, Material, PlannedCost, ProductionOrder, ProductionSession,
};

/// Write operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    VoucherHeader,
    VoucherLine,
    VoucherNumber,
    Consumptions,
    OrderUpdate,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    accounts: Vec<Account>,
    vouchers: BTreeMap<VoucherId, JournalVoucher>,
    materials: HashMap<MaterialId, Material>,
    boms: HashMap<BomId, BillOfMaterials>,
    orders: HashMap<ProductionOrderId, ProductionOrder>,
    planned_costs: Vec<PlannedCost>,
    consumptions: Vec<Consumption>,
    fail_point: Option<FailPoint>,
}

impl StoreState {
    fn check(&self, point: FailPoint) -> Result<(), PortError> {
        if self.fail_point == Some(point) {
            return Err(PortError::internal(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }

    fn posted_lines(
        &self,
        tenant_id: TenantId,
    ) -> impl Iterator<Item = (&JournalVoucher, &JournalVoucherLine)> {
        self.vouchers
            .values()
            .filter(move |v| v.tenant_id == tenant_id && v.status == VoucherStatus::Posted)
            .flat_map(|v| v.lines.iter().map(move |line| (v, line)))
    }
}

/// Shared in-memory store; clones share state
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    // Outside the session state so ids are never reused, like a sequence
    next_voucher_id: Arc<AtomicI64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with accounts
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        let state = StoreState {
            accounts,
            ..StoreState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            next_voucher_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Makes the given write fail in every later session
    pub async fn set_fail_point(&self, point: FailPoint) {
        self.state.lock().await.fail_point = Some(point);
    }

    pub async fn clear_fail_point(&self) {
        self.state.lock().await.fail_point = None;
    }

    /// Number of committed vouchers for a tenant
    pub async fn voucher_count(&self, tenant_id: TenantId) -> usize {
        self.state
            .lock()
            .await
            .vouchers
            .values()
            .filter(|v| v.tenant_id == tenant_id)
            .count()
    }

    /// Committed vouchers for a tenant, in id order
    pub async fn vouchers(&self, tenant_id: TenantId) -> Vec<JournalVoucher> {
        self.state
            .lock()
            .await
            .vouchers
            .values()
            .filter(|v| v.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    /// Committed consumption rows of an order
    pub async fn consumption_count(&self, order_id: ProductionOrderId) -> usize {
        self.state
            .lock()
            .await
            .consumptions
            .iter()
            .filter(|c| c.order_id == order_id)
            .count()
    }
}

impl DomainPort for InMemoryStore {}

#[async_trait]
impl HealthCheckable for InMemoryStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    type Session = InMemorySession;

    async fn begin(&self) -> Result<Self::Session, PortError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemorySession {
            guard,
            working,
            next_voucher_id: self.next_voucher_id.clone(),
        })
    }
}

/// A unit of work over the in-memory store
///
/// Dropping the session discards its working copy.
pub struct InMemorySession {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
    next_voucher_id: Arc<AtomicI64>,
}

#[async_trait]
impl UnitOfWork for InMemorySession {
    async fn commit(self) -> Result<(), PortError> {
        let mut guard = self.guard;
        *guard = self.working;
        Ok(())
    }
}

#[async_trait]
impl LedgerSession for InMemorySession {
    async fn find_account(
        &mut self,
        tenant_id: TenantId,
        code: &str,
    ) -> Result<Option<Account>, PortError> {
        Ok(self
            .working
            .accounts
            .iter()
            .find(|a| a.tenant_id == tenant_id && a.code == code)
            .cloned())
    }

    async fn find_account_by_role(
        &mut self,
        tenant_id: TenantId,
        role: SystemRole,
    ) -> Result<Option<Account>, PortError> {
        Ok(self
            .working
            .accounts
            .iter()
            .find(|a| a.tenant_id == tenant_id && a.is_active && a.system_role == Some(role))
            .cloned())
    }

    async fn list_accounts(&mut self, tenant_id: TenantId) -> Result<Vec<Account>, PortError> {
        let mut accounts: Vec<Account> = self
            .working
            .accounts
            .iter()
            .filter(|a| a.tenant_id == tenant_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        let exists = self
            .working
            .accounts
            .iter()
            .any(|a| a.tenant_id == account.tenant_id && a.code == account.code);
        if exists {
            return Err(PortError::conflict(format!("account {} already exists", account.code)));
        }
        self.working.accounts.push(account.clone());
        Ok(())
    }

    async fn insert_voucher_header(&mut self, header: &NewVoucher) -> Result<VoucherId, PortError> {
        self.working.check(FailPoint::VoucherHeader)?;

        let id = VoucherId::new(self.next_voucher_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.working.vouchers.insert(
            id,
            JournalVoucher {
                id,
                tenant_id: header.tenant_id,
                voucher_number: header.voucher_number.clone(),
                source: header.source,
                reference_id: header.reference_id.clone(),
                narration: header.narration.clone(),
                entry_date: header.entry_date,
                status: header.status,
                total_debit: header.total_debit,
                total_credit: header.total_credit,
                created_by: header.created_by.clone(),
                created_at: Utc::now(),
                lines: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn insert_voucher_line(
        &mut self,
        voucher_id: VoucherId,
        line: &NewVoucherLine,
    ) -> Result<(), PortError> {
        self.working.check(FailPoint::VoucherLine)?;

        if line.debit.is_zero() == line.credit.is_zero() {
            return Err(PortError::validation("exactly one of debit and credit must be nonzero"));
        }
        let voucher = self
            .working
            .vouchers
            .get_mut(&voucher_id)
            .ok_or_else(|| PortError::not_found("JournalVoucher", voucher_id))?;
        voucher.lines.push(JournalVoucherLine {
            line_no: line.line_no,
            account_code: line.account_code.clone(),
            debit: line.debit,
            credit: line.credit,
            description: line.description.clone(),
            payee_ref: line.payee_ref.clone(),
        });
        Ok(())
    }

    async fn assign_voucher_number(
        &mut self,
        voucher_id: VoucherId,
        voucher_number: &str,
    ) -> Result<(), PortError> {
        self.working.check(FailPoint::VoucherNumber)?;

        let voucher = self
            .working
            .vouchers
            .get(&voucher_id)
            .ok_or_else(|| PortError::not_found("JournalVoucher", voucher_id))?;
        let tenant_id = voucher.tenant_id;
        let taken = self
            .working
            .vouchers
            .values()
            .any(|v| v.tenant_id == tenant_id && v.id != voucher_id && v.voucher_number == voucher_number);
        if taken {
            return Err(PortError::conflict(format!("voucher number {} already used", voucher_number)));
        }

        if let Some(voucher) = self.working.vouchers.get_mut(&voucher_id) {
            voucher.voucher_number = voucher_number.to_string();
        }
        Ok(())
    }

    async fn find_voucher(
        &mut self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
    ) -> Result<Option<JournalVoucher>, PortError> {
        Ok(self
            .working
            .vouchers
            .get(&voucher_id)
            .filter(|v| v.tenant_id == tenant_id)
            .cloned()
            .map(|mut v| {
                v.lines.sort_by_key(|l| l.line_no);
                v
            }))
    }

    async fn posted_totals(
        &mut self,
        tenant_id: TenantId,
        account_code: &str,
        window: DateWindow,
    ) -> Result<AccountTotals, PortError> {
        let mut totals = AccountTotals::default();
        for (voucher, line) in self.working.posted_lines(tenant_id) {
            if line.account_code == account_code && window.contains(voucher.entry_date) {
                totals.add(line.debit, line.credit);
            }
        }
        Ok(totals)
    }

    async fn posted_entries(
        &mut self,
        tenant_id: TenantId,
        account_code: &str,
        period: Period,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        let mut entries: Vec<LedgerEntry> = self
            .working
            .posted_lines(tenant_id)
            .filter(|(voucher, line)| {
                line.account_code == account_code && period.contains(voucher.entry_date)
            })
            .map(|(voucher, line)| LedgerEntry {
                voucher_id: voucher.id,
                voucher_number: voucher.voucher_number.clone(),
                line_no: line.line_no,
                entry_date: voucher.entry_date,
                reference_id: voucher.reference_id.clone(),
                description: line.description.clone().or_else(|| Some(voucher.narration.clone())),
                debit: line.debit,
                credit: line.credit,
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.entry_date, a.voucher_id, a.line_no).cmp(&(b.entry_date, b.voucher_id, b.line_no))
        });
        Ok(entries)
    }

    async fn posted_totals_by_account(
        &mut self,
        tenant_id: TenantId,
        window: DateWindow,
    ) -> Result<HashMap<String, AccountTotals>, PortError> {
        let mut totals: HashMap<String, AccountTotals> = HashMap::new();
        for (voucher, line) in self.working.posted_lines(tenant_id) {
            if window.contains(voucher.entry_date) {
                totals
                    .entry(line.account_code.clone())
                    .or_default()
                    .add(line.debit, line.credit);
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl ProductionSession for InMemorySession {
    async fn insert_material(&mut self, material: &Material) -> Result<(), PortError> {
        let duplicate_sku = self
            .working
            .materials
            .values()
            .any(|m| m.tenant_id == material.tenant_id && m.sku == material.sku);
        if duplicate_sku {
            return Err(PortError::conflict(format!("material {} already exists", material.sku)));
        }
        self.working.materials.insert(material.id, material.clone());
        Ok(())
    }

    async fn find_material(
        &mut self,
        tenant_id: TenantId,
        material_id: MaterialId,
    ) -> Result<Option<Material>, PortError> {
        Ok(self
            .working
            .materials
            .get(&material_id)
            .filter(|m| m.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_material_cost(
        &mut self,
        tenant_id: TenantId,
        material_id: MaterialId,
        average_unit_cost: Decimal,
    ) -> Result<(), PortError> {
        let material = self
            .working
            .materials
            .get_mut(&material_id)
            .filter(|m| m.tenant_id == tenant_id)
            .ok_or_else(|| PortError::not_found("Material", material_id))?;
        material.average_unit_cost = average_unit_cost;
        Ok(())
    }

    async fn insert_bom(&mut self, bom: &BillOfMaterials) -> Result<(), PortError> {
        let duplicate_version = self.working.boms.values().any(|b| {
            b.tenant_id == bom.tenant_id
                && b.finished_good == bom.finished_good
                && b.version == bom.version
        });
        if duplicate_version {
            return Err(PortError::conflict(format!("BOM version {} already exists", bom.version)));
        }
        self.working.boms.insert(bom.id, bom.clone());
        Ok(())
    }

    async fn find_bom(
        &mut self,
        tenant_id: TenantId,
        bom_id: BomId,
    ) -> Result<Option<BillOfMaterials>, PortError> {
        Ok(self
            .working
            .boms
            .get(&bom_id)
            .filter(|b| b.tenant_id == tenant_id)
            .cloned())
    }

    async fn latest_active_bom(
        &mut self,
        tenant_id: TenantId,
        finished_good: MaterialId,
    ) -> Result<Option<BillOfMaterials>, PortError> {
        Ok(self
            .working
            .boms
            .values()
            .filter(|b| b.tenant_id == tenant_id && b.finished_good == finished_good && b.is_active())
            .max_by_key(|b| b.version)
            .cloned())
    }

    async fn latest_bom_version(
        &mut self,
        tenant_id: TenantId,
        finished_good: MaterialId,
    ) -> Result<Option<i32>, PortError> {
        Ok(self
            .working
            .boms
            .values()
            .filter(|b| b.tenant_id == tenant_id && b.finished_good == finished_good)
            .map(|b| b.version)
            .max())
    }

    async fn insert_order(&mut self, order: &ProductionOrder) -> Result<(), PortError> {
        self.working.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_order(
        &mut self,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<Option<ProductionOrder>, PortError> {
        Ok(self
            .working
            .orders
            .get(&order_id)
            .filter(|o| o.tenant_id == tenant_id)
            .cloned())
    }

    async fn lock_order(
        &mut self,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<Option<ProductionOrder>, PortError> {
        // The session already holds the store lock
        self.find_order(tenant_id, order_id).await
    }

    async fn update_order(&mut self, order: &ProductionOrder) -> Result<(), PortError> {
        self.working.check(FailPoint::OrderUpdate)?;

        let stored = self
            .working
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| PortError::not_found("ProductionOrder", order.id))?;
        *stored = order.clone();
        Ok(())
    }

    async fn insert_planned_costs(&mut self, rows: &[PlannedCost]) -> Result<(), PortError> {
        self.working.planned_costs.extend_from_slice(rows);
        Ok(())
    }

    async fn planned_costs(
        &mut self,
        order_id: ProductionOrderId,
    ) -> Result<Vec<PlannedCost>, PortError> {
        Ok(self
            .working
            .planned_costs
            .iter()
            .filter(|row| row.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn insert_consumptions(&mut self, rows: &[Consumption]) -> Result<(), PortError> {
        self.working.check(FailPoint::Consumptions)?;
        self.working.consumptions.extend_from_slice(rows);
        Ok(())
    }

    async fn consumptions(
        &mut self,
        order_id: ProductionOrderId,
    ) -> Result<Vec<Consumption>, PortError> {
        Ok(self
            .working
            .consumptions
            .iter()
            .filter(|row| row.order_id == order_id)
            .cloned()
            .collect())
    }
}
