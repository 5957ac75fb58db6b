//! PostgreSQL store adapter
//!
//! `PgStore` hands out `PgSession`s, each wrapping one database transaction.
//! Dropping a session without committing rolls the transaction back.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, BomId, DateWindow, DomainPort, HealthCheckResult, HealthCheckable,
    MaterialId, Period, PortError, ProductionOrderId, TenantId, UnitOfWork, VoucherId,
};
use domain_ledger::{
    Account, AccountTotals, JournalVoucher, LedgerEntry, LedgerSession, LedgerStore, NewVoucher,
    NewVoucherLine, SystemRole,
};
use domain_production::{
    BillOfMaterials, Consumption, Material, PlannedCost, ProductionOrder, ProductionSession,
};

use crate::error::DatabaseError;
use crate::repositories::{BomRepository, LedgerRepository, ProductionOrderRepository};

const ADAPTER_ID: &str = "postgres-store";

/// PostgreSQL-backed store for the ledger and production domains
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PgStore {}

#[async_trait]
impl LedgerStore for PgStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<Self::Session, PortError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Ok(PgSession { tx })
    }
}

#[async_trait]
impl HealthCheckable for PgStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

/// One database transaction
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession").finish_non_exhaustive()
    }
}

#[async_trait]
impl UnitOfWork for PgSession {
    async fn commit(self) -> Result<(), PortError> {
        self.tx.commit().await.map_err(DatabaseError::from)?;
        debug!("transaction committed");
        Ok(())
    }
}

#[async_trait]
impl LedgerSession for PgSession {
    async fn find_account(
        &mut self,
        tenant_id: TenantId,
        code: &str,
    ) -> Result<Option<Account>, PortError> {
        Ok(LedgerRepository::find_account(&mut *self.tx, tenant_id, code).await?)
    }

    async fn find_account_by_role(
        &mut self,
        tenant_id: TenantId,
        role: SystemRole,
    ) -> Result<Option<Account>, PortError> {
        Ok(LedgerRepository::find_account_by_role(&mut *self.tx, tenant_id, role).await?)
    }

    async fn list_accounts(&mut self, tenant_id: TenantId) -> Result<Vec<Account>, PortError> {
        Ok(LedgerRepository::list_accounts(&mut *self.tx, tenant_id).await?)
    }

    #[instrument(skip(self, account), fields(code = %account.code))]
    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        Ok(LedgerRepository::insert_account(&mut *self.tx, account).await?)
    }

    async fn insert_voucher_header(&mut self, header: &NewVoucher) -> Result<VoucherId, PortError> {
        Ok(LedgerRepository::insert_voucher_header(&mut *self.tx, header).await?)
    }

    async fn insert_voucher_line(
        &mut self,
        voucher_id: VoucherId,
        line: &NewVoucherLine,
    ) -> Result<(), PortError> {
        Ok(LedgerRepository::insert_voucher_line(&mut *self.tx, voucher_id, line).await?)
    }

    async fn assign_voucher_number(
        &mut self,
        voucher_id: VoucherId,
        voucher_number: &str,
    ) -> Result<(), PortError> {
        Ok(LedgerRepository::assign_voucher_number(&mut *self.tx, voucher_id, voucher_number).await?)
    }

    async fn find_voucher(
        &mut self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
    ) -> Result<Option<JournalVoucher>, PortError> {
        Ok(LedgerRepository::find_voucher(&mut *self.tx, tenant_id, voucher_id).await?)
    }

    async fn posted_totals(
        &mut self,
        tenant_id: TenantId,
        account_code: &str,
        window: DateWindow,
    ) -> Result<AccountTotals, PortError> {
        Ok(LedgerRepository::posted_totals(&mut *self.tx, tenant_id, account_code, window).await?)
    }

    async fn posted_entries(
        &mut self,
        tenant_id: TenantId,
        account_code: &str,
        period: Period,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        Ok(LedgerRepository::posted_entries(&mut *self.tx, tenant_id, account_code, period).await?)
    }

    async fn posted_totals_by_account(
        &mut self,
        tenant_id: TenantId,
        window: DateWindow,
    ) -> Result<HashMap<String, AccountTotals>, PortError> {
        Ok(LedgerRepository::posted_totals_by_account(&mut *self.tx, tenant_id, window).await?)
    }
}

#[async_trait]
impl ProductionSession for PgSession {
    async fn insert_material(&mut self, material: &Material) -> Result<(), PortError> {
        Ok(BomRepository::insert_material(&mut *self.tx, material).await?)
    }

    async fn find_material(
        &mut self,
        tenant_id: TenantId,
        material_id: MaterialId,
    ) -> Result<Option<Material>, PortError> {
        Ok(BomRepository::find_material(&mut *self.tx, tenant_id, material_id).await?)
    }

    async fn update_material_cost(
        &mut self,
        tenant_id: TenantId,
        material_id: MaterialId,
        average_unit_cost: Decimal,
    ) -> Result<(), PortError> {
        Ok(BomRepository::update_material_cost(&mut *self.tx, tenant_id, material_id, average_unit_cost).await?)
    }

    #[instrument(skip(self, bom), fields(bom_id = %bom.id, version = bom.version))]
    async fn insert_bom(&mut self, bom: &BillOfMaterials) -> Result<(), PortError> {
        Ok(BomRepository::insert_bom(&mut *self.tx, bom).await?)
    }

    async fn find_bom(
        &mut self,
        tenant_id: TenantId,
        bom_id: BomId,
    ) -> Result<Option<BillOfMaterials>, PortError> {
        Ok(BomRepository::find_bom(&mut *self.tx, tenant_id, bom_id).await?)
    }

    async fn latest_active_bom(
        &mut self,
        tenant_id: TenantId,
        finished_good: MaterialId,
    ) -> Result<Option<BillOfMaterials>, PortError> {
        Ok(BomRepository::latest_active_bom(&mut *self.tx, tenant_id, finished_good).await?)
    }

    async fn latest_bom_version(
        &mut self,
        tenant_id: TenantId,
        finished_good: MaterialId,
    ) -> Result<Option<i32>, PortError> {
        Ok(BomRepository::latest_bom_version(&mut *self.tx, tenant_id, finished_good).await?)
    }

    async fn insert_order(&mut self, order: &ProductionOrder) -> Result<(), PortError> {
        Ok(ProductionOrderRepository::insert_order(&mut *self.tx, order).await?)
    }

    async fn find_order(
        &mut self,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<Option<ProductionOrder>, PortError> {
        Ok(ProductionOrderRepository::find_order(&mut *self.tx, tenant_id, order_id).await?)
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn lock_order(
        &mut self,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<Option<ProductionOrder>, PortError> {
        Ok(ProductionOrderRepository::lock_order(&mut *self.tx, tenant_id, order_id).await?)
    }

    async fn update_order(&mut self, order: &ProductionOrder) -> Result<(), PortError> {
        Ok(ProductionOrderRepository::update_order(&mut *self.tx, order).await?)
    }

    async fn insert_planned_costs(&mut self, rows: &[PlannedCost]) -> Result<(), PortError> {
        Ok(ProductionOrderRepository::insert_planned_costs(&mut *self.tx, rows).await?)
    }

    async fn planned_costs(
        &mut self,
        order_id: ProductionOrderId,
    ) -> Result<Vec<PlannedCost>, PortError> {
        Ok(ProductionOrderRepository::planned_costs(&mut *self.tx, order_id).await?)
    }

    async fn insert_consumptions(&mut self, rows: &[Consumption]) -> Result<(), PortError> {
        Ok(ProductionOrderRepository::insert_consumptions(&mut *self.tx, rows).await?)
    }

    async fn consumptions(
        &mut self,
        order_id: ProductionOrderId,
    ) -> Result<Vec<Consumption>, PortError> {
        Ok(ProductionOrderRepository::consumptions(&mut *self.tx, order_id).await?)
    }
}
