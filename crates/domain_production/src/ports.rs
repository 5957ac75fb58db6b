//! Storage port for the production domain
//!
//! Production sessions extend ledger sessions so that completing an order
//! and posting its journal voucher share one unit of work.

use async_trait::async_trait;
use rust_decimal::Decimal;

use core_kernel::{BomId, MaterialId, PortError, ProductionOrderId, TenantId};
use domain_ledger::LedgerSession;
use crate::bom::{BillOfMaterials, Material};
use crate::order::{Consumption, PlannedCost, ProductionOrder};

/// Operations available inside one production unit of work
#[async_trait]
pub trait ProductionSession: LedgerSession {
    async fn insert_material(&mut self, material: &Material) -> Result<(), PortError>;

    async fn find_material(
        &mut self,
        tenant_id: TenantId,
        material_id: MaterialId,
    ) -> Result<Option<Material>, PortError>;

    /// Replaces a material's average unit cost
    async fn update_material_cost(
        &mut self,
        tenant_id: TenantId,
        material_id: MaterialId,
        average_unit_cost: Decimal,
    ) -> Result<(), PortError>;

    /// Persists a BOM with its components, overheads and operations
    async fn insert_bom(&mut self, bom: &BillOfMaterials) -> Result<(), PortError>;

    async fn find_bom(
        &mut self,
        tenant_id: TenantId,
        bom_id: BomId,
    ) -> Result<Option<BillOfMaterials>, PortError>;

    /// Highest version of an active BOM for a finished good
    async fn latest_active_bom(
        &mut self,
        tenant_id: TenantId,
        finished_good: MaterialId,
    ) -> Result<Option<BillOfMaterials>, PortError>;

    /// Highest version of any BOM for a finished good
    async fn latest_bom_version(
        &mut self,
        tenant_id: TenantId,
        finished_good: MaterialId,
    ) -> Result<Option<i32>, PortError>;

    async fn insert_order(&mut self, order: &ProductionOrder) -> Result<(), PortError>;

    async fn find_order(
        &mut self,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<Option<ProductionOrder>, PortError>;

    /// Loads an order and holds it against concurrent changes until the
    /// session ends
    async fn lock_order(
        &mut self,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<Option<ProductionOrder>, PortError>;

    /// Writes status, timestamps, actual costs and completion voucher
    async fn update_order(&mut self, order: &ProductionOrder) -> Result<(), PortError>;

    async fn insert_planned_costs(&mut self, rows: &[PlannedCost]) -> Result<(), PortError>;

    async fn planned_costs(
        &mut self,
        order_id: ProductionOrderId,
    ) -> Result<Vec<PlannedCost>, PortError>;

    async fn insert_consumptions(&mut self, rows: &[Consumption]) -> Result<(), PortError>;

    async fn consumptions(
        &mut self,
        order_id: ProductionOrderId,
    ) -> Result<Vec<Consumption>, PortError>;
}
