//! Production DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{MaterialId, TenantId};
use domain_production::{
    BillOfMaterials, BomComponent, BomOperation, BomOverhead, Material,
    ProductionOrderStatus,
};

#[derive(Debug, Deserialize)]
pub struct CreateMaterialRequest {
    pub tenant_id: Uuid,
    pub sku: String,
    pub name: String,
    pub uom: String,
    #[serde(default)]
    pub average_unit_cost: Decimal,
}

impl From<CreateMaterialRequest> for Material {
    fn from(body: CreateMaterialRequest) -> Self {
        Material::new(
            TenantId::from_uuid(body.tenant_id),
            body.sku,
            body.name,
            body.uom,
            body.average_unit_cost,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAverageCostRequest {
    pub tenant_id: Uuid,
    pub average_unit_cost: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateBomRequest {
    pub tenant_id: Uuid,
    pub finished_good: Uuid,
    pub version: i32,
    pub batch_size: Decimal,
    #[serde(default)]
    pub scrap_percentage: Decimal,
    pub components: Vec<BomComponent>,
    #[serde(default)]
    pub overheads: Vec<BomOverhead>,
    #[serde(default)]
    pub operations: Vec<BomOperation>,
    #[serde(default)]
    pub inactive: bool,
}

impl From<CreateBomRequest> for BillOfMaterials {
    fn from(body: CreateBomRequest) -> Self {
        let mut bom = BillOfMaterials::new(
            TenantId::from_uuid(body.tenant_id),
            MaterialId::from_uuid(body.finished_good),
            body.version,
        )
        .with_batch_size(body.batch_size)
        .with_scrap(body.scrap_percentage);

        bom.components = body.components;
        bom.overheads = body.overheads;
        bom.operations = body.operations;
        if body.inactive {
            bom = bom.deactivated();
        }
        bom
    }
}

/// Query for a batch cost estimate
#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    pub tenant_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub tenant_id: Uuid,
    pub actor_id: String,
    pub bom_id: Uuid,
    pub quantity: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
    pub status: ProductionOrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub tenant_id: Uuid,
    pub actor_id: String,
    pub status: ProductionOrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub order_id: Uuid,
    pub status: ProductionOrderStatus,
    pub message: String,
    pub completion_voucher_id: Option<i64>,
}
