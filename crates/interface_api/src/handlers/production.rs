//! Production handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::{BomId, MaterialId, ProductionOrderId, TenantId};
use domain_ledger::LedgerStore;
use domain_production::{
    BillOfMaterials, CostEstimate, CostReconciliation, Material, OrderDetails, ProductionSession,
};

use crate::dto::ledger::TenantQuery;
use crate::dto::production::*;
use crate::{error::ApiError, AppState};

/// Registers a material
pub async fn create_material<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreateMaterialRequest>,
) -> Result<(StatusCode, Json<Material>), ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let material = state.catalog.register_material(request.into()).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

/// Replaces a material's average unit cost
pub async fn update_average_cost<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAverageCostRequest>,
) -> Result<StatusCode, ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    state
        .catalog
        .update_average_cost(
            TenantId::from_uuid(request.tenant_id),
            MaterialId::from_uuid(id),
            request.average_unit_cost,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Registers a new BOM version
pub async fn create_bom<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreateBomRequest>,
) -> Result<(StatusCode, Json<BillOfMaterials>), ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let bom = state.catalog.register_bom(request.into()).await?;
    Ok((StatusCode::CREATED, Json(bom)))
}

pub async fn get_bom<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<BillOfMaterials>, ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let bom = state
        .catalog
        .get_bom(TenantId::from_uuid(query.tenant_id), BomId::from_uuid(id))
        .await?;
    Ok(Json(bom))
}

/// Batch cost estimate at current material costs
pub async fn cost_estimate<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Query(query): Query<EstimateQuery>,
) -> Result<Json<CostEstimate>, ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let estimate = state
        .catalog
        .estimate(
            TenantId::from_uuid(query.tenant_id),
            BomId::from_uuid(id),
            query.quantity,
        )
        .await?;
    Ok(Json(estimate))
}

/// Creates a production order and snapshots its planned costs
pub async fn create_order<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let order = state
        .orders
        .create(
            TenantId::from_uuid(request.tenant_id),
            &request.actor_id,
            BomId::from_uuid(request.bom_id),
            request.quantity,
            request.notes,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_id: *order.id.as_uuid(),
            status: order.status,
            created_at: order.created_at,
        }),
    ))
}

/// Moves an order through its lifecycle
pub async fn update_order_status<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderStatusResponse>, ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let order = state
        .orders
        .advance(
            TenantId::from_uuid(request.tenant_id),
            &request.actor_id,
            ProductionOrderId::from_uuid(id),
            request.status,
        )
        .await?;

    Ok(Json(OrderStatusResponse {
        order_id: id,
        status: order.status,
        message: format!("Production order moved to {}", order.status),
        completion_voucher_id: order.completion_voucher_id.map(|v| v.value()),
    }))
}

pub async fn get_order<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<OrderDetails>, ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let details = state
        .orders
        .get_order(TenantId::from_uuid(query.tenant_id), ProductionOrderId::from_uuid(id))
        .await?;
    Ok(Json(details))
}

/// Planned against actual cost of an order
pub async fn reconciliation<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<CostReconciliation>, ApiError>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    let reconciliation = state
        .orders
        .reconcile(TenantId::from_uuid(query.tenant_id), ProductionOrderId::from_uuid(id))
        .await?;
    Ok(Json(reconciliation))
}
