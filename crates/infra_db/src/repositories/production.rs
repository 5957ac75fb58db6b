//! Production repository implementation
//!
//! Materials, bills of materials and production orders together with the
//! planned-cost snapshots and consumption rows recorded against orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use core_kernel::{BomId, MaterialId, PlannedCostId, ProductionOrderId, TenantId, VoucherId};
use domain_production::{
    AllocationMethod, BillOfMaterials, BomComponent, BomOperation, BomOverhead, BomStatus,
    Consumption, CostBreakdown, Material, PlannedCost, PlannedCostKind, ProductionOrder,
    ProductionOrderStatus,
};

use crate::error::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "bom_status", rename_all = "snake_case")]
pub enum DbBomStatus {
    Active,
    Inactive,
}

impl From<BomStatus> for DbBomStatus {
    fn from(status: BomStatus) -> Self {
        match status {
            BomStatus::Active => DbBomStatus::Active,
            BomStatus::Inactive => DbBomStatus::Inactive,
        }
    }
}

impl From<DbBomStatus> for BomStatus {
    fn from(status: DbBomStatus) -> Self {
        match status {
            DbBomStatus::Active => BomStatus::Active,
            DbBomStatus::Inactive => BomStatus::Inactive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "allocation_method", rename_all = "snake_case")]
pub enum DbAllocationMethod {
    PerUnit,
    PerBatch,
    PercentageOfMaterial,
}

impl From<AllocationMethod> for DbAllocationMethod {
    fn from(method: AllocationMethod) -> Self {
        match method {
            AllocationMethod::PerUnit => DbAllocationMethod::PerUnit,
            AllocationMethod::PerBatch => DbAllocationMethod::PerBatch,
            AllocationMethod::PercentageOfMaterial => DbAllocationMethod::PercentageOfMaterial,
        }
    }
}

impl From<DbAllocationMethod> for AllocationMethod {
    fn from(method: DbAllocationMethod) -> Self {
        match method {
            DbAllocationMethod::PerUnit => AllocationMethod::PerUnit,
            DbAllocationMethod::PerBatch => AllocationMethod::PerBatch,
            DbAllocationMethod::PercentageOfMaterial => AllocationMethod::PercentageOfMaterial,
        }
    }
}

/// Production order status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "production_order_status", rename_all = "snake_case")]
pub enum DbOrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl From<ProductionOrderStatus> for DbOrderStatus {
    fn from(status: ProductionOrderStatus) -> Self {
        match status {
            ProductionOrderStatus::Pending => DbOrderStatus::Pending,
            ProductionOrderStatus::InProgress => DbOrderStatus::InProgress,
            ProductionOrderStatus::Completed => DbOrderStatus::Completed,
            ProductionOrderStatus::Cancelled => DbOrderStatus::Cancelled,
        }
    }
}

impl From<DbOrderStatus> for ProductionOrderStatus {
    fn from(status: DbOrderStatus) -> Self {
        match status {
            DbOrderStatus::Pending => ProductionOrderStatus::Pending,
            DbOrderStatus::InProgress => ProductionOrderStatus::InProgress,
            DbOrderStatus::Completed => ProductionOrderStatus::Completed,
            DbOrderStatus::Cancelled => ProductionOrderStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "planned_cost_kind", rename_all = "snake_case")]
pub enum DbPlannedCostKind {
    Overhead,
    Material,
    Scrap,
    Total,
}

impl From<PlannedCostKind> for DbPlannedCostKind {
    fn from(kind: PlannedCostKind) -> Self {
        match kind {
            PlannedCostKind::Overhead => DbPlannedCostKind::Overhead,
            PlannedCostKind::Material => DbPlannedCostKind::Material,
            PlannedCostKind::Scrap => DbPlannedCostKind::Scrap,
            PlannedCostKind::Total => DbPlannedCostKind::Total,
        }
    }
}

impl From<DbPlannedCostKind> for PlannedCostKind {
    fn from(kind: DbPlannedCostKind) -> Self {
        match kind {
            DbPlannedCostKind::Overhead => PlannedCostKind::Overhead,
            DbPlannedCostKind::Material => PlannedCostKind::Material,
            DbPlannedCostKind::Scrap => PlannedCostKind::Scrap,
            DbPlannedCostKind::Total => PlannedCostKind::Total,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MaterialRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub sku: String,
    pub name: String,
    pub uom: String,
    pub average_unit_cost: Decimal,
}

impl From<MaterialRow> for Material {
    fn from(row: MaterialRow) -> Self {
        Material {
            id: MaterialId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            sku: row.sku,
            name: row.name,
            uom: row.uom,
            average_unit_cost: row.average_unit_cost,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BomRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub finished_good_id: Uuid,
    pub version: i32,
    pub status: DbBomStatus,
    pub batch_size: Decimal,
    pub scrap_percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BomComponentRow {
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub uom: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct BomOverheadRow {
    pub name: String,
    pub category: String,
    pub allocation: DbAllocationMethod,
    pub cost: Decimal,
    pub gl_account: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct BomOperationRow {
    pub sequence: i32,
    pub name: String,
    pub notes: Option<String>,
}

/// Production order row from the database
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub finished_good_id: Uuid,
    pub bom_id: Uuid,
    pub quantity: Decimal,
    pub status: DbOrderStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub actual_material_cost: Option<Decimal>,
    pub actual_overhead_cost: Option<Decimal>,
    pub actual_scrap_cost: Option<Decimal>,
    pub actual_total_cost: Option<Decimal>,
    pub completion_voucher_id: Option<i64>,
}

impl From<OrderRow> for ProductionOrder {
    fn from(row: OrderRow) -> Self {
        let actual_cost = match (
            row.actual_material_cost,
            row.actual_overhead_cost,
            row.actual_scrap_cost,
            row.actual_total_cost,
        ) {
            (Some(material), Some(overhead), Some(scrap), Some(total)) => Some(CostBreakdown {
                material,
                overhead,
                scrap,
                total,
            }),
            _ => None,
        };

        ProductionOrder {
            id: ProductionOrderId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            finished_good: MaterialId::from_uuid(row.finished_good_id),
            bom_id: BomId::from_uuid(row.bom_id),
            quantity: row.quantity,
            status: row.status.into(),
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
            completed_by: row.completed_by,
            actual_cost,
            completion_voucher_id: row.completion_voucher_id.map(VoucherId::new),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PlannedCostRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub kind: DbPlannedCostKind,
    pub name: String,
    pub category: Option<String>,
    pub gl_account: Option<String>,
    pub amount: Decimal,
}

impl From<PlannedCostRow> for PlannedCost {
    fn from(row: PlannedCostRow) -> Self {
        PlannedCost {
            id: PlannedCostId::from_uuid(row.id),
            order_id: ProductionOrderId::from_uuid(row.order_id),
            kind: row.kind.into(),
            name: row.name,
            category: row.category,
            gl_account: row.gl_account,
            amount: row.amount,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ConsumptionRow {
    pub order_id: Uuid,
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub consumed_at: DateTime<Utc>,
}

impl From<ConsumptionRow> for Consumption {
    fn from(row: ConsumptionRow) -> Self {
        Consumption {
            order_id: ProductionOrderId::from_uuid(row.order_id),
            material_id: MaterialId::from_uuid(row.material_id),
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            total_cost: row.total_cost,
            consumed_at: row.consumed_at,
        }
    }
}

const BOM_COLUMNS: &str =
    "id, tenant_id, finished_good_id, version, status, batch_size, scrap_percentage, created_at";

const ORDER_COLUMNS: &str = r#"
    id, tenant_id, finished_good_id, bom_id, quantity, status, notes,
    created_by, created_at, updated_at, completed_at, completed_by,
    actual_material_cost, actual_overhead_cost, actual_scrap_cost, actual_total_cost,
    completion_voucher_id
"#;

/// Repository for materials and bills of materials
#[derive(Debug, Clone, Copy, Default)]
pub struct BomRepository;

impl BomRepository {
    pub async fn insert_material(
        conn: &mut PgConnection,
        material: &Material,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO materials (id, tenant_id, sku, name, uom, average_unit_cost)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(material.id.as_uuid())
        .bind(material.tenant_id.as_uuid())
        .bind(&material.sku)
        .bind(&material.name)
        .bind(&material.uom)
        .bind(material.average_unit_cost)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find_material(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        material_id: MaterialId,
    ) -> Result<Option<Material>, DatabaseError> {
        let row = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT id, tenant_id, sku, name, uom, average_unit_cost
            FROM materials
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(material_id.as_uuid())
        .fetch_optional(conn)
        .await?;

        Ok(row.map(Material::from))
    }

    pub async fn update_material_cost(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        material_id: MaterialId,
        average_unit_cost: Decimal,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE materials SET average_unit_cost = $3 WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id.as_uuid())
        .bind(material_id.as_uuid())
        .bind(average_unit_cost)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Material", material_id));
        }
        Ok(())
    }

    /// Inserts a BOM header and all of its child rows
    pub async fn insert_bom(
        conn: &mut PgConnection,
        bom: &BillOfMaterials,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO boms (
                id, tenant_id, finished_good_id, version, status,
                batch_size, scrap_percentage, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(bom.id.as_uuid())
        .bind(bom.tenant_id.as_uuid())
        .bind(bom.finished_good.as_uuid())
        .bind(bom.version)
        .bind(DbBomStatus::from(bom.status))
        .bind(bom.batch_size)
        .bind(bom.scrap_percentage)
        .bind(bom.created_at)
        .execute(&mut *conn)
        .await?;

        for (position, component) in bom.components.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bom_components (bom_id, position, material_id, quantity, uom)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(bom.id.as_uuid())
            .bind(position as i32)
            .bind(component.material_id.as_uuid())
            .bind(component.quantity)
            .bind(&component.uom)
            .execute(&mut *conn)
            .await?;
        }

        for (position, overhead) in bom.overheads.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bom_overheads (bom_id, position, name, category, allocation, cost, gl_account)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(bom.id.as_uuid())
            .bind(position as i32)
            .bind(&overhead.name)
            .bind(&overhead.category)
            .bind(DbAllocationMethod::from(overhead.allocation))
            .bind(overhead.cost)
            .bind(&overhead.gl_account)
            .execute(&mut *conn)
            .await?;
        }

        for operation in &bom.operations {
            sqlx::query(
                "INSERT INTO bom_operations (bom_id, sequence, name, notes) VALUES ($1, $2, $3, $4)",
            )
            .bind(bom.id.as_uuid())
            .bind(operation.sequence)
            .bind(&operation.name)
            .bind(&operation.notes)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn find_bom(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        bom_id: BomId,
    ) -> Result<Option<BillOfMaterials>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM boms WHERE tenant_id = $1 AND id = $2",
            BOM_COLUMNS
        );
        let row = sqlx::query_as::<_, BomRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(bom_id.as_uuid())
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::load_children(conn, row).await?)),
            None => Ok(None),
        }
    }

    pub async fn latest_active_bom(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        finished_good: MaterialId,
    ) -> Result<Option<BillOfMaterials>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {} FROM boms
            WHERE tenant_id = $1 AND finished_good_id = $2 AND status = 'active'
            ORDER BY version DESC
            LIMIT 1
            "#,
            BOM_COLUMNS
        );
        let row = sqlx::query_as::<_, BomRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(finished_good.as_uuid())
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::load_children(conn, row).await?)),
            None => Ok(None),
        }
    }

    pub async fn latest_bom_version(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        finished_good: MaterialId,
    ) -> Result<Option<i32>, DatabaseError> {
        let version: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(version) FROM boms WHERE tenant_id = $1 AND finished_good_id = $2",
        )
        .bind(tenant_id.as_uuid())
        .bind(finished_good.as_uuid())
        .fetch_one(conn)
        .await?;

        Ok(version)
    }

    async fn load_children(
        conn: &mut PgConnection,
        row: BomRow,
    ) -> Result<BillOfMaterials, DatabaseError> {
        let components = sqlx::query_as::<_, BomComponentRow>(
            "SELECT material_id, quantity, uom FROM bom_components WHERE bom_id = $1 ORDER BY position",
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        let overheads = sqlx::query_as::<_, BomOverheadRow>(
            r#"
            SELECT name, category, allocation, cost, gl_account
            FROM bom_overheads
            WHERE bom_id = $1
            ORDER BY position
            "#,
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        let operations = sqlx::query_as::<_, BomOperationRow>(
            "SELECT sequence, name, notes FROM bom_operations WHERE bom_id = $1 ORDER BY sequence",
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(BillOfMaterials {
            id: BomId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            finished_good: MaterialId::from_uuid(row.finished_good_id),
            version: row.version,
            status: row.status.into(),
            batch_size: row.batch_size,
            scrap_percentage: row.scrap_percentage,
            components: components
                .into_iter()
                .map(|c| BomComponent {
                    material_id: MaterialId::from_uuid(c.material_id),
                    quantity: c.quantity,
                    uom: c.uom,
                })
                .collect(),
            overheads: overheads
                .into_iter()
                .map(|o| BomOverhead {
                    name: o.name,
                    category: o.category,
                    allocation: o.allocation.into(),
                    cost: o.cost,
                    gl_account: o.gl_account,
                })
                .collect(),
            operations: operations
                .into_iter()
                .map(|op| BomOperation {
                    sequence: op.sequence,
                    name: op.name,
                    notes: op.notes,
                })
                .collect(),
            created_at: row.created_at,
        })
    }
}

/// Repository for production orders and their cost records
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductionOrderRepository;

impl ProductionOrderRepository {
    pub async fn insert_order(
        conn: &mut PgConnection,
        order: &ProductionOrder,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO production_orders (
                id, tenant_id, finished_good_id, bom_id, quantity, status, notes,
                created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.tenant_id.as_uuid())
        .bind(order.finished_good.as_uuid())
        .bind(order.bom_id.as_uuid())
        .bind(order.quantity)
        .bind(DbOrderStatus::from(order.status))
        .bind(&order.notes)
        .bind(&order.created_by)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find_order(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<Option<ProductionOrder>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM production_orders WHERE tenant_id = $1 AND id = $2",
            ORDER_COLUMNS
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(order_id.as_uuid())
            .fetch_optional(conn)
            .await?;

        Ok(row.map(ProductionOrder::from))
    }

    /// Loads an order with a row lock held until the transaction ends
    pub async fn lock_order(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<Option<ProductionOrder>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM production_orders WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
            ORDER_COLUMNS
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(order_id.as_uuid())
            .fetch_optional(conn)
            .await?;

        Ok(row.map(ProductionOrder::from))
    }

    pub async fn update_order(
        conn: &mut PgConnection,
        order: &ProductionOrder,
    ) -> Result<(), DatabaseError> {
        let actual = order.actual_cost.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE production_orders SET
                status = $3,
                notes = $4,
                updated_at = $5,
                completed_at = $6,
                completed_by = $7,
                actual_material_cost = $8,
                actual_overhead_cost = $9,
                actual_scrap_cost = $10,
                actual_total_cost = $11,
                completion_voucher_id = $12
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(order.tenant_id.as_uuid())
        .bind(order.id.as_uuid())
        .bind(DbOrderStatus::from(order.status))
        .bind(&order.notes)
        .bind(order.updated_at)
        .bind(order.completed_at)
        .bind(&order.completed_by)
        .bind(actual.map(|c| c.material))
        .bind(actual.map(|c| c.overhead))
        .bind(actual.map(|c| c.scrap))
        .bind(actual.map(|c| c.total))
        .bind(order.completion_voucher_id.map(|id| id.value()))
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("ProductionOrder", order.id));
        }
        Ok(())
    }

    pub async fn insert_planned_costs(
        conn: &mut PgConnection,
        rows: &[PlannedCost],
    ) -> Result<(), DatabaseError> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO production_order_costs (id, order_id, kind, name, category, gl_account, amount)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(row.id.as_uuid())
            .bind(row.order_id.as_uuid())
            .bind(DbPlannedCostKind::from(row.kind))
            .bind(&row.name)
            .bind(&row.category)
            .bind(&row.gl_account)
            .bind(row.amount)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn planned_costs(
        conn: &mut PgConnection,
        order_id: ProductionOrderId,
    ) -> Result<Vec<PlannedCost>, DatabaseError> {
        let rows = sqlx::query_as::<_, PlannedCostRow>(
            r#"
            SELECT id, order_id, kind, name, category, gl_account, amount
            FROM production_order_costs
            WHERE order_id = $1
            ORDER BY kind, name
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(conn)
        .await?;

        Ok(rows.into_iter().map(PlannedCost::from).collect())
    }

    pub async fn insert_consumptions(
        conn: &mut PgConnection,
        rows: &[Consumption],
    ) -> Result<(), DatabaseError> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO production_order_consumptions (
                    order_id, material_id, quantity, unit_cost, total_cost, consumed_at
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(row.order_id.as_uuid())
            .bind(row.material_id.as_uuid())
            .bind(row.quantity)
            .bind(row.unit_cost)
            .bind(row.total_cost)
            .bind(row.consumed_at)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn consumptions(
        conn: &mut PgConnection,
        order_id: ProductionOrderId,
    ) -> Result<Vec<Consumption>, DatabaseError> {
        let rows = sqlx::query_as::<_, ConsumptionRow>(
            r#"
            SELECT order_id, material_id, quantity, unit_cost, total_cost, consumed_at
            FROM production_order_consumptions
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(conn)
        .await?;

        Ok(rows.into_iter().map(Consumption::from).collect())
    }
}
