//! Material and BOM catalog

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{info, instrument};

use core_kernel::{BomId, MaterialId, TenantId, UnitOfWork};
use domain_ledger::LedgerStore;
use crate::bom::{BillOfMaterials, Material};
use crate::costing::{estimate_batch_cost, CostEstimate, CostedBom};
use crate::error::ProductionError;
use crate::ports::ProductionSession;

/// Maintains materials and BOM versions and answers cost estimates
#[derive(Debug, Clone)]
pub struct BomCatalog<S> {
    store: S,
}

impl<S> BomCatalog<S>
where
    S: LedgerStore,
    S::Session: ProductionSession,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a material to the tenant's catalog
    #[instrument(skip(self, material), fields(tenant_id = %material.tenant_id, sku = %material.sku))]
    pub async fn register_material(&self, material: Material) -> Result<Material, ProductionError> {
        if material.average_unit_cost < Decimal::ZERO {
            return Err(ProductionError::InvalidCost(material.average_unit_cost));
        }

        let mut session = self.store.begin().await?;
        session.insert_material(&material).await?;
        session.commit().await?;

        Ok(material)
    }

    /// Replaces a material's current average unit cost
    pub async fn update_average_cost(
        &self,
        tenant_id: TenantId,
        material_id: MaterialId,
        average_unit_cost: Decimal,
    ) -> Result<(), ProductionError> {
        if average_unit_cost < Decimal::ZERO {
            return Err(ProductionError::InvalidCost(average_unit_cost));
        }

        let mut session = self.store.begin().await?;
        if session.find_material(tenant_id, material_id).await?.is_none() {
            return Err(ProductionError::MaterialNotFound(material_id));
        }
        session
            .update_material_cost(tenant_id, material_id, average_unit_cost)
            .await?;
        session.commit().await?;
        Ok(())
    }

    /// Adds a new BOM version
    ///
    /// The version must be higher than every existing version for the
    /// finished good, and every referenced material must exist.
    #[instrument(skip(self, bom), fields(tenant_id = %bom.tenant_id, bom_id = %bom.id, version = bom.version))]
    pub async fn register_bom(&self, bom: BillOfMaterials) -> Result<BillOfMaterials, ProductionError> {
        bom.validate()?;

        let mut session = self.store.begin().await?;

        if session.find_material(bom.tenant_id, bom.finished_good).await?.is_none() {
            return Err(ProductionError::MaterialNotFound(bom.finished_good));
        }
        for component in &bom.components {
            if session.find_material(bom.tenant_id, component.material_id).await?.is_none() {
                return Err(ProductionError::MaterialNotFound(component.material_id));
            }
        }

        if let Some(latest) = session.latest_bom_version(bom.tenant_id, bom.finished_good).await? {
            if bom.version <= latest {
                return Err(ProductionError::InvalidBom(format!(
                    "version {} must be higher than existing version {}",
                    bom.version, latest
                )));
            }
        }

        session.insert_bom(&bom).await?;
        session.commit().await?;

        info!("Registered bill of materials");
        Ok(bom)
    }

    pub async fn get_bom(
        &self,
        tenant_id: TenantId,
        bom_id: BomId,
    ) -> Result<BillOfMaterials, ProductionError> {
        let mut session = self.store.begin().await?;
        session
            .find_bom(tenant_id, bom_id)
            .await?
            .ok_or(ProductionError::BomNotFound(bom_id))
    }

    /// Highest active BOM version for a finished good
    pub async fn latest_active(
        &self,
        tenant_id: TenantId,
        finished_good: MaterialId,
    ) -> Result<BillOfMaterials, ProductionError> {
        let mut session = self.store.begin().await?;
        session
            .latest_active_bom(tenant_id, finished_good)
            .await?
            .ok_or(ProductionError::NoActiveBom(finished_good))
    }

    /// Batch cost estimate at current material costs
    pub async fn estimate(
        &self,
        tenant_id: TenantId,
        bom_id: BomId,
        quantity: Decimal,
    ) -> Result<CostEstimate, ProductionError> {
        if quantity <= Decimal::ZERO {
            return Err(ProductionError::InvalidBatchSize(quantity));
        }

        let mut session = self.store.begin().await?;
        let bom = session
            .find_bom(tenant_id, bom_id)
            .await?
            .ok_or(ProductionError::BomNotFound(bom_id))?;
        let costed = price_bom(&mut session, &bom).await?;
        estimate_batch_cost(&costed, quantity)
    }
}

/// Prices a BOM with the materials visible to the session
pub(crate) async fn price_bom<S>(
    session: &mut S,
    bom: &BillOfMaterials,
) -> Result<CostedBom, ProductionError>
where
    S: ProductionSession + ?Sized,
{
    let materials = load_materials(session, bom).await?;
    CostedBom::price(bom, &materials)
}

/// Loads every component material of a BOM
pub(crate) async fn load_materials<S>(
    session: &mut S,
    bom: &BillOfMaterials,
) -> Result<HashMap<MaterialId, Material>, ProductionError>
where
    S: ProductionSession + ?Sized,
{
    let mut materials = HashMap::with_capacity(bom.components.len());
    for component in &bom.components {
        if materials.contains_key(&component.material_id) {
            continue;
        }
        let material = session
            .find_material(bom.tenant_id, component.material_id)
            .await?
            .ok_or(ProductionError::MaterialNotFound(component.material_id))?;
        materials.insert(component.material_id, material);
    }
    Ok(materials)
}
