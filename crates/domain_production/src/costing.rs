//! Batch cost rollup
//!
//! Pure functions that turn a BOM priced at current material costs into a
//! batch cost estimate. Used for pre-order estimates, for the planned-cost
//! snapshot taken when an order is created, and for reconciliation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{MaterialId, Rate};
use crate::bom::{AllocationMethod, BillOfMaterials, BomOverhead, Material};
use crate::error::ProductionError;

/// A component priced at a material's unit cost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostedComponent {
    pub material_id: MaterialId,
    pub name: String,
    /// Quantity per unit of finished good
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

impl CostedComponent {
    /// Cost of this component in one unit of finished good
    pub fn unit_contribution(&self) -> Result<Decimal, ProductionError> {
        mul(self.quantity, self.unit_cost)
    }
}

/// A BOM with every component priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostedBom {
    pub scrap_percentage: Decimal,
    pub components: Vec<CostedComponent>,
    pub overheads: Vec<BomOverhead>,
}

impl CostedBom {
    /// Prices a BOM using each material's current average unit cost
    ///
    /// # Errors
    ///
    /// `MaterialNotFound` if a component's material is missing from `materials`
    pub fn price(
        bom: &BillOfMaterials,
        materials: &HashMap<MaterialId, Material>,
    ) -> Result<Self, ProductionError> {
        let components = bom
            .components
            .iter()
            .map(|component| {
                let material = materials
                    .get(&component.material_id)
                    .ok_or(ProductionError::MaterialNotFound(component.material_id))?;
                Ok(CostedComponent {
                    material_id: component.material_id,
                    name: material.name.clone(),
                    quantity: component.quantity,
                    unit_cost: material.average_unit_cost,
                })
            })
            .collect::<Result<Vec<_>, ProductionError>>()?;

        Ok(Self {
            scrap_percentage: bom.scrap_percentage,
            components,
            overheads: bom.overheads.clone(),
        })
    }

    /// Material cost of one unit of finished good, before scrap and overhead
    pub fn material_unit_cost(&self) -> Result<Decimal, ProductionError> {
        self.components
            .iter()
            .try_fold(Decimal::ZERO, |acc, c| add(acc, c.unit_contribution()?))
    }
}

/// One overhead item's share of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverheadAllocation {
    pub name: String,
    pub category: String,
    pub allocation: AllocationMethod,
    pub gl_account: String,
    /// Contribution to one unit of finished good
    pub unit_cost: Decimal,
    /// Contribution to the whole batch
    pub batch_cost: Decimal,
}

/// Cost estimate for a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub batch_quantity: Decimal,
    pub material_unit_cost: Decimal,
    pub overhead_unit_cost: Decimal,
    pub pre_scrap_unit_cost: Decimal,
    pub scrap_unit_cost: Decimal,
    pub final_unit_cost: Decimal,
    /// Batch material cost
    pub material: Decimal,
    /// Batch overhead cost
    pub overhead: Decimal,
    /// Batch scrap allowance
    pub scrap: Decimal,
    /// Batch total
    pub total: Decimal,
    /// Total divided by batch quantity
    pub per_unit: Decimal,
    pub overheads: Vec<OverheadAllocation>,
}

/// Allocates one overhead item to a batch
///
/// Returns `(unit, batch)` contributions. A per-batch item always
/// contributes exactly its cost to the batch, however thin it is spread.
///
/// # Errors
///
/// `CostOverflow` if a contribution leaves the decimal range
pub fn allocate_overhead(
    overhead: &BomOverhead,
    material_unit_cost: Decimal,
    batch_quantity: Decimal,
) -> Result<(Decimal, Decimal), ProductionError> {
    match overhead.allocation {
        AllocationMethod::PerUnit => Ok((overhead.cost, mul(overhead.cost, batch_quantity)?)),
        AllocationMethod::PerBatch => {
            let unit = overhead
                .cost
                .checked_div(batch_quantity)
                .ok_or(ProductionError::CostOverflow)?;
            Ok((unit, overhead.cost))
        }
        AllocationMethod::PercentageOfMaterial => {
            let unit = Rate::from_percentage(overhead.cost)
                .checked_apply(material_unit_cost)
                .ok_or(ProductionError::CostOverflow)?;
            Ok((unit, mul(unit, batch_quantity)?))
        }
    }
}

fn mul(a: Decimal, b: Decimal) -> Result<Decimal, ProductionError> {
    a.checked_mul(b).ok_or(ProductionError::CostOverflow)
}

fn add(a: Decimal, b: Decimal) -> Result<Decimal, ProductionError> {
    a.checked_add(b).ok_or(ProductionError::CostOverflow)
}

fn sum(values: impl IntoIterator<Item = Decimal>) -> Result<Decimal, ProductionError> {
    values.into_iter().try_fold(Decimal::ZERO, add)
}

/// Estimates the cost of producing `batch_quantity` units
///
/// # Errors
///
/// - `InvalidBatchSize` if the quantity is zero or negative
/// - `CostOverflow` if any figure leaves the decimal range
///
/// # Example
///
/// ```rust,ignore
/// // one component: 2 x 5.00, 10% of material overhead, 5% scrap
/// let estimate = estimate_batch_cost(&costed, dec!(10))?;
/// assert_eq!(estimate.final_unit_cost, dec!(11.55));
/// assert_eq!(estimate.total, dec!(115.50));
/// ```
pub fn estimate_batch_cost(
    bom: &CostedBom,
    batch_quantity: Decimal,
) -> Result<CostEstimate, ProductionError> {
    if batch_quantity <= Decimal::ZERO {
        return Err(ProductionError::InvalidBatchSize(batch_quantity));
    }

    let material_unit_cost = bom.material_unit_cost()?;

    let overheads = bom
        .overheads
        .iter()
        .map(|overhead| {
            let (unit_cost, batch_cost) =
                allocate_overhead(overhead, material_unit_cost, batch_quantity)?;
            Ok(OverheadAllocation {
                name: overhead.name.clone(),
                category: overhead.category.clone(),
                allocation: overhead.allocation,
                gl_account: overhead.gl_account.clone(),
                unit_cost,
                batch_cost,
            })
        })
        .collect::<Result<Vec<_>, ProductionError>>()?;

    let overhead_unit_cost = sum(overheads.iter().map(|o| o.unit_cost))?;
    let scrap_rate = Rate::from_percentage(bom.scrap_percentage);
    let apply_scrap = |amount: Decimal| {
        scrap_rate
            .checked_apply(amount)
            .ok_or(ProductionError::CostOverflow)
    };
    let pre_scrap_unit_cost = add(material_unit_cost, overhead_unit_cost)?;
    let scrap_unit_cost = apply_scrap(pre_scrap_unit_cost)?;
    let final_unit_cost = add(pre_scrap_unit_cost, scrap_unit_cost)?;

    // Batch figures come from batch contributions so that per-batch items
    // total exactly their cost
    let material = mul(material_unit_cost, batch_quantity)?;
    let overhead = sum(overheads.iter().map(|o| o.batch_cost))?;
    let scrap = apply_scrap(add(material, overhead)?)?;
    let total = sum([material, overhead, scrap])?;
    let per_unit = total
        .checked_div(batch_quantity)
        .ok_or(ProductionError::CostOverflow)?;

    Ok(CostEstimate {
        batch_quantity,
        material_unit_cost,
        overhead_unit_cost,
        pre_scrap_unit_cost,
        scrap_unit_cost,
        final_unit_cost,
        material,
        overhead,
        scrap,
        total,
        per_unit,
        overheads,
    })
}
