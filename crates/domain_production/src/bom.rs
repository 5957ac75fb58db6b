//! Bills of materials and materials
//!
//! A BOM describes how one unit of a finished good is built: the
//! components consumed per unit, the overheads applied, the scrap
//! allowance and the routing operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use core_kernel::{BomId, MaterialId, TenantId};
use crate::error::ProductionError;

/// A stocked material (raw material or finished good)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub tenant_id: TenantId,
    pub sku: String,
    pub name: String,
    /// Unit of measure
    pub uom: String,
    /// Current moving average cost per unit
    pub average_unit_cost: Decimal,
}

impl Material {
    pub fn new(
        tenant_id: TenantId,
        sku: impl Into<String>,
        name: impl Into<String>,
        uom: impl Into<String>,
        average_unit_cost: Decimal,
    ) -> Self {
        Self {
            id: MaterialId::new_v7(),
            tenant_id,
            sku: sku.into(),
            name: name.into(),
            uom: uom.into(),
            average_unit_cost,
        }
    }
}

/// BOM status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BomStatus {
    Active,
    Inactive,
}

impl BomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BomStatus::Active => "active",
            BomStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for BomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BomStatus::Active),
            "inactive" => Ok(BomStatus::Inactive),
            other => Err(format!("unknown BOM status: {}", other)),
        }
    }
}

/// How an overhead item is allocated to production
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    /// `cost` is a per-unit amount
    PerUnit,
    /// `cost` is a fixed amount per batch, spread over the batch quantity
    PerBatch,
    /// `cost` is a percentage of the material unit cost
    PercentageOfMaterial,
}

impl AllocationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMethod::PerUnit => "per_unit",
            AllocationMethod::PerBatch => "per_batch",
            AllocationMethod::PercentageOfMaterial => "percentage_of_material",
        }
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_unit" => Ok(AllocationMethod::PerUnit),
            "per_batch" => Ok(AllocationMethod::PerBatch),
            "percentage_of_material" => Ok(AllocationMethod::PercentageOfMaterial),
            other => Err(format!("unknown allocation method: {}", other)),
        }
    }
}

/// A component consumed per unit of finished good
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomComponent {
    pub material_id: MaterialId,
    pub quantity: Decimal,
    pub uom: String,
}

/// An overhead applied to production
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomOverhead {
    pub name: String,
    /// Cost category (e.g. "labor", "utilities")
    pub category: String,
    pub allocation: AllocationMethod,
    /// Amount or percentage depending on `allocation`
    pub cost: Decimal,
    /// Account credited when the overhead is applied
    pub gl_account: String,
}

/// A routing step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomOperation {
    pub sequence: i32,
    pub name: String,
    pub notes: Option<String>,
}

/// A versioned bill of materials for one finished good
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillOfMaterials {
    pub id: BomId,
    pub tenant_id: TenantId,
    pub finished_good: MaterialId,
    pub version: i32,
    pub status: BomStatus,
    /// Standard batch size
    pub batch_size: Decimal,
    /// Scrap allowance, 0 to 100
    pub scrap_percentage: Decimal,
    pub components: Vec<BomComponent>,
    pub overheads: Vec<BomOverhead>,
    pub operations: Vec<BomOperation>,
    pub created_at: DateTime<Utc>,
}

impl BillOfMaterials {
    /// Creates an empty active BOM with a batch size of one
    pub fn new(tenant_id: TenantId, finished_good: MaterialId, version: i32) -> Self {
        Self {
            id: BomId::new_v7(),
            tenant_id,
            finished_good,
            version,
            status: BomStatus::Active,
            batch_size: Decimal::ONE,
            scrap_percentage: Decimal::ZERO,
            components: Vec::new(),
            overheads: Vec::new(),
            operations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: Decimal) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_scrap(mut self, percentage: Decimal) -> Self {
        self.scrap_percentage = percentage;
        self
    }

    pub fn component(mut self, material_id: MaterialId, quantity: Decimal, uom: impl Into<String>) -> Self {
        self.components.push(BomComponent {
            material_id,
            quantity,
            uom: uom.into(),
        });
        self
    }

    pub fn overhead(
        mut self,
        name: impl Into<String>,
        category: impl Into<String>,
        allocation: AllocationMethod,
        cost: Decimal,
        gl_account: impl Into<String>,
    ) -> Self {
        self.overheads.push(BomOverhead {
            name: name.into(),
            category: category.into(),
            allocation,
            cost,
            gl_account: gl_account.into(),
        });
        self
    }

    pub fn operation(mut self, sequence: i32, name: impl Into<String>, notes: Option<String>) -> Self {
        self.operations.push(BomOperation {
            sequence,
            name: name.into(),
            notes,
        });
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.status = BomStatus::Inactive;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == BomStatus::Active
    }

    /// Checks structural invariants
    ///
    /// # Errors
    ///
    /// - `InvalidBatchSize` if the standard batch size is not positive
    /// - `InvalidScrapPercentage` if scrap is outside 0..=100
    /// - `InvalidBom` for non-positive component quantities, negative
    ///   overhead costs, a component that is the finished good itself, or
    ///   duplicate operation sequences
    pub fn validate(&self) -> Result<(), ProductionError> {
        if self.batch_size <= Decimal::ZERO {
            return Err(ProductionError::InvalidBatchSize(self.batch_size));
        }
        if self.scrap_percentage < Decimal::ZERO || self.scrap_percentage > Decimal::ONE_HUNDRED {
            return Err(ProductionError::InvalidScrapPercentage(self.scrap_percentage));
        }
        if self.version < 1 {
            return Err(ProductionError::InvalidBom(format!(
                "version must be at least 1, got {}",
                self.version
            )));
        }

        for component in &self.components {
            if component.quantity <= Decimal::ZERO {
                return Err(ProductionError::InvalidBom(format!(
                    "component {} has non-positive quantity {}",
                    component.material_id, component.quantity
                )));
            }
            if component.material_id == self.finished_good {
                return Err(ProductionError::InvalidBom(
                    "a BOM cannot consume its own finished good".to_string(),
                ));
            }
        }

        for overhead in &self.overheads {
            if overhead.cost < Decimal::ZERO {
                return Err(ProductionError::InvalidBom(format!(
                    "overhead '{}' has negative cost {}",
                    overhead.name, overhead.cost
                )));
            }
            if overhead.gl_account.trim().is_empty() {
                return Err(ProductionError::InvalidBom(format!(
                    "overhead '{}' has no GL account",
                    overhead.name
                )));
            }
        }

        let mut sequences = HashSet::new();
        for operation in &self.operations {
            if !sequences.insert(operation.sequence) {
                return Err(ProductionError::InvalidBom(format!(
                    "duplicate operation sequence {}",
                    operation.sequence
                )));
            }
        }

        Ok(())
    }
}
