//! Production orders, planned cost snapshots and consumption records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{BomId, Currency, MaterialId, PlannedCostId, ProductionOrderId, TenantId, VoucherId};
use crate::costing::CostEstimate;
use crate::error::ProductionError;

/// Production order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductionOrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ProductionOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionOrderStatus::Pending => "Pending",
            ProductionOrderStatus::InProgress => "InProgress",
            ProductionOrderStatus::Completed => "Completed",
            ProductionOrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Completed and Cancelled accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProductionOrderStatus::Completed | ProductionOrderStatus::Cancelled)
    }

    /// Returns true if moving from this status to `target` is allowed
    pub fn can_transition_to(&self, target: ProductionOrderStatus) -> bool {
        use ProductionOrderStatus::*;
        matches!(
            (*self, target),
            (Pending, InProgress) |
            (InProgress, Completed) |
            (Pending, Cancelled) |
            (InProgress, Cancelled)
        )
    }
}

impl fmt::Display for ProductionOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductionOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ProductionOrderStatus::Pending),
            "InProgress" => Ok(ProductionOrderStatus::InProgress),
            "Completed" => Ok(ProductionOrderStatus::Completed),
            "Cancelled" => Ok(ProductionOrderStatus::Cancelled),
            other => Err(format!("unknown production order status: {}", other)),
        }
    }
}

/// Material, overhead, scrap and total figures for one order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub material: Decimal,
    pub overhead: Decimal,
    pub scrap: Decimal,
    pub total: Decimal,
}

impl CostBreakdown {
    /// Component-wise `self - other`
    pub fn minus(&self, other: &CostBreakdown) -> CostBreakdown {
        CostBreakdown {
            material: self.material - other.material,
            overhead: self.overhead - other.overhead,
            scrap: self.scrap - other.scrap,
            total: self.total - other.total,
        }
    }
}

/// An order to produce a quantity of a finished good from a BOM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub id: ProductionOrderId,
    pub tenant_id: TenantId,
    pub finished_good: MaterialId,
    pub bom_id: BomId,
    pub quantity: Decimal,
    pub status: ProductionOrderStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set only on transition to Completed
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    /// Actual costs recorded at completion
    pub actual_cost: Option<CostBreakdown>,
    /// Voucher capitalising the finished goods, if any was posted
    pub completion_voucher_id: Option<VoucherId>,
}

impl ProductionOrder {
    /// Creates a pending order
    pub fn new(
        tenant_id: TenantId,
        finished_good: MaterialId,
        bom_id: BomId,
        quantity: Decimal,
        created_by: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProductionOrderId::new_v7(),
            tenant_id,
            finished_good,
            bom_id,
            quantity,
            status: ProductionOrderStatus::Pending,
            notes,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            completed_by: None,
            actual_cost: None,
            completion_voucher_id: None,
        }
    }

    /// Moves the order to `target`
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the state machine does not allow the move
    pub fn transition(
        &mut self,
        target: ProductionOrderStatus,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ProductionError> {
        if !self.status.can_transition_to(target) {
            return Err(ProductionError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        self.status = target;
        self.updated_at = at;
        if target == ProductionOrderStatus::Completed {
            self.completed_at = Some(at);
            self.completed_by = Some(actor.to_string());
        }
        Ok(())
    }
}

/// Kind of planned cost row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedCostKind {
    /// One overhead item
    Overhead,
    /// Aggregate planned material cost
    Material,
    /// Aggregate planned scrap allowance
    Scrap,
    /// Aggregate planned total
    Total,
}

impl PlannedCostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlannedCostKind::Overhead => "overhead",
            PlannedCostKind::Material => "material",
            PlannedCostKind::Scrap => "scrap",
            PlannedCostKind::Total => "total",
        }
    }
}

impl FromStr for PlannedCostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overhead" => Ok(PlannedCostKind::Overhead),
            "material" => Ok(PlannedCostKind::Material),
            "scrap" => Ok(PlannedCostKind::Scrap),
            "total" => Ok(PlannedCostKind::Total),
            other => Err(format!("unknown planned cost kind: {}", other)),
        }
    }
}

/// A planned cost row snapshotted when the order is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedCost {
    pub id: PlannedCostId,
    pub order_id: ProductionOrderId,
    pub kind: PlannedCostKind,
    pub name: String,
    pub category: Option<String>,
    /// Account credited at completion (overhead rows only)
    pub gl_account: Option<String>,
    pub amount: Decimal,
}

impl PlannedCost {
    /// Builds the snapshot rows for an order: one per overhead item plus
    /// material, scrap and total aggregates, rounded to the currency
    pub fn snapshot(
        order_id: ProductionOrderId,
        estimate: &CostEstimate,
        currency: Currency,
    ) -> Vec<PlannedCost> {
        let mut rows: Vec<PlannedCost> = estimate
            .overheads
            .iter()
            .map(|overhead| PlannedCost {
                id: PlannedCostId::new_v7(),
                order_id,
                kind: PlannedCostKind::Overhead,
                name: overhead.name.clone(),
                category: Some(overhead.category.clone()),
                gl_account: Some(overhead.gl_account.clone()),
                amount: currency.round(overhead.batch_cost),
            })
            .collect();

        for (kind, name, amount) in [
            (PlannedCostKind::Material, "Planned material", estimate.material),
            (PlannedCostKind::Scrap, "Planned scrap allowance", estimate.scrap),
            (PlannedCostKind::Total, "Planned total", estimate.total),
        ] {
            rows.push(PlannedCost {
                id: PlannedCostId::new_v7(),
                order_id,
                kind,
                name: name.to_string(),
                category: None,
                gl_account: None,
                amount: currency.round(amount),
            });
        }

        rows
    }

    /// Folds snapshot rows back into a breakdown
    pub fn breakdown(rows: &[PlannedCost]) -> CostBreakdown {
        rows.iter().fold(CostBreakdown::default(), |mut acc, row| {
            match row.kind {
                PlannedCostKind::Overhead => acc.overhead += row.amount,
                PlannedCostKind::Material => acc.material += row.amount,
                PlannedCostKind::Scrap => acc.scrap += row.amount,
                PlannedCostKind::Total => acc.total += row.amount,
            }
            acc
        })
    }
}

/// Material consumed when an order completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumption {
    pub order_id: ProductionOrderId,
    pub material_id: MaterialId,
    pub quantity: Decimal,
    /// Average unit cost in effect at completion
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub consumed_at: DateTime<Utc>,
}

/// Planned against actual costs of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReconciliation {
    pub order_id: ProductionOrderId,
    pub status: ProductionOrderStatus,
    pub quantity: Decimal,
    pub planned: CostBreakdown,
    /// Present once the order is completed
    pub actual: Option<CostBreakdown>,
    /// `actual - planned`, present once the order is completed
    pub variance: Option<CostBreakdown>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use ProductionOrderStatus::*;

    fn order() -> ProductionOrder {
        ProductionOrder::new(TenantId::new(), MaterialId::new(), BomId::new(), dec!(10), "planner", None)
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!Pending.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Pending));
        for target in [Pending, InProgress, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(target));
            assert!(!Cancelled.can_transition_to(target));
        }
    }

    #[test]
    fn test_completion_stamps_order() {
        let mut order = order();
        let now = Utc::now();
        order.transition(InProgress, "operator", now).unwrap();
        assert!(order.completed_at.is_none());

        order.transition(Completed, "operator", now).unwrap();
        assert_eq!(order.completed_at, Some(now));
        assert_eq!(order.completed_by.as_deref(), Some("operator"));
    }

    #[test]
    fn test_invalid_transition_leaves_order_unchanged() {
        let mut order = order();
        let before = order.clone();

        let result = order.transition(Completed, "operator", Utc::now());

        assert!(matches!(
            result,
            Err(ProductionError::InvalidTransition { from: Pending, to: Completed })
        ));
        assert_eq!(order, before);
    }
}
