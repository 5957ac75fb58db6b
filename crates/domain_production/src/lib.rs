//! Production Domain - Bills of Materials, Costing and Production Orders
//!
//! This crate covers the manufacturing side of the accounting core:
//!
//! - [`BillOfMaterials`]: versioned recipes with components, overheads,
//!   scrap allowance and routing operations
//! - [`estimate_batch_cost`]: pure batch cost rollup
//! - [`BomCatalog`]: materials, BOM versions and cost estimates
//! - [`ProductionOrderService`]: order creation, status transitions and
//!   completion, which capitalises finished goods through the ledger
//!
//! Completion runs in a single [`ProductionSession`], which is also a
//! ledger session, so consumption rows, the status change and the journal
//! voucher commit or roll back together.

pub mod bom;
pub mod costing;
pub mod catalog;
pub mod order;
pub mod lifecycle;
pub mod ports;
pub mod error;

pub use bom::{AllocationMethod, BillOfMaterials, BomComponent, BomOperation, BomOverhead, BomStatus, Material};
pub use costing::{
    allocate_overhead, estimate_batch_cost, CostEstimate, CostedBom, CostedComponent, OverheadAllocation,
};
pub use catalog::BomCatalog;
pub use order::{
    Consumption, CostBreakdown, CostReconciliation, PlannedCost, PlannedCostKind, ProductionOrder,
    ProductionOrderStatus,
};
pub use lifecycle::{OrderDetails, ProductionOrderService};
pub use ports::ProductionSession;
pub use error::ProductionError;
