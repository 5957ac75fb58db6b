//! Repository implementations
//!
//! Each repository is a set of associated functions over a borrowed
//! `PgConnection`, so callers decide the transaction boundary.

mod ledger;
mod production;

pub use ledger::{DbAccountClass, DbVoucherStatus, LedgerRepository};
pub use production::{
    BomRepository, DbAllocationMethod, DbBomStatus, DbOrderStatus, DbPlannedCostKind,
    ProductionOrderRepository,
};
