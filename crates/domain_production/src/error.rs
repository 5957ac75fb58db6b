//! Production domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{BomId, MaterialId, PortError, ProductionOrderId};
use domain_ledger::LedgerError;
use crate::order::ProductionOrderStatus;

/// Errors that can occur in the production domain
#[derive(Debug, Error)]
pub enum ProductionError {
    #[error("Invalid batch size: {0} (must be greater than zero)")]
    InvalidBatchSize(Decimal),

    #[error("Invalid order quantity: {0} (must be greater than zero)")]
    InvalidQuantity(Decimal),

    #[error("Invalid scrap percentage: {0} (must be between 0 and 100)")]
    InvalidScrapPercentage(Decimal),

    #[error("Invalid unit cost: {0} (must not be negative)")]
    InvalidCost(Decimal),

    #[error("Cost calculation exceeds the supported decimal range")]
    CostOverflow,

    #[error("Invalid bill of materials: {0}")]
    InvalidBom(String),

    #[error("Bill of materials not found: {0}")]
    BomNotFound(BomId),

    #[error("Bill of materials is inactive: {0}")]
    BomInactive(BomId),

    #[error("Bill of materials {bom_id} is superseded by {latest}")]
    BomSuperseded { bom_id: BomId, latest: BomId },

    #[error("No active bill of materials for finished good {0}")]
    NoActiveBom(MaterialId),

    #[error("Material not found: {0}")]
    MaterialNotFound(MaterialId),

    #[error("Production order not found: {0}")]
    OrderNotFound(ProductionOrderId),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ProductionOrderStatus,
        to: ProductionOrderStatus,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

impl ProductionError {
    /// Returns true for errors caused by the caller's input
    pub fn is_validation(&self) -> bool {
        match self {
            ProductionError::InvalidBatchSize(_)
            | ProductionError::InvalidQuantity(_)
            | ProductionError::InvalidScrapPercentage(_)
            | ProductionError::InvalidCost(_)
            | ProductionError::CostOverflow
            | ProductionError::InvalidBom(_)
            | ProductionError::BomInactive(_)
            | ProductionError::BomSuperseded { .. } => true,
            ProductionError::Ledger(err) => err.is_validation(),
            _ => false,
        }
    }

    /// Returns true for unknown references and incomplete tenant setup
    pub fn is_not_found(&self) -> bool {
        match self {
            ProductionError::BomNotFound(_)
            | ProductionError::NoActiveBom(_)
            | ProductionError::MaterialNotFound(_)
            | ProductionError::OrderNotFound(_) => true,
            ProductionError::Ledger(err) => err.is_not_found(),
            _ => false,
        }
    }
}
