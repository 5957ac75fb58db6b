//! Core Kernel - Foundational types shared by the ledger and production domains
//!
//! This crate provides the building blocks used across all domain modules:
//! - Strongly-typed identifiers for tenants, BOMs, materials, orders and vouchers
//! - Currency minor-unit precision and percentage rates
//! - Accounting periods and date windows for ledger queries
//! - Port infrastructure shared by every storage adapter

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Currency, Rate, MoneyError};
pub use temporal::{Period, DateWindow, TemporalError};
pub use identifiers::{
    TenantId, BomId, MaterialId, ProductionOrderId, PlannedCostId, VoucherId,
};
pub use ports::{
    PortError, DomainPort, UnitOfWork, HealthCheckable, HealthCheckResult, AdapterHealth,
};
