//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! manufacturing accounting test suite.
//!
//! # Modules
//!
//! - `memory`: In-memory store implementing the ledger and production ports
//! - `fixtures`: Seeded stores and production setups
//! - `database`: PostgreSQL test container management
//! - `assertions`: Assertion helpers for ledger invariants
//! - `generators`: Property-based test data generators

pub mod memory;
pub mod fixtures;
pub mod database;
pub mod assertions;
pub mod generators;

pub use memory::{FailPoint, InMemorySession, InMemoryStore};
pub use fixtures::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
