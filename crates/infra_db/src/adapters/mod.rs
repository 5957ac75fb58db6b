//! Store adapters
//!
//! Implements the ledger and production storage ports on PostgreSQL by
//! delegating to the repository layer inside one transaction per session.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PgStore;
//! use domain_ledger::JournalPostingService;
//!
//! let store = PgStore::new(pool);
//! let posting = JournalPostingService::new(store.clone(), Currency::USD);
//! ```

pub mod store;

pub use store::{PgSession, PgStore};
