//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the manufacturing accounting core using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories are plain
//! functions over a borrowed connection; the [`PgStore`] adapter opens one
//! transaction per session and implements the ledger and production
//! storage ports on top of them.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgStore};
//!
//! let pool = create_pool(DatabaseConfig::default()).await?;
//! run_migrations(&pool).await?;
//! let store = PgStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PgSession, PgStore};
