//! HTTP API Layer
//!
//! REST surface of the manufacturing accounting core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers for the ledger and production domains
//! - **Middleware**: request tracing and audit logging
//! - **DTOs**: request/response bodies
//! - **Error Handling**: domain errors mapped onto HTTP status codes
//!
//! The router is generic over the store, so the same routes run against
//! PostgreSQL in the server binary and against the in-memory store in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(PgStore::new(pool), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use core_kernel::HealthCheckable;
use domain_ledger::{JournalPostingService, LedgerQueryService, LedgerStore};
use domain_production::{BomCatalog, ProductionOrderService, ProductionSession};

use crate::config::ApiConfig;
use crate::middleware::audit_middleware;
use crate::handlers::{health, ledger, production};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub config: ApiConfig,
    pub posting: JournalPostingService<S>,
    pub ledger: LedgerQueryService<S>,
    pub catalog: BomCatalog<S>,
    pub orders: ProductionOrderService<S>,
}

impl<S> AppState<S>
where
    S: LedgerStore + Clone,
    S::Session: ProductionSession,
{
    pub fn new(store: S, config: ApiConfig) -> Self {
        let currency = config.base_currency;
        Self {
            posting: JournalPostingService::new(store.clone(), currency),
            ledger: LedgerQueryService::new(store.clone()),
            catalog: BomCatalog::new(store.clone()),
            orders: ProductionOrderService::new(store.clone(), currency),
            store,
            config,
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `store` - Store backing every service
/// * `config` - API configuration
pub fn create_router<S>(store: S, config: ApiConfig) -> Router
where
    S: LedgerStore + HealthCheckable + Clone,
    S::Session: ProductionSession,
{
    let state = AppState::new(store, config);

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check::<S>));

    let ledger_routes = Router::new()
        .route("/accounts", post(ledger::register_accounts::<S>))
        .route("/journal-entries", post(ledger::post_journal_entry::<S>))
        .route("/vouchers/:id", get(ledger::get_voucher::<S>))
        .route("/ledger/:account_code", get(ledger::account_activity::<S>))
        .route("/trial-balance", get(ledger::trial_balance::<S>));

    let production_routes = Router::new()
        .route("/materials", post(production::create_material::<S>))
        .route("/materials/:id/average-cost", put(production::update_average_cost::<S>))
        .route("/boms", post(production::create_bom::<S>))
        .route("/boms/:id", get(production::get_bom::<S>))
        .route("/boms/:id/cost-estimate", get(production::cost_estimate::<S>))
        .route("/production-orders", post(production::create_order::<S>))
        .route("/production-orders/:id", get(production::get_order::<S>))
        .route("/production-orders/:id/status", put(production::update_order_status::<S>))
        .route(
            "/production-orders/:id/reconciliation",
            get(production::reconciliation::<S>),
        );

    let api_routes = Router::new()
        .merge(ledger_routes)
        .merge(production_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
