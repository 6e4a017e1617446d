//! Hotel booking core: room availability, pricing with promotions, and the
//! booking lifecycle with hotel capacity bookkeeping, served over axum.

pub mod admin;
pub mod auth;
pub mod availability;
pub mod booking;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pricing;
pub mod routes;

use std::sync::Arc;

use cache::AppCache;
use db::InventoryStore;
use pricing::PricingPolicy;

pub use routes::router;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
    pub cache: AppCache,
    pub pricing: Arc<PricingPolicy>,
}

impl AppState {
    pub fn new(store: Arc<dyn InventoryStore>, pricing: PricingPolicy) -> Self {
        Self {
            store,
            cache: AppCache::new(),
            pricing: Arc::new(pricing),
        }
    }
}
