//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  /health                      (open)                                    │
//! │  /api ── require_bearer ──┬── /discounts            GET POST DELETE     │
//! │                           ├── /discounts/products   GET ?sku=A&sku=B    │
//! │                           ├── /discounts/product    GET                 │
//! │                           ├── /discounts/amount     GET                 │
//! │                           ├── /discounts/import     POST                │
//! │                           └── /checkout/resolve     POST                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod checkout;
pub mod discounts;
pub mod health;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::require_bearer;
use crate::AppState;

/// Builds the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/discounts",
            get(discounts::list_all)
                .post(discounts::create)
                .delete(discounts::delete_many),
        )
        .route("/discounts/products", get(discounts::list_products_for_skus))
        .route("/discounts/product", get(discounts::list_products))
        .route("/discounts/amount", get(discounts::list_amounts))
        .route("/discounts/import", post(discounts::import))
        .route("/checkout/resolve", post(checkout::resolve))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .with_state(state)
}
