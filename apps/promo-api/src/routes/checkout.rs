//! Server-side checkout resolution.
//!
//! `POST /api/checkout/resolve` takes the checkout function's input,
//! loads the rules relevant to the cart, runs the resolver and answers with
//! the function output plus an explanation of the decision.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use promo_core::checkout::{CheckoutInput, FunctionOutput};
use promo_core::summary::DiscountPreview;
use promo_core::{resolve_with_audit, Resolution, DEFAULT_PREVIEW_DECIMAL_PLACES};

use crate::error::ApiError;
use crate::AppState;

/// `{"discounts": [...], "resolution": {...}, "preview": {...}}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    #[serde(flatten)]
    pub output: FunctionOutput,
    pub resolution: Resolution,
    pub preview: DiscountPreview,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CheckoutInput>, JsonRejection>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let Json(input) = payload?;
    let cart = input.to_cart();

    let rules = state
        .db
        .discounts()
        .load_rules_for_skus(&cart.skus())
        .await?;

    let resolution = resolve_with_audit(&cart, &rules)?;
    let output = FunctionOutput::from_directives(&resolution.directives, state.config.order_targeting);
    let preview = DiscountPreview::compute(
        &cart,
        &resolution.directives,
        DEFAULT_PREVIEW_DECIMAL_PLACES,
    )?;

    debug!(
        lines = cart.lines.len(),
        rules = rules.len(),
        discounts = output.discounts.len(),
        total_discount = %preview.total_discount,
        "Checkout resolved"
    );

    Ok(Json(ResolveResponse {
        output,
        resolution,
        preview,
    }))
}
