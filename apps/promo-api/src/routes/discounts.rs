//! Rule read endpoints and admin operations.
//!
//! | Method & path | Handler |
//! |---|---|
//! | `GET /api/discounts` | [`list_all`] |
//! | `GET /api/discounts/products?sku=A&sku=B` | [`list_products_for_skus`] |
//! | `GET /api/discounts/product` | [`list_products`] |
//! | `GET /api/discounts/amount` | [`list_amounts`] |
//! | `POST /api/discounts` | [`create`] |
//! | `DELETE /api/discounts` | [`delete_many`] |
//! | `POST /api/discounts/import` | [`import`] |

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use promo_core::{DiscountRecord, NewDiscount, RuleKind};

use crate::erp::{self, ErpFeed, ImportError, ImportSummary};
use crate::error::ApiError;
use crate::AppState;

/// SKUs requested from the products endpoint, first occurrence order.
///
/// - `sku=<value>` (repeatable): one exact SKU, commas included
/// - `skus=A,B`: comma-separated shorthand, entries trimmed
///
/// Blank values and other keys are ignored.
pub fn requested_skus(pairs: &[(String, String)]) -> Vec<String> {
    let mut skus: Vec<String> = Vec::new();
    let mut push = |sku: &str| {
        if !sku.trim().is_empty() && !skus.iter().any(|s| s == sku) {
            skus.push(sku.to_string());
        }
    };

    for (key, value) in pairs {
        match key.as_str() {
            "sku" => push(value.as_str()),
            "skus" => value.split(',').map(str::trim).for_each(&mut push),
            _ => {}
        }
    }
    skus
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

pub async fn list_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DiscountRecord>>, ApiError> {
    Ok(Json(state.db.discounts().list_all().await?))
}

pub async fn list_products_for_skus(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<DiscountRecord>>, ApiError> {
    let skus = requested_skus(&pairs);
    Ok(Json(
        state.db.discounts().list_products_for_skus(&skus).await?,
    ))
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DiscountRecord>>, ApiError> {
    Ok(Json(
        state.db.discounts().list_by_kind(RuleKind::Product).await?,
    ))
}

pub async fn list_amounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DiscountRecord>>, ApiError> {
    Ok(Json(
        state.db.discounts().list_by_kind(RuleKind::Amount).await?,
    ))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewDiscount>, JsonRejection>,
) -> Result<(StatusCode, Json<DiscountRecord>), ApiError> {
    let Json(discount) = payload?;
    let record = state.db.discounts().create(&discount).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_many(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Json(request) = payload?;
    let deleted = state.db.discounts().delete_many(&request.ids).await?;
    Ok(Json(DeleteResponse { deleted }))
}

pub async fn import(State(state): State<Arc<AppState>>) -> Result<Json<ImportSummary>, ApiError> {
    let url = state
        .config
        .erp_feed_url
        .as_deref()
        .ok_or(ImportError::NotConfigured)?;

    info!("ERP import requested");
    let feed = ErpFeed::new(state.http.clone(), url)?;
    let summary = erp::import_from_feed(&feed, &state.db.discounts()).await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_comma_list_is_split_and_trimmed() {
        assert_eq!(
            requested_skus(&pairs(&[("skus", " A, ,B,,C ")])),
            vec!["A", "B", "C"]
        );
        assert!(requested_skus(&pairs(&[("skus", "")])).is_empty());
        assert!(requested_skus(&[]).is_empty());
    }

    #[test]
    fn test_repeated_sku_is_taken_verbatim() {
        assert_eq!(
            requested_skus(&pairs(&[("sku", "X,Y"), ("sku", " A "), ("sku", "X,Y"), ("other", "Z")])),
            vec!["X,Y", " A "]
        );
    }

    #[test]
    fn test_both_forms_combine_in_order() {
        assert_eq!(
            requested_skus(&pairs(&[("skus", "A,B"), ("sku", "C"), ("sku", "  ")])),
            vec!["A", "B", "C"]
        );
    }
}
