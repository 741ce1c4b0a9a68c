//! # ERP Discount Import
//!
//! Replaces the whole rule store with the discounts published by the ERP.
//!
//! ## Import Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET ERP_FEED_URL                                                       │
//! │       │   [{cantDesde, cantHasta, descuento, tipoDescuento,             │
//! │       │     codProductoErp}, ...]                                       │
//! │       ▼                                                                 │
//! │  map every record ──► NewDiscount        any failure: abort, store     │
//! │       │                                  untouched                      │
//! │       ▼                                                                 │
//! │  DiscountRepository::replace_all (one transaction, feed order kept)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Feed order becomes id order, which is the order the resolver uses to
//! pick the first matching rule.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use promo_core::validation::validate_new_discount;
use promo_core::{Money, NewDiscount, Percentage, RuleKind, ValidationError};
use promo_db::{DbError, DiscountRepository};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("ERP feed URL is not configured")]
    NotConfigured,

    #[error("Invalid ERP feed URL: {0}")]
    InvalidUrl(String),

    #[error("ERP feed request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("ERP feed answered with status {0}")]
    Status(u16),

    #[error("ERP record {index} is invalid: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Store(#[from] DbError),
}

// =============================================================================
// Feed Record
// =============================================================================

/// One discount as published by the ERP.
///
/// Numbers may arrive as JSON numbers or strings. PRODUCT records often
/// carry zero bounds; they are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErpDiscount {
    #[serde(default)]
    pub cant_desde: Option<Money>,
    #[serde(default)]
    pub cant_hasta: Option<Money>,
    pub descuento: Percentage,
    pub tipo_descuento: String,
    #[serde(default)]
    pub cod_producto_erp: Option<String>,
}

impl ErpDiscount {
    /// Maps the record and validates the result.
    pub fn to_new_discount(&self) -> Result<NewDiscount, ValidationError> {
        let kind: RuleKind = self.tipo_descuento.parse()?;
        let sku = self
            .cod_producto_erp
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);

        let discount = match kind {
            RuleKind::Product => NewDiscount {
                kind,
                sku,
                amount_from: None,
                amount_to: None,
                percentage: self.descuento,
            },
            RuleKind::Amount => NewDiscount {
                kind,
                sku: None,
                amount_from: self.cant_desde,
                amount_to: self.cant_hasta,
                percentage: self.descuento,
            },
        };

        validate_new_discount(&discount)?;
        Ok(discount)
    }
}

/// Maps a whole feed. The first bad record aborts the mapping.
pub fn map_feed(records: &[ErpDiscount]) -> Result<Vec<NewDiscount>, ImportError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .to_new_discount()
                .map_err(|source| ImportError::InvalidRecord { index, source })
        })
        .collect()
}

// =============================================================================
// Feed Client
// =============================================================================

/// HTTP access to the ERP discount feed.
#[derive(Debug, Clone)]
pub struct ErpFeed {
    http: reqwest::Client,
    url: Url,
}

impl ErpFeed {
    pub fn new(http: reqwest::Client, url: &str) -> Result<Self, ImportError> {
        let url = Url::parse(url).map_err(|e| ImportError::InvalidUrl(e.to_string()))?;
        Ok(ErpFeed { http, url })
    }

    /// Fetches the raw feed records.
    pub async fn fetch(&self) -> Result<Vec<ErpDiscount>, ImportError> {
        // The feed URL carries its access token; only the host is logged.
        debug!(host = self.url.host_str().unwrap_or(""), "Fetching ERP discount feed");

        let response = self.http.get(self.url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(ImportError::Status(response.status().as_u16()));
        }

        let records: Vec<ErpDiscount> = response.json().await?;
        debug!(count = records.len(), "ERP feed fetched");
        Ok(records)
    }
}

/// Outcome of a completed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub products: usize,
    pub amounts: usize,
}

/// Fetches the feed, maps it, and replaces the stored rule set.
pub async fn import_from_feed(
    feed: &ErpFeed,
    repo: &DiscountRepository,
) -> Result<ImportSummary, ImportError> {
    let records = feed.fetch().await?;
    let discounts = map_feed(&records)?;

    let imported = repo.replace_all(&discounts).await?;
    let products = discounts
        .iter()
        .filter(|d| d.kind == RuleKind::Product)
        .count();

    let summary = ImportSummary {
        imported,
        products,
        amounts: imported - products,
    };

    info!(
        imported = summary.imported,
        products = summary.products,
        amounts = summary.amounts,
        "ERP discounts imported"
    );
    Ok(summary)
}
