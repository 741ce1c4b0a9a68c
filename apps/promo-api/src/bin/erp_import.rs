//! Imports the ERP discount feed into the rule store.
//!
//! ## Usage
//! ```bash
//! ERP_FEED_URL=https://erp.example/descuentos?token=... cargo run --bin erp-import
//!
//! # Fetch and validate only, store untouched:
//! cargo run --bin erp-import -- --dry-run
//! ```

use anyhow::Context;
use tracing::info;

use promo_api::erp::{self, ErpFeed};
use promo_api::{init_tracing, ImportConfig};
use promo_core::RuleKind;
use promo_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let dry_run = std::env::args().skip(1).any(|arg| arg == "--dry-run");
    let config = ImportConfig::load().context("loading configuration")?;

    let http = reqwest::Client::builder()
        .timeout(config.erp_timeout)
        .build()?;
    let feed = ErpFeed::new(http, &config.erp_feed_url)?;

    if dry_run {
        let records = feed.fetch().await?;
        let discounts = erp::map_feed(&records)?;
        let products = discounts
            .iter()
            .filter(|d| d.kind == RuleKind::Product)
            .count();
        info!(
            records = discounts.len(),
            products,
            amounts = discounts.len() - products,
            "Dry run: feed is valid, store untouched"
        );
        return Ok(());
    }

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("opening rule store")?;

    let summary = erp::import_from_feed(&feed, &db.discounts()).await?;
    println!(
        "Imported {} discounts ({} product, {} amount)",
        summary.imported, summary.products, summary.amounts
    );

    db.close().await;
    Ok(())
}
