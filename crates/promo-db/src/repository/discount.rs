//! # Discount Repository
//!
//! Database operations for discount rules.
//!
//! ## Ordering Guarantee
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every read is ORDER BY id ASC                                          │
//! │                                                                         │
//! │  id 1  PRODUCT  A      5%   ◄── wins for SKU A                          │
//! │  id 2  AMOUNT   0..100 20%  ◄── wins for subtotal 80                    │
//! │  id 3  PRODUCT  A      50%      (shadowed by id 1)                      │
//! │  id 4  AMOUNT   50..90 10%      (shadowed by id 2 for 80)               │
//! │                                                                         │
//! │  The resolver takes the FIRST match in input order, so the store       │
//! │  must hand rules over in a stable order: creation order.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage
//! Money and percentages are TEXT columns holding the exact decimal string.
//! A row that cannot be decoded surfaces as [`DbError::CorruptRecord`]
//! rather than being skipped.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteArguments, SqlitePool};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use promo_core::validation::validate_new_discount;
use promo_core::{DiscountRecord, DiscountRule, Money, NewDiscount, Percentage, RuleKind};

const SELECT_COLUMNS: &str =
    "SELECT id, kind, sku, amount_from, amount_to, percentage, created_at FROM discounts";

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw `discounts` row, before decimals and kind are parsed.
#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: i64,
    kind: String,
    sku: Option<String>,
    amount_from: Option<String>,
    amount_to: Option<String>,
    percentage: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DiscountRow> for DiscountRecord {
    type Error = DbError;

    fn try_from(row: DiscountRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let money = |raw: Option<String>| -> DbResult<Option<Money>> {
            raw.map(|s| s.parse::<Money>().map_err(|e| DbError::corrupt(id, e)))
                .transpose()
        };

        Ok(DiscountRecord {
            id,
            kind: row.kind.parse().map_err(|e| DbError::corrupt(id, e))?,
            sku: row.sku,
            amount_from: money(row.amount_from)?,
            amount_to: money(row.amount_to)?,
            percentage: row
                .percentage
                .parse::<Percentage>()
                .map_err(|e| DbError::corrupt(id, e))?,
            created_at: row.created_at,
        })
    }
}

fn into_records(rows: Vec<DiscountRow>) -> DbResult<Vec<DiscountRecord>> {
    rows.into_iter().map(DiscountRecord::try_from).collect()
}

fn into_rules(records: &[DiscountRecord]) -> DbResult<Vec<DiscountRule>> {
    records
        .iter()
        .map(|r| r.to_rule().map_err(|e| DbError::corrupt(r.id, e)))
        .collect()
}

/// Column values for an insert. A PRODUCT rule keeps only its SKU and an
/// AMOUNT rule only its range, whatever else the payload carried. The SKU
/// is stored byte-for-byte: matching against cart lines is exact.
struct InsertColumns {
    kind: RuleKind,
    sku: Option<String>,
    amount_from: Option<String>,
    amount_to: Option<String>,
    percentage: String,
}

impl From<&NewDiscount> for InsertColumns {
    fn from(d: &NewDiscount) -> Self {
        match d.kind {
            RuleKind::Product => InsertColumns {
                kind: d.kind,
                sku: d.sku.clone(),
                amount_from: None,
                amount_to: None,
                percentage: d.percentage.value().to_string(),
            },
            RuleKind::Amount => InsertColumns {
                kind: d.kind,
                sku: None,
                amount_from: d.amount_from.map(|m| m.to_string()),
                amount_to: d.amount_to.map(|m| m.to_string()),
                percentage: d.percentage.value().to_string(),
            },
        }
    }
}

fn insert_query(
    cols: &InsertColumns,
    created_at: DateTime<Utc>,
) -> sqlx::query::Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(
        r#"
        INSERT INTO discounts (kind, sku, amount_from, amount_to, percentage, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(cols.kind.as_str())
    .bind(cols.sku.as_deref())
    .bind(cols.amount_from.as_deref())
    .bind(cols.amount_to.as_deref())
    .bind(cols.percentage.as_str())
    .bind(created_at)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for discount rule operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.discounts();
///
/// // Rules relevant to a cart, ready for the resolver
/// let rules = repo.load_rules_for_skus(&cart.skus()).await?;
/// let directives = promo_core::resolve(&cart, &rules)?;
/// ```
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Lists every rule in creation order.
    pub async fn list_all(&self) -> DbResult<Vec<DiscountRecord>> {
        let rows: Vec<DiscountRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await?;

        debug!(count = rows.len(), "Listed all discounts");
        into_records(rows)
    }

    /// Lists rules of one kind in creation order.
    pub async fn list_by_kind(&self, kind: RuleKind) -> DbResult<Vec<DiscountRecord>> {
        let rows: Vec<DiscountRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE kind = ?1 ORDER BY id ASC"))
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?;

        debug!(%kind, count = rows.len(), "Listed discounts by kind");
        into_records(rows)
    }

    /// Lists PRODUCT rules whose SKU is in `skus`, in creation order.
    ///
    /// An empty `skus` returns an empty list without touching the database.
    pub async fn list_products_for_skus(&self, skus: &[String]) -> DbResult<Vec<DiscountRecord>> {
        if skus.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE kind = ")
            .push_bind(RuleKind::Product.as_str())
            .push(" AND sku IN (");
        let mut separated = qb.separated(", ");
        for sku in skus {
            separated.push_bind(sku.as_str());
        }
        separated.push_unseparated(") ORDER BY id ASC");

        let rows: Vec<DiscountRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        debug!(
            skus = skus.len(),
            count = rows.len(),
            "Listed product discounts for SKUs"
        );
        into_records(rows)
    }

    /// Gets a rule by id.
    ///
    /// ## Returns
    /// * `Ok(Some(record))` - Rule found
    /// * `Ok(None)` - No rule with that id
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<DiscountRecord>> {
        let row: Option<DiscountRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(DiscountRecord::try_from).transpose()
    }

    /// Validates and stores a new rule.
    ///
    /// ## Errors
    /// `DbError::Validation` if the payload is invalid; nothing is written.
    pub async fn create(&self, discount: &NewDiscount) -> DbResult<DiscountRecord> {
        validate_new_discount(discount)?;

        let cols = InsertColumns::from(discount);
        let created_at = Utc::now();

        let result = insert_query(&cols, created_at).execute(&self.pool).await?;
        let id = result.last_insert_rowid();

        info!(id, kind = %cols.kind, "Discount created");

        Ok(DiscountRecord {
            id,
            kind: cols.kind,
            sku: cols.sku,
            amount_from: discount.amount_from.filter(|_| cols.kind == RuleKind::Amount),
            amount_to: discount.amount_to.filter(|_| cols.kind == RuleKind::Amount),
            percentage: discount.percentage,
            created_at,
        })
    }

    /// Deletes the given ids and returns how many rows went away.
    ///
    /// Unknown ids are ignored. An empty slice deletes nothing.
    pub async fn delete_many(&self, ids: &[i64]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM discounts WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let deleted = qb.build().execute(&self.pool).await?.rows_affected();

        info!(requested = ids.len(), deleted, "Discounts deleted");
        Ok(deleted)
    }

    /// Replaces the whole rule set with `discounts`, keeping their order.
    ///
    /// Every payload is validated before the transaction opens. The delete
    /// and the inserts commit together, so readers see either the old set
    /// or the new one.
    pub async fn replace_all(&self, discounts: &[NewDiscount]) -> DbResult<usize> {
        for discount in discounts {
            validate_new_discount(discount)?;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let removed = sqlx::query("DELETE FROM discounts")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let created_at = Utc::now();
        for discount in discounts {
            let cols = InsertColumns::from(discount);
            insert_query(&cols, created_at).execute(&mut *tx).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(removed, inserted = discounts.len(), "Discount set replaced");
        Ok(discounts.len())
    }

    /// Counts stored rules.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Every rule, converted for the resolver, in creation order.
    pub async fn load_rules(&self) -> DbResult<Vec<DiscountRule>> {
        into_rules(&self.list_all().await?)
    }

    /// Product rules for `skus` followed by every amount rule.
    ///
    /// Each class keeps creation order, so the resolver picks the same
    /// winners as it would from [`Self::load_rules`].
    pub async fn load_rules_for_skus(&self, skus: &[String]) -> DbResult<Vec<DiscountRule>> {
        let mut records = self.list_products_for_skus(skus).await?;
        records.extend(self.list_by_kind(RuleKind::Amount).await?);
        into_rules(&records)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> DiscountRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.discounts()
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn product(sku: &str, pct: i64) -> NewDiscount {
        NewDiscount {
            kind: RuleKind::Product,
            sku: Some(sku.to_string()),
            amount_from: None,
            amount_to: None,
            percentage: Percentage::from_whole(pct),
        }
    }

    fn amount(from: &str, to: &str, pct: i64) -> NewDiscount {
        NewDiscount {
            kind: RuleKind::Amount,
            sku: None,
            amount_from: Some(money(from)),
            amount_to: Some(money(to)),
            percentage: Percentage::from_whole(pct),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo().await;

        let created = repo.create(&amount("50.00", "150", 10)).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.kind, RuleKind::Amount);
        assert_eq!(fetched.amount_from, Some(money("50")));
        assert_eq!(fetched.amount_from.unwrap().to_string(), "50.00");
        assert_eq!(fetched.amount_to, Some(money("150")));
        assert_eq!(fetched.sku, None);
        assert!(repo.get_by_id(9_999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payload() {
        let repo = repo().await;

        let mut missing_sku = product("A", 5);
        missing_sku.sku = None;
        assert!(matches!(
            repo.create(&missing_sku).await,
            Err(DbError::Validation(_))
        ));
        assert!(repo.create(&amount("100", "50", 5)).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_product_rule_drops_range_fields() {
        let repo = repo().await;

        let mut payload = product("A", 5);
        payload.amount_from = Some(money("1"));
        let created = repo.create(&payload).await.unwrap();

        assert_eq!(created.sku.as_deref(), Some("A"));
        assert_eq!(created.amount_from, None);
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku, created.sku);
        assert_eq!(fetched.amount_from, None);
        assert_eq!(fetched.percentage, created.percentage);
    }

    #[tokio::test]
    async fn test_sku_is_stored_exactly_and_still_matches() {
        let repo = repo().await;
        let created = repo.create(&product(" A ", 5)).await.unwrap();
        assert_eq!(created.sku.as_deref(), Some(" A "));

        let padded = repo
            .load_rules_for_skus(&[" A ".to_string()])
            .await
            .unwrap();
        assert_eq!(padded, vec![DiscountRule::product(" A ", Percentage::from_whole(5))]);

        let trimmed = repo.list_products_for_skus(&["A".to_string()]).await.unwrap();
        assert!(trimmed.is_empty());
    }

    #[tokio::test]
    async fn test_lists_preserve_creation_order() {
        let repo = repo().await;
        repo.create(&product("B", 1)).await.unwrap();
        repo.create(&amount("0", "100", 2)).await.unwrap();
        repo.create(&product("A", 3)).await.unwrap();
        repo.create(&product("B", 4)).await.unwrap();

        let all = repo.list_all().await.unwrap();
        let pcts: Vec<Percentage> = all.iter().map(|r| r.percentage).collect();
        assert_eq!(
            pcts,
            (1..=4).map(Percentage::from_whole).collect::<Vec<_>>()
        );

        let products = repo.list_by_kind(RuleKind::Product).await.unwrap();
        assert_eq!(products.len(), 3);
        assert!(products.windows(2).all(|w| w[0].id < w[1].id));

        let amounts = repo.list_by_kind(RuleKind::Amount).await.unwrap();
        assert_eq!(amounts.len(), 1);
    }

    #[tokio::test]
    async fn test_list_products_for_skus() {
        let repo = repo().await;
        repo.create(&product("B", 1)).await.unwrap();
        repo.create(&product("A", 2)).await.unwrap();
        repo.create(&product("C", 3)).await.unwrap();
        repo.create(&amount("0", "10", 4)).await.unwrap();

        let found = repo
            .list_products_for_skus(&["C".to_string(), "B".to_string()])
            .await
            .unwrap();
        let skus: Vec<&str> = found.iter().filter_map(|r| r.sku.as_deref()).collect();
        assert_eq!(skus, vec!["B", "C"]);

        assert!(repo.list_products_for_skus(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_many() {
        let repo = repo().await;
        let a = repo.create(&product("A", 1)).await.unwrap();
        let b = repo.create(&product("B", 2)).await.unwrap();
        repo.create(&product("C", 3)).await.unwrap();

        assert_eq!(repo.delete_many(&[a.id, b.id, 12_345]).await.unwrap(), 2);
        assert_eq!(repo.delete_many(&[]).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_all() {
        let repo = repo().await;
        repo.create(&product("OLD", 50)).await.unwrap();

        let inserted = repo
            .replace_all(&[product("A", 5), amount("0", "100", 20)])
            .await
            .unwrap();

        assert_eq!(inserted, 2);
        let rules = repo.load_rules().await.unwrap();
        assert_eq!(
            rules,
            vec![
                DiscountRule::product("A", Percentage::from_whole(5)),
                DiscountRule::amount(money("0"), money("100"), Percentage::from_whole(20)),
            ]
        );
    }

    #[tokio::test]
    async fn test_replace_all_is_all_or_nothing() {
        let repo = repo().await;
        repo.create(&product("KEEP", 10)).await.unwrap();

        let result = repo
            .replace_all(&[product("A", 5), amount("100", "0", 20)])
            .await;

        assert!(matches!(result, Err(DbError::Validation(_))));
        let remaining = repo.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].sku.as_deref(), Some("KEEP"));
    }

    #[tokio::test]
    async fn test_load_rules_for_skus_puts_products_first() {
        let repo = repo().await;
        repo.create(&amount("0", "50", 1)).await.unwrap();
        repo.create(&product("A", 2)).await.unwrap();
        repo.create(&product("Z", 3)).await.unwrap();
        repo.create(&amount("50", "100", 4)).await.unwrap();

        let rules = repo.load_rules_for_skus(&["A".to_string()]).await.unwrap();
        let kinds: Vec<RuleKind> = rules.iter().map(DiscountRule::kind).collect();
        assert_eq!(
            kinds,
            vec![RuleKind::Product, RuleKind::Amount, RuleKind::Amount]
        );
        assert_eq!(rules[1].percentage(), Percentage::from_whole(1));
    }

    #[tokio::test]
    async fn test_undecodable_row_is_corrupt_record() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "INSERT INTO discounts (kind, sku, percentage, created_at) VALUES ('PRODUCT', 'A', 'ten', ?1)",
        )
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let result = db.discounts().list_all().await;
        assert!(matches!(result, Err(DbError::CorruptRecord { .. })));
    }
}
