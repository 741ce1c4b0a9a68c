//! # Domain Types
//!
//! Core domain types used throughout the Promo Engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  INPUT                         RULES                  OUTPUT            │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌──────────────────┐  │
//! │  │      Cart       │   │    DiscountRule     │   │ DiscountDirective│  │
//! │  │  ─────────────  │   │  ─────────────────  │   │ ──────────────── │  │
//! │  │  lines: Vec<..> │   │  Product {sku, %}   │   │ percentage       │  │
//! │  └────────┬────────┘   │  Amount {from,to,%} │   │ target LINE/ORDER│  │
//! │           │            └─────────────────────┘   │ reason           │  │
//! │  ┌────────▼────────┐            ▲                └──────────────────┘  │
//! │  │    CartLine     │            │ to_rule()                            │
//! │  │  id, sku?,      │   ┌────────┴────────────┐                         │
//! │  │  qty, price     │   │   DiscountRecord    │  (stored row, id order) │
//! │  └─────────────────┘   └─────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rule Kind Resolution
//! Stores and feeds describe a rule's kind with a free-form string
//! (`"PRODUCTO"`, `"importe"`, `"AMOUNT"`...). That string is parsed exactly
//! once into [`RuleKind`] at the store boundary; the resolver only ever sees
//! the closed [`DiscountRule`] enum.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Percentage
// =============================================================================

/// A discount percentage: `15` means 15% off.
///
/// Holds whatever the rule store supplied, including negative values, so
/// that validation can reject them explicitly instead of clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(#[ts(type = "string")] Decimal);

impl Percentage {
    /// Creates a percentage from a decimal value.
    #[inline]
    pub const fn from_decimal(value: Decimal) -> Self {
        Percentage(value)
    }

    /// Creates a percentage from a whole number.
    #[inline]
    pub fn from_whole(value: i64) -> Self {
        Percentage(Decimal::from(value))
    }

    /// Returns the raw value (15 for 15%).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Checks if the percentage is below zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Computes `amount × percentage / 100`, unrounded. `None` when the
    /// product leaves the decimal range (percentages have no upper bound).
    ///
    /// ## Example
    /// ```rust
    /// use promo_core::{Money, Percentage};
    ///
    /// let pct = Percentage::from_whole(20);
    /// let amount: Money = "80".parse().unwrap();
    /// assert_eq!(pct.checked_of(amount), Some("16".parse::<Money>().unwrap()));
    /// ```
    pub fn checked_of(&self, amount: Money) -> Option<Money> {
        amount
            .amount()
            .checked_mul(self.0)?
            .checked_div(Decimal::ONE_HUNDRED)
            .map(Money::from_decimal)
    }
}

/// Displays without trailing zeros: `15.00` → `15`, `12.50` → `12.5`.
impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Percentage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Percentage)
            .map_err(|e| ValidationError::InvalidFormat {
                field: "percentage".to_string(),
                reason: e.to_string(),
            })
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One item entry in a shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Opaque identifier, unique within the cart.
    pub id: String,

    /// Stock Keeping Unit. Lines without one never match a product rule.
    pub sku: Option<String>,

    /// Units of this item (must be > 0).
    pub quantity: i64,

    /// Price of a single unit (must be >= 0).
    pub unit_price: Money,
}

impl CartLine {
    /// Creates a new cart line.
    pub fn new(
        id: impl Into<String>,
        sku: Option<&str>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        CartLine {
            id: id.into(),
            sku: sku.map(str::to_string),
            quantity,
            unit_price,
        }
    }

    /// `quantity × unit_price`, or `None` if the product overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply_quantity(self.quantity)
    }
}

/// An ordered cart snapshot.
///
/// ## Invariants
/// - Line ids are unique (checked by [`crate::validation::validate_cart`])
/// - Line order is significant: directives are emitted in cart order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a cart from lines.
    pub fn new(lines: Vec<CartLine>) -> Self {
        Cart { lines }
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Finds a line by id.
    pub fn line(&self, id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Distinct SKUs present in the cart, in first-seen order.
    ///
    /// Used to ask the rule store for product rules relevant to this cart.
    pub fn skus(&self) -> Vec<String> {
        let mut skus: Vec<String> = Vec::new();
        for sku in self.lines.iter().filter_map(|l| l.sku.as_deref()) {
            if !skus.iter().any(|s| s == sku) {
                skus.push(sku.to_string());
            }
        }
        skus
    }
}

// =============================================================================
// Rule Kind
// =============================================================================

/// The two rule classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// Keyed by exact SKU match. Takes precedence per line.
    Product,
    /// Keyed by an inclusive subtotal range over uncovered money.
    Amount,
}

impl RuleKind {
    /// Canonical storage/wire spelling.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Product => "PRODUCT",
            RuleKind::Amount => "AMOUNT",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive. Accepts the ERP spellings `PRODUCTO` and `IMPORTE`.
impl FromStr for RuleKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRODUCT" | "PRODUCTO" => Ok(RuleKind::Product),
            "AMOUNT" | "IMPORTE" => Ok(RuleKind::Amount),
            _ => Err(ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: vec!["PRODUCT".to_string(), "AMOUNT".to_string()],
            }),
        }
    }
}

impl<'de> Deserialize<'de> for RuleKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Discount Rules
// =============================================================================

/// Discount keyed by exact SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductRule {
    pub sku: String,
    pub percentage: Percentage,
}

/// Discount keyed by an inclusive subtotal range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AmountRule {
    pub from_inclusive: Money,
    pub to_inclusive: Money,
    pub percentage: Percentage,
}

impl AmountRule {
    /// `from_inclusive <= subtotal <= to_inclusive`.
    pub fn contains(&self, subtotal: Money) -> bool {
        self.from_inclusive <= subtotal && subtotal <= self.to_inclusive
    }
}

/// A discount rule as consumed by the resolver.
///
/// ## Wire Format
/// ```json
/// { "kind": "PRODUCT", "sku": "A", "percentage": "15" }
/// { "kind": "AMOUNT", "fromInclusive": "50", "toInclusive": "150", "percentage": "10" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountRule {
    Product(ProductRule),
    Amount(AmountRule),
}

impl DiscountRule {
    /// Shorthand for a product rule.
    pub fn product(sku: impl Into<String>, percentage: Percentage) -> Self {
        DiscountRule::Product(ProductRule {
            sku: sku.into(),
            percentage,
        })
    }

    /// Shorthand for an amount rule.
    pub fn amount(from_inclusive: Money, to_inclusive: Money, percentage: Percentage) -> Self {
        DiscountRule::Amount(AmountRule {
            from_inclusive,
            to_inclusive,
            percentage,
        })
    }

    /// Which class this rule belongs to.
    pub fn kind(&self) -> RuleKind {
        match self {
            DiscountRule::Product(_) => RuleKind::Product,
            DiscountRule::Amount(_) => RuleKind::Amount,
        }
    }

    pub fn percentage(&self) -> Percentage {
        match self {
            DiscountRule::Product(r) => r.percentage,
            DiscountRule::Amount(r) => r.percentage,
        }
    }
}

// =============================================================================
// Discount Directives
// =============================================================================

/// Discriminant of a directive's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    Line,
    Order,
}

/// What a directive applies to.
///
/// An `Order` target carries the ids of the lines whose money was not
/// covered by a product rule: that is the effective scope of the discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "targetKind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountTarget {
    Line {
        #[serde(rename = "targetLineId")]
        line_id: String,
    },
    Order {
        #[serde(rename = "lineIds")]
        line_ids: Vec<String>,
    },
}

/// The resolver's output instruction.
///
/// ## Wire Format
/// ```json
/// { "percentage": "5", "targetKind": "LINE", "targetLineId": "l1", "reason": "5% PRODUCT match" }
/// { "percentage": "20", "targetKind": "ORDER", "lineIds": ["l2"], "reason": "20% AMOUNT match" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountDirective {
    pub percentage: Percentage,
    #[serde(flatten)]
    pub target: DiscountTarget,
    /// Informational only.
    pub reason: String,
}

impl DiscountDirective {
    pub fn target_kind(&self) -> TargetKind {
        match self.target {
            DiscountTarget::Line { .. } => TargetKind::Line,
            DiscountTarget::Order { .. } => TargetKind::Order,
        }
    }

    /// Present iff the target kind is `Line`.
    pub fn target_line_id(&self) -> Option<&str> {
        match &self.target {
            DiscountTarget::Line { line_id } => Some(line_id),
            DiscountTarget::Order { .. } => None,
        }
    }

    /// Ids of every line the directive reaches.
    pub fn affected_line_ids(&self) -> Vec<&str> {
        match &self.target {
            DiscountTarget::Line { line_id } => vec![line_id.as_str()],
            DiscountTarget::Order { line_ids } => line_ids.iter().map(String::as_str).collect(),
        }
    }
}

// =============================================================================
// Stored Records
// =============================================================================

/// A rule row as kept by the rule store.
///
/// `id` grows monotonically, so ordering by id is creation order: the
/// order that decides "first match wins".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRecord {
    pub id: i64,
    pub kind: RuleKind,
    pub sku: Option<String>,
    pub amount_from: Option<Money>,
    pub amount_to: Option<Money>,
    pub percentage: Percentage,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl DiscountRecord {
    /// Converts a stored row into the resolver's rule type.
    ///
    /// ## Errors
    /// - PRODUCT row without a SKU
    /// - AMOUNT row missing either range bound
    pub fn to_rule(&self) -> CoreResult<DiscountRule> {
        let field = format!("discount {}", self.id);
        match self.kind {
            RuleKind::Product => {
                let sku = self
                    .sku
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(ValidationError::Required {
                        field: format!("{field} sku"),
                    })?;
                Ok(DiscountRule::product(sku, self.percentage))
            }
            RuleKind::Amount => {
                let (from, to) = self.amount_from.zip(self.amount_to).ok_or(
                    ValidationError::Required {
                        field: format!("{field} amount range"),
                    },
                )?;
                Ok(DiscountRule::amount(from, to, self.percentage))
            }
        }
    }
}

/// Payload for creating a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewDiscount {
    pub kind: RuleKind,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub amount_from: Option<Money>,
    #[serde(default)]
    pub amount_to: Option<Money>,
    pub percentage: Percentage,
}

// =============================================================================
// Unit Tests
// =============================================================================
