//! # Checkout Function Wire Types
//!
//! Conversion between the checkout platform's discount-function payloads and
//! the resolver's own types.
//!
//! ## Round Trip
//! ```text
//! CheckoutInput (platform JSON)
//!      │ to_cart()
//!      ▼
//! Cart ──► resolve(cart, rules) ──► Vec<DiscountDirective>
//!                                           │ FunctionOutput::from_directives()
//!                                           ▼
//!                          FunctionOutput { discounts: [...] } (platform JSON)
//! ```
//!
//! ## Order Targeting
//! An ORDER directive only covers lines no product rule claimed. The
//! platform can express that two ways, picked by [`OrderTargeting`]:
//!
//! | Mode | Targets emitted |
//! |------|-----------------|
//! | `LineList` | one `cartLine` per uncovered line |
//! | `WholeOrder` | a single `orderSubtotal` target |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Cart, CartLine, DiscountDirective, DiscountTarget, Percentage};

// =============================================================================
// Function Input
// =============================================================================

/// Payload the checkout platform sends to the discount function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub cart: CheckoutCart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCart {
    pub lines: Vec<CheckoutLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub id: String,
    pub quantity: i64,
    #[serde(default)]
    pub merchandise: Merchandise,
    pub cost: LineCost,
}

/// Variant data. Custom line items carry no SKU at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Merchandise {
    #[serde(default)]
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineCost {
    pub amount_per_quantity: MoneyAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MoneyAmount {
    pub amount: Money,
}

impl CheckoutInput {
    /// Builds the resolver's cart. An empty SKU string counts as no SKU.
    pub fn to_cart(&self) -> Cart {
        Cart::new(
            self.cart
                .lines
                .iter()
                .map(|line| {
                    let sku = line
                        .merchandise
                        .sku
                        .as_deref()
                        .filter(|s| !s.is_empty());
                    CartLine::new(
                        line.id.clone(),
                        sku,
                        line.quantity,
                        line.cost.amount_per_quantity.amount,
                    )
                })
                .collect(),
        )
    }
}

// =============================================================================
// Order Targeting
// =============================================================================

/// How an ORDER directive is expressed to the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderTargeting {
    /// One `cartLine` target per uncovered line. Exact scope.
    #[default]
    LineList,
    /// A single `orderSubtotal` target.
    WholeOrder,
}

impl fmt::Display for OrderTargeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderTargeting::LineList => f.write_str("line_list"),
            OrderTargeting::WholeOrder => f.write_str("whole_order"),
        }
    }
}

impl FromStr for OrderTargeting {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "line_list" | "lines" => Ok(OrderTargeting::LineList),
            "whole_order" | "order" => Ok(OrderTargeting::WholeOrder),
            _ => Err(ValidationError::NotAllowed {
                field: "order targeting".to_string(),
                allowed: vec!["line_list".to_string(), "whole_order".to_string()],
            }),
        }
    }
}

// =============================================================================
// Function Output
// =============================================================================

/// What the discount function hands back to the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FunctionOutput {
    pub discounts: Vec<FunctionDiscount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDiscount {
    pub message: String,
    pub targets: Vec<Target>,
    pub value: DiscountValue,
}

/// `{"cartLine": {"id": ..}}` or `{"orderSubtotal": {"excludedVariantIds": []}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum Target {
    CartLine(CartLineTarget),
    OrderSubtotal(OrderSubtotalTarget),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLineTarget {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubtotalTarget {
    pub excluded_variant_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountValue {
    pub percentage: PercentageValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PercentageValue {
    pub value: Percentage,
}

impl Target {
    fn cart_line(id: &str) -> Self {
        Target::CartLine(CartLineTarget { id: id.to_string() })
    }
}

impl FunctionOutput {
    /// Converts resolver directives into platform discount operations,
    /// preserving directive order.
    ///
    /// A directive left with no target is dropped; the platform rejects
    /// discounts without targets.
    pub fn from_directives(directives: &[DiscountDirective], targeting: OrderTargeting) -> Self {
        let discounts = directives
            .iter()
            .map(|directive| {
                let targets = match (&directive.target, targeting) {
                    (DiscountTarget::Line { line_id }, _) => vec![Target::cart_line(line_id)],
                    (DiscountTarget::Order { line_ids }, OrderTargeting::LineList) => {
                        line_ids.iter().map(|id| Target::cart_line(id)).collect()
                    }
                    (DiscountTarget::Order { .. }, OrderTargeting::WholeOrder) => {
                        vec![Target::OrderSubtotal(OrderSubtotalTarget::default())]
                    }
                };

                FunctionDiscount {
                    message: directive.reason.clone(),
                    targets,
                    value: DiscountValue {
                        percentage: PercentageValue {
                            value: directive.percentage,
                        },
                    },
                }
            })
            .filter(|discount| !discount.targets.is_empty())
            .collect();

        FunctionOutput { discounts }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
