//! # Discount Preview
//!
//! Estimates how much money each directive removes from a cart.
//!
//! The checkout platform applies the percentages itself and stays the
//! source of truth for final amounts. This preview exists so the service
//! can explain a resolution to an operator.
//!
//! ```text
//! directive (20%, ORDER, [l2, l3])
//!      │
//!      ▼
//! base   = total(l2) + total(l3)       = 85.00
//! amount = round(base × 20 / 100, dp)  = 17.00
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Cart, DiscountDirective, Percentage, TargetKind};

/// Money removed by a single directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DirectivePreview {
    pub target_kind: TargetKind,
    pub line_ids: Vec<String>,
    pub percentage: Percentage,
    /// Σ line totals the directive reaches.
    pub base: Money,
    /// `base × percentage / 100`, rounded.
    pub amount: Money,
}

/// Preview of a whole resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPreview {
    pub entries: Vec<DirectivePreview>,
    /// Cart subtotal before any discount.
    pub cart_subtotal: Money,
    pub total_discount: Money,
}

impl DiscountPreview {
    /// Computes the preview, rounding each entry to `decimal_places` with
    /// banker's rounding. The total is the sum of the rounded entries.
    ///
    /// ## Errors
    /// A directive naming a line the cart does not contain, or a line total,
    /// discount or total discount that overflows.
    pub fn compute(
        cart: &Cart,
        directives: &[DiscountDirective],
        decimal_places: u32,
    ) -> CoreResult<Self> {
        let cart_subtotal = cart
            .lines
            .iter()
            .try_fold(Money::zero(), |acc, line| {
                line.line_total().and_then(|total| acc.checked_add(total))
            })
            .ok_or_else(|| overflow("cart"))?;

        let mut entries = Vec::with_capacity(directives.len());
        let mut total_discount = Money::zero();

        for directive in directives {
            let line_ids = directive.affected_line_ids();

            let mut base = Money::zero();
            for id in &line_ids {
                let line = cart.line(id).ok_or_else(|| ValidationError::InvalidFormat {
                    field: "directive".to_string(),
                    reason: format!("line '{id}' is not in the cart"),
                })?;
                base = line
                    .line_total()
                    .and_then(|total| base.checked_add(total))
                    .ok_or_else(|| overflow(id))?;
            }

            let amount = directive
                .percentage
                .checked_of(base)
                .ok_or_else(|| overflow("percentage"))?
                .round_to(decimal_places);
            total_discount = total_discount
                .checked_add(amount)
                .ok_or_else(|| overflow("total_discount"))?;

            entries.push(DirectivePreview {
                target_kind: directive.target_kind(),
                line_ids: line_ids.into_iter().map(str::to_string).collect(),
                percentage: directive.percentage,
                base,
                amount,
            });
        }

        Ok(DiscountPreview {
            entries,
            cart_subtotal,
            total_discount,
        })
    }

    /// Cart subtotal minus every previewed discount.
    pub fn discounted_subtotal(&self) -> Money {
        self.cart_subtotal - self.total_discount
    }
}

fn overflow(what: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: what.to_string(),
        reason: "total exceeds the representable range".to_string(),
    }
}
