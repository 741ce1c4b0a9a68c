//! # Discount Resolver
//!
//! Decides which discount rules apply to a cart, to which targets, and at
//! what percentage.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      resolve(cart, rules)                               │
//! │                                                                         │
//! │  1. Validate cart + rules ──── malformed? ──► InvalidInput (no output) │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  2. Partition rules (input order kept in each class)                   │
//! │     product_rules: first rule per SKU wins                             │
//! │     amount_rules:  first containing range wins                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  3. For each line, in cart order                                       │
//! │     ├── SKU matches product rule ──► LINE directive, line covered      │
//! │     └── otherwise ─────────────────► qty × price into uncovered        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  4. uncovered > 0 and some amount rule contains it                     │
//! │     └──► ONE ORDER directive scoped to the uncovered lines             │
//! │                                                                         │
//! │  Output: LINE directives (cart order), then at most one ORDER          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Precedence
//! Product rules win absolutely on their line. Amount rules only ever see
//! money no product rule touched, so no dollar receives two percentages.
//!
//! ## Example
//! ```rust
//! use promo_core::{resolve, Cart, CartLine, DiscountRule, Money, Percentage};
//!
//! let cart = Cart::new(vec![CartLine::new("l1", Some("A"), 2, Money::from_major(10))]);
//! let rules = vec![DiscountRule::product("A", Percentage::from_whole(15))];
//!
//! let directives = resolve(&cart, &rules).unwrap();
//! assert_eq!(directives.len(), 1);
//! assert_eq!(directives[0].target_line_id(), Some("l1"));
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    AmountRule, Cart, DiscountDirective, DiscountRule, DiscountTarget, ProductRule,
};
use crate::validation::{validate_cart, validate_rules};

// =============================================================================
// Resolution
// =============================================================================

/// Directives plus the facts that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// LINE directives in cart order, then at most one ORDER directive.
    pub directives: Vec<DiscountDirective>,

    /// Σ quantity × unit price over lines no product rule matched.
    pub uncovered_subtotal: Money,

    /// Lines that received a product discount.
    pub covered_line_ids: Vec<String>,

    /// Lines whose money flowed into the uncovered subtotal.
    pub uncovered_line_ids: Vec<String>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Resolves the discount directives for a cart.
///
/// Pure and deterministic: identical inputs yield identical output,
/// including order. Inputs are never mutated.
///
/// ## Errors
/// `CoreError::InvalidInput` for quantity <= 0, unit price < 0,
/// percentage < 0, an inverted amount range or a duplicated line id.
pub fn resolve(cart: &Cart, rules: &[DiscountRule]) -> CoreResult<Vec<DiscountDirective>> {
    Ok(resolve_with_audit(cart, rules)?.directives)
}

/// Same as [`resolve`], also returning the uncovered subtotal and which
/// lines were covered.
pub fn resolve_with_audit(cart: &Cart, rules: &[DiscountRule]) -> CoreResult<Resolution> {
    validate_cart(cart)?;
    validate_rules(rules)?;

    let (product_rules, amount_rules) = partition(rules);

    let mut directives = Vec::new();
    let mut covered_line_ids = Vec::new();
    let mut uncovered_line_ids = Vec::new();
    let mut uncovered_subtotal = Money::zero();

    for (i, line) in cart.lines.iter().enumerate() {
        let matched = line
            .sku
            .as_deref()
            .and_then(|sku| product_rules.get(sku).copied());

        match matched {
            Some(rule) => {
                directives.push(DiscountDirective {
                    percentage: rule.percentage,
                    target: DiscountTarget::Line {
                        line_id: line.id.clone(),
                    },
                    reason: format!("{}% PRODUCT match", rule.percentage),
                });
                covered_line_ids.push(line.id.clone());
            }
            None => {
                let line_total = line
                    .line_total()
                    .and_then(|total| uncovered_subtotal.checked_add(total))
                    .ok_or_else(|| overflow(i))?;
                uncovered_subtotal = line_total;
                uncovered_line_ids.push(line.id.clone());
            }
        }
    }

    // Zero uncovered money means nothing left for an amount rule to reward.
    if uncovered_subtotal.is_positive() {
        if let Some(rule) = amount_rules.iter().find(|r| r.contains(uncovered_subtotal)) {
            directives.push(DiscountDirective {
                percentage: rule.percentage,
                target: DiscountTarget::Order {
                    line_ids: uncovered_line_ids.clone(),
                },
                reason: format!("{}% AMOUNT match", rule.percentage),
            });
        }
    }

    debug!(
        lines = cart.lines.len(),
        rules = rules.len(),
        covered = covered_line_ids.len(),
        %uncovered_subtotal,
        directives = directives.len(),
        "Discounts resolved"
    );

    Ok(Resolution {
        directives,
        uncovered_subtotal,
        covered_line_ids,
        uncovered_line_ids,
    })
}

// =============================================================================
// Rule Filtering
// =============================================================================

/// Keeps product rules whose SKU is in `skus`, and every amount rule.
///
/// Relative order is preserved, so the first matching rule of each class
/// is the same before and after filtering.
pub fn rules_for_skus(rules: &[DiscountRule], skus: &[String]) -> Vec<DiscountRule> {
    let wanted: HashSet<&str> = skus.iter().map(String::as_str).collect();

    rules
        .iter()
        .filter(|rule| match rule {
            DiscountRule::Product(p) => wanted.contains(p.sku.as_str()),
            DiscountRule::Amount(_) => true,
        })
        .cloned()
        .collect()
}

// =============================================================================
// Helpers
// =============================================================================

/// Splits rules by class. Product rules are indexed by SKU keeping only the
/// first occurrence; amount rules keep input order.
fn partition(rules: &[DiscountRule]) -> (HashMap<&str, &ProductRule>, Vec<&AmountRule>) {
    let mut products: HashMap<&str, &ProductRule> = HashMap::new();
    let mut amounts = Vec::new();

    for rule in rules {
        match rule {
            DiscountRule::Product(p) => {
                products.entry(p.sku.as_str()).or_insert(p);
            }
            DiscountRule::Amount(a) => amounts.push(a),
        }
    }

    (products, amounts)
}

fn overflow(line_index: usize) -> ValidationError {
    ValidationError::InvalidFormat {
        field: format!("lines[{line_index}]"),
        reason: "line total exceeds the representable range".to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::{CartLine, Percentage, TargetKind};

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn pct(v: i64) -> Percentage {
        Percentage::from_whole(v)
    }

    fn line(id: &str, sku: Option<&str>, qty: i64, price: &str) -> CartLine {
        CartLine::new(id, sku, qty, money(price))
    }

    fn amount(from: &str, to: &str, p: i64) -> DiscountRule {
        DiscountRule::amount(money(from), money(to), pct(p))
    }

    #[test]
    fn test_single_product_match() {
        let cart = Cart::new(vec![line("a", Some("A"), 2, "10")]);
        let rules = vec![DiscountRule::product("A", pct(15))];

        let directives = resolve(&cart, &rules).unwrap();

        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].percentage, pct(15));
        assert_eq!(directives[0].target_kind(), TargetKind::Line);
        assert_eq!(directives[0].target_line_id(), Some("a"));
        assert_eq!(directives[0].reason, "15% PRODUCT match");
    }

    #[test]
    fn test_sku_match_is_exact() {
        let cart = Cart::new(vec![
            line("lower", Some("a"), 1, "10"),
            line("padded", Some(" A "), 1, "10"),
            line("comma", Some("A,B"), 1, "10"),
        ]);
        let rules = vec![
            DiscountRule::product("A", pct(5)),
            DiscountRule::product("A,B", pct(7)),
        ];

        let resolution = resolve_with_audit(&cart, &rules).unwrap();

        assert_eq!(resolution.covered_line_ids, vec!["comma".to_string()]);
        assert_eq!(resolution.directives[0].percentage, pct(7));
        assert_eq!(
            resolution.uncovered_line_ids,
            vec!["lower".to_string(), "padded".to_string()]
        );
    }

    #[test]
    fn test_single_amount_match() {
        let cart = Cart::new(vec![line("b", Some("B"), 1, "100")]);
        let rules = vec![amount("50", "150", 10)];

        let resolution = resolve_with_audit(&cart, &rules).unwrap();

        assert_eq!(resolution.uncovered_subtotal, money("100"));
        assert_eq!(resolution.directives.len(), 1);
        let order = &resolution.directives[0];
        assert_eq!(order.target_kind(), TargetKind::Order);
        assert_eq!(order.percentage, pct(10));
        assert_eq!(order.target_line_id(), None);
        assert_eq!(order.reason, "10% AMOUNT match");
    }

    #[test]
    fn test_product_line_excluded_from_amount_subtotal() {
        let cart = Cart::new(vec![
            line("a", Some("A"), 1, "20"),
            line("b", Some("B"), 1, "80"),
        ]);
        let rules = vec![DiscountRule::product("A", pct(5)), amount("0", "100", 20)];

        let resolution = resolve_with_audit(&cart, &rules).unwrap();

        assert_eq!(resolution.uncovered_subtotal, money("80"));
        assert_eq!(resolution.covered_line_ids, vec!["a".to_string()]);
        assert_eq!(resolution.directives.len(), 2);
        assert_eq!(resolution.directives[0].target_line_id(), Some("a"));
        assert_eq!(resolution.directives[0].percentage, pct(5));
        assert_eq!(
            resolution.directives[1].target,
            DiscountTarget::Order {
                line_ids: vec!["b".to_string()]
            }
        );
        assert_eq!(resolution.directives[1].percentage, pct(20));
    }

    #[test]
    fn test_upper_bound_is_inclusive() {
        let cart = Cart::new(vec![line("x", None, 3, "50")]);
        let rules = vec![amount("50", "150", 10)];

        let directives = resolve(&cart, &rules).unwrap();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].percentage, pct(10));
    }

    #[test]
    fn test_lower_bound_is_inclusive() {
        let cart = Cart::new(vec![line("x", None, 1, "50.00")]);
        let rules = vec![amount("50", "150", 10)];

        assert_eq!(resolve(&cart, &rules).unwrap().len(), 1);
    }

    #[test]
    fn test_subtotal_outside_every_range_yields_no_order_directive() {
        let cart = Cart::new(vec![line("x", None, 1, "150.01")]);
        let rules = vec![amount("50", "150", 10), amount("0", "49.99", 5)];

        assert!(resolve(&cart, &rules).unwrap().is_empty());
    }

    #[test]
    fn test_first_product_rule_wins() {
        let cart = Cart::new(vec![line("a", Some("A"), 1, "10")]);
        let rules = vec![
            DiscountRule::product("A", pct(5)),
            DiscountRule::product("A", pct(50)),
        ];

        let directives = resolve(&cart, &rules).unwrap();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].percentage, pct(5));
    }

    #[test]
    fn test_first_overlapping_amount_rule_wins() {
        let cart = Cart::new(vec![line("x", None, 1, "100")]);
        let rules = vec![amount("90", "200", 7), amount("0", "1000", 30)];

        let directives = resolve(&cart, &rules).unwrap();
        assert_eq!(directives[0].percentage, pct(7));
    }

    #[test]
    fn test_line_without_sku_never_matches_product_rule() {
        let cart = Cart::new(vec![line("x", None, 1, "10")]);
        let rules = vec![DiscountRule::product("", pct(50)), amount("0", "100", 5)];

        let resolution = resolve_with_audit(&cart, &rules).unwrap();
        assert!(resolution.covered_line_ids.is_empty());
        assert_eq!(resolution.uncovered_subtotal, money("10"));
        assert_eq!(resolution.directives[0].target_kind(), TargetKind::Order);
    }

    #[test]
    fn test_all_lines_covered_skips_amount_rules() {
        let cart = Cart::new(vec![line("a", Some("A"), 1, "10")]);
        let rules = vec![DiscountRule::product("A", pct(5)), amount("0", "1000", 20)];

        let resolution = resolve_with_audit(&cart, &rules).unwrap();
        assert!(resolution.uncovered_subtotal.is_zero());
        assert_eq!(resolution.directives.len(), 1);
        assert_eq!(resolution.directives[0].target_kind(), TargetKind::Line);
    }

    #[test]
    fn test_zero_uncovered_subtotal_skips_zero_lower_bound() {
        let cart = Cart::new(vec![line("free", None, 1, "0")]);
        let rules = vec![amount("0", "100", 20)];

        assert!(resolve(&cart, &rules).unwrap().is_empty());
    }

    #[test]
    fn test_empty_cart_and_empty_rules() {
        let cart = Cart::new(vec![line("a", Some("A"), 1, "10")]);
        assert!(resolve(&cart, &[]).unwrap().is_empty());

        let rules = vec![DiscountRule::product("A", pct(5)), amount("0", "100", 20)];
        assert!(resolve(&Cart::default(), &rules).unwrap().is_empty());
    }

    #[test]
    fn test_line_directives_precede_order_directive_in_cart_order() {
        let cart = Cart::new(vec![
            line("1", Some("C"), 1, "5"),
            line("2", Some("X"), 1, "30"),
            line("3", Some("A"), 1, "5"),
            line("4", None, 2, "10"),
        ]);
        let rules = vec![
            amount("0", "100", 10),
            DiscountRule::product("A", pct(3)),
            DiscountRule::product("C", pct(4)),
        ];

        let directives = resolve(&cart, &rules).unwrap();
        let targets: Vec<Vec<&str>> = directives.iter().map(|d| d.affected_line_ids()).collect();
        assert_eq!(targets, vec![vec!["1"], vec!["3"], vec!["2", "4"]]);
        assert_eq!(directives[2].percentage, pct(10));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let cart = Cart::new(vec![
            line("1", Some("A"), 1, "20"),
            line("2", Some("B"), 4, "12.50"),
            line("3", None, 1, "7.25"),
        ]);
        let rules = vec![
            DiscountRule::product("B", pct(8)),
            amount("0", "30", 2),
            amount("20", "60", 4),
        ];

        let first = serde_json::to_string(&resolve(&cart, &rules).unwrap()).unwrap();
        let second = serde_json::to_string(&resolve(&cart, &rules).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_input_is_rejected_without_partial_result() {
        let rules = vec![DiscountRule::product("A", pct(5))];

        let zero_qty = Cart::new(vec![line("a", Some("A"), 0, "10")]);
        assert!(matches!(
            resolve(&zero_qty, &rules),
            Err(CoreError::InvalidInput(ValidationError::MustBePositive { .. }))
        ));

        let negative_price = Cart::new(vec![line("a", Some("A"), 1, "-10")]);
        assert!(resolve(&negative_price, &rules).is_err());

        let cart = Cart::new(vec![line("a", Some("A"), 1, "10")]);
        let negative_pct = vec![DiscountRule::product("A", pct(-5))];
        assert!(resolve(&cart, &negative_pct).is_err());

        let inverted = vec![amount("100", "0", 5)];
        assert!(resolve(&cart, &inverted).is_err());
    }

    #[test]
    fn test_decimal_percentages_pass_through_unrounded() {
        let cart = Cart::new(vec![line("a", Some("A"), 1, "10")]);
        let rules = vec![DiscountRule::product("A", "12.50".parse().unwrap())];

        let directives = resolve(&cart, &rules).unwrap();
        assert_eq!(directives[0].percentage.value().to_string(), "12.50");
        assert_eq!(directives[0].reason, "12.5% PRODUCT match");
    }

    #[test]
    fn test_rules_for_skus_preserves_order() {
        let rules = vec![
            DiscountRule::product("A", pct(1)),
            amount("0", "10", 2),
            DiscountRule::product("Z", pct(3)),
            DiscountRule::product("A", pct(4)),
            amount("0", "100", 5),
        ];

        let filtered = rules_for_skus(&rules, &["A".to_string()]);

        assert_eq!(
            filtered,
            vec![
                DiscountRule::product("A", pct(1)),
                amount("0", "10", 2),
                DiscountRule::product("A", pct(4)),
                amount("0", "100", 5),
            ]
        );
    }

    #[test]
    fn test_filtering_does_not_change_resolution() {
        let cart = Cart::new(vec![
            line("1", Some("A"), 1, "40"),
            line("2", Some("B"), 1, "60"),
        ]);
        let rules = vec![
            DiscountRule::product("Q", pct(90)),
            DiscountRule::product("A", pct(10)),
            amount("0", "59", 1),
            amount("60", "60", 6),
            DiscountRule::product("A", pct(99)),
        ];

        let filtered = rules_for_skus(&rules, &cart.skus());
        assert_eq!(
            resolve(&cart, &rules).unwrap(),
            resolve(&cart, &filtered).unwrap()
        );
    }
}
