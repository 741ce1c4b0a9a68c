//! # Validation Module
//!
//! Input validation for carts, rules and rule-creation payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Decimal parsing, required fields                                  │
//! │  └── Rule kind strings → RuleKind                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── validate_cart / validate_rules  (run by the resolver)             │
//! │  └── validate_new_discount           (run by the rule store)           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── CHECK (kind IN ('PRODUCT', 'AMOUNT'))                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use promo_core::validation::validate_sku;
//!
//! assert!(validate_sku("COKE-330").is_ok());
//! assert!(validate_sku("   ").is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Cart, DiscountRule, NewDiscount, Percentage, RuleKind};
use crate::MAX_SKU_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a SKU used as a product rule key.
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_SKU_LENGTH`] characters
///
/// SKUs are otherwise opaque: they are compared byte-for-byte against cart
/// lines, so no character set is imposed.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > MAX_SKU_LENGTH {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LENGTH,
        });
    }

    Ok(())
}

/// Validates a line quantity (must be > 0).
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a monetary amount (must be >= 0, zero is a free item).
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a discount percentage (must be >= 0).
pub fn validate_percentage(field: &str, pct: Percentage) -> ValidationResult<()> {
    if pct.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates that `from <= to`.
pub fn validate_range(field: &str, from: Money, to: Money) -> ValidationResult<()> {
    if from > to {
        return Err(ValidationError::InvertedRange {
            field: field.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Resolver Input Validators
// =============================================================================

/// Validates a cart before resolution.
///
/// ## Rules
/// - Every quantity > 0
/// - Every unit price >= 0
/// - Line ids unique
pub fn validate_cart(cart: &Cart) -> ValidationResult<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(cart.lines.len());

    for (i, line) in cart.lines.iter().enumerate() {
        validate_quantity(&format!("lines[{i}].quantity"), line.quantity)?;
        validate_non_negative_amount(&format!("lines[{i}].unitPrice"), line.unit_price)?;

        if !seen.insert(line.id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "line id".to_string(),
                value: line.id.clone(),
            });
        }
    }

    Ok(())
}

/// Validates a rule set before resolution.
///
/// Overlapping ranges and repeated SKUs are NOT errors: input order
/// decides which one wins.
pub fn validate_rules(rules: &[DiscountRule]) -> ValidationResult<()> {
    for (i, rule) in rules.iter().enumerate() {
        validate_percentage(&format!("rules[{i}].percentage"), rule.percentage())?;

        if let DiscountRule::Amount(amount) = rule {
            validate_range(
                &format!("rules[{i}]"),
                amount.from_inclusive,
                amount.to_inclusive,
            )?;
        }
    }

    Ok(())
}

// =============================================================================
// Rule Store Validators
// =============================================================================

/// Validates a rule-creation payload.
///
/// ## Rules
/// - Percentage >= 0
/// - PRODUCT: SKU present and valid
/// - AMOUNT: both bounds present, non-negative, `from <= to`
pub fn validate_new_discount(discount: &NewDiscount) -> ValidationResult<()> {
    validate_percentage("percentage", discount.percentage)?;

    match discount.kind {
        RuleKind::Product => {
            let sku = discount.sku.as_deref().ok_or(ValidationError::Required {
                field: "sku".to_string(),
            })?;
            validate_sku(sku)
        }
        RuleKind::Amount => {
            let from = discount.amount_from.ok_or(ValidationError::Required {
                field: "amountFrom".to_string(),
            })?;
            let to = discount.amount_to.ok_or(ValidationError::Required {
                field: "amountTo".to_string(),
            })?;
            validate_non_negative_amount("amountFrom", from)?;
            validate_non_negative_amount("amountTo", to)?;
            validate_range("amount", from, to)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CartLine;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn new_discount(kind: RuleKind) -> NewDiscount {
        NewDiscount {
            kind,
            sku: None,
            amount_from: None,
            amount_to: None,
            percentage: Percentage::from_whole(10),
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("has space").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku(&"A".repeat(MAX_SKU_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("q", 1).is_ok());
        assert!(validate_quantity("q", 0).is_err());
        assert!(validate_quantity("q", -1).is_err());
    }

    #[test]
    fn test_validate_cart() {
        let ok = Cart::new(vec![
            CartLine::new("1", Some("A"), 1, money("0")),
            CartLine::new("2", None, 3, money("9.99")),
        ]);
        assert!(validate_cart(&ok).is_ok());

        let negative_price = Cart::new(vec![CartLine::new("1", None, 1, money("-1"))]);
        assert_eq!(
            validate_cart(&negative_price),
            Err(ValidationError::MustNotBeNegative {
                field: "lines[0].unitPrice".to_string()
            })
        );

        let duplicate = Cart::new(vec![
            CartLine::new("1", None, 1, money("1")),
            CartLine::new("1", None, 1, money("1")),
        ]);
        assert!(matches!(
            validate_cart(&duplicate),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_validate_rules() {
        let ok = vec![
            DiscountRule::product("A", Percentage::from_whole(0)),
            DiscountRule::amount(money("10"), money("10"), Percentage::from_whole(5)),
        ];
        assert!(validate_rules(&ok).is_ok());

        let negative = vec![DiscountRule::product("A", Percentage::from_whole(-5))];
        assert!(validate_rules(&negative).is_err());

        let inverted = vec![DiscountRule::amount(
            money("150"),
            money("50"),
            Percentage::from_whole(5),
        )];
        assert!(matches!(
            validate_rules(&inverted),
            Err(ValidationError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_validate_new_discount() {
        let mut product = new_discount(RuleKind::Product);
        assert!(validate_new_discount(&product).is_err());
        product.sku = Some("SKU-1".to_string());
        assert!(validate_new_discount(&product).is_ok());

        let mut amount = new_discount(RuleKind::Amount);
        amount.amount_from = Some(money("100"));
        assert!(validate_new_discount(&amount).is_err());
        amount.amount_to = Some(money("50"));
        assert!(validate_new_discount(&amount).is_err());
        amount.amount_to = Some(money("500"));
        assert!(validate_new_discount(&amount).is_ok());
        amount.amount_from = Some(money("-1"));
        assert!(validate_new_discount(&amount).is_err());
    }
}
