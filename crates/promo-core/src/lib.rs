//! # promo-core: Pure Discount Logic for the Promo Engine
//!
//! This crate is the **heart** of the Promo Engine. It decides which discount
//! rules apply to a cart as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Promo Engine Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Checkout platform (discount function)              │   │
//! │  │    cart lines ──► discount operations                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + bearer token                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    promo-api (axum)                             │   │
//! │  │    rule endpoints, admin CRUD, ERP import, checkout resolve    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ promo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ resolver  │  │ checkout  │  │ validation│  │   │
//! │  │   │ Cart,Rule │  │  resolve  │  │ wire I/O  │  │   rules   │  │   │
//! │  │   │ Directive │  │  audit    │  │ targeting │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    promo-db (Rule Store)                        │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Cart, DiscountRule, DiscountDirective, etc.)
//! - [`money`] - Decimal money type (no floating point!)
//! - [`resolver`] - The discount resolver
//! - [`checkout`] - Checkout-function wire types and conversions
//! - [`summary`] - Preview of how much each directive removes
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart + same rules = same directives, same order
//! 2. **No I/O**: rule sets are passed in as immutable snapshots
//! 3. **Decimal Money**: prices and bounds are exact base-10 decimals
//! 4. **Explicit Errors**: malformed input is an error, never a silent "no discount"
//!
//! ## Example Usage
//!
//! ```rust
//! use promo_core::{resolve, Cart, CartLine, DiscountRule, Money, Percentage, TargetKind};
//!
//! let cart = Cart::new(vec![
//!     CartLine::new("l1", Some("A"), 1, Money::from_major(20)),
//!     CartLine::new("l2", Some("B"), 1, Money::from_major(80)),
//! ]);
//! let rules = vec![
//!     DiscountRule::product("A", Percentage::from_whole(5)),
//!     DiscountRule::amount(Money::from_major(0), Money::from_major(100), Percentage::from_whole(20)),
//! ];
//!
//! let directives = resolve(&cart, &rules).unwrap();
//! assert_eq!(directives[0].target_kind(), TargetKind::Line);
//! assert_eq!(directives[1].target_kind(), TargetKind::Order);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod resolver;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use resolver::{resolve, resolve_with_audit, rules_for_skus, Resolution};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a SKU accepted by the rule store.
///
/// Matches the widest product code the ERP feed emits, with headroom.
pub const MAX_SKU_LENGTH: usize = 255;

/// Decimal places used when previewing discount amounts.
pub const DEFAULT_PREVIEW_DECIMAL_PLACES: u32 = 2;
