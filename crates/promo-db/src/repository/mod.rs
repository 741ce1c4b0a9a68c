//! # Repository Module
//!
//! Database repositories for the rule store.
//!
//! ```text
//! HTTP handler / ERP import
//!       │
//!       │  db.discounts().load_rules_for_skus(&skus)
//!       ▼
//! DiscountRepository ──► SQL (ORDER BY id) ──► SQLite
//! ```
//!
//! ## Available Repositories
//!
//! - [`discount::DiscountRepository`] - Discount rule CRUD and rule loading

pub mod discount;
