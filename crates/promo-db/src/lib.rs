//! # promo-db: Rule Store for the Promo Engine
//!
//! SQLite storage for discount rules, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Promo Engine Data Flow                           │
//! │                                                                         │
//! │  promo-api handler (checkout resolve, admin CRUD, ERP import)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     promo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │    Repository      │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ DiscountRepository │  │ (embedded) │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (DATABASE_PATH)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Discount repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use promo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("promo.db")).await?;
//! let rules = db.discounts().load_rules_for_skus(&cart.skus()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::discount::DiscountRepository;
