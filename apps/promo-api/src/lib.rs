//! # promo-api: HTTP Service for the Promo Engine
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        promo-api                                        │
//! │                                                                         │
//! │  Checkout function ──► /api/checkout/resolve ─┐                         │
//! │  (or client.rs) ────► /api/discounts/* ───────┤                         │
//! │  Admin ─────────────► POST/DELETE /api/* ─────┤  require_bearer         │
//! │                                               ▼                         │
//! │                                    ┌────────────────────┐               │
//! │                                    │   Arc<AppState>    │               │
//! │                                    │  db, config, http  │               │
//! │                                    └─────────┬──────────┘               │
//! │                           ┌──────────────────┼─────────────────┐        │
//! │                           ▼                  ▼                 ▼        │
//! │                    promo-db (rules)   promo-core (resolve)   ERP feed   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`routes`] - Router and handlers
//! - [`auth`] - Bearer-token middleware
//! - [`config`] - Layered configuration
//! - [`erp`] - ERP feed import
//! - [`client`] - Checkout-function client for the rule endpoints
//! - [`error`] - API error type

pub mod auth;
pub mod client;
pub mod config;
pub mod erp;
pub mod error;
pub mod routes;

use tracing::Subscriber;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use promo_db::Database;

pub use config::{ApiConfig, ClientConfig, ImportConfig};
pub use error::{ApiError, ErrorCode};
pub use routes::router;

/// Shared application state, handed to handlers as `Arc<AppState>`.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    /// Outbound client for the ERP feed.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.erp_timeout)
            .build()?;

        Ok(AppState { db, config, http })
    }
}

const DEFAULT_LOG_FILTER: &str = "info,promo=debug,sqlx=warn";

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=promo=trace` - Trace for promo crates only
/// - Default: `info,promo=debug,sqlx=warn`
pub fn init_tracing() {
    let rust_log = std::env::var("RUST_LOG").ok();
    subscriber(log_filter(rust_log.as_deref())).init();
}

/// `RUST_LOG` when set and parseable, the default directives otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish()
}
