//! # Checkout Function Client
//!
//! What runs inside the checkout platform's discount hook: fetch the rules
//! relevant to the cart over HTTP, resolve locally, hand back operations.
//!
//! ```text
//! CheckoutInput ──► Cart ──┬── GET /api/discounts/products?sku=..   ┐
//!                          └── GET /api/discounts/amount            ┘ product ++ amount
//!                                         │
//!                                         ▼
//!                               resolve(cart, rules)
//!                                         │
//!                                         ▼
//!                                  FunctionOutput
//! ```
//!
//! If the rules can't be fetched the function fails loudly. It never
//! reports "no discounts" for a fetch it could not complete.

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use promo_core::checkout::{CheckoutInput, FunctionOutput, OrderTargeting};
use promo_core::{resolve, Cart, CoreError, DiscountRecord, DiscountRule};

use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Rule service rejected the API token")]
    Unauthorized,

    #[error("Rule service answered {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Rule service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A fetched record can't become a rule, or the cart is invalid.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// HTTP client for the rule read endpoints.
#[derive(Debug, Clone)]
pub struct RuleClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl RuleClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(RuleClient { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/discounts/{path}", self.config.app_url)
    }

    async fn get_records(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<DiscountRecord>, ClientError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.config.api_token)
            .query(query)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED => {
                warn!(path, "Rule service rejected the token");
                Err(ClientError::Unauthorized)
            }
            status => Err(ClientError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// PRODUCT records for `skus`, in store order. No request for no SKUs.
    pub async fn fetch_product_rules(
        &self,
        skus: &[String],
    ) -> Result<Vec<DiscountRecord>, ClientError> {
        if skus.is_empty() {
            return Ok(Vec::new());
        }
        // One pair per SKU: a SKU may itself contain commas.
        let query: Vec<(&str, String)> = skus.iter().map(|sku| ("sku", sku.clone())).collect();
        self.get_records("products", &query).await
    }

    /// Every AMOUNT record, in store order.
    pub async fn fetch_amount_rules(&self) -> Result<Vec<DiscountRecord>, ClientError> {
        self.get_records("amount", &[]).await
    }

    /// Product rules for the cart's SKUs followed by all amount rules.
    pub async fn fetch_rules_for_cart(&self, cart: &Cart) -> Result<Vec<DiscountRule>, ClientError> {
        let mut records = self.fetch_product_rules(&cart.skus()).await?;
        records.extend(self.fetch_amount_rules().await?);

        debug!(count = records.len(), "Fetched rules for cart");
        Ok(records
            .iter()
            .map(DiscountRecord::to_rule)
            .collect::<Result<_, _>>()?)
    }
}

/// The discount hook: input in, discount operations out.
#[derive(Debug, Clone)]
pub struct DiscountFunction {
    client: RuleClient,
    targeting: OrderTargeting,
}

impl DiscountFunction {
    pub fn new(client: RuleClient, targeting: OrderTargeting) -> Self {
        DiscountFunction { client, targeting }
    }

    pub async fn run(&self, input: &CheckoutInput) -> Result<FunctionOutput, ClientError> {
        let cart = input.to_cart();
        let rules = self.client.fetch_rules_for_cart(&cart).await?;
        let directives = resolve(&cart, &rules)?;

        Ok(FunctionOutput::from_directives(&directives, self.targeting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::routes::router;
    use crate::AppState;
    use promo_core::checkout::Target;
    use promo_core::{NewDiscount, Percentage, RuleKind};
    use promo_db::{Database, DbConfig};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    const TOKEN: &str = "e2e-token";

    /// Starts the real service on a loopback port and returns its base URL.
    async fn start_service() -> (String, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = ApiConfig::from_vars([("API_TOKEN", TOKEN)]).unwrap();
        let state = Arc::new(AppState::new(db.clone(), config).unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.ok();
        });

        (format!("http://{addr}"), db)
    }

    async fn seed(db: &Database) {
        let repo = db.discounts();
        repo.create(&NewDiscount {
            kind: RuleKind::Amount,
            sku: None,
            amount_from: Some("50".parse().unwrap()),
            amount_to: Some("150".parse().unwrap()),
            percentage: Percentage::from_whole(10),
        })
        .await
        .unwrap();
        repo.create(&NewDiscount {
            kind: RuleKind::Product,
            sku: Some("A".to_string()),
            amount_from: None,
            amount_to: None,
            percentage: Percentage::from_whole(15),
        })
        .await
        .unwrap();
    }

    fn input() -> CheckoutInput {
        serde_json::from_value(json!({
            "cart": { "lines": [
                { "id": "l1", "quantity": 2, "merchandise": { "sku": "A" },
                  "cost": { "amountPerQuantity": { "amount": "10" } } },
                { "id": "l2", "quantity": 3, "merchandise": {},
                  "cost": { "amountPerQuantity": { "amount": "50" } } }
            ] }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_resolution() {
        let (url, db) = start_service().await;
        seed(&db).await;

        let client = RuleClient::new(ClientConfig::new(url, TOKEN)).unwrap();
        let function = DiscountFunction::new(client, OrderTargeting::LineList);
        let output = function.run(&input()).await.unwrap();

        assert_eq!(output.discounts.len(), 2);
        assert_eq!(output.discounts[0].message, "15% PRODUCT match");
        assert_eq!(
            output.discounts[1].targets,
            vec![Target::CartLine(promo_core::checkout::CartLineTarget {
                id: "l2".to_string()
            })]
        );
        assert_eq!(
            output.discounts[1].value.percentage.value,
            Percentage::from_whole(10)
        );
    }

    #[tokio::test]
    async fn test_fetch_rules_keeps_products_first() {
        let (url, db) = start_service().await;
        seed(&db).await;

        let client = RuleClient::new(ClientConfig::new(url, TOKEN)).unwrap();
        let rules = client
            .fetch_rules_for_cart(&input().to_cart())
            .await
            .unwrap();

        let kinds: Vec<RuleKind> = rules.iter().map(DiscountRule::kind).collect();
        assert_eq!(kinds, vec![RuleKind::Product, RuleKind::Amount]);
    }

    #[tokio::test]
    async fn test_filtered_fetch_resolves_like_full_rule_set() {
        let (url, db) = start_service().await;
        let repo = db.discounts();
        repo.create(&NewDiscount {
            kind: RuleKind::Product,
            sku: Some("X,Y".to_string()),
            amount_from: None,
            amount_to: None,
            percentage: Percentage::from_whole(15),
        })
        .await
        .unwrap();
        repo.create(&NewDiscount {
            kind: RuleKind::Product,
            sku: Some("X".to_string()),
            amount_from: None,
            amount_to: None,
            percentage: Percentage::from_whole(5),
        })
        .await
        .unwrap();

        let cart = Cart::new(vec![
            promo_core::CartLine::new("l1", Some("X,Y"), 1, "10".parse().unwrap()),
            promo_core::CartLine::new("l2", Some("Y"), 1, "10".parse().unwrap()),
        ]);

        let client = RuleClient::new(ClientConfig::new(url, TOKEN)).unwrap();
        let fetched = client.fetch_rules_for_cart(&cart).await.unwrap();
        let full = repo.load_rules().await.unwrap();

        let via_client = resolve(&cart, &fetched).unwrap();
        assert_eq!(via_client, resolve(&cart, &full).unwrap());
        assert_eq!(via_client.len(), 1);
        assert_eq!(via_client[0].target_line_id(), Some("l1"));
    }

    #[tokio::test]
    async fn test_wrong_token_is_an_error_not_an_empty_result() {
        let (url, db) = start_service().await;
        seed(&db).await;

        let client = RuleClient::new(ClientConfig::new(url, "wrong")).unwrap();
        let function = DiscountFunction::new(client, OrderTargeting::LineList);

        assert!(matches!(
            function.run(&input()).await,
            Err(ClientError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RuleClient::new(ClientConfig::new(format!("http://{addr}"), TOKEN)).unwrap();
        assert!(matches!(
            client.fetch_amount_rules().await,
            Err(ClientError::Transport(_))
        ));
    }
}
