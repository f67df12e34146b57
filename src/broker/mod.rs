pub mod http;
pub mod sim;

pub use http::HttpOrderGateway;
pub use sim::SimulatedGateway;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Request(String),

    #[error("gateway rejected order ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("gateway returned malformed response: {0}")]
    Malformed(String),
}

/// A replica order for the follower's account.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub user_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    /// Deterministic per (subscription, leader trade), so a retried placement
    /// cannot become a second order.
    pub client_order_id: String,
}

/// Gateway acknowledgement for a placed order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub id: String,
    pub status: String,
}

/// Order-placement collaborator. One call per successfully sized copy trade;
/// retries, if any, belong to the caller's workflow layer.
#[async_trait]
pub trait OrderGateway: Send + Sync + fmt::Debug {
    async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder, GatewayError>;
}
