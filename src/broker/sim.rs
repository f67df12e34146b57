use async_trait::async_trait;

use super::{GatewayError, OrderGateway, OrderRequest, PlacedOrder};

/// Simulated gateway used when no GATEWAY_URL is configured, and by tests.
/// Accepts every order, or fails every order with a fixed message.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    fail_message: Option<String>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that rejects everything, for failure-path tests.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_message: Some(message.into()),
        }
    }
}

#[async_trait]
impl OrderGateway for SimulatedGateway {
    async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder, GatewayError> {
        if let Some(message) = &self.fail_message {
            return Err(GatewayError::Request(message.clone()));
        }

        tracing::info!(
            user = %request.user_id,
            symbol = %request.symbol,
            side = %request.side,
            quantity = %request.quantity,
            "[SIM] Would place order"
        );

        Ok(PlacedOrder {
            id: format!("sim-{}", request.client_order_id),
            status: "accepted".into(),
        })
    }
}
