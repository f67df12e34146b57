use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{GatewayError, OrderGateway, OrderRequest, PlacedOrder};

/// Order gateway over the platform's internal order-placement HTTP API.
#[derive(Debug, Clone)]
pub struct HttpOrderGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct OrderAck {
    id: String,
    status: String,
}

impl HttpOrderGateway {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder, GatewayError> {
        let url = format!("{}/orders", self.base_url);

        let body = json!({
            "user_id": request.user_id,
            "symbol": request.symbol,
            "side": request.side,
            "type": request.order_type,
            "quantity": request.quantity,
            "price": request.price,
            "client_order_id": request.client_order_id,
        });

        let mut req = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let ack: OrderAck = resp
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        Ok(PlacedOrder {
            id: ack.id,
            status: ack.status,
        })
    }
}
