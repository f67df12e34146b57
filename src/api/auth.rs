use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::errors::AppError;

/// Bearer-token gate for the protected routes.
///
/// When `API_TOKEN` is set, every request must carry a matching
/// `Authorization: Bearer <token>`. When it is unset the gate is open,
/// for local development behind a trusted proxy.
pub async fn require_auth(req: Request, next: Next) -> Response {
    let expected = match std::env::var("API_TOKEN") {
        Ok(token) if !token.is_empty() => token,
        _ => return next.run(req).await,
    };

    let presented = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => next.run(req).await,
        _ => AppError::Unauthorized.into_response(),
    }
}
