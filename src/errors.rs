use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Subscription-management contract violations.
///
/// All non-retryable and surfaced to the caller as rejected operations.
/// Problems inside trade replication are data outcomes on the CopyTrade
/// record (`skipped`/`failed` with a reason), never errors of this type.
#[derive(Debug, Error)]
pub enum CopyTradingError {
    #[error("Subscription not found")]
    NotFound,

    #[error("Already subscribed to this leader")]
    AlreadySubscribed,

    #[error("Maximum concurrent copy subscriptions reached ({0})")]
    MaxCopiesExceeded(i64),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Cannot copy your own trades")]
    SelfCopy,

    #[error("Invalid status transition: {0}")]
    InvalidStatus(String),
}

impl CopyTradingError {
    pub fn code(&self) -> &'static str {
        match self {
            CopyTradingError::NotFound => "NOT_FOUND",
            CopyTradingError::AlreadySubscribed => "ALREADY_SUBSCRIBED",
            CopyTradingError::MaxCopiesExceeded(_) => "MAX_COPIES_EXCEEDED",
            CopyTradingError::InvalidAmount(_) => "INVALID_AMOUNT",
            CopyTradingError::SelfCopy => "SELF_COPY",
            CopyTradingError::InvalidStatus(_) => "INVALID_STATUS",
        }
    }
}

/// Pattern-analysis contract violations. Terminal, never retried.
#[derive(Debug, Error)]
pub enum FraudDetectionError {
    #[error("Trader not found")]
    TraderNotFound,

    #[error("Insufficient data: {trades} trades in window, need at least {min}")]
    InsufficientData { trades: usize, min: usize },
}

impl FraudDetectionError {
    pub fn code(&self) -> &'static str {
        match self {
            FraudDetectionError::TraderNotFound => "NOT_FOUND",
            FraudDetectionError::InsufficientData { .. } => "INSUFFICIENT_DATA",
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Copy(#[from] CopyTradingError),

    #[error(transparent)]
    Fraud(#[from] FraudDetectionError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, None, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, None, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, None, "Unauthorized".into()),
            AppError::Copy(e) => {
                let status = match e {
                    CopyTradingError::NotFound => StatusCode::NOT_FOUND,
                    CopyTradingError::AlreadySubscribed | CopyTradingError::InvalidStatus(_) => {
                        StatusCode::CONFLICT
                    }
                    CopyTradingError::MaxCopiesExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    CopyTradingError::InvalidAmount(_) | CopyTradingError::SelfCopy => {
                        StatusCode::BAD_REQUEST
                    }
                };
                (status, Some(e.code()), e.to_string())
            }
            AppError::Fraud(e) => {
                let status = match e {
                    FraudDetectionError::TraderNotFound => StatusCode::NOT_FOUND,
                    FraudDetectionError::InsufficientData { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                };
                (status, Some(e.code()), e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "Internal server error".into(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}
