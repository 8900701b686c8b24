/// Axum HTTP handlers for the agent wallet API endpoints
use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::state::{LedgerError, ServiceState};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<ServiceState>;

/// Error `code` clients match on for overdrawn channels and wallets.
/// Must stay equal to `agent_wallet_client::error::INSUFFICIENT_FUNDS_CODE`.
pub const INSUFFICIENT_FUNDS_CODE: &str = "INSUFFICIENT_FUNDS";

/// Custom error type for handlers
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    Conflict(String),
    InsufficientFunds(String),
    TooManyRequests { message: String, retry_after_secs: u64 },
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, code, retry_after) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND", None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR", None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN", None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT", None),
            ApiError::InsufficientFunds(msg) => {
                (StatusCode::BAD_REQUEST, msg, INSUFFICIENT_FUNDS_CODE, None)
            }
            ApiError::TooManyRequests {
                message,
                retry_after_secs,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                message,
                "RATE_LIMITED",
                Some(retry_after_secs),
            ),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "INTERNAL_ERROR", None)
            }
        };

        let body = Json(ErrorResponse {
            error,
            code: Some(code.to_string()),
            retry_after,
        });

        match retry_after {
            Some(secs) => (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response(),
            None => (status, body).into_response(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::WalletExists(_) | LedgerError::ChannelClosed(_) => {
                ApiError::Conflict(message)
            }
            LedgerError::WalletNotFound(_)
            | LedgerError::ChannelNotFound(_)
            | LedgerError::BalanceNotFound { .. } => ApiError::NotFound(message),
            LedgerError::Invalid(_) => ApiError::BadRequest(message),
            LedgerError::InsufficientFunds(_) => ApiError::InsufficientFunds(message),
            LedgerError::NotOwner { .. } => ApiError::Forbidden(message),
            LedgerError::MissingMasterSeed => ApiError::Internal(message),
            LedgerError::RateLimited { retry_after_secs } => ApiError::TooManyRequests {
                message,
                retry_after_secs,
            },
        }
    }
}

/// Middleware: reject requests once the configured budget is spent
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Err(e) = state.admit() {
        log::warn!("Rejecting {} {}: {}", request.method(), request.uri(), e);
        return ApiError::from(e).into_response();
    }
    next.run(request).await
}

/// POST /wallets
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(req): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let wallet = state.create_wallet(&req.agent_id)?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

/// GET /wallets/{agentId}
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<WalletResponse>, ApiError> {
    Ok(Json(state.get_wallet(&agent_id)?))
}

/// GET /wallets/{agentId}/balances
pub async fn get_all_balances(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<BalancesResponse>, ApiError> {
    let balances = state.balances(&agent_id)?;
    Ok(Json(BalancesResponse { balances }))
}

/// GET /wallets/{agentId}/balances/{chain}/{token}
pub async fn get_balance(
    State(state): State<AppState>,
    Path((agent_id, chain, token)): Path<(String, String, String)>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.balance(&agent_id, &chain, &token)?;
    Ok(Json(BalanceResponse {
        balance: balance.to_string(),
    }))
}

/// GET /wallets/{agentId}/channels
pub async fn get_agent_channels(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<ChannelsResponse>, ApiError> {
    let channels = state.channels_for(&agent_id)?;
    Ok(Json(ChannelsResponse { channels }))
}

/// POST /channels
pub async fn open_channel(
    State(state): State<AppState>,
    Json(req): Json<OpenChannelRequest>,
) -> Result<(StatusCode, Json<OpenChannelResponse>), ApiError> {
    let channel_id = state.open_channel(&req)?;
    Ok((StatusCode::CREATED, Json(OpenChannelResponse { channel_id })))
}

/// POST /channels/{channelId}/payments
pub async fn send_payment(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(req): Json<SendPaymentRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    state.send_payment(&channel_id, &req.agent_id, &req.amount)?;
    Ok(Json(AckResponse {
        success: true,
        channel_id,
    }))
}

/// DELETE /channels/{channelId}
pub async fn close_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(req): Json<CloseChannelRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    state.close_channel(&channel_id, &req.agent_id)?;
    Ok(Json(AckResponse {
        success: true,
        channel_id,
    }))
}

/// POST /dev/wallets/{agentId}/credit
/// Fund a wallet out of band (not part of the agent wallet API)
pub async fn credit_wallet(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(req): Json<CreditRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let amount = crate::state::parse_amount(&req.amount)?;
    let balance = state.credit(&agent_id, &req.chain, &req.token, amount)?;
    Ok(Json(BalanceResponse {
        balance: balance.to_string(),
    }))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
