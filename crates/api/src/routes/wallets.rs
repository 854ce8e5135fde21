//! Wallet operation routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use coffer_core::wallet::{OperationKind, WalletOperation};
use coffer_shared::{AppError, WalletId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppState;
use crate::error::ApiError;

/// Creates the wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet", post(operate_wallet))
        .route("/wallets/{wallet_id}", get(get_wallet))
}

/// Request body for a deposit or withdrawal.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOperationRequest {
    /// Target wallet.
    pub wallet_id: WalletId,
    /// `DEPOSIT` or `WITHDRAW`, case-insensitive.
    pub operation_type: String,
    /// Decimal amount as text, `.` or `,` separator.
    pub amount: String,
}

/// Response for a committed operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResponse {
    /// Target wallet.
    pub wallet_id: WalletId,
    /// Applied operation.
    pub operation_type: OperationKind,
    /// Balance after commit, as decimal text.
    pub balance: String,
    /// Wallet currency.
    pub currency: String,
}

/// Response for a balance query.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Wallet ID.
    pub wallet_id: WalletId,
    /// Current balance as decimal text.
    pub balance: String,
    /// Wallet currency.
    pub currency: String,
}

/// POST `/wallet` - Deposit into or withdraw from a wallet.
async fn operate_wallet(
    State(state): State<AppState>,
    payload: Result<Json<WalletOperationRequest>, JsonRejection>,
) -> Result<Json<OperationResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Failed to decode request body");
        AppError::Validation("Invalid request payload".to_string())
    })?;

    if request.wallet_id.is_nil() {
        warn!("Wallet ID is required");
        return Err(AppError::Validation("Wallet ID is required".to_string()).into());
    }

    let kind: OperationKind = request.operation_type.parse().map_err(|_| {
        warn!(operation_type = %request.operation_type, "Invalid operation type");
        AppError::Validation("Invalid operation type".to_string())
    })?;

    let wallet_id = request.wallet_id;
    let outcome = state
        .wallets
        .operate(WalletOperation {
            wallet_id,
            kind,
            amount: request.amount,
        })
        .await
        .map_err(|err| ApiError::wallet(err, wallet_id))?;

    Ok(Json(OperationResponse {
        wallet_id: outcome.wallet_id,
        operation_type: outcome.kind,
        balance: outcome.balance,
        currency: outcome.currency,
    }))
}

/// GET `/wallets/{wallet_id}` - Current balance of a wallet.
async fn get_wallet(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let wallet_id: WalletId = wallet_id
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid wallet ID: {wallet_id}")))?;

    let balance = state
        .wallets
        .balance(wallet_id)
        .await
        .map_err(|err| ApiError::wallet(err, wallet_id))?;

    Ok(Json(BalanceResponse {
        wallet_id: balance.wallet_id,
        balance: balance.balance,
        currency: balance.currency,
    }))
}
