//! Wallet endpoints. Every call acts on the caller's own wallet.

use api_types::wallet::{
    ReconciliationView, Topup, TransactionList, TransactionListResponse, WalletView,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use engine::{WalletTransactionFilter, users};

use crate::{ServerError, server::ServerState, views};

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<WalletView>, ServerError> {
    let snapshot = state.engine.wallet(&user.username).await?;
    Ok(Json(WalletView {
        balance_minor: snapshot.balance_minor,
    }))
}

pub async fn topup(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<Topup>,
) -> Result<Json<WalletView>, ServerError> {
    let snapshot = state
        .engine
        .topup(&user.username, payload.amount_minor)
        .await?;
    Ok(Json(WalletView {
        balance_minor: snapshot.balance_minor,
    }))
}

pub async fn transactions(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = WalletTransactionFilter {
        kind: query.kind.map(views::engine_tx_kind),
        from: query.from,
        to: query.to,
    };
    let lines = state
        .engine
        .wallet_transactions(&user.username, &filter)
        .await?;
    Ok(Json(TransactionListResponse {
        transactions: lines.into_iter().map(views::transaction).collect(),
    }))
}

pub async fn reconcile(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ReconciliationView>, ServerError> {
    let reconciliation = state.engine.reconcile_wallet(&user.username).await?;
    Ok(Json(views::reconciliation(reconciliation)))
}
