//! Approver endpoints.

use api_types::{
    approval::{ApprovalView, Reject},
    expense::{ExpenseListResponse, ExpenseView},
};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
};
use engine::{ApproveCmd, RejectCmd, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, upload, views};

pub async fn pending(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let expenses = state.engine.list_pending_approvals(&user.username).await?;
    Ok(Json(ExpenseListResponse {
        expenses: expenses.into_iter().map(views::expense).collect(),
    }))
}

/// Multipart body: optional `file` (payment slip) and optional `notes`.
/// A request without a multipart body approves with neither.
pub async fn approve(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApprovalView>, ServerError> {
    let mut form = match multipart {
        Ok(multipart) => upload::read_form(multipart).await?,
        Err(_) => upload::UploadForm::default(),
    };
    let cmd = ApproveCmd {
        user_id: user.username,
        expense_id: id,
        slip: form.file,
        notes: form.fields.remove("notes"),
    };
    let outcome = state.engine.approve_expense(cmd).await?;
    Ok(Json(views::approval(outcome)))
}

pub async fn reject(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Reject>,
) -> Result<Json<ExpenseView>, ServerError> {
    let cmd = RejectCmd {
        user_id: user.username,
        expense_id: id,
        reason: payload.reason,
    };
    let expense = state.engine.reject_expense(cmd).await?;
    Ok(Json(views::expense(expense)))
}
