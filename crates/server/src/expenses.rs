//! Expense request endpoints (requester side).

use api_types::expense::{
    AttachmentView, ExpenseDetailView, ExpenseList, ExpenseListResponse, ExpenseNew, ExpenseView,
};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use engine::{CreateExpenseCmd, ExpenseListFilter, users};

use crate::{ServerError, server::ServerState, upload, views};

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let cmd = CreateExpenseCmd {
        user_id: user.username,
        group_id: payload.group_id,
        title: payload.title,
        category: payload.category,
        amount_minor: payload.amount_minor,
        description: payload.description,
        target_approver_id: payload.target_approver_id,
        direct_record: payload.direct_record,
    };
    let expense = state.engine.create_expense(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::expense(expense))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseList>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let filter = ExpenseListFilter {
        status: query.status.map(views::engine_status),
        group_id: query.group_id,
    };
    let expenses = state.engine.list_expenses(&user.username, &filter).await?;
    Ok(Json(ExpenseListResponse {
        expenses: expenses.into_iter().map(views::expense).collect(),
    }))
}

pub async fn detail(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ExpenseDetailView>, ServerError> {
    let detail = state.engine.expense(&user.username, &id).await?;
    Ok(Json(views::expense_detail(detail)))
}

pub async fn attach(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AttachmentView>), ServerError> {
    let form = upload::read_form(multipart).await?;
    let file = form
        .file
        .ok_or_else(|| ServerError::Generic("missing file part".to_string()))?;
    let attachment = state
        .engine
        .attach_receipt(&user.username, &id, file)
        .await?;
    Ok((StatusCode::CREATED, Json(views::attachment(attachment))))
}
