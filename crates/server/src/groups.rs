//! Expense group endpoints.

use api_types::group::{
    GroupJoin, GroupNew, GroupRole, GroupSummaryView, GroupUpdate, GroupView, InvitePreview,
    MembersResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{UpdateGroupCmd, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let group = state
        .engine
        .create_group(&user.username, &payload.name, payload.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(views::group(group))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GroupSummaryView>>, ServerError> {
    let groups = state.engine.list_groups(&user.username).await?;
    Ok(Json(groups.into_iter().map(views::group_summary).collect()))
}

pub async fn join(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupJoin>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state
        .engine
        .join_group(&user.username, &payload.invite_code)
        .await?;
    Ok(Json(views::group(group)))
}

pub async fn by_invite(
    _: Extension<users::Model>,
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<InvitePreview>, ServerError> {
    let summary = state.engine.group_by_invite(&code).await?;
    Ok(Json(InvitePreview {
        id: summary.group.id,
        name: summary.group.name,
        description: summary.group.description,
        member_count: summary.member_count,
    }))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GroupUpdate>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state
        .engine
        .update_group(
            &user.username,
            id,
            UpdateGroupCmd {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;
    Ok(Json(views::group(group)))
}

pub async fn members(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state.engine.group_members(&user.username, id).await?;
    Ok(Json(MembersResponse {
        members: members.into_iter().map(views::member).collect(),
    }))
}

pub async fn grant_role(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, username, role)): Path<(Uuid, String, GroupRole)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .set_member_role(&user.username, id, &username, views::engine_role(role))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_role(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, username, role)): Path<(Uuid, String, GroupRole)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .revoke_member_role(&user.username, id, &username, views::engine_role(role))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_member(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, username)): Path<(Uuid, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(&user.username, id, &username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
