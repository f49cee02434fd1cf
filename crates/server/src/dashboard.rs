use api_types::dashboard::DashboardView;
use axum::{Extension, Json, extract::State};
use engine::users;

use crate::{ServerError, server::ServerState, views};

pub async fn stats(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<DashboardView>, ServerError> {
    let stats = state.engine.dashboard_stats(&user.username).await?;
    Ok(Json(views::dashboard(stats)))
}
