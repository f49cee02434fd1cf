use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use engine::{Engine, users};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{approvals, dashboard, expenses, groups, health, wallet};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolves the caller from HTTP Basic credentials and stores the user row
/// as a request extension.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<users::Model> = users::Entity::find()
        .filter(users::Column::Username.eq(auth_header.username()))
        .filter(users::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to resolve caller: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let authenticated = Router::new()
        .route("/groups", post(groups::create).get(groups::list))
        .route("/groups/join", post(groups::join))
        .route("/groups/invite/{code}", get(groups::by_invite))
        .route("/groups/{id}", patch(groups::update))
        .route("/groups/{id}/members", get(groups::members))
        .route(
            "/groups/{id}/members/{username}",
            delete(groups::remove_member),
        )
        .route(
            "/groups/{id}/members/{username}/roles/{role}",
            put(groups::grant_role).delete(groups::revoke_role),
        )
        .route("/expenses", post(expenses::create).get(expenses::list))
        .route("/expenses/{id}", get(expenses::detail))
        .route("/expenses/{id}/attachments", post(expenses::attach))
        .route("/approvals", get(approvals::pending))
        .route("/approvals/{id}/approve", post(approvals::approve))
        .route("/approvals/{id}/reject", post(approvals::reject))
        .route("/wallet", get(wallet::get))
        .route("/wallet/topup", post(wallet::topup))
        .route("/wallet/transactions", get(wallet::transactions))
        .route("/wallet/reconcile", get(wallet::reconcile))
        .route("/dashboard/stats", get(dashboard::stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/health", get(health::check))
        .merge(authenticated)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}
