use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};

pub use server::{ServerState, router, run_with_listener};

mod approvals;
mod dashboard;
mod expenses;
mod groups;
mod health;
mod server;
mod upload;
mod views;
mod wallet;

pub mod types {
    pub mod group {
        pub use api_types::group::{
            GroupJoin, GroupNew, GroupRole, GroupSummaryView, GroupUpdate, GroupView,
            InvitePreview, MemberView, MembersResponse,
        };
    }

    pub mod expense {
        pub use api_types::expense::{
            AttachmentView, ExpenseDetailView, ExpenseList, ExpenseListResponse, ExpenseNew,
            ExpenseStatus, ExpenseView, SlipView,
        };
    }

    pub mod approval {
        pub use api_types::approval::{ApprovalView, Reject};
    }

    pub mod wallet {
        pub use api_types::wallet::{
            ReconciliationView, Topup, TransactionList, TransactionListResponse,
            TransactionView, WalletTxKind, WalletView,
        };
    }

    pub mod dashboard {
        pub use api_types::dashboard::{CategoryView, DashboardView, MonthView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err.kind() {
        ErrorKind::InvalidArgument => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::UpstreamDegraded => StatusCode::BAD_GATEWAY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Storage(detail) => {
            tracing::error!("storage error: {detail}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => {
                let kind = err.kind().as_str().to_string();
                (
                    status_for_engine_error(&err),
                    ErrorBody {
                        error: message_for_engine_error(err),
                        kind,
                    },
                )
            }
            ServerError::Generic(error) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error,
                    kind: "bad_request".to_string(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
