//! Command structs for engine operations.
//!
//! These types group parameters for the lifecycle writes
//! (create/approve/reject) and the list filters, keeping call sites readable
//! and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{ExpenseStatus, WalletTxKind, storage::FileUpload};

/// Submit a new expense request.
#[derive(Clone, Debug)]
pub struct CreateExpenseCmd {
    pub user_id: String,
    pub group_id: Uuid,
    pub title: String,
    pub category: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub target_approver_id: Option<String>,
    /// Record an already-settled spend: the request is created approved and
    /// never reaches an approver.
    pub direct_record: bool,
}

impl CreateExpenseCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        group_id: Uuid,
        title: impl Into<String>,
        category: impl Into<String>,
        amount_minor: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            group_id,
            title: title.into(),
            category: category.into(),
            amount_minor,
            description: None,
            target_approver_id: None,
            direct_record: false,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn target_approver(mut self, approver: impl Into<String>) -> Self {
        self.target_approver_id = Some(approver.into());
        self
    }

    #[must_use]
    pub fn direct_record(mut self, direct_record: bool) -> Self {
        self.direct_record = direct_record;
        self
    }
}

/// Approve a pending expense, optionally with a payment slip.
#[derive(Clone, Debug)]
pub struct ApproveCmd {
    pub user_id: String,
    pub expense_id: Uuid,
    pub slip: Option<FileUpload>,
    pub notes: Option<String>,
}

impl ApproveCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, expense_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            expense_id,
            slip: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn slip(mut self, slip: FileUpload) -> Self {
        self.slip = Some(slip);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Reject a pending expense.
#[derive(Clone, Debug)]
pub struct RejectCmd {
    pub user_id: String,
    pub expense_id: Uuid,
    pub reason: Option<String>,
}

impl RejectCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, expense_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            expense_id,
            reason: None,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Filters for the caller's own expense list.
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub status: Option<ExpenseStatus>,
    pub group_id: Option<Uuid>,
}

/// Filters for wallet history. `from` is inclusive, `to` exclusive.
#[derive(Clone, Debug, Default)]
pub struct WalletTransactionFilter {
    pub kind: Option<WalletTxKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl WalletTransactionFilter {
    pub(crate) fn validate(&self) -> crate::ResultEngine<()> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from >= to => Err(crate::EngineError::InvalidArgument(
                "from must be before to".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Partial update of a group's metadata.
#[derive(Clone, Debug, Default)]
pub struct UpdateGroupCmd {
    pub name: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
}
