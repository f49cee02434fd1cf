//! Expense requests.
//!
//! An `ExpenseRequest` is created `pending` (or directly `approved` for
//! self-recorded entries) and moves out of `pending` exactly once. Both
//! `approved` and `rejected` are terminal.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// `approved` and `rejected` have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<&str> for ExpenseStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid expense status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRequest {
    pub id: Uuid,
    pub group_id: Uuid,
    pub requester_id: String,
    pub title: String,
    pub category: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub status: ExpenseStatus,
    /// When set, only this user may approve or reject.
    pub target_approver_id: Option<String>,
    /// Who approved or rejected.
    pub approver_id: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpenseRequest {
    pub fn new(
        group_id: Uuid,
        requester_id: &str,
        title: String,
        category: String,
        amount_minor: i64,
        description: Option<String>,
        target_approver_id: Option<String>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidArgument(
                "amount_minor must be > 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            requester_id: requester_id.to_string(),
            title,
            category,
            amount_minor,
            description,
            status: ExpenseStatus::Pending,
            target_approver_id,
            approver_id: None,
            acted_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Turns a fresh request into a self-recorded entry: approved at creation,
    /// with the requester as its own approver.
    pub fn record_directly(&mut self) {
        self.status = ExpenseStatus::Approved;
        self.approver_id = Some(self.requester_id.clone());
        self.acted_at = Some(self.created_at);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub requester_id: String,
    pub title: String,
    pub category: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub status: String,
    pub target_approver_id: Option<String>,
    pub approver_id: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Groups,
    #[sea_orm(has_many = "super::approval_slips::Entity")]
    ApprovalSlips,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::approval_slips::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalSlips.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ExpenseRequest> for ActiveModel {
    fn from(expense: &ExpenseRequest) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            group_id: ActiveValue::Set(expense.group_id.to_string()),
            requester_id: ActiveValue::Set(expense.requester_id.clone()),
            title: ActiveValue::Set(expense.title.clone()),
            category: ActiveValue::Set(expense.category.clone()),
            amount_minor: ActiveValue::Set(expense.amount_minor),
            description: ActiveValue::Set(expense.description.clone()),
            status: ActiveValue::Set(expense.status.as_str().to_string()),
            target_approver_id: ActiveValue::Set(expense.target_approver_id.clone()),
            approver_id: ActiveValue::Set(expense.approver_id.clone()),
            acted_at: ActiveValue::Set(expense.acted_at),
            rejection_reason: ActiveValue::Set(expense.rejection_reason.clone()),
            created_at: ActiveValue::Set(expense.created_at),
            updated_at: ActiveValue::Set(expense.updated_at),
        }
    }
}

impl TryFrom<Model> for ExpenseRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            requester_id: model.requester_id,
            title: model.title,
            category: model.category,
            amount_minor: model.amount_minor,
            description: model.description,
            status: ExpenseStatus::try_from(model.status.as_str())?,
            target_approver_id: model.target_approver_id,
            approver_id: model.approver_id,
            acted_at: model.acted_at,
            rejection_reason: model.rejection_reason,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(amount_minor: i64) -> ResultEngine<ExpenseRequest> {
        ExpenseRequest::new(
            Uuid::new_v4(),
            "alice",
            "Taxi".to_string(),
            "travel".to_string(),
            amount_minor,
            None,
            None,
        )
    }

    #[test]
    fn new_expense_is_pending() {
        let expense = expense(100_00).unwrap();
        assert_eq!(expense.status, ExpenseStatus::Pending);
        assert!(expense.approver_id.is_none());
        assert!(!expense.status.is_terminal());
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        assert!(matches!(expense(0), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(expense(-5), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn direct_record_self_approves() {
        let mut expense = expense(250).unwrap();
        expense.record_directly();
        assert_eq!(expense.status, ExpenseStatus::Approved);
        assert_eq!(expense.approver_id.as_deref(), Some("alice"));
        assert_eq!(expense.acted_at, Some(expense.created_at));
        assert!(expense.status.is_terminal());
    }

    #[test]
    fn status_round_trips_through_storage_name() {
        for status in [
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
        ] {
            assert_eq!(ExpenseStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(ExpenseStatus::try_from("voided").is_err());
    }
}
