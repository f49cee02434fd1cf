use sea_orm::{Condition, QueryFilter, QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    ApprovalSlip, Attachment, CreateExpenseCmd, EngineError, ExpenseListFilter, ExpenseRequest,
    ExpenseStatus, FileUpload, GroupRole, ResultEngine, approval_slips, attachments, expenses,
    group_roles,
    util::{normalize_optional_text, normalize_required_text, parse_uuid},
};

use super::Engine;

/// An expense with everything uploaded against it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDetail {
    pub expense: ExpenseRequest,
    pub attachments: Vec<Attachment>,
    pub slips: Vec<ApprovalSlip>,
}

impl Engine {
    /// Submits a new expense request in `cmd.group_id`.
    ///
    /// A direct record is stored already approved by its requester and is
    /// never settled against any wallet.
    pub async fn create_expense(&self, cmd: CreateExpenseCmd) -> ResultEngine<ExpenseRequest> {
        let CreateExpenseCmd {
            user_id,
            group_id,
            title,
            category,
            amount_minor,
            description,
            target_approver_id,
            direct_record,
        } = cmd;

        let title = normalize_required_text(&title, "title")?;
        let category = normalize_required_text(&category, "category")?;
        let description = normalize_optional_text(description.as_deref());
        let target_approver_id = normalize_optional_text(target_approver_id.as_deref());

        self.require_group(&self.database, group_id).await?;
        self.require_member(&user_id, group_id).await?;
        if let Some(target) = target_approver_id.as_deref() {
            if !self.oracle.is_member(target, group_id).await? {
                return Err(EngineError::InvalidArgument(format!(
                    "target approver {target} is not a member of this group"
                )));
            }
            if !self.oracle.has_role(target, group_id, GroupRole::DECIDERS).await? {
                return Err(EngineError::InvalidArgument(format!(
                    "target approver {target} cannot approve in this group"
                )));
            }
        }

        let mut expense = ExpenseRequest::new(
            group_id,
            &user_id,
            title,
            category,
            amount_minor,
            description,
            target_approver_id,
        )?;
        if direct_record {
            expense.record_directly();
        }

        expenses::ActiveModel::from(&expense)
            .insert(&self.database)
            .await?;

        if direct_record {
            info!(
                expense_id = %expense.id,
                requester = %user_id,
                "expense recorded directly; no wallet settlement"
            );
        } else {
            info!(expense_id = %expense.id, requester = %user_id, "expense submitted");
        }
        Ok(expense)
    }

    /// An expense with its attachments and slips, for any member of its group.
    pub async fn expense(&self, user_id: &str, expense_id: &str) -> ResultEngine<ExpenseDetail> {
        let expense_id = parse_uuid(expense_id, "expense")?;
        let expense = self.require_expense(&self.database, expense_id).await?;
        self.require_member(user_id, expense.group_id).await?;

        let attachments = attachments::Entity::find()
            .filter(attachments::Column::ExpenseId.eq(expense_id.to_string()))
            .order_by_asc(attachments::Column::UploadedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Attachment::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        let slips = approval_slips::Entity::find()
            .filter(approval_slips::Column::ExpenseId.eq(expense_id.to_string()))
            .order_by_asc(approval_slips::Column::UploadedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(ApprovalSlip::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(ExpenseDetail {
            expense,
            attachments,
            slips,
        })
    }

    /// The caller's own requests, newest first.
    pub async fn list_expenses(
        &self,
        user_id: &str,
        filter: &ExpenseListFilter,
    ) -> ResultEngine<Vec<ExpenseRequest>> {
        let mut query =
            expenses::Entity::find().filter(expenses::Column::RequesterId.eq(user_id.to_string()));
        if let Some(status) = filter.status {
            query = query.filter(expenses::Column::Status.eq(status.as_str()));
        }
        if let Some(group_id) = filter.group_id {
            query = query.filter(expenses::Column::GroupId.eq(group_id.to_string()));
        }
        query
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(ExpenseRequest::try_from)
            .collect()
    }

    /// Pending requests the caller could decide on: groups where they hold a
    /// deciding role, minus requests designated to somebody else.
    pub async fn list_pending_approvals(
        &self,
        user_id: &str,
    ) -> ResultEngine<Vec<ExpenseRequest>> {
        let group_ids: Vec<String> = group_roles::Entity::find()
            .filter(group_roles::Column::UserId.eq(user_id.to_string()))
            .filter(group_roles::Column::Role.is_in(GroupRole::DECIDERS.iter().map(|r| r.as_str())))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|row| row.group_id)
            .collect();
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        expenses::Entity::find()
            .filter(expenses::Column::GroupId.is_in(group_ids))
            .filter(expenses::Column::Status.eq(ExpenseStatus::Pending.as_str()))
            .filter(
                Condition::any()
                    .add(expenses::Column::TargetApproverId.is_null())
                    .add(expenses::Column::TargetApproverId.eq(user_id.to_string())),
            )
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(ExpenseRequest::try_from)
            .collect()
    }

    /// Stores a receipt against an expense. Any group member may attach;
    /// the expense status is untouched.
    pub async fn attach_receipt(
        &self,
        user_id: &str,
        expense_id: &str,
        upload: FileUpload,
    ) -> ResultEngine<Attachment> {
        let expense_id = parse_uuid(expense_id, "expense")?;
        let expense = self.require_expense(&self.database, expense_id).await?;
        self.require_member(user_id, expense.group_id).await?;
        if upload.bytes.is_empty() {
            return Err(EngineError::InvalidArgument("file is empty".to_string()));
        }

        let stored = self
            .storage
            .store(&upload.bytes, &upload.file_name)
            .await?;
        let attachment = Attachment::new(
            expense.id,
            upload.file_name,
            upload.content_type,
            &stored,
            user_id,
        );
        attachments::ActiveModel::from(&attachment)
            .insert(&self.database)
            .await?;
        Ok(attachment)
    }
}
