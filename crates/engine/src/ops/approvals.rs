use chrono::Utc;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    ApprovalSlip, ApproveCmd, EngineError, ExpenseRequest, ExpenseStatus, FileUpload, GroupRole,
    RejectCmd, ResultEngine, approval_slips, expenses,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

/// Result of a successful approval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub expense: ExpenseRequest,
    pub slip: Option<ApprovalSlip>,
}

impl Engine {
    /// Loads the expense and runs the shared decision gate for `actor`.
    ///
    /// The pending check here only short-circuits obvious cases; the status
    /// that counts is re-checked by the conditional update.
    async fn authorize_decision_on(
        &self,
        actor: &str,
        expense_id: Uuid,
    ) -> ResultEngine<ExpenseRequest> {
        let expense = self.require_expense(&self.database, expense_id).await?;
        self.authorize(
            actor,
            expense.group_id,
            GroupRole::DECIDERS,
            expense.target_approver_id.as_deref(),
        )
        .await?;
        if expense.status.is_terminal() {
            return Err(already_decided(&expense));
        }
        Ok(expense)
    }

    /// Stores the slip and asks the verifier about it.
    ///
    /// Returns `None` when the file cannot be stored; the approval goes on
    /// without a slip. Verifier failures only leave the slip unverified.
    async fn prepare_slip(
        &self,
        expense: &ExpenseRequest,
        upload: FileUpload,
        notes: Option<String>,
        actor: &str,
    ) -> Option<ApprovalSlip> {
        let stored = match self.storage.store(&upload.bytes, &upload.file_name).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(expense_id = %expense.id, error = %err, "failed to store slip, approving without it");
                return None;
            }
        };
        let verdict = match self.verifier.verify(&stored).await {
            Ok(verdict) => {
                if !verdict.accepted {
                    warn!(expense_id = %expense.id, "slip rejected by verifier");
                }
                Some(verdict)
            }
            Err(err) => {
                warn!(expense_id = %expense.id, error = %err, "slip verification unavailable");
                None
            }
        };
        Some(ApprovalSlip::new(
            expense.id,
            upload.file_name,
            upload.content_type,
            notes,
            &stored,
            verdict,
            actor,
        ))
    }

    /// Approves a pending expense and debits the approver's wallet.
    ///
    /// The status change, the slip row and the debit commit together. Of two
    /// concurrent approvals only the one whose conditional update matches a
    /// `pending` row proceeds; the other gets `Conflict` and leaves nothing
    /// behind except its stored file.
    pub async fn approve_expense(&self, cmd: ApproveCmd) -> ResultEngine<ApprovalOutcome> {
        let ApproveCmd {
            user_id,
            expense_id,
            slip,
            notes,
        } = cmd;
        let expense = self.authorize_decision_on(&user_id, expense_id).await?;

        let notes = normalize_optional_text(notes.as_deref());
        let slip = match slip.filter(|upload| !upload.bytes.is_empty()) {
            Some(upload) => self.prepare_slip(&expense, upload, notes, &user_id).await,
            None => None,
        };

        let now = Utc::now();
        let outcome: ResultEngine<ApprovalOutcome> = with_tx!(self, |db_tx| {
            let updated = expenses::Entity::update_many()
                .col_expr(
                    expenses::Column::Status,
                    Expr::value(ExpenseStatus::Approved.as_str()),
                )
                .col_expr(expenses::Column::ApproverId, Expr::value(user_id.clone()))
                .col_expr(expenses::Column::ActedAt, Expr::value(now))
                .col_expr(expenses::Column::UpdatedAt, Expr::value(now))
                .filter(expenses::Column::Id.eq(expense_id.to_string()))
                .filter(expenses::Column::Status.eq(ExpenseStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;
            if updated.rows_affected == 0 {
                let current = self.require_expense(&db_tx, expense_id).await?;
                return Err(already_decided(&current));
            }

            if let Some(slip) = &slip {
                approval_slips::ActiveModel::try_from(slip)?
                    .insert(&db_tx)
                    .await?;
            }

            self.settle(
                &db_tx,
                &user_id,
                expense.amount_minor,
                expense.id,
                format!("Approved expense: {}", expense.title),
            )
            .await?;

            let expense = self.require_expense(&db_tx, expense_id).await?;
            Ok(ApprovalOutcome { expense, slip })
        });

        let outcome = outcome?;
        info!(
            expense_id = %expense_id,
            approver = %user_id,
            amount_minor = outcome.expense.amount_minor,
            verified = outcome.slip.as_ref().is_some_and(|s| s.is_verified),
            "expense approved"
        );
        Ok(outcome)
    }

    /// Rejects a pending expense. No wallet effect, no slip.
    pub async fn reject_expense(&self, cmd: RejectCmd) -> ResultEngine<ExpenseRequest> {
        let RejectCmd {
            user_id,
            expense_id,
            reason,
        } = cmd;
        let reason = normalize_optional_text(reason.as_deref());
        self.authorize_decision_on(&user_id, expense_id).await?;

        let now = Utc::now();
        let rejected: ResultEngine<ExpenseRequest> = with_tx!(self, |db_tx| {
            let updated = expenses::Entity::update_many()
                .col_expr(
                    expenses::Column::Status,
                    Expr::value(ExpenseStatus::Rejected.as_str()),
                )
                .col_expr(expenses::Column::ApproverId, Expr::value(user_id.clone()))
                .col_expr(expenses::Column::ActedAt, Expr::value(now))
                .col_expr(expenses::Column::RejectionReason, Expr::value(reason.clone()))
                .col_expr(expenses::Column::UpdatedAt, Expr::value(now))
                .filter(expenses::Column::Id.eq(expense_id.to_string()))
                .filter(expenses::Column::Status.eq(ExpenseStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;
            if updated.rows_affected == 0 {
                let current = self.require_expense(&db_tx, expense_id).await?;
                return Err(already_decided(&current));
            }
            self.require_expense(&db_tx, expense_id).await
        });

        let expense = rejected?;
        info!(expense_id = %expense_id, approver = %user_id, "expense rejected");
        Ok(expense)
    }
}

fn already_decided(expense: &ExpenseRequest) -> EngineError {
    EngineError::Conflict(format!("expense is already {}", expense.status.as_str()))
}
