//! Engine types to wire DTOs.

use api_types::{
    approval::ApprovalView,
    dashboard::{CategoryView, DashboardView, MonthView},
    expense::{AttachmentView, ExpenseDetailView, ExpenseStatus, ExpenseView, SlipView},
    group::{GroupRole, GroupSummaryView, GroupView, MemberView},
    wallet::{ReconciliationView, TransactionView, WalletTxKind},
};

pub(crate) fn role(role: engine::GroupRole) -> GroupRole {
    match role {
        engine::GroupRole::Admin => GroupRole::Admin,
        engine::GroupRole::Approver => GroupRole::Approver,
        engine::GroupRole::Requester => GroupRole::Requester,
    }
}

pub(crate) fn engine_role(role: GroupRole) -> engine::GroupRole {
    match role {
        GroupRole::Admin => engine::GroupRole::Admin,
        GroupRole::Approver => engine::GroupRole::Approver,
        GroupRole::Requester => engine::GroupRole::Requester,
    }
}

pub(crate) fn status(status: engine::ExpenseStatus) -> ExpenseStatus {
    match status {
        engine::ExpenseStatus::Pending => ExpenseStatus::Pending,
        engine::ExpenseStatus::Approved => ExpenseStatus::Approved,
        engine::ExpenseStatus::Rejected => ExpenseStatus::Rejected,
    }
}

pub(crate) fn engine_status(status: ExpenseStatus) -> engine::ExpenseStatus {
    match status {
        ExpenseStatus::Pending => engine::ExpenseStatus::Pending,
        ExpenseStatus::Approved => engine::ExpenseStatus::Approved,
        ExpenseStatus::Rejected => engine::ExpenseStatus::Rejected,
    }
}

pub(crate) fn engine_tx_kind(kind: WalletTxKind) -> engine::WalletTxKind {
    match kind {
        WalletTxKind::Credit => engine::WalletTxKind::Credit,
        WalletTxKind::Debit => engine::WalletTxKind::Debit,
    }
}

pub(crate) fn group(group: engine::Group) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name,
        description: group.description,
        invite_code: group.invite_code,
        created_by: group.created_by,
        created_at: group.created_at,
        updated_at: group.updated_at,
    }
}

pub(crate) fn group_summary(summary: engine::GroupSummary) -> GroupSummaryView {
    GroupSummaryView {
        group: group(summary.group),
        member_count: summary.member_count,
    }
}

pub(crate) fn member(member: engine::GroupMember) -> MemberView {
    MemberView {
        username: member.username,
        full_name: member.full_name,
        joined_at: member.joined_at,
        roles: member.roles.into_iter().map(role).collect(),
    }
}

pub(crate) fn expense(expense: engine::ExpenseRequest) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        group_id: expense.group_id,
        requester_id: expense.requester_id,
        title: expense.title,
        category: expense.category,
        amount_minor: expense.amount_minor,
        description: expense.description,
        status: status(expense.status),
        target_approver_id: expense.target_approver_id,
        approver_id: expense.approver_id,
        acted_at: expense.acted_at,
        rejection_reason: expense.rejection_reason,
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

pub(crate) fn attachment(attachment: engine::Attachment) -> AttachmentView {
    AttachmentView {
        id: attachment.id,
        file_name: attachment.file_name,
        file_ref: attachment.file_ref,
        file_size: attachment.file_size,
        content_type: attachment.content_type,
        uploaded_by: attachment.uploaded_by,
        uploaded_at: attachment.uploaded_at,
    }
}

pub(crate) fn slip(slip: engine::ApprovalSlip) -> SlipView {
    SlipView {
        id: slip.id,
        file_name: slip.file_name,
        file_ref: slip.file_ref,
        file_size: slip.file_size,
        content_type: slip.content_type,
        notes: slip.notes,
        is_verified: slip.is_verified,
        verification_payload: slip.verification_payload,
        uploaded_by: slip.uploaded_by,
        uploaded_at: slip.uploaded_at,
    }
}

pub(crate) fn expense_detail(detail: engine::ExpenseDetail) -> ExpenseDetailView {
    ExpenseDetailView {
        expense: expense(detail.expense),
        attachments: detail.attachments.into_iter().map(attachment).collect(),
        slips: detail.slips.into_iter().map(slip).collect(),
    }
}

pub(crate) fn approval(outcome: engine::ApprovalOutcome) -> ApprovalView {
    ApprovalView {
        expense: expense(outcome.expense),
        slip: outcome.slip.map(slip),
    }
}

pub(crate) fn transaction(tx: engine::WalletTransaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: match tx.kind {
            engine::WalletTxKind::Credit => WalletTxKind::Credit,
            engine::WalletTxKind::Debit => WalletTxKind::Debit,
        },
        amount_minor: tx.amount_minor,
        description: tx.description,
        expense_id: tx.expense_id,
        created_at: tx.created_at,
    }
}

pub(crate) fn reconciliation(rec: engine::Reconciliation) -> ReconciliationView {
    ReconciliationView {
        balance_minor: rec.balance_minor,
        ledger_sum_minor: rec.ledger_sum_minor,
        consistent: rec.consistent,
    }
}

pub(crate) fn dashboard(stats: engine::DashboardStats) -> DashboardView {
    DashboardView {
        total_expenses: stats.total_expenses,
        pending_count: stats.by_status.pending,
        approved_count: stats.by_status.approved,
        rejected_count: stats.by_status.rejected,
        total_amount_minor: stats.total_amount_minor,
        categories: stats
            .categories
            .into_iter()
            .map(|c| CategoryView {
                category: c.category,
                count: c.count,
                amount_minor: c.amount_minor,
            })
            .collect(),
        monthly: stats
            .monthly
            .into_iter()
            .map(|m| MonthView {
                month: m.month,
                amount_minor: m.amount_minor,
            })
            .collect(),
    }
}
