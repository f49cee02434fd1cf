use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod group {
    use super::*;

    /// Role of a member inside an expense group.
    ///
    /// - `admin`: manages members and roles, and may decide on expenses.
    /// - `approver`: may approve or reject expenses.
    /// - `requester`: may submit expenses.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GroupRole {
        Admin,
        Approver,
        Requester,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupJoin {
        pub invite_code: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GroupUpdate {
        pub name: Option<String>,
        /// An empty string clears the description.
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub invite_code: String,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupSummaryView {
        #[serde(flatten)]
        pub group: GroupView,
        pub member_count: u64,
    }

    /// What a prospective member sees before joining.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvitePreview {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub member_count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub username: String,
        pub full_name: String,
        pub joined_at: DateTime<Utc>,
        pub roles: Vec<GroupRole>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ExpenseStatus {
        Pending,
        Approved,
        Rejected,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub group_id: Uuid,
        pub title: String,
        pub category: String,
        /// Amount in minor units (cents), > 0.
        pub amount_minor: i64,
        pub description: Option<String>,
        pub target_approver_id: Option<String>,
        /// Record an already-settled spend; skips approval.
        #[serde(default)]
        pub direct_record: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub status: Option<ExpenseStatus>,
        pub group_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub group_id: Uuid,
        pub requester_id: String,
        pub title: String,
        pub category: String,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub status: ExpenseStatus,
        pub target_approver_id: Option<String>,
        pub approver_id: Option<String>,
        pub acted_at: Option<DateTime<Utc>>,
        pub rejection_reason: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AttachmentView {
        pub id: Uuid,
        pub file_name: String,
        pub file_ref: String,
        pub file_size: i64,
        pub content_type: Option<String>,
        pub uploaded_by: String,
        pub uploaded_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SlipView {
        pub id: Uuid,
        pub file_name: String,
        pub file_ref: String,
        pub file_size: i64,
        pub content_type: Option<String>,
        pub notes: Option<String>,
        pub is_verified: bool,
        /// Verifier response, verbatim.
        pub verification_payload: Option<serde_json::Value>,
        pub uploaded_by: String,
        pub uploaded_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseDetailView {
        #[serde(flatten)]
        pub expense: ExpenseView,
        pub attachments: Vec<AttachmentView>,
        pub slips: Vec<SlipView>,
    }
}

pub mod approval {
    use super::*;
    use crate::expense::{ExpenseView, SlipView};

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct Reject {
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApprovalView {
        pub expense: ExpenseView,
        pub slip: Option<SlipView>,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WalletTxKind {
        Credit,
        Debit,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Topup {
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub balance_minor: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub kind: Option<WalletTxKind>,
        /// Inclusive lower bound (RFC3339).
        pub from: Option<DateTime<Utc>>,
        /// Exclusive upper bound (RFC3339).
        pub to: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: WalletTxKind,
        pub amount_minor: i64,
        pub description: String,
        pub expense_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconciliationView {
        pub balance_minor: i64,
        pub ledger_sum_minor: i64,
        pub consistent: bool,
    }
}

pub mod dashboard {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub category: String,
        pub count: u64,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthView {
        pub month: String,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardView {
        pub total_expenses: u64,
        pub pending_count: u64,
        pub approved_count: u64,
        pub rejected_count: u64,
        pub total_amount_minor: i64,
        pub categories: Vec<CategoryView>,
        pub monthly: Vec<MonthView>,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}
