//! Expense approval and wallet settlement engine.
//!
//! Group members submit [`ExpenseRequest`]s, approvers settle them against
//! their wallet, and every balance change is mirrored by an append-only
//! [`WalletTransaction`]. Collaborators (membership lookups, file storage,
//! slip verification) are traits so the [`Engine`] can be wired with doubles.

pub use approval_slips::ApprovalSlip;
pub use attachments::Attachment;
pub use commands::{
    ApproveCmd, CreateExpenseCmd, ExpenseListFilter, RejectCmd, UpdateGroupCmd,
    WalletTransactionFilter,
};
pub use error::{EngineError, ErrorKind};
pub use expenses::{ExpenseRequest, ExpenseStatus};
pub use groups::{Group, GroupMember, GroupRole, GroupSummary};
pub use ops::{
    ApprovalOutcome, CategoryStats, DashboardStats, Engine, EngineBuilder, ExpenseDetail,
    MonthStats, Reconciliation, StatusStats, WalletSnapshot, authorize_decision,
};
pub use oracle::{DbMembershipOracle, MembershipOracle};
pub use storage::{FileUpload, LocalDiskStorage, SlipStorage, StoredFile};
pub use verification::{
    DisabledVerifier, SLIPOK_DEFAULT_BASE_URL, SlipOkConfig, SlipOkVerifier, SlipVerifier,
    Verdict,
};
pub use wallet_transactions::{WalletTransaction, WalletTxKind};

mod approval_slips;
mod attachments;
mod commands;
mod error;
mod expenses;
mod group_members;
mod group_roles;
mod groups;
mod ops;
mod oracle;
mod storage;
pub mod users;
mod util;
mod verification;
mod wallet_transactions;

pub type ResultEngine<T> = Result<T, EngineError>;
