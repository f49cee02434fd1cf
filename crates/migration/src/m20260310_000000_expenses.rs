//! Expense lifecycle and wallet ledger tables.
//!
//! - `expense_requests`: spending claims and their approval state
//! - `expense_attachments`: receipts uploaded by requesters
//! - `approval_slips`: payment slips uploaded at approval time
//! - `wallet_transactions`: append-only ledger behind `users.wallet_balance`

use sea_orm_migration::prelude::*;

use crate::m20260301_000000_init::{ExpenseGroups, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ExpenseRequests {
    Table,
    Id,
    GroupId,
    RequesterId,
    Title,
    Category,
    AmountMinor,
    Description,
    Status,
    TargetApproverId,
    ApproverId,
    ActedAt,
    RejectionReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ExpenseAttachments {
    Table,
    Id,
    ExpenseId,
    FileName,
    FileRef,
    FileSize,
    ContentType,
    UploadedBy,
    UploadedAt,
}

#[derive(Iden)]
enum ApprovalSlips {
    Table,
    Id,
    ExpenseId,
    FileName,
    FileRef,
    FileSize,
    ContentType,
    Notes,
    IsVerified,
    VerificationPayload,
    UploadedBy,
    UploadedAt,
}

#[derive(Iden)]
enum WalletTransactions {
    Table,
    Id,
    UserId,
    Kind,
    AmountMinor,
    Description,
    ExpenseId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExpenseRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseRequests::GroupId).string().not_null())
                    .col(
                        ColumnDef::new(ExpenseRequests::RequesterId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpenseRequests::Title).string().not_null())
                    .col(ColumnDef::new(ExpenseRequests::Category).string().not_null())
                    .col(
                        ColumnDef::new(ExpenseRequests::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(ExpenseRequests::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(ExpenseRequests::Description).string())
                    .col(
                        ColumnDef::new(ExpenseRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ExpenseRequests::TargetApproverId).string())
                    .col(ColumnDef::new(ExpenseRequests::ApproverId).string())
                    .col(ColumnDef::new(ExpenseRequests::ActedAt).timestamp())
                    .col(ColumnDef::new(ExpenseRequests::RejectionReason).string())
                    .col(
                        ColumnDef::new(ExpenseRequests::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseRequests::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_requests-group_id")
                            .from(ExpenseRequests::Table, ExpenseRequests::GroupId)
                            .to(ExpenseGroups::Table, ExpenseGroups::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_requests-requester_id")
                            .from(ExpenseRequests::Table, ExpenseRequests::RequesterId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_requests-group_id-status")
                    .table(ExpenseRequests::Table)
                    .col(ExpenseRequests::GroupId)
                    .col(ExpenseRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_requests-requester_id")
                    .table(ExpenseRequests::Table)
                    .col(ExpenseRequests::RequesterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpenseAttachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseAttachments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExpenseAttachments::ExpenseId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseAttachments::FileName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpenseAttachments::FileRef).string().not_null())
                    .col(
                        ColumnDef::new(ExpenseAttachments::FileSize)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpenseAttachments::ContentType).string())
                    .col(
                        ColumnDef::new(ExpenseAttachments::UploadedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseAttachments::UploadedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_attachments-expense_id")
                            .from(ExpenseAttachments::Table, ExpenseAttachments::ExpenseId)
                            .to(ExpenseRequests::Table, ExpenseRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApprovalSlips::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalSlips::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApprovalSlips::ExpenseId).string().not_null())
                    .col(ColumnDef::new(ApprovalSlips::FileName).string().not_null())
                    .col(ColumnDef::new(ApprovalSlips::FileRef).string().not_null())
                    .col(
                        ColumnDef::new(ApprovalSlips::FileSize)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ApprovalSlips::ContentType).string())
                    .col(ColumnDef::new(ApprovalSlips::Notes).string())
                    .col(
                        ColumnDef::new(ApprovalSlips::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ApprovalSlips::VerificationPayload).text())
                    .col(ColumnDef::new(ApprovalSlips::UploadedBy).string().not_null())
                    .col(
                        ColumnDef::new(ApprovalSlips::UploadedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-approval_slips-expense_id")
                            .from(ApprovalSlips::Table, ApprovalSlips::ExpenseId)
                            .to(ExpenseRequests::Table, ExpenseRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WalletTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WalletTransactions::UserId).string().not_null())
                    .col(ColumnDef::new(WalletTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(WalletTransactions::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(WalletTransactions::AmountMinor).gt(0)),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletTransactions::ExpenseId).string())
                    .col(
                        ColumnDef::new(WalletTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_transactions-user_id")
                            .from(WalletTransactions::Table, WalletTransactions::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_transactions-expense_id")
                            .from(WalletTransactions::Table, WalletTransactions::ExpenseId)
                            .to(ExpenseRequests::Table, ExpenseRequests::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-user_id-created_at")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::UserId)
                    .col(WalletTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse creation order (FK dependencies).
        manager
            .drop_table(Table::drop().table(WalletTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalSlips::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseAttachments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseRequests::Table).to_owned())
            .await?;
        Ok(())
    }
}
