//! Wallet ledger.
//!
//! Rows are append-only. For every user, credits minus debits equals
//! `users.wallet_balance`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletTxKind {
    Credit,
    Debit,
}

impl WalletTxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }

    /// Effect on the balance of a positive `amount_minor`, `None` on overflow.
    pub fn signed(self, amount_minor: i64) -> Option<i64> {
        match self {
            Self::Credit => Some(amount_minor),
            Self::Debit => amount_minor.checked_neg(),
        }
    }
}

impl TryFrom<&str> for WalletTxKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid wallet transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: String,
    pub kind: WalletTxKind,
    /// Always positive; the sign comes from `kind`.
    pub amount_minor: i64,
    pub description: String,
    pub expense_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    pub fn new(
        user_id: &str,
        kind: WalletTxKind,
        amount_minor: i64,
        description: String,
        expense_id: Option<Uuid>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidArgument(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            kind,
            amount_minor,
            description,
            expense_id,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub description: String,
    pub expense_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&WalletTransaction> for ActiveModel {
    fn from(tx: &WalletTransaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            description: ActiveValue::Set(tx.description.clone()),
            expense_id: ActiveValue::Set(tx.expense_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for WalletTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet transaction")?,
            user_id: model.user_id,
            kind: WalletTxKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            description: model.description,
            expense_id: model
                .expense_id
                .as_deref()
                .map(|id| parse_uuid(id, "expense"))
                .transpose()?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_sign() {
        assert_eq!(WalletTxKind::Credit.signed(500), Some(500));
        assert_eq!(WalletTxKind::Debit.signed(500), Some(-500));
        assert_eq!(WalletTxKind::Debit.signed(i64::MIN), None);
    }

    #[test]
    fn ledger_lines_are_positive() {
        let err = WalletTransaction::new("alice", WalletTxKind::Credit, -5, String::new(), None);
        assert!(matches!(err, Err(EngineError::InvalidArgument(_))));
    }
}
