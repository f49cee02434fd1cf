use sea_orm::{
    ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, WalletTransaction, WalletTransactionFilter, WalletTxKind, users,
    util::require_positive_amount, wallet_transactions,
};

use super::{Engine, with_tx};

/// Current balance of a user's wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub user_id: String,
    pub balance_minor: i64,
}

/// Stored balance next to the balance recomputed from the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub user_id: String,
    pub balance_minor: i64,
    pub ledger_sum_minor: i64,
    pub consistent: bool,
}

impl Engine {
    /// Moves `amount_minor` in or out of `user_id`'s wallet and appends the
    /// matching ledger line. Runs on the caller's transaction only.
    ///
    /// Debits have no floor: a balance may go negative.
    pub(super) async fn post_wallet_entry(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        kind: WalletTxKind,
        amount_minor: i64,
        description: String,
        expense_id: Option<Uuid>,
    ) -> ResultEngine<WalletTransaction> {
        let line = WalletTransaction::new(user_id, kind, amount_minor, description, expense_id)?;

        let balance = Expr::col(users::Column::WalletBalance);
        let new_balance = match kind {
            WalletTxKind::Credit => balance.add(amount_minor),
            WalletTxKind::Debit => balance.sub(amount_minor),
        };
        let updated = users::Entity::update_many()
            .col_expr(users::Column::WalletBalance, new_balance)
            .filter(users::Column::Username.eq(user_id.to_string()))
            .exec(db_tx)
            .await?;
        if updated.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }

        wallet_transactions::ActiveModel::from(&line)
            .insert(db_tx)
            .await?;
        Ok(line)
    }

    /// Debits the approver for an approved expense.
    pub(super) async fn settle(
        &self,
        db_tx: &DatabaseTransaction,
        approver_id: &str,
        amount_minor: i64,
        expense_id: Uuid,
        description: String,
    ) -> ResultEngine<WalletTransaction> {
        self.post_wallet_entry(
            db_tx,
            approver_id,
            WalletTxKind::Debit,
            amount_minor,
            description,
            Some(expense_id),
        )
        .await
    }

    /// Credits the caller's own wallet.
    pub async fn topup(&self, user_id: &str, amount_minor: i64) -> ResultEngine<WalletSnapshot> {
        require_positive_amount(amount_minor)?;
        with_tx!(self, |db_tx| {
            self.post_wallet_entry(
                &db_tx,
                user_id,
                WalletTxKind::Credit,
                amount_minor,
                "Wallet top-up".to_string(),
                None,
            )
            .await?;
            self.snapshot(&db_tx, user_id).await
        })
    }

    pub async fn wallet(&self, user_id: &str) -> ResultEngine<WalletSnapshot> {
        self.snapshot(&self.database, user_id).await
    }

    async fn snapshot<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<WalletSnapshot> {
        let user = self.require_user_exists(db, user_id).await?;
        Ok(WalletSnapshot {
            user_id: user.username,
            balance_minor: user.wallet_balance,
        })
    }

    /// The caller's ledger, newest first.
    pub async fn wallet_transactions(
        &self,
        user_id: &str,
        filter: &WalletTransactionFilter,
    ) -> ResultEngine<Vec<WalletTransaction>> {
        filter.validate()?;
        let mut query = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::UserId.eq(user_id.to_string()));
        if let Some(kind) = filter.kind {
            query = query.filter(wallet_transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(wallet_transactions::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(wallet_transactions::Column::CreatedAt.lt(to));
        }
        query
            .order_by_desc(wallet_transactions::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(WalletTransaction::try_from)
            .collect()
    }

    /// Recomputes credits minus debits and compares with the stored balance.
    ///
    /// Balance and ledger are read in one transaction so a concurrent
    /// settlement cannot split them.
    pub async fn reconcile_wallet(&self, user_id: &str) -> ResultEngine<Reconciliation> {
        let db_tx = self.database.begin().await?;
        let snapshot = self.snapshot(&db_tx, user_id).await?;
        let lines = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::UserId.eq(user_id.to_string()))
            .all(&db_tx)
            .await?;
        db_tx.commit().await?;

        let entries = lines
            .iter()
            .map(|line| Ok((WalletTxKind::try_from(line.kind.as_str())?, line.amount_minor)))
            .collect::<ResultEngine<Vec<_>>>()?;
        let ledger_sum_minor = ledger_sum(&entries)?;
        Ok(Reconciliation {
            user_id: snapshot.user_id,
            balance_minor: snapshot.balance_minor,
            ledger_sum_minor,
            consistent: ledger_sum_minor == snapshot.balance_minor,
        })
    }
}

/// Credits minus debits. Overflow is an error, never a wrapped value.
fn ledger_sum(entries: &[(WalletTxKind, i64)]) -> ResultEngine<i64> {
    let overflow = || EngineError::InvalidArgument("ledger sum out of range".to_string());
    entries.iter().try_fold(0i64, |total, (kind, amount_minor)| {
        kind.signed(*amount_minor)
            .and_then(|signed| total.checked_add(signed))
            .ok_or_else(overflow)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_sum_nets_credits_and_debits() {
        let entries = [
            (WalletTxKind::Credit, 500),
            (WalletTxKind::Debit, 120),
            (WalletTxKind::Debit, 400),
        ];
        assert_eq!(ledger_sum(&entries), Ok(-20));
        assert_eq!(ledger_sum(&[]), Ok(0));
    }

    #[test]
    fn ledger_sum_overflow_is_an_error() {
        let entries = [(WalletTxKind::Credit, i64::MAX), (WalletTxKind::Credit, 1)];
        assert_eq!(
            ledger_sum(&entries),
            Err(EngineError::InvalidArgument(
                "ledger sum out of range".to_string()
            ))
        );

        let entries = [(WalletTxKind::Debit, i64::MAX), (WalletTxKind::Debit, 2)];
        assert!(ledger_sum(&entries).is_err());
    }
}
