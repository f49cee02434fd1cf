mod common;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, EntityTrait, PaginatorTrait};

use common::{Script, harness, trip_group};
use engine::{
    ApproveCmd, CreateExpenseCmd, EngineError, WalletTransactionFilter, WalletTxKind, users,
};

#[tokio::test]
async fn non_positive_topup_writes_nothing() {
    let h = harness(Script::Accept).await;

    for amount in [-5, 0] {
        let err = h.engine.topup("alice", amount).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    assert_eq!(h.engine.wallet("alice").await.unwrap().balance_minor, 0);
    let lines = engine::WalletTransactionFilter::default();
    assert!(
        h.engine
            .wallet_transactions("alice", &lines)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn topup_credits_balance_and_ledger() {
    let h = harness(Script::Accept).await;

    let snapshot = h.engine.topup("alice", 500).await.unwrap();
    assert_eq!(snapshot.balance_minor, 500);
    let snapshot = h.engine.topup("alice", 250).await.unwrap();
    assert_eq!(snapshot.balance_minor, 750);

    let lines = h
        .engine
        .wallet_transactions("alice", &WalletTransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.kind == WalletTxKind::Credit));
    assert!(lines.iter().all(|l| l.expense_id.is_none()));
}

#[tokio::test]
async fn topup_for_unknown_user_rolls_back() {
    let h = harness(Script::Accept).await;

    let err = h.engine.topup("nobody", 100).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert_eq!(
        engine::users::Entity::find().count(&h.db).await.unwrap(),
        4
    );
    let lines = h
        .engine
        .wallet_transactions("nobody", &WalletTransactionFilter::default())
        .await
        .unwrap();
    assert!(lines.is_empty());
}

#[tokio::test]
async fn balance_may_go_negative_and_stays_reconciled() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;

    h.engine.topup("bob", 50).await.unwrap();
    for amount in [100, 30] {
        let expense = h
            .engine
            .create_expense(CreateExpenseCmd::new("dave", group_id, "Taxi", "travel", amount))
            .await
            .unwrap();
        h.engine
            .approve_expense(ApproveCmd::new("bob", expense.id))
            .await
            .unwrap();
    }

    let reconciliation = h.engine.reconcile_wallet("bob").await.unwrap();
    assert_eq!(reconciliation.balance_minor, -80);
    assert_eq!(reconciliation.ledger_sum_minor, -80);
    assert!(reconciliation.consistent);

    let debits = h
        .engine
        .wallet_transactions(
            "bob",
            &WalletTransactionFilter {
                kind: Some(WalletTxKind::Debit),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(debits.len(), 2);
    // Newest first.
    assert_eq!(debits[0].amount_minor, 30);
    assert_eq!(debits[1].amount_minor, 100);
}

#[tokio::test]
async fn reconciliation_detects_out_of_band_balance_writes() {
    let h = harness(Script::Accept).await;
    h.engine.topup("carol", 100).await.unwrap();

    users::ActiveModel {
        username: ActiveValue::Unchanged("carol".to_string()),
        wallet_balance: ActiveValue::Set(1_000),
        ..Default::default()
    }
    .update(&h.db)
    .await
    .unwrap();

    let reconciliation = h.engine.reconcile_wallet("carol").await.unwrap();
    assert_eq!(reconciliation.ledger_sum_minor, 100);
    assert_eq!(reconciliation.balance_minor, 1_000);
    assert!(!reconciliation.consistent);
}

#[tokio::test]
async fn history_filters_by_time_window() {
    let h = harness(Script::Accept).await;
    h.engine.topup("alice", 10).await.unwrap();

    let now = Utc::now();
    let past = WalletTransactionFilter {
        to: Some(now - Duration::hours(1)),
        ..Default::default()
    };
    assert!(
        h.engine
            .wallet_transactions("alice", &past)
            .await
            .unwrap()
            .is_empty()
    );

    let window = WalletTransactionFilter {
        from: Some(now - Duration::hours(1)),
        to: Some(now + Duration::hours(1)),
        ..Default::default()
    };
    assert_eq!(
        h.engine
            .wallet_transactions("alice", &window)
            .await
            .unwrap()
            .len(),
        1
    );

    let inverted = WalletTransactionFilter {
        from: Some(now),
        to: Some(now),
        ..Default::default()
    };
    let err = h
        .engine
        .wallet_transactions("alice", &inverted)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
}
