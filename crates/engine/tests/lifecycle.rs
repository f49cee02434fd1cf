mod common;

use std::sync::Arc;

use common::{FailingStorage, Script, ScriptedVerifier, harness, migrated_db, trip_group};
use engine::{
    ApproveCmd, CreateExpenseCmd, Engine, EngineError, ExpenseListFilter, ExpenseStatus,
    FileUpload, RejectCmd, WalletTransactionFilter, WalletTxKind,
};

fn slip() -> FileUpload {
    FileUpload {
        file_name: "slip.png".to_string(),
        content_type: Some("image/png".to_string()),
        bytes: b"\x89PNG fake".to_vec(),
    }
}

async fn travel_expense(engine: &Engine, group_id: uuid::Uuid) -> engine::ExpenseRequest {
    engine
        .create_expense(CreateExpenseCmd::new("dave", group_id, "Taxi", "travel", 100))
        .await
        .unwrap()
}

#[tokio::test]
async fn approve_debits_approver_and_writes_ledger_line() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let expense = travel_expense(&h.engine, group_id).await;
    assert_eq!(expense.status, ExpenseStatus::Pending);

    let outcome = h
        .engine
        .approve_expense(ApproveCmd::new("bob", expense.id))
        .await
        .unwrap();

    assert_eq!(outcome.expense.status, ExpenseStatus::Approved);
    assert_eq!(outcome.expense.approver_id.as_deref(), Some("bob"));
    assert!(outcome.expense.acted_at.is_some());
    assert!(outcome.slip.is_none());
    assert_eq!(h.engine.wallet("bob").await.unwrap().balance_minor, -100);
    assert_eq!(h.engine.wallet("dave").await.unwrap().balance_minor, 0);

    let lines = h
        .engine
        .wallet_transactions("bob", &WalletTransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].kind, WalletTxKind::Debit);
    assert_eq!(lines[0].amount_minor, 100);
    assert_eq!(lines[0].expense_id, Some(expense.id));
    // No file, no verification call.
    assert_eq!(h.verifier.calls(), 0);
}

#[tokio::test]
async fn designated_approver_is_the_only_one_allowed() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let expense = h
        .engine
        .create_expense(
            CreateExpenseCmd::new("dave", group_id, "Hotel", "travel", 250).target_approver("carol"),
        )
        .await
        .unwrap();

    let err = h
        .engine
        .approve_expense(ApproveCmd::new("bob", expense.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    // Admin role does not override the designation either.
    let err = h
        .engine
        .reject_expense(RejectCmd::new("alice", expense.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let outcome = h
        .engine
        .approve_expense(ApproveCmd::new("carol", expense.id))
        .await
        .unwrap();
    assert_eq!(outcome.expense.approver_id.as_deref(), Some("carol"));
    assert_eq!(h.engine.wallet("bob").await.unwrap().balance_minor, 0);
    assert_eq!(h.engine.wallet("carol").await.unwrap().balance_minor, -250);
}

#[tokio::test]
async fn plain_member_cannot_decide() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let expense = h
        .engine
        .create_expense(CreateExpenseCmd::new("bob", group_id, "Fuel", "travel", 80))
        .await
        .unwrap();

    let err = h
        .engine
        .approve_expense(ApproveCmd::new("dave", expense.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert_eq!(h.engine.wallet("dave").await.unwrap().balance_minor, 0);
}

#[tokio::test]
async fn rejected_slip_is_recorded_unverified_and_approval_still_settles() {
    let h = harness(Script::Reject).await;
    let group_id = trip_group(&h.engine).await;
    let expense = travel_expense(&h.engine, group_id).await;

    let outcome = h
        .engine
        .approve_expense(
            ApproveCmd::new("bob", expense.id)
                .slip(slip())
                .notes("paid by transfer"),
        )
        .await
        .unwrap();

    let slip = outcome.slip.unwrap();
    assert!(!slip.is_verified);
    assert!(slip.verification_payload.is_none());
    assert_eq!(slip.notes.as_deref(), Some("paid by transfer"));
    assert_eq!(h.verifier.calls(), 1);
    assert_eq!(h.storage.stored_count(), 1);
    assert_eq!(h.engine.wallet("bob").await.unwrap().balance_minor, -100);

    let detail = h.engine.expense("dave", &expense.id.to_string()).await.unwrap();
    assert_eq!(detail.slips.len(), 1);
    assert_eq!(detail.slips[0].file_ref, slip.file_ref);
}

#[tokio::test]
async fn accepted_slip_keeps_payload_verbatim() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let expense = travel_expense(&h.engine, group_id).await;

    let outcome = h
        .engine
        .approve_expense(ApproveCmd::new("bob", expense.id).slip(slip()))
        .await
        .unwrap();
    let slip = outcome.slip.unwrap();
    assert!(slip.is_verified);

    let detail = h.engine.expense("bob", &expense.id.to_string()).await.unwrap();
    let payload = detail.slips[0].verification_payload.clone().unwrap();
    assert_eq!(payload["amount"], 100);
    assert_eq!(payload["transRef"], slip.file_ref.as_str());
}

#[tokio::test]
async fn unreachable_verifier_does_not_block_approval() {
    let h = harness(Script::Unreachable).await;
    let group_id = trip_group(&h.engine).await;
    let expense = travel_expense(&h.engine, group_id).await;

    let outcome = h
        .engine
        .approve_expense(ApproveCmd::new("bob", expense.id).slip(slip()))
        .await
        .unwrap();

    assert_eq!(outcome.expense.status, ExpenseStatus::Approved);
    assert!(!outcome.slip.unwrap().is_verified);
    assert_eq!(h.engine.wallet("bob").await.unwrap().balance_minor, -100);
}

#[tokio::test]
async fn storage_failure_approves_without_slip() {
    let db = migrated_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .storage(Arc::new(FailingStorage))
        .verifier(Arc::new(ScriptedVerifier::new(Script::Accept)))
        .build()
        .await
        .unwrap();
    let group_id = trip_group(&engine).await;
    let expense = travel_expense(&engine, group_id).await;

    let outcome = engine
        .approve_expense(ApproveCmd::new("bob", expense.id).slip(slip()))
        .await
        .unwrap();
    assert_eq!(outcome.expense.status, ExpenseStatus::Approved);
    assert!(outcome.slip.is_none());

    let detail = engine.expense("bob", &expense.id.to_string()).await.unwrap();
    assert_eq!(detail.expense.status, ExpenseStatus::Approved);
    assert!(detail.slips.is_empty());
    assert_eq!(engine.wallet("bob").await.unwrap().balance_minor, -100);
    assert!(engine.reconcile_wallet("bob").await.unwrap().consistent);
}

#[tokio::test]
async fn reject_records_reason_and_ignores_wallet() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let expense = travel_expense(&h.engine, group_id).await;

    let rejected = h
        .engine
        .reject_expense(RejectCmd::new("bob", expense.id).reason("duplicate"))
        .await
        .unwrap();

    assert_eq!(rejected.status, ExpenseStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("duplicate"));
    assert_eq!(rejected.approver_id.as_deref(), Some("bob"));
    assert_eq!(h.engine.wallet("bob").await.unwrap().balance_minor, 0);
    let detail = h.engine.expense("bob", &expense.id.to_string()).await.unwrap();
    assert!(detail.slips.is_empty());
    assert_eq!(h.storage.stored_count(), 0);
}

#[tokio::test]
async fn decided_expenses_are_terminal() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let approved = travel_expense(&h.engine, group_id).await;
    let rejected = travel_expense(&h.engine, group_id).await;

    let first = h
        .engine
        .approve_expense(ApproveCmd::new("bob", approved.id))
        .await
        .unwrap();
    h.engine
        .reject_expense(RejectCmd::new("bob", rejected.id))
        .await
        .unwrap();

    let again = h
        .engine
        .approve_expense(ApproveCmd::new("carol", approved.id))
        .await
        .unwrap_err();
    assert!(matches!(again, EngineError::Conflict(_)));
    let flip = h
        .engine
        .reject_expense(RejectCmd::new("bob", approved.id))
        .await
        .unwrap_err();
    assert!(matches!(flip, EngineError::Conflict(_)));
    let revive = h
        .engine
        .approve_expense(ApproveCmd::new("bob", rejected.id))
        .await
        .unwrap_err();
    assert!(matches!(revive, EngineError::Conflict(_)));

    let detail = h.engine.expense("bob", &approved.id.to_string()).await.unwrap();
    assert_eq!(detail.expense.approver_id.as_deref(), Some("bob"));
    assert_eq!(detail.expense.acted_at, first.expense.acted_at);
    assert_eq!(h.engine.wallet("bob").await.unwrap().balance_minor, -100);
    assert_eq!(h.engine.wallet("carol").await.unwrap().balance_minor, 0);
}

#[tokio::test]
async fn sequential_double_approval_settles_once() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let expense = travel_expense(&h.engine, group_id).await;

    h.engine
        .approve_expense(ApproveCmd::new("bob", expense.id))
        .await
        .unwrap();
    let err = h
        .engine
        .approve_expense(ApproveCmd::new("bob", expense.id).slip(slip()))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Conflict(_)));
    assert_eq!(h.engine.wallet("bob").await.unwrap().balance_minor, -100);
    let lines = h
        .engine
        .wallet_transactions("bob", &WalletTransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
}

#[tokio::test]
async fn concurrent_approvals_settle_exactly_once() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let expense = travel_expense(&h.engine, group_id).await;

    let (first, second) = tokio::join!(
        h.engine
            .approve_expense(ApproveCmd::new("bob", expense.id).slip(slip())),
        h.engine
            .approve_expense(ApproveCmd::new("carol", expense.id).slip(slip())),
    );

    let results = [first, second];
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(EngineError::Conflict(_))))
    );

    let winner = winners[0].expense.approver_id.clone().unwrap();
    let loser = if winner == "bob" { "carol" } else { "bob" };
    assert_eq!(h.engine.wallet(&winner).await.unwrap().balance_minor, -100);
    assert_eq!(h.engine.wallet(loser).await.unwrap().balance_minor, 0);

    let detail = h.engine.expense("dave", &expense.id.to_string()).await.unwrap();
    assert_eq!(detail.slips.len(), 1);
    assert_eq!(detail.slips[0].uploaded_by, winner);
}

#[tokio::test]
async fn create_requires_membership_and_positive_amount() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    common::add_user(&h.db, "eve").await;

    let err = h
        .engine
        .create_expense(CreateExpenseCmd::new("eve", group_id, "Snacks", "food", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    for amount in [0, -5] {
        let err = h
            .engine
            .create_expense(CreateExpenseCmd::new("dave", group_id, "Snacks", "food", amount))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    let err = h
        .engine
        .create_expense(CreateExpenseCmd::new("dave", group_id, "  ", "food", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let err = h
        .engine
        .create_expense(
            CreateExpenseCmd::new("dave", group_id, "Snacks", "food", 10).target_approver("eve"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let err = h
        .engine
        .create_expense(
            CreateExpenseCmd::new("bob", group_id, "Snacks", "food", 10).target_approver("dave"),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidArgument(
            "target approver dave cannot approve in this group".to_string()
        )
    );

    let err = h
        .engine
        .create_expense(CreateExpenseCmd::new(
            "dave",
            uuid::Uuid::new_v4(),
            "Snacks",
            "food",
            10,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let mine = h
        .engine
        .list_expenses("dave", &ExpenseListFilter::default())
        .await
        .unwrap();
    assert!(mine.is_empty());
}

#[tokio::test]
async fn direct_record_is_approved_without_settlement() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;

    let expense = h
        .engine
        .create_expense(
            CreateExpenseCmd::new("dave", group_id, "Lunch", "food", 45).direct_record(true),
        )
        .await
        .unwrap();

    assert_eq!(expense.status, ExpenseStatus::Approved);
    assert_eq!(expense.approver_id.as_deref(), Some("dave"));
    assert_eq!(expense.acted_at, Some(expense.created_at));
    assert_eq!(h.engine.wallet("dave").await.unwrap().balance_minor, 0);
    assert!(
        h.engine
            .list_pending_approvals("bob")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn pending_approvals_respect_roles_and_designation() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let open = travel_expense(&h.engine, group_id).await;
    let for_carol = h
        .engine
        .create_expense(
            CreateExpenseCmd::new("dave", group_id, "Hotel", "travel", 250).target_approver("carol"),
        )
        .await
        .unwrap();
    let decided = travel_expense(&h.engine, group_id).await;
    h.engine
        .reject_expense(RejectCmd::new("bob", decided.id))
        .await
        .unwrap();

    let bob: Vec<_> = h
        .engine
        .list_pending_approvals("bob")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(bob, vec![open.id]);

    let carol = h.engine.list_pending_approvals("carol").await.unwrap();
    assert_eq!(carol.len(), 2);
    assert!(carol.iter().any(|e| e.id == for_carol.id));

    assert!(
        h.engine
            .list_pending_approvals("dave")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn list_expenses_filters_own_requests() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let first = travel_expense(&h.engine, group_id).await;
    let second = travel_expense(&h.engine, group_id).await;
    h.engine
        .create_expense(CreateExpenseCmd::new("bob", group_id, "Fuel", "travel", 30))
        .await
        .unwrap();
    h.engine
        .approve_expense(ApproveCmd::new("bob", first.id))
        .await
        .unwrap();

    let all = h
        .engine
        .list_expenses("dave", &ExpenseListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let pending = h
        .engine
        .list_expenses(
            "dave",
            &ExpenseListFilter {
                status: Some(ExpenseStatus::Pending),
                group_id: Some(group_id),
            },
        )
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second.id);
}

#[tokio::test]
async fn expense_detail_is_scoped_to_members() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    common::add_user(&h.db, "eve").await;
    let expense = travel_expense(&h.engine, group_id).await;

    let err = h
        .engine
        .expense("eve", &expense.id.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = h.engine.expense("dave", "not-a-uuid").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let err = h
        .engine
        .expense("dave", &uuid::Uuid::new_v4().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = h
        .engine
        .approve_expense(ApproveCmd::new("bob", uuid::Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn receipts_attach_without_changing_status() {
    let h = harness(Script::Accept).await;
    let group_id = trip_group(&h.engine).await;
    let expense = travel_expense(&h.engine, group_id).await;

    let attachment = h
        .engine
        .attach_receipt("dave", &expense.id.to_string(), slip())
        .await
        .unwrap();
    assert_eq!(attachment.file_name, "slip.png");
    assert_eq!(attachment.file_size, 9);

    let err = h
        .engine
        .attach_receipt(
            "dave",
            &expense.id.to_string(),
            FileUpload {
                file_name: "empty.png".to_string(),
                content_type: None,
                bytes: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let detail = h.engine.expense("bob", &expense.id.to_string()).await.unwrap();
    assert_eq!(detail.expense.status, ExpenseStatus::Pending);
    assert_eq!(detail.attachments.len(), 1);
    assert_eq!(detail.attachments[0].id, attachment.id);
    assert_eq!(detail.attachments[0].file_ref, attachment.file_ref);
    assert_eq!(h.verifier.calls(), 0);
}
