use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, Statement};
use uuid::Uuid;

use engine::{Engine, EngineError, LOAN_PERIOD_DAYS, NewBookCmd, RequestStatus};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, role, student_id) in [
        ("bianca", "admin", None),
        ("carlo", "student", Some("STU000001")),
        ("dora", "student", Some("STU000002")),
    ] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, full_name, role, student_id) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                username.into(),
                "password".into(),
                username.into(),
                role.into(),
                student_id.into(),
            ],
        ))
        .await
        .unwrap();
    }
    Engine::builder().database(db).build().await.unwrap()
}

async fn seed_book(engine: &Engine, isbn: &str, copies: i32) -> Uuid {
    let category_id = engine
        .new_category("Novels", None, "bianca", Utc::now())
        .await
        .unwrap();
    engine
        .new_book(NewBookCmd::new(
            "The Tartar Steppe",
            "Dino Buzzati",
            isbn,
            category_id,
            copies,
            "bianca",
            Utc::now(),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn request_approve_return_round_trip() {
    let engine = engine_with_db().await;
    let book_id = seed_book(&engine, "9788804668237", 2).await;

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();

    // Filing a request claims nothing yet.
    let book = engine.book(book_id).await.unwrap();
    assert_eq!(book.available_copies, 2);
    let request = engine.request(request_id, "carlo").await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    let issue_tx = engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();

    let book = engine.book(book_id).await.unwrap();
    assert_eq!(book.available_copies, 1);
    let request = engine.request(request_id, "carlo").await.unwrap();
    assert_eq!(request.status, RequestStatus::Approved);
    assert_eq!(request.approved_by.as_deref(), Some("bianca"));

    // The loan period is exactly 14 days from the approval stamp.
    let approval_date = request.approval_date.unwrap();
    let due_date = request.due_date.unwrap();
    assert_eq!(due_date - approval_date, Duration::days(LOAN_PERIOD_DAYS));

    let return_tx = engine
        .return_book(request_id, "carlo", Utc::now())
        .await
        .unwrap();

    let book = engine.book(book_id).await.unwrap();
    assert_eq!(book.available_copies, 2);
    let request = engine.request(request_id, "carlo").await.unwrap();
    assert_eq!(request.status, RequestStatus::Returned);
    assert!(request.return_date.is_some());

    // Exactly two ledger rows: the issue and the return.
    let ledger = engine
        .list_transactions("carlo", &Default::default())
        .await
        .unwrap();
    let mut ids: Vec<Uuid> = ledger.iter().map(|tx| tx.id).collect();
    ids.sort();
    let mut expected = vec![issue_tx, return_tx];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn duplicate_active_request_is_rejected() {
    let engine = engine_with_db().await;
    let book_id = seed_book(&engine, "9788804668237", 2).await;

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();

    let err = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateRequest(_)));

    // Still a duplicate while approved.
    engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();
    let err = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateRequest(_)));

    // A terminal request frees the pair again.
    engine
        .return_book(request_id, "carlo", Utc::now())
        .await
        .unwrap();
    engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn requesting_an_unavailable_book_fails_without_side_effects() {
    let engine = engine_with_db().await;
    let book_id = seed_book(&engine, "9788804668237", 1).await;

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();
    engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();

    // Shelf is empty now; dora's request must not be created.
    let err = engine
        .request_book(book_id, "dora", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));

    let requests = engine.list_requests_for_student("dora").await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn approving_without_copies_fails_and_leaves_state_unchanged() {
    let engine = engine_with_db().await;
    let book_id = seed_book(&engine, "9788804668237", 1).await;

    // Both students request while a copy is still on the shelf.
    let first = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();
    let second = engine
        .request_book(book_id, "dora", Utc::now())
        .await
        .unwrap();

    engine
        .approve_request(first, "bianca", Utc::now())
        .await
        .unwrap();

    let err = engine
        .approve_request(second, "bianca", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));

    // All-or-nothing: the failed approval changed neither the counter nor
    // the request, and wrote no ledger row.
    let book = engine.book(book_id).await.unwrap();
    assert_eq!(book.available_copies, 0);
    let request = engine.request(second, "dora").await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(request.approval_date.is_none());
    let ledger = engine
        .list_transactions("bianca", &Default::default())
        .await
        .unwrap();
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn only_the_owning_student_can_return() {
    let engine = engine_with_db().await;
    let book_id = seed_book(&engine, "9788804668237", 1).await;

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();
    engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();

    let err = engine
        .return_book(request_id, "dora", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // Admins hold no student capability either.
    let err = engine
        .return_book(request_id, "bianca", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let request = engine.request(request_id, "carlo").await.unwrap();
    assert_eq!(request.status, RequestStatus::Approved);
}

#[tokio::test]
async fn transitions_outside_the_graph_are_rejected() {
    let engine = engine_with_db().await;
    let book_id = seed_book(&engine, "9788804668237", 2).await;

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();
    engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();

    // Re-approving an approved request.
    let err = engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
    let book = engine.book(book_id).await.unwrap();
    assert_eq!(book.available_copies, 1);

    // Rejecting an approved request.
    let err = engine
        .reject_request(request_id, "bianca", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    // Returning twice.
    engine
        .return_book(request_id, "carlo", Utc::now())
        .await
        .unwrap();
    let err = engine
        .return_book(request_id, "carlo", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
    let book = engine.book(book_id).await.unwrap();
    assert_eq!(book.available_copies, 2);
}

#[tokio::test]
async fn rejecting_twice_is_rejected() {
    let engine = engine_with_db().await;
    let book_id = seed_book(&engine, "9788804668237", 1).await;

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();
    engine
        .reject_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();

    let request = engine.request(request_id, "carlo").await.unwrap();
    assert_eq!(request.status, RequestStatus::Rejected);
    assert_eq!(request.approved_by.as_deref(), Some("bianca"));

    let err = engine
        .reject_request(request_id, "bianca", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    // A rejection never touches the shelf.
    let book = engine.book(book_id).await.unwrap();
    assert_eq!(book.available_copies, 1);
}

#[tokio::test]
async fn role_gates_on_lifecycle_operations() {
    let engine = engine_with_db().await;
    let book_id = seed_book(&engine, "9788804668237", 1).await;

    // Admins do not file borrow requests.
    let err = engine
        .request_book(book_id, "bianca", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();

    // Students do not approve or reject.
    let err = engine
        .approve_request(request_id, "dora", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = engine
        .reject_request(request_id, "dora", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn request_visibility_is_scoped() {
    let engine = engine_with_db().await;
    let book_id = seed_book(&engine, "9788804668237", 1).await;

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();

    // The owner and any admin can see it; another student cannot.
    engine.request(request_id, "carlo").await.unwrap();
    engine.request(request_id, "bianca").await.unwrap();
    let err = engine.request(request_id, "dora").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let pending = engine.list_pending_requests("bianca").await.unwrap();
    assert_eq!(pending.len(), 1);
    let err = engine.list_pending_requests("carlo").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
