use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, Statement};
use uuid::Uuid;

use engine::{
    Engine, EngineError, LedgerListFilter, NewBookCmd, NewFineCmd, TransactionKind,
};
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

async fn seed_category(engine: &Engine) -> Uuid {
    engine
        .new_category("Novels", Some("Long-form fiction"), "bianca", Utc::now())
        .await
        .unwrap()
}

fn book_cmd(category_id: Uuid, isbn: &str, copies: i32) -> NewBookCmd {
    NewBookCmd::new(
        "Invisible Cities",
        "Italo Calvino",
        isbn,
        category_id,
        copies,
        "bianca",
        Utc::now(),
    )
}

#[tokio::test]
async fn new_book_starts_with_all_copies_on_the_shelf() {
    let engine = engine_with_db().await;
    let category_id = seed_category(&engine).await;

    let book_id = engine
        .new_book(
            book_cmd(category_id, "9788806219468", 3)
                .publisher("Einaudi")
                .pages(164),
        )
        .await
        .unwrap();

    let book = engine.book(book_id).await.unwrap();
    assert_eq!(book.total_copies, 3);
    assert_eq!(book.available_copies, 3);
    assert!(book.is_available());
    assert_eq!(book.publisher.as_deref(), Some("Einaudi"));
    assert!(engine.is_available(book_id).await.unwrap());

    let by_isbn = engine.book_by_isbn("9788806219468").await.unwrap();
    assert_eq!(by_isbn.id, book_id);
}

#[tokio::test]
async fn duplicate_isbn_is_rejected() {
    let engine = engine_with_db().await;
    let category_id = seed_category(&engine).await;

    engine
        .new_book(book_cmd(category_id, "9788806219468", 1))
        .await
        .unwrap();
    let err = engine
        .new_book(book_cmd(category_id, "9788806219468", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn category_names_collide_on_normalized_form() {
    let engine = engine_with_db().await;

    engine
        .new_category("Science Fiction", None, "bianca", Utc::now())
        .await
        .unwrap();
    let err = engine
        .new_category("  scïence   fiction ", None, "bianca", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn catalog_writes_require_the_admin_role() {
    let engine = engine_with_db().await;
    let category_id = seed_category(&engine).await;

    let err = engine
        .new_category("Poetry", None, "carlo", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let mut cmd = book_cmd(category_id, "9788806219468", 1);
    cmd.added_by = "carlo".to_string();
    let err = engine.new_book(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn zero_copies_is_an_invalid_book() {
    let engine = engine_with_db().await;
    let category_id = seed_category(&engine).await;

    let err = engine
        .new_book(book_cmd(category_id, "9788806219468", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn only_available_listing_hides_empty_shelves() {
    let engine = engine_with_db().await;
    let category_id = seed_category(&engine).await;

    let first = engine
        .new_book(book_cmd(category_id, "9788806219468", 1))
        .await
        .unwrap();
    let second = engine
        .new_book(book_cmd(category_id, "9788804668237", 1))
        .await
        .unwrap();

    let request_id = engine
        .request_book(second, "carlo", Utc::now())
        .await
        .unwrap();
    engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();

    let all = engine.list_books(false).await.unwrap();
    assert_eq!(all.len(), 2);
    let available = engine.list_books(true).await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, first);
}

#[tokio::test]
async fn ledger_is_scoped_by_role() {
    let engine = engine_with_db().await;
    let category_id = seed_category(&engine).await;
    let book_id = engine
        .new_book(book_cmd(category_id, "9788806219468", 2))
        .await
        .unwrap();

    for student in ["carlo", "dora"] {
        let request_id = engine
            .request_book(book_id, student, Utc::now())
            .await
            .unwrap();
        engine
            .approve_request(request_id, "bianca", Utc::now())
            .await
            .unwrap();
    }

    // Admin sees every record, students their own.
    let all = engine
        .list_transactions("bianca", &Default::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    let own = engine
        .list_transactions("carlo", &Default::default())
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].student_id, "carlo");
    assert_eq!(own[0].kind, TransactionKind::Issue);
    assert_eq!(own[0].processed_by, "bianca");
    assert!(own[0].due_date.is_some());

    // A student reads own records, not a peer's.
    engine.transaction(own[0].id, "carlo").await.unwrap();
    let err = engine.transaction(own[0].id, "dora").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn ledger_filters_by_kind() {
    let engine = engine_with_db().await;
    let category_id = seed_category(&engine).await;
    let book_id = engine
        .new_book(book_cmd(category_id, "9788806219468", 1))
        .await
        .unwrap();

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();
    engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();
    engine
        .return_book(request_id, "carlo", Utc::now())
        .await
        .unwrap();

    let filter = LedgerListFilter {
        kinds: Some(vec![TransactionKind::Return]),
        ..Default::default()
    };
    let returns = engine.list_transactions("bianca", &filter).await.unwrap();
    assert_eq!(returns.len(), 1);
    assert_eq!(returns[0].kind, TransactionKind::Return);
    // Self-return: the student is the processing actor.
    assert_eq!(returns[0].processed_by, "carlo");
}

#[tokio::test]
async fn fine_lifecycle() {
    let engine = engine_with_db().await;
    let category_id = seed_category(&engine).await;
    let book_id = engine
        .new_book(book_cmd(category_id, "9788806219468", 1))
        .await
        .unwrap();

    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();
    let issue_tx = engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();

    let fine_id = engine
        .new_fine(NewFineCmd::new(
            issue_tx,
            250,
            "late return",
            "bianca",
            Utc::now(),
        ))
        .await
        .unwrap();

    // One fine per transaction.
    let err = engine
        .new_fine(NewFineCmd::new(
            issue_tx,
            100,
            "late return",
            "bianca",
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Students see their own fines, unpaid.
    let fines = engine.list_fines("carlo").await.unwrap();
    assert_eq!(fines.len(), 1);
    assert_eq!(fines[0].amount_minor, 250);
    assert!(!fines[0].is_paid);
    assert!(engine.list_fines("dora").await.unwrap().is_empty());

    // Settlement flips is_paid exactly once.
    engine.pay_fine(fine_id, "bianca", Utc::now()).await.unwrap();
    let fines = engine.list_fines("carlo").await.unwrap();
    assert!(fines[0].is_paid);
    assert!(fines[0].paid_date.is_some());

    let err = engine
        .pay_fine(fine_id, "bianca", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
}

#[tokio::test]
async fn fine_validation() {
    let engine = engine_with_db().await;
    let category_id = seed_category(&engine).await;
    let book_id = engine
        .new_book(book_cmd(category_id, "9788806219468", 1))
        .await
        .unwrap();
    let request_id = engine
        .request_book(book_id, "carlo", Utc::now())
        .await
        .unwrap();
    let issue_tx = engine
        .approve_request(request_id, "bianca", Utc::now())
        .await
        .unwrap();

    // Students cannot raise fines.
    let err = engine
        .new_fine(NewFineCmd::new(issue_tx, 250, "late", "carlo", Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // A fine needs a real transaction and a positive amount.
    let err = engine
        .new_fine(NewFineCmd::new(
            Uuid::new_v4(),
            250,
            "late",
            "bianca",
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .new_fine(NewFineCmd::new(issue_tx, 0, "late", "bianca", Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}
