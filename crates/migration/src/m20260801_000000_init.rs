//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Scaffale:
//!
//! - `users`: authentication and role tags (student/admin)
//! - `categories`: catalog taxonomy
//! - `books`: catalog entries with copy counters
//! - `book_requests`: the borrowing lifecycle rows
//! - `transactions`: append-only issue/return ledger
//! - `fines`: monetary penalties attached to ledger rows

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    FullName,
    Role,
    StudentId,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    NameNorm,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum Books {
    Table,
    Id,
    Title,
    Author,
    Isbn,
    CategoryId,
    Description,
    Publisher,
    Pages,
    PublicationDate,
    TotalCopies,
    AvailableCopies,
    AddedBy,
    CreatedAt,
}

#[derive(Iden)]
enum BookRequests {
    Table,
    Id,
    StudentId,
    BookId,
    Status,
    RequestDate,
    ApprovalDate,
    DueDate,
    ReturnDate,
    ApprovedBy,
    Note,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    StudentId,
    BookId,
    Kind,
    RecordedAt,
    DueDate,
    ReturnDate,
    ProcessedBy,
    Note,
}

#[derive(Iden)]
enum Fines {
    Table,
    Id,
    TransactionId,
    StudentId,
    AmountMinor,
    Reason,
    IsPaid,
    CreatedAt,
    PaidDate,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("student"),
                    )
                    .col(ColumnDef::new(Users::StudentId).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-student_id-unique")
                    .table(Users::Table)
                    .col(Users::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Description).string())
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Books
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Books::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Books::Title).string().not_null())
                    .col(ColumnDef::new(Books::Author).string().not_null())
                    .col(ColumnDef::new(Books::Isbn).string().not_null())
                    .col(ColumnDef::new(Books::CategoryId).string().not_null())
                    .col(ColumnDef::new(Books::Description).string())
                    .col(ColumnDef::new(Books::Publisher).string())
                    .col(ColumnDef::new(Books::Pages).integer())
                    .col(ColumnDef::new(Books::PublicationDate).date())
                    .col(ColumnDef::new(Books::TotalCopies).integer().not_null())
                    .col(ColumnDef::new(Books::AvailableCopies).integer().not_null())
                    .col(ColumnDef::new(Books::AddedBy).string().not_null())
                    .col(ColumnDef::new(Books::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-books-category_id")
                            .from(Books::Table, Books::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-books-added_by")
                            .from(Books::Table, Books::AddedBy)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-books-isbn-unique")
                    .table(Books::Table)
                    .col(Books::Isbn)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-books-category_id")
                    .table(Books::Table)
                    .col(Books::CategoryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Book requests
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BookRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookRequests::StudentId).string().not_null())
                    .col(ColumnDef::new(BookRequests::BookId).string().not_null())
                    .col(ColumnDef::new(BookRequests::Status).string().not_null())
                    .col(
                        ColumnDef::new(BookRequests::RequestDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BookRequests::ApprovalDate).timestamp())
                    .col(ColumnDef::new(BookRequests::DueDate).timestamp())
                    .col(ColumnDef::new(BookRequests::ReturnDate).timestamp())
                    .col(ColumnDef::new(BookRequests::ApprovedBy).string())
                    .col(ColumnDef::new(BookRequests::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-book_requests-student_id")
                            .from(BookRequests::Table, BookRequests::StudentId)
                            .to(Users::Table, Users::Username),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-book_requests-book_id")
                            .from(BookRequests::Table, BookRequests::BookId)
                            .to(Books::Table, Books::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-book_requests-approved_by")
                            .from(BookRequests::Table, BookRequests::ApprovedBy)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        // The duplicate-active-request rule is a derived predicate checked by
        // the engine inside the insert transaction; these indexes only serve
        // the lookup paths.
        manager
            .create_index(
                Index::create()
                    .name("idx-book_requests-student_id-book_id")
                    .table(BookRequests::Table)
                    .col(BookRequests::StudentId)
                    .col(BookRequests::BookId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-book_requests-status")
                    .table(BookRequests::Table)
                    .col(BookRequests::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::StudentId).string().not_null())
                    .col(ColumnDef::new(Transactions::BookId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::RecordedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::DueDate).timestamp())
                    .col(ColumnDef::new(Transactions::ReturnDate).timestamp())
                    .col(
                        ColumnDef::new(Transactions::ProcessedBy)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-student_id")
                            .from(Transactions::Table, Transactions::StudentId)
                            .to(Users::Table, Users::Username),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-book_id")
                            .from(Transactions::Table, Transactions::BookId)
                            .to(Books::Table, Books::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-processed_by")
                            .from(Transactions::Table, Transactions::ProcessedBy)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-student_id-recorded_at")
                    .table(Transactions::Table)
                    .col(Transactions::StudentId)
                    .col(Transactions::RecordedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-book_id")
                    .table(Transactions::Table)
                    .col(Transactions::BookId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Fines
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Fines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Fines::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Fines::TransactionId).string().not_null())
                    .col(ColumnDef::new(Fines::StudentId).string().not_null())
                    .col(ColumnDef::new(Fines::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Fines::Reason).string().not_null())
                    .col(ColumnDef::new(Fines::IsPaid).boolean().not_null())
                    .col(ColumnDef::new(Fines::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Fines::PaidDate).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fines-transaction_id")
                            .from(Fines::Table, Fines::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fines-student_id")
                            .from(Fines::Table, Fines::StudentId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fines-transaction_id-unique")
                    .table(Fines::Table)
                    .col(Fines::TransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fines-student_id")
                    .table(Fines::Table)
                    .col(Fines::StudentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Fines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BookRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
