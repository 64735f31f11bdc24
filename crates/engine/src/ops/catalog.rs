//! Catalog operations: categories and books.
//!
//! Books are created with `available_copies == total_copies`. The copy
//! counters have no public mutation surface; only request transitions move
//! them (see `ops::requests`).

use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Book, Category, EngineError, NewBookCmd, ResultEngine, books, categories,
    util::normalize_name_key,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Register a new category.
    ///
    /// Names are matched on their normalized form, so "Science-Fiction" and
    /// "science fiction" collide.
    pub async fn new_category(
        &self,
        name: &str,
        description: Option<&str>,
        admin_id: &str,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;

            let display = normalize_required_text(name, "category name")?;
            let normalized = normalize_name_key(&display);
            let existing = categories::Entity::find()
                .filter(categories::Column::NameNorm.eq(normalized.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(display));
            }

            let category = Category {
                id: Uuid::new_v4(),
                name: display,
                description: normalize_optional_text(description),
                created_at,
            };
            categories::ActiveModel::from(&category).insert(&db_tx).await?;
            Ok(category.id)
        })
    }

    /// Add a book to the catalog. All copies start on the shelf.
    pub async fn new_book(&self, cmd: NewBookCmd) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            let admin = self.require_admin(&db_tx, &cmd.added_by).await?;

            let title = normalize_required_text(&cmd.title, "book title")?;
            let author = normalize_required_text(&cmd.author, "book author")?;
            let isbn = normalize_required_text(&cmd.isbn, "isbn")?;
            if cmd.total_copies < 1 {
                return Err(EngineError::InvalidAmount(
                    "total_copies must be >= 1".to_string(),
                ));
            }

            categories::Entity::find_by_id(cmd.category_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;

            let duplicate = books::Entity::find()
                .filter(books::Column::Isbn.eq(isbn.clone()))
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(isbn));
            }

            let book = Book {
                id: Uuid::new_v4(),
                title,
                author,
                isbn,
                category_id: cmd.category_id,
                description: normalize_optional_text(cmd.description.as_deref()),
                publisher: normalize_optional_text(cmd.publisher.as_deref()),
                pages: cmd.pages,
                publication_date: cmd.publication_date,
                total_copies: cmd.total_copies,
                available_copies: cmd.total_copies,
                added_by: admin.username,
                created_at: cmd.created_at,
            };
            books::ActiveModel::from(&book).insert(&db_tx).await?;
            Ok(book.id)
        })
    }

    /// Return a [`Book`].
    pub async fn book(&self, book_id: Uuid) -> ResultEngine<Book> {
        let model = books::Entity::find_by_id(book_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("book not exists".to_string()))?;
        Book::try_from(model)
    }

    pub async fn book_by_isbn(&self, isbn: &str) -> ResultEngine<Book> {
        let model = books::Entity::find()
            .filter(books::Column::Isbn.eq(isbn.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("book not exists".to_string()))?;
        Book::try_from(model)
    }

    /// Whether at least one copy of the book is on the shelf.
    pub async fn is_available(&self, book_id: Uuid) -> ResultEngine<bool> {
        Ok(self.book(book_id).await?.is_available())
    }

    /// List catalog entries, newest first.
    pub async fn list_books(&self, only_available: bool) -> ResultEngine<Vec<Book>> {
        let mut query = books::Entity::find().order_by_desc(books::Column::CreatedAt);
        if only_available {
            query = query.filter(books::Column::AvailableCopies.gt(0));
        }
        let models = query.all(&self.database).await?;
        models.into_iter().map(Book::try_from).collect()
    }

    pub async fn list_categories(&self) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    /// Move `available_copies` by `delta`, keeping it inside
    /// `[0, total_copies]`. Only the request transitions call this.
    ///
    /// The bound is part of the UPDATE's WHERE clause and the affected row
    /// count is checked, so two concurrent approvals cannot both pass an
    /// availability check and over-decrement.
    pub(super) async fn adjust_available_copies<C: ConnectionTrait>(
        &self,
        db: &C,
        book_id: Uuid,
        delta: i32,
    ) -> ResultEngine<()> {
        let mut update = books::Entity::update_many()
            .col_expr(
                books::Column::AvailableCopies,
                Expr::col(books::Column::AvailableCopies).add(delta),
            )
            .filter(books::Column::Id.eq(book_id.to_string()));

        update = if delta < 0 {
            update.filter(books::Column::AvailableCopies.gte(-delta))
        } else {
            update.filter(
                Expr::col(books::Column::AvailableCopies)
                    .lte(Expr::col(books::Column::TotalCopies).sub(delta)),
            )
        };

        let result = update.exec(db).await?;
        if result.rows_affected == 0 {
            return Err(if delta < 0 {
                EngineError::Unavailable("no copies available".to_string())
            } else {
                EngineError::InvalidCopyCount(
                    "available_copies would exceed total_copies".to_string(),
                )
            });
        }
        Ok(())
    }
}
