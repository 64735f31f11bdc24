//! Book catalog primitives.
//!
//! A `Book` tracks its physical inventory through two counters:
//! `total_copies` and `available_copies`. The counters move only through
//! request-lifecycle transitions (approve decrements, return increments) and
//! stay inside `[0, total_copies]`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// A catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Stable identifier for this book.
    ///
    /// This is a UUID generated once and persisted in the database, so the
    /// book can be retitled without breaking references.
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category_id: Uuid,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub pages: Option<i32>,
    pub publication_date: Option<NaiveDate>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category_id: String,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub pages: Option<i32>,
    pub publication_date: Option<Date>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub added_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
    #[sea_orm(has_many = "super::requests::Entity")]
    Requests,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Book> for ActiveModel {
    fn from(book: &Book) -> Self {
        Self {
            id: ActiveValue::Set(book.id.to_string()),
            title: ActiveValue::Set(book.title.clone()),
            author: ActiveValue::Set(book.author.clone()),
            isbn: ActiveValue::Set(book.isbn.clone()),
            category_id: ActiveValue::Set(book.category_id.to_string()),
            description: ActiveValue::Set(book.description.clone()),
            publisher: ActiveValue::Set(book.publisher.clone()),
            pages: ActiveValue::Set(book.pages),
            publication_date: ActiveValue::Set(book.publication_date),
            total_copies: ActiveValue::Set(book.total_copies),
            available_copies: ActiveValue::Set(book.available_copies),
            added_by: ActiveValue::Set(book.added_by.clone()),
            created_at: ActiveValue::Set(book.created_at),
        }
    }
}

impl TryFrom<Model> for Book {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "book")?,
            title: model.title,
            author: model.author,
            isbn: model.isbn,
            category_id: parse_uuid(&model.category_id, "category")?,
            description: model.description,
            publisher: model.publisher,
            pages: model.pages,
            publication_date: model.publication_date,
            total_copies: model.total_copies,
            available_copies: model.available_copies,
            added_by: model.added_by,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn book(total: i32, available: i32) -> Book {
        Book {
            id: Uuid::new_v4(),
            title: String::from("The Name of the Rose"),
            author: String::from("Umberto Eco"),
            isbn: String::from("9780151446476"),
            category_id: Uuid::new_v4(),
            description: None,
            publisher: None,
            pages: None,
            publication_date: None,
            total_copies: total,
            available_copies: available,
            added_by: String::from("bianca"),
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn available_with_free_copies() {
        assert!(book(2, 1).is_available());
    }

    #[test]
    fn unavailable_with_no_free_copies() {
        assert!(!book(2, 0).is_available());
    }
}
