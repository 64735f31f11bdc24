//! Command structs for engine operations.
//!
//! These types group parameters for the wide write operations (adding a book,
//! raising a fine), keeping call sites readable and avoiding long argument
//! lists. Narrow operations (approve, reject, return) take plain arguments.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Add a book to the catalog.
#[derive(Clone, Debug)]
pub struct NewBookCmd {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category_id: Uuid,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub pages: Option<i32>,
    pub publication_date: Option<NaiveDate>,
    pub total_copies: i32,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

impl NewBookCmd {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        category_id: Uuid,
        total_copies: i32,
        added_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            category_id,
            description: None,
            publisher: None,
            pages: None,
            publication_date: None,
            total_copies,
            added_by: added_by.into(),
            created_at,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    #[must_use]
    pub fn pages(mut self, pages: i32) -> Self {
        self.pages = Some(pages);
        self
    }

    #[must_use]
    pub fn publication_date(mut self, publication_date: NaiveDate) -> Self {
        self.publication_date = Some(publication_date);
        self
    }
}

/// Raise a fine against a ledger transaction.
#[derive(Clone, Debug)]
pub struct NewFineCmd {
    pub transaction_id: Uuid,
    pub amount_minor: i64,
    pub reason: String,
    pub issued_by: String,
    pub created_at: DateTime<Utc>,
}

impl NewFineCmd {
    #[must_use]
    pub fn new(
        transaction_id: Uuid,
        amount_minor: i64,
        reason: impl Into<String>,
        issued_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id,
            amount_minor,
            reason: reason.into(),
            issued_by: issued_by.into(),
            created_at,
        }
    }
}
