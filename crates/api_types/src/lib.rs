use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a borrow request.
///
/// `pending -> {approved, rejected}`, `approved -> returned`; `rejected`
/// and `returned` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Returned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Issue,
    Return,
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
    }
}

pub mod book {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookNew {
        pub title: String,
        pub author: String,
        pub isbn: String,
        /// Category id (UUID).
        ///
        /// This is serialized as a string in JSON.
        pub category_id: Uuid,
        pub description: Option<String>,
        pub publisher: Option<String>,
        pub pages: Option<i32>,
        pub publication_date: Option<NaiveDate>,
        pub total_copies: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookView {
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
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookList {
        pub only_available: Option<bool>,
    }
}

pub mod request {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestView {
        pub id: Uuid,
        pub student_id: String,
        pub book_id: Uuid,
        pub status: RequestStatus,
        pub request_date: DateTime<Utc>,
        pub approval_date: Option<DateTime<Utc>>,
        pub due_date: Option<DateTime<Utc>>,
        pub return_date: Option<DateTime<Utc>>,
        pub approved_by: Option<String>,
    }

    /// Response for approve/return: the ledger record the transition wrote.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestProcessed {
        pub transaction_id: Uuid,
    }
}

pub mod ledger {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub kinds: Option<Vec<TransactionKind>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub student_id: String,
        pub book_id: Uuid,
        pub kind: TransactionKind,
        pub recorded_at: DateTime<Utc>,
        pub due_date: Option<DateTime<Utc>>,
        pub return_date: Option<DateTime<Utc>>,
        pub processed_by: String,
    }
}

pub mod fine {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FineNew {
        pub transaction_id: Uuid,
        pub amount_minor: i64,
        pub reason: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FineCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FineView {
        pub id: Uuid,
        pub transaction_id: Uuid,
        pub student_id: String,
        pub amount_minor: i64,
        pub reason: String,
        pub is_paid: bool,
        pub created_at: DateTime<Utc>,
        pub paid_date: Option<DateTime<Utc>>,
    }
}
