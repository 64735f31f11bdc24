//! Ledger primitives.
//!
//! A `Transaction` is an immutable audit record produced by a request
//! transition: approving a request issues a copy, returning one hands it
//! back. Rows are append-only; nothing in the engine updates or deletes them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Issue,
    Return,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Return => "return",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "issue" => Ok(Self::Issue),
            "return" => Ok(Self::Return),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub student_id: String,
    pub book_id: Uuid,
    pub kind: TransactionKind,
    pub recorded_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub processed_by: String,
    pub note: Option<String>,
}

impl Transaction {
    /// Audit record for a copy leaving the shelf.
    pub fn issue(
        student_id: String,
        book_id: Uuid,
        due_date: DateTime<Utc>,
        processed_by: String,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            book_id,
            kind: TransactionKind::Issue,
            recorded_at,
            due_date: Some(due_date),
            return_date: None,
            processed_by,
            note: None,
        }
    }

    /// Audit record for a copy coming back.
    pub fn handback(
        student_id: String,
        book_id: Uuid,
        returned_at: DateTime<Utc>,
        processed_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            book_id,
            kind: TransactionKind::Return,
            recorded_at: returned_at,
            due_date: None,
            return_date: Some(returned_at),
            processed_by,
            note: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub student_id: String,
    pub book_id: String,
    pub kind: String,
    pub recorded_at: DateTimeUtc,
    pub due_date: Option<DateTimeUtc>,
    pub return_date: Option<DateTimeUtc>,
    pub processed_by: String,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::books::Entity",
        from = "Column::BookId",
        to = "super::books::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Books,
    #[sea_orm(has_many = "super::fines::Entity")]
    Fines,
}

impl Related<super::books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Books.def()
    }
}

impl Related<super::fines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            student_id: ActiveValue::Set(tx.student_id.clone()),
            book_id: ActiveValue::Set(tx.book_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            recorded_at: ActiveValue::Set(tx.recorded_at),
            due_date: ActiveValue::Set(tx.due_date),
            return_date: ActiveValue::Set(tx.return_date),
            processed_by: ActiveValue::Set(tx.processed_by.clone()),
            note: ActiveValue::Set(tx.note.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            student_id: model.student_id,
            book_id: parse_uuid(&model.book_id, "book")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            recorded_at: model.recorded_at,
            due_date: model.due_date,
            return_date: model.return_date,
            processed_by: model.processed_by,
            note: model.note,
        })
    }
}
