//! Borrow-request primitives.
//!
//! A `BookRequest` is the unit of the borrowing lifecycle. Its status moves
//! along `pending -> {approved, rejected}` and `approved -> returned`;
//! `rejected` and `returned` are terminal. Transitions outside this graph are
//! rejected by the engine, never applied silently.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Returned,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Returned => "returned",
        }
    }

    /// An active request holds (pending) or occupies (approved) a copy claim.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Returned)
    }

    /// Whether the lifecycle graph allows moving from `self` to `next`.
    pub fn can_transition(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Returned)
        )
    }
}

impl TryFrom<&str> for RequestStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "returned" => Ok(Self::Returned),
            other => Err(EngineError::InvalidTransition(format!(
                "invalid request status: {other}"
            ))),
        }
    }
}

/// A student's request to borrow one copy of a book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookRequest {
    pub id: Uuid,
    pub student_id: String,
    pub book_id: Uuid,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub note: Option<String>,
}

impl BookRequest {
    pub fn new(book_id: Uuid, student_id: String, requested_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            book_id,
            status: RequestStatus::Pending,
            request_date: requested_at,
            approval_date: None,
            due_date: None,
            return_date: None,
            approved_by: None,
            note: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "book_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub student_id: String,
    pub book_id: String,
    pub status: String,
    pub request_date: DateTimeUtc,
    pub approval_date: Option<DateTimeUtc>,
    pub due_date: Option<DateTimeUtc>,
    pub return_date: Option<DateTimeUtc>,
    pub approved_by: Option<String>,
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
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Books.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BookRequest> for ActiveModel {
    fn from(request: &BookRequest) -> Self {
        Self {
            id: ActiveValue::Set(request.id.to_string()),
            student_id: ActiveValue::Set(request.student_id.clone()),
            book_id: ActiveValue::Set(request.book_id.to_string()),
            status: ActiveValue::Set(request.status.as_str().to_string()),
            request_date: ActiveValue::Set(request.request_date),
            approval_date: ActiveValue::Set(request.approval_date),
            due_date: ActiveValue::Set(request.due_date),
            return_date: ActiveValue::Set(request.return_date),
            approved_by: ActiveValue::Set(request.approved_by.clone()),
            note: ActiveValue::Set(request.note.clone()),
        }
    }
}

impl TryFrom<Model> for BookRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "request")?,
            student_id: model.student_id,
            book_id: parse_uuid(&model.book_id, "book")?,
            status: RequestStatus::try_from(model.status.as_str())?,
            request_date: model.request_date,
            approval_date: model.approval_date,
            due_date: model.due_date,
            return_date: model.return_date,
            approved_by: model.approved_by,
            note: model.note,
        })
    }
}
