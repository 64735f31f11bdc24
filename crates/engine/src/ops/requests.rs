//! The borrowing lifecycle state machine.
//!
//! `pending -> {approved, rejected}`, `approved -> returned`. Every
//! transition re-reads the request inside a DB transaction, rejects moves the
//! graph does not allow, and adjusts `available_copies` with a conditional
//! UPDATE so concurrent approvals cannot over-claim copies.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BookRequest, EngineError, RequestStatus, ResultEngine, books, requests, users::Role,
    util::parse_uuid,
};

use super::{Engine, with_tx};

/// Fixed loan period between approval and due date.
pub const LOAN_PERIOD_DAYS: i64 = 14;

impl Engine {
    async fn require_request<C: ConnectionTrait>(
        &self,
        db: &C,
        request_id: Uuid,
    ) -> ResultEngine<requests::Model> {
        requests::Entity::find_by_id(request_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("request not exists".to_string()))
    }

    /// Whether the student already holds a pending or approved request for
    /// the book. "Active" is a derived predicate, not a uniqueness
    /// constraint; terminal rows may repeat freely.
    async fn has_active_request<C: ConnectionTrait>(
        &self,
        db: &C,
        student_id: &str,
        book_id: Uuid,
    ) -> ResultEngine<bool> {
        let existing = requests::Entity::find()
            .filter(requests::Column::StudentId.eq(student_id.to_string()))
            .filter(requests::Column::BookId.eq(book_id.to_string()))
            .filter(requests::Column::Status.is_in([
                RequestStatus::Pending.as_str(),
                RequestStatus::Approved.as_str(),
            ]))
            .one(db)
            .await?;
        Ok(existing.is_some())
    }

    /// File a borrow request (student action).
    ///
    /// Fails with [`EngineError::DuplicateRequest`] when an active request
    /// for the same (student, book) pair exists, and with
    /// [`EngineError::Unavailable`] when no copy is on the shelf.
    pub async fn request_book(
        &self,
        book_id: Uuid,
        student_id: &str,
        requested_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            let student = self.require_student(&db_tx, student_id).await?;

            let book_model = books::Entity::find_by_id(book_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("book not exists".to_string()))?;

            if self
                .has_active_request(&db_tx, &student.username, book_id)
                .await?
            {
                return Err(EngineError::DuplicateRequest(
                    "an active request for this book already exists".to_string(),
                ));
            }
            if book_model.available_copies <= 0 {
                return Err(EngineError::Unavailable(book_model.title));
            }

            let request = BookRequest::new(book_id, student.username, requested_at);
            requests::ActiveModel::from(&request).insert(&db_tx).await?;
            Ok(request.id)
        })
    }

    /// Approve a pending request (admin action).
    ///
    /// As one atomic unit: marks the request approved, stamps
    /// `approval_date` and `due_date` (approval + 14 days), claims a copy,
    /// and appends an issue record to the ledger. Returns the ledger
    /// transaction id.
    pub async fn approve_request(
        &self,
        request_id: Uuid,
        admin_id: &str,
        approved_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            let admin = self.require_admin(&db_tx, admin_id).await?;

            let request_model = self.require_request(&db_tx, request_id).await?;
            let status = RequestStatus::try_from(request_model.status.as_str())?;
            if !status.can_transition(RequestStatus::Approved) {
                return Err(EngineError::InvalidTransition(format!(
                    "cannot approve a {} request",
                    status.as_str()
                )));
            }

            let book_id = parse_uuid(&request_model.book_id, "book")?;
            self.adjust_available_copies(&db_tx, book_id, -1).await?;

            let due_date = approved_at + Duration::days(LOAN_PERIOD_DAYS);
            let request_active = requests::ActiveModel {
                id: ActiveValue::Set(request_model.id.clone()),
                status: ActiveValue::Set(RequestStatus::Approved.as_str().to_string()),
                approved_by: ActiveValue::Set(Some(admin.username.clone())),
                approval_date: ActiveValue::Set(Some(approved_at)),
                due_date: ActiveValue::Set(Some(due_date)),
                ..Default::default()
            };
            request_active.update(&db_tx).await?;

            let tx_id = self
                .record_issue(
                    &db_tx,
                    &request_model.student_id,
                    book_id,
                    due_date,
                    &admin.username,
                    approved_at,
                )
                .await?;
            Ok(tx_id)
        })
    }

    /// Reject a pending request (admin action). No inventory or ledger
    /// effect; rejecting twice is an invalid transition.
    pub async fn reject_request(
        &self,
        request_id: Uuid,
        admin_id: &str,
        rejected_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let admin = self.require_admin(&db_tx, admin_id).await?;

            let request_model = self.require_request(&db_tx, request_id).await?;
            let status = RequestStatus::try_from(request_model.status.as_str())?;
            if !status.can_transition(RequestStatus::Rejected) {
                return Err(EngineError::InvalidTransition(format!(
                    "cannot reject a {} request",
                    status.as_str()
                )));
            }

            let request_active = requests::ActiveModel {
                id: ActiveValue::Set(request_model.id.clone()),
                status: ActiveValue::Set(RequestStatus::Rejected.as_str().to_string()),
                approved_by: ActiveValue::Set(Some(admin.username)),
                approval_date: ActiveValue::Set(Some(rejected_at)),
                ..Default::default()
            };
            request_active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Return a borrowed book (owning student only).
    ///
    /// As one atomic unit: marks the request returned, stamps
    /// `return_date`, puts the copy back on the shelf, and appends a return
    /// record to the ledger. Returns the ledger transaction id.
    pub async fn return_book(
        &self,
        request_id: Uuid,
        student_id: &str,
        returned_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            let student = self.require_student(&db_tx, student_id).await?;

            let request_model = self.require_request(&db_tx, request_id).await?;
            if request_model.student_id != student.username {
                return Err(EngineError::Forbidden(
                    "only the requesting student may return this book".to_string(),
                ));
            }
            let status = RequestStatus::try_from(request_model.status.as_str())?;
            if !status.can_transition(RequestStatus::Returned) {
                return Err(EngineError::InvalidTransition(format!(
                    "cannot return a {} request",
                    status.as_str()
                )));
            }

            let book_id = parse_uuid(&request_model.book_id, "book")?;
            self.adjust_available_copies(&db_tx, book_id, 1).await?;

            let request_active = requests::ActiveModel {
                id: ActiveValue::Set(request_model.id.clone()),
                status: ActiveValue::Set(RequestStatus::Returned.as_str().to_string()),
                return_date: ActiveValue::Set(Some(returned_at)),
                ..Default::default()
            };
            request_active.update(&db_tx).await?;

            let tx_id = self
                .record_return(&db_tx, &student.username, book_id, returned_at)
                .await?;
            Ok(tx_id)
        })
    }

    /// Return a [`BookRequest`] visible to `actor` (admins, or the owning
    /// student). Unauthorized lookups read as missing.
    pub async fn request(&self, request_id: Uuid, actor: &str) -> ResultEngine<BookRequest> {
        let user = self.require_user(&self.database, actor).await?;
        let model = self.require_request(&self.database, request_id).await?;
        if Role::try_from(user.role.as_str())? != Role::Admin && model.student_id != user.username {
            return Err(EngineError::KeyNotFound("request not exists".to_string()));
        }
        BookRequest::try_from(model)
    }

    /// The admin approval queue, newest first.
    pub async fn list_pending_requests(&self, admin_id: &str) -> ResultEngine<Vec<BookRequest>> {
        self.require_admin(&self.database, admin_id).await?;
        let models = requests::Entity::find()
            .filter(requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .order_by_desc(requests::Column::RequestDate)
            .all(&self.database)
            .await?;
        models.into_iter().map(BookRequest::try_from).collect()
    }

    /// A student's own request history, newest first.
    pub async fn list_requests_for_student(
        &self,
        student_id: &str,
    ) -> ResultEngine<Vec<BookRequest>> {
        let student = self.require_student(&self.database, student_id).await?;
        let models = requests::Entity::find()
            .filter(requests::Column::StudentId.eq(student.username))
            .order_by_desc(requests::Column::RequestDate)
            .all(&self.database)
            .await?;
        models.into_iter().map(BookRequest::try_from).collect()
    }
}
