//! Append-only ledger of issue/return records.
//!
//! Rows are written only by the request transitions, inside the same DB
//! transaction as the status change and counter adjustment. There is no
//! update or delete surface.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind, transactions, users::Role,
};

use super::Engine;

/// Filters for ledger listings.
#[derive(Clone, Debug, Default)]
pub struct LedgerListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kinds: Option<Vec<TransactionKind>>,
}

impl Engine {
    pub(super) async fn record_issue<C: ConnectionTrait>(
        &self,
        db: &C,
        student_id: &str,
        book_id: Uuid,
        due_date: DateTime<Utc>,
        admin_id: &str,
        recorded_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let tx = Transaction::issue(
            student_id.to_string(),
            book_id,
            due_date,
            admin_id.to_string(),
            recorded_at,
        );
        transactions::ActiveModel::from(&tx).insert(db).await?;
        Ok(tx.id)
    }

    pub(super) async fn record_return<C: ConnectionTrait>(
        &self,
        db: &C,
        student_id: &str,
        book_id: Uuid,
        returned_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        // Self-return: the student is also the processing actor.
        let tx = Transaction::handback(
            student_id.to_string(),
            book_id,
            returned_at,
            student_id.to_string(),
        );
        transactions::ActiveModel::from(&tx).insert(db).await?;
        Ok(tx.id)
    }

    /// Return a ledger [`Transaction`] visible to `actor` (admins, or the
    /// student it concerns). Unauthorized lookups read as missing.
    pub async fn transaction(&self, transaction_id: Uuid, actor: &str) -> ResultEngine<Transaction> {
        let user = self.require_user(&self.database, actor).await?;
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        if Role::try_from(user.role.as_str())? != Role::Admin && model.student_id != user.username {
            return Err(EngineError::KeyNotFound(
                "transaction not exists".to_string(),
            ));
        }
        Transaction::try_from(model)
    }

    /// List ledger records, newest first.
    ///
    /// Admins see every record; students see their own.
    pub async fn list_transactions(
        &self,
        actor: &str,
        filter: &LedgerListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let user = self.require_user(&self.database, actor).await?;

        let mut query = transactions::Entity::find();
        if Role::try_from(user.role.as_str())? != Role::Admin {
            query = query.filter(transactions::Column::StudentId.eq(user.username));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::RecordedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::RecordedAt.lte(to));
        }
        if let Some(kinds) = &filter.kinds {
            query = query.filter(
                transactions::Column::Kind.is_in(kinds.iter().map(|kind| kind.as_str())),
            );
        }

        let models = query
            .order_by_desc(transactions::Column::RecordedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Transaction::try_from).collect()
    }
}
