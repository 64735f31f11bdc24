//! Fine operations.
//!
//! Fines hang off ledger transactions one-to-one. Settlement is the only
//! mutation: `is_paid` flips false to true once and `paid_date` is stamped.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Fine, NewFineCmd, ResultEngine, fines, transactions, users::Role,
};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Raise a fine against a ledger transaction (admin action).
    pub async fn new_fine(&self, cmd: NewFineCmd) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, &cmd.issued_by).await?;

            if cmd.amount_minor <= 0 {
                return Err(EngineError::InvalidAmount(
                    "amount_minor must be > 0".to_string(),
                ));
            }
            let reason = normalize_required_text(&cmd.reason, "fine reason")?;

            let tx_model = transactions::Entity::find_by_id(cmd.transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;

            let existing = fines::Entity::find()
                .filter(fines::Column::TransactionId.eq(cmd.transaction_id.to_string()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(
                    "a fine for this transaction already exists".to_string(),
                ));
            }

            let fine = Fine::new(
                cmd.transaction_id,
                tx_model.student_id,
                cmd.amount_minor,
                reason,
                cmd.created_at,
            );
            fines::ActiveModel::from(&fine).insert(&db_tx).await?;
            Ok(fine.id)
        })
    }

    /// Settle a fine (admin action). Settling twice is an invalid
    /// transition.
    pub async fn pay_fine(
        &self,
        fine_id: Uuid,
        admin_id: &str,
        paid_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;

            let model = fines::Entity::find_by_id(fine_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("fine not exists".to_string()))?;
            if model.is_paid {
                return Err(EngineError::InvalidTransition(
                    "fine already settled".to_string(),
                ));
            }

            let fine_active = fines::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                is_paid: ActiveValue::Set(true),
                paid_date: ActiveValue::Set(Some(paid_at)),
                ..Default::default()
            };
            fine_active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// List fines, newest first. Admins see every fine; students their own.
    pub async fn list_fines(&self, actor: &str) -> ResultEngine<Vec<Fine>> {
        let user = self.require_user(&self.database, actor).await?;

        let mut query = fines::Entity::find();
        if Role::try_from(user.role.as_str())? != Role::Admin {
            query = query.filter(fines::Column::StudentId.eq(user.username));
        }

        let models = query
            .order_by_desc(fines::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Fine::try_from).collect()
    }
}
