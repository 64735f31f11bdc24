//! Fine primitives.
//!
//! A `Fine` is a monetary penalty attached to a single ledger transaction.
//! Amounts are stored as integer minor units (`i64`). The only mutation a
//! fine ever sees is settlement: `is_paid` flips false to true exactly once.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fine {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub student_id: String,
    pub amount_minor: i64,
    pub reason: String,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
}

impl Fine {
    pub fn new(
        transaction_id: Uuid,
        student_id: String,
        amount_minor: i64,
        reason: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            student_id,
            amount_minor,
            reason,
            is_paid: false,
            created_at,
            paid_date: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub student_id: String,
    pub amount_minor: i64,
    pub reason: String,
    pub is_paid: bool,
    pub created_at: DateTimeUtc,
    pub paid_date: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Fine> for ActiveModel {
    fn from(fine: &Fine) -> Self {
        Self {
            id: ActiveValue::Set(fine.id.to_string()),
            transaction_id: ActiveValue::Set(fine.transaction_id.to_string()),
            student_id: ActiveValue::Set(fine.student_id.clone()),
            amount_minor: ActiveValue::Set(fine.amount_minor),
            reason: ActiveValue::Set(fine.reason.clone()),
            is_paid: ActiveValue::Set(fine.is_paid),
            created_at: ActiveValue::Set(fine.created_at),
            paid_date: ActiveValue::Set(fine.paid_date),
        }
    }
}

impl TryFrom<Model> for Fine {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "fine")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            student_id: model.student_id,
            amount_minor: model.amount_minor,
            reason: model.reason,
            is_paid: model.is_paid,
            created_at: model.created_at,
            paid_date: model.paid_date,
        })
    }
}
