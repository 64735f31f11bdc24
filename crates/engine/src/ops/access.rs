//! Actor lookup and role gating.
//!
//! Every operation receives the acting username explicitly; there is no
//! ambient session state. Helpers run on the caller's connection so role
//! checks share the transaction of the mutation they guard.

use sea_orm::{ConnectionTrait, prelude::*};

use crate::{EngineError, ResultEngine, users, users::Role};

use super::Engine;

impl Engine {
    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_role<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
        role: Role,
    ) -> ResultEngine<users::Model> {
        let user = self.require_user(db, username).await?;
        if Role::try_from(user.role.as_str())? != role {
            return Err(EngineError::Forbidden(format!(
                "{} role required",
                role.as_str()
            )));
        }
        Ok(user)
    }

    pub(super) async fn require_admin<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
    ) -> ResultEngine<users::Model> {
        self.require_role(db, username, Role::Admin).await
    }

    pub(super) async fn require_student<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
    ) -> ResultEngine<users::Model> {
        self.require_role(db, username, Role::Student).await
    }
}
