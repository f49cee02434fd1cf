//! Membership/role lookups.
//!
//! The lifecycle operations never query membership tables directly; they ask
//! a [`MembershipOracle`]. [`DbMembershipOracle`] answers from the
//! `group_members`/`group_roles` tables of the same store.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, PaginatorTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{GroupRole, ResultEngine, group_members, group_roles};

#[async_trait]
pub trait MembershipOracle: Send + Sync + std::fmt::Debug {
    /// Whether `user_id` belongs to `group_id`.
    async fn is_member(&self, user_id: &str, group_id: Uuid) -> ResultEngine<bool>;

    /// Whether `user_id` holds at least one of `roles` in `group_id`.
    async fn has_role(
        &self,
        user_id: &str,
        group_id: Uuid,
        roles: &[GroupRole],
    ) -> ResultEngine<bool>;
}

#[derive(Clone, Debug)]
pub struct DbMembershipOracle {
    database: DatabaseConnection,
}

impl DbMembershipOracle {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl MembershipOracle for DbMembershipOracle {
    async fn is_member(&self, user_id: &str, group_id: Uuid) -> ResultEngine<bool> {
        let row = group_members::Entity::find_by_id((group_id.to_string(), user_id.to_string()))
            .one(&self.database)
            .await?;
        Ok(row.is_some())
    }

    async fn has_role(
        &self,
        user_id: &str,
        group_id: Uuid,
        roles: &[GroupRole],
    ) -> ResultEngine<bool> {
        if roles.is_empty() {
            return Ok(false);
        }
        // Roles of a removed member are deleted with the membership, but a
        // role row alone is never enough.
        if !self.is_member(user_id, group_id).await? {
            return Ok(false);
        }
        let count = group_roles::Entity::find()
            .filter(group_roles::Column::GroupId.eq(group_id.to_string()))
            .filter(group_roles::Column::UserId.eq(user_id.to_string()))
            .filter(group_roles::Column::Role.is_in(roles.iter().map(|r| r.as_str())))
            .count(&self.database)
            .await?;
        Ok(count > 0)
    }
}
