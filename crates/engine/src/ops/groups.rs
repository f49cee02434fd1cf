use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    EngineError, Group, GroupMember, GroupRole, GroupSummary, ResultEngine, UpdateGroupCmd,
    group_members, group_roles, groups, users,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a group; the creator joins it as admin.
    pub async fn create_group(
        &self,
        user_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> ResultEngine<Group> {
        let name = normalize_required_text(name, "group name")?;
        let group = Group::new(name, normalize_optional_text(description), user_id);
        let created: ResultEngine<Group> = with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            groups::ActiveModel::from(&group).insert(&db_tx).await?;
            add_member(&db_tx, group.id, user_id, GroupRole::Admin).await?;
            Ok(group)
        });
        let group = created?;
        info!(group_id = %group.id, creator = %user_id, "group created");
        Ok(group)
    }

    /// Joins the group behind `invite_code` as a requester.
    pub async fn join_group(&self, user_id: &str, invite_code: &str) -> ResultEngine<Group> {
        let group = self.find_by_invite(invite_code).await?;
        if self.oracle.is_member(user_id, group.id).await? {
            return Err(EngineError::Conflict(
                "already a member of this group".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            add_member(&db_tx, group.id, user_id, GroupRole::Requester).await?;
            Ok(group)
        })
    }

    async fn find_by_invite(&self, invite_code: &str) -> ResultEngine<Group> {
        let code = normalize_required_text(invite_code, "invite code")?.to_lowercase();
        let model = groups::Entity::find()
            .filter(groups::Column::InviteCode.eq(code))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("invite code not exists".to_string()))?;
        Group::try_from(model)
    }

    /// Public preview of a group, for a user about to join it.
    pub async fn group_by_invite(&self, invite_code: &str) -> ResultEngine<GroupSummary> {
        let group = self.find_by_invite(invite_code).await?;
        let member_count = member_count(&self.database, group.id).await?;
        Ok(GroupSummary {
            group,
            member_count,
        })
    }

    /// Groups the caller belongs to, oldest membership first.
    pub async fn list_groups(&self, user_id: &str) -> ResultEngine<Vec<GroupSummary>> {
        let memberships = group_members::Entity::find()
            .filter(group_members::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(group_members::Column::JoinedAt)
            .all(&self.database)
            .await?;

        let mut summaries = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let group_id = crate::util::parse_uuid(&membership.group_id, "group")?;
            let group = self.require_group(&self.database, group_id).await?;
            let member_count = member_count(&self.database, group_id).await?;
            summaries.push(GroupSummary {
                group,
                member_count,
            });
        }
        Ok(summaries)
    }

    /// Members of a group with their roles. Visible to members only.
    pub async fn group_members(
        &self,
        user_id: &str,
        group_id: Uuid,
    ) -> ResultEngine<Vec<GroupMember>> {
        self.require_group(&self.database, group_id).await?;
        self.require_member(user_id, group_id).await?;

        let members = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(group_members::Column::JoinedAt)
            .all(&self.database)
            .await?;
        let mut roles: HashMap<String, Vec<GroupRole>> = HashMap::new();
        for row in group_roles::Entity::find()
            .filter(group_roles::Column::GroupId.eq(group_id.to_string()))
            .all(&self.database)
            .await?
        {
            roles
                .entry(row.user_id)
                .or_default()
                .push(GroupRole::try_from(row.role.as_str())?);
        }
        let names: HashMap<String, String> = users::Entity::find()
            .filter(
                users::Column::Username.is_in(members.iter().map(|m| m.user_id.clone())),
            )
            .all(&self.database)
            .await?
            .into_iter()
            .map(|user| (user.username, user.full_name))
            .collect();

        Ok(members
            .into_iter()
            .map(|member| {
                let mut member_roles = roles.remove(&member.user_id).unwrap_or_default();
                member_roles.sort_by_key(|role| role.as_str());
                GroupMember {
                    full_name: names.get(&member.user_id).cloned().unwrap_or_default(),
                    username: member.user_id,
                    joined_at: member.joined_at,
                    roles: member_roles,
                }
            })
            .collect())
    }

    /// Renames a group or changes its description (admin only).
    pub async fn update_group(
        &self,
        user_id: &str,
        group_id: Uuid,
        cmd: UpdateGroupCmd,
    ) -> ResultEngine<Group> {
        let mut group = self.require_group(&self.database, group_id).await?;
        self.require_admin(user_id, group_id).await?;

        if let Some(name) = cmd.name.as_deref() {
            group.name = normalize_required_text(name, "group name")?;
        }
        if let Some(description) = cmd.description.as_deref() {
            group.description = normalize_optional_text(Some(description));
        }
        group.updated_at = Utc::now();

        groups::ActiveModel {
            id: ActiveValue::Unchanged(group.id.to_string()),
            name: ActiveValue::Set(group.name.clone()),
            description: ActiveValue::Set(group.description.clone()),
            updated_at: ActiveValue::Set(group.updated_at),
            ..Default::default()
        }
        .update(&self.database)
        .await?;
        Ok(group)
    }

    /// Grants `role` to an existing member (admin only). Granting a role the
    /// member already holds is a no-op.
    pub async fn set_member_role(
        &self,
        user_id: &str,
        group_id: Uuid,
        member: &str,
        role: GroupRole,
    ) -> ResultEngine<()> {
        self.require_group(&self.database, group_id).await?;
        self.require_admin(user_id, group_id).await?;
        self.require_group_member(group_id, member).await?;

        let existing = group_roles::Entity::find_by_id((
            group_id.to_string(),
            member.to_string(),
            role.as_str().to_string(),
        ))
        .one(&self.database)
        .await?;
        if existing.is_none() {
            role_row(group_id, member, role)
                .insert(&self.database)
                .await?;
            info!(group_id = %group_id, member = %member, role = role.as_str(), "role granted");
        }
        Ok(())
    }

    /// Revokes `role` from a member (admin only). The last admin of a group
    /// cannot lose the admin role.
    pub async fn revoke_member_role(
        &self,
        user_id: &str,
        group_id: Uuid,
        member: &str,
        role: GroupRole,
    ) -> ResultEngine<()> {
        self.require_group(&self.database, group_id).await?;
        self.require_admin(user_id, group_id).await?;
        self.require_group_member(group_id, member).await?;

        with_tx!(self, |db_tx| {
            if role == GroupRole::Admin {
                let admins = group_roles::Entity::find()
                    .filter(group_roles::Column::GroupId.eq(group_id.to_string()))
                    .filter(group_roles::Column::Role.eq(GroupRole::Admin.as_str()))
                    .count(&db_tx)
                    .await?;
                if admins <= 1 {
                    return Err(EngineError::Conflict(
                        "cannot revoke the last admin".to_string(),
                    ));
                }
            }
            group_roles::Entity::delete_many()
                .filter(group_roles::Column::GroupId.eq(group_id.to_string()))
                .filter(group_roles::Column::UserId.eq(member.to_string()))
                .filter(group_roles::Column::Role.eq(role.as_str()))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Removes a member and their roles (admin only, never oneself).
    pub async fn remove_member(
        &self,
        user_id: &str,
        group_id: Uuid,
        member: &str,
    ) -> ResultEngine<()> {
        self.require_group(&self.database, group_id).await?;
        self.require_admin(user_id, group_id).await?;
        if member == user_id {
            return Err(EngineError::InvalidArgument(
                "cannot remove yourself from the group".to_string(),
            ));
        }
        self.require_group_member(group_id, member).await?;

        with_tx!(self, |db_tx| {
            group_roles::Entity::delete_many()
                .filter(group_roles::Column::GroupId.eq(group_id.to_string()))
                .filter(group_roles::Column::UserId.eq(member.to_string()))
                .exec(&db_tx)
                .await?;
            group_members::Entity::delete_by_id((group_id.to_string(), member.to_string()))
                .exec(&db_tx)
                .await?;
            info!(group_id = %group_id, member = %member, "member removed");
            Ok(())
        })
    }

    async fn require_group_member(&self, group_id: Uuid, member: &str) -> ResultEngine<()> {
        if !self.oracle.is_member(member, group_id).await? {
            return Err(EngineError::KeyNotFound("member not exists".to_string()));
        }
        Ok(())
    }
}

fn role_row(group_id: Uuid, user_id: &str, role: GroupRole) -> group_roles::ActiveModel {
    group_roles::ActiveModel {
        group_id: ActiveValue::Set(group_id.to_string()),
        user_id: ActiveValue::Set(user_id.to_string()),
        role: ActiveValue::Set(role.as_str().to_string()),
    }
}

async fn add_member(
    db_tx: &DatabaseTransaction,
    group_id: Uuid,
    user_id: &str,
    role: GroupRole,
) -> ResultEngine<()> {
    group_members::ActiveModel {
        group_id: ActiveValue::Set(group_id.to_string()),
        user_id: ActiveValue::Set(user_id.to_string()),
        joined_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db_tx)
    .await?;
    role_row(group_id, user_id, role).insert(db_tx).await?;
    Ok(())
}

async fn member_count<C: ConnectionTrait>(db: &C, group_id: Uuid) -> ResultEngine<u64> {
    Ok(group_members::Entity::find()
        .filter(group_members::Column::GroupId.eq(group_id.to_string()))
        .count(db)
        .await?)
}
