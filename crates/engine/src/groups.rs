//! Expense groups, their members and per-group roles.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// Role a member holds inside a group.
///
/// - `admin`: manages the group and may approve/reject.
/// - `approver`: may approve/reject.
/// - `requester`: may only submit and view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Admin,
    Approver,
    Requester,
}

impl GroupRole {
    /// Roles allowed to move an expense out of `pending`.
    pub const DECIDERS: &'static [GroupRole] = &[GroupRole::Approver, GroupRole::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Approver => "approver",
            Self::Requester => "requester",
        }
    }
}

impl TryFrom<&str> for GroupRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "approver" => Ok(Self::Approver),
            "requester" => Ok(Self::Requester),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid group role: {other}"
            ))),
        }
    }
}

/// A shared spending group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub invite_code: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: String, description: Option<String>, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            invite_code: new_invite_code(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Eight lowercase hex characters.
fn new_invite_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Group summary as seen by one of its members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: Group,
    pub member_count: u64,
}

/// A member of a group together with its roles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub username: String,
    pub full_name: String,
    pub joined_at: DateTime<Utc>,
    pub roles: Vec<GroupRole>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[sea_orm(unique)]
    pub invite_code: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Group> for ActiveModel {
    fn from(group: &Group) -> Self {
        Self {
            id: ActiveValue::Set(group.id.to_string()),
            name: ActiveValue::Set(group.name.clone()),
            description: ActiveValue::Set(group.description.clone()),
            invite_code: ActiveValue::Set(group.invite_code.clone()),
            created_by: ActiveValue::Set(group.created_by.clone()),
            created_at: ActiveValue::Set(group.created_at),
            updated_at: ActiveValue::Set(group.updated_at),
        }
    }
}

impl TryFrom<Model> for Group {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "group")?,
            name: model.name,
            description: model.description,
            invite_code: model.invite_code,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_code_is_short_hex() {
        let group = Group::new("Trip".to_string(), None, "alice");
        assert_eq!(group.invite_code.len(), 8);
        assert!(group.invite_code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn parse_role() {
        assert_eq!(GroupRole::try_from("approver").unwrap(), GroupRole::Approver);
        assert!(matches!(
            GroupRole::try_from("owner"),
            Err(EngineError::InvalidArgument(_))
        ));
    }
}
