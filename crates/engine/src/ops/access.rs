use sea_orm::{ConnectionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ExpenseRequest, Group, GroupRole, ResultEngine, expenses, groups, users,
};

use super::Engine;

/// Allow/deny for acting on a group-scoped resource.
///
/// `holds_required_role` is the oracle's answer for the required role set.
/// A designated user, when present, must be the actor regardless of role.
pub fn authorize_decision(
    actor: &str,
    holds_required_role: bool,
    designated: Option<&str>,
) -> ResultEngine<()> {
    if !holds_required_role {
        return Err(EngineError::Forbidden(
            "insufficient role in group".to_string(),
        ));
    }
    match designated {
        Some(designated) if designated != actor => Err(EngineError::Forbidden(format!(
            "expense is assigned to {designated}"
        ))),
        _ => Ok(()),
    }
}

fn forbidden_as(err: EngineError, message: &str) -> EngineError {
    match err {
        EngineError::Forbidden(_) => EngineError::Forbidden(message.to_string()),
        other => other,
    }
}

impl Engine {
    /// The single authorization gate. An empty `required` set means plain
    /// membership.
    pub(super) async fn authorize(
        &self,
        actor: &str,
        group_id: Uuid,
        required: &[GroupRole],
        designated: Option<&str>,
    ) -> ResultEngine<()> {
        let allowed = if required.is_empty() {
            self.oracle.is_member(actor, group_id).await?
        } else {
            self.oracle.has_role(actor, group_id, required).await?
        };
        authorize_decision(actor, allowed, designated)
    }

    pub(super) async fn require_member(&self, actor: &str, group_id: Uuid) -> ResultEngine<()> {
        self.authorize(actor, group_id, &[], None)
            .await
            .map_err(|err| forbidden_as(err, "not a member of this group"))
    }

    pub(super) async fn require_admin(&self, actor: &str, group_id: Uuid) -> ResultEngine<()> {
        self.authorize(actor, group_id, &[GroupRole::Admin], None)
            .await
            .map_err(|err| forbidden_as(err, "group admin role required"))
    }

    pub(super) async fn require_user_exists<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_expense<C: ConnectionTrait>(
        &self,
        db: &C,
        expense_id: Uuid,
    ) -> ResultEngine<ExpenseRequest> {
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        ExpenseRequest::try_from(model)
    }

    pub(super) async fn require_group<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: Uuid,
    ) -> ResultEngine<Group> {
        let model = groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        Group::try_from(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_required() {
        let err = authorize_decision("bob", false, None).unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }

    #[test]
    fn undesignated_expense_accepts_any_decider() {
        assert!(authorize_decision("bob", true, None).is_ok());
    }

    #[test]
    fn designated_approver_overrides_role() {
        assert!(authorize_decision("carol", true, Some("carol")).is_ok());
        let err = authorize_decision("bob", true, Some("carol")).unwrap_err();
        assert_eq!(
            err,
            EngineError::Forbidden("expense is assigned to carol".to_string())
        );
        // Being designated does not stand in for the role.
        assert!(authorize_decision("carol", false, Some("carol")).is_err());
    }
}
