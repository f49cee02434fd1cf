//! Payment slips uploaded while approving an expense.
//!
//! A slip is written once, in the same transaction that approves its expense,
//! and never mutated afterwards. `verification_payload` holds whatever the
//! external verifier returned for an accepted slip, stored verbatim.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, storage::StoredFile, util::parse_uuid, verification::Verdict,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalSlip {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub file_name: String,
    pub file_ref: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub notes: Option<String>,
    pub is_verified: bool,
    pub verification_payload: Option<serde_json::Value>,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

impl ApprovalSlip {
    /// Builds the slip row for `expense_id`.
    ///
    /// Only an accepted verdict marks the slip verified; a rejected verdict or
    /// a missing one (verifier failed) leaves it unverified with no payload.
    pub fn new(
        expense_id: Uuid,
        file_name: String,
        content_type: Option<String>,
        notes: Option<String>,
        stored: &StoredFile,
        verdict: Option<Verdict>,
        uploaded_by: &str,
    ) -> Self {
        let (is_verified, verification_payload) = match verdict {
            Some(Verdict {
                accepted: true,
                payload,
            }) => (true, Some(payload)),
            _ => (false, None),
        };
        Self {
            id: Uuid::new_v4(),
            expense_id,
            file_name,
            file_ref: stored.reference.clone(),
            file_size: stored.size,
            content_type,
            notes,
            is_verified,
            verification_payload,
            uploaded_by: uploaded_by.to_string(),
            uploaded_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "approval_slips")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub file_name: String,
    pub file_ref: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub notes: Option<String>,
    pub is_verified: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub verification_payload: Option<String>,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&ApprovalSlip> for ActiveModel {
    type Error = EngineError;

    fn try_from(slip: &ApprovalSlip) -> ResultEngine<Self> {
        let payload = slip
            .verification_payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| EngineError::InvalidArgument(format!("invalid slip payload: {err}")))?;
        Ok(Self {
            id: ActiveValue::Set(slip.id.to_string()),
            expense_id: ActiveValue::Set(slip.expense_id.to_string()),
            file_name: ActiveValue::Set(slip.file_name.clone()),
            file_ref: ActiveValue::Set(slip.file_ref.clone()),
            file_size: ActiveValue::Set(slip.file_size),
            content_type: ActiveValue::Set(slip.content_type.clone()),
            notes: ActiveValue::Set(slip.notes.clone()),
            is_verified: ActiveValue::Set(slip.is_verified),
            verification_payload: ActiveValue::Set(payload),
            uploaded_by: ActiveValue::Set(slip.uploaded_by.clone()),
            uploaded_at: ActiveValue::Set(slip.uploaded_at),
        })
    }
}

impl TryFrom<Model> for ApprovalSlip {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        // Payloads come from a third party; an unreadable one is surfaced as a
        // raw string rather than failing the read.
        let verification_payload = model.verification_payload.map(|raw| {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        });
        Ok(Self {
            id: parse_uuid(&model.id, "approval slip")?,
            expense_id: parse_uuid(&model.expense_id, "expense")?,
            file_name: model.file_name,
            file_ref: model.file_ref,
            file_size: model.file_size,
            content_type: model.content_type,
            notes: model.notes,
            is_verified: model.is_verified,
            verification_payload,
            uploaded_by: model.uploaded_by,
            uploaded_at: model.uploaded_at,
        })
    }
}
