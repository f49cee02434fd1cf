//! Receipts attached to an expense by its requester.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, storage::StoredFile, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub file_name: String,
    pub file_ref: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Attachment {
    pub fn new(
        expense_id: Uuid,
        file_name: String,
        content_type: Option<String>,
        stored: &StoredFile,
        uploaded_by: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            expense_id,
            file_name,
            file_ref: stored.reference.clone(),
            file_size: stored.size,
            content_type,
            uploaded_by: uploaded_by.to_string(),
            uploaded_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub file_name: String,
    pub file_ref: String,
    pub file_size: i64,
    pub content_type: Option<String>,
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

impl From<&Attachment> for ActiveModel {
    fn from(value: &Attachment) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            expense_id: ActiveValue::Set(value.expense_id.to_string()),
            file_name: ActiveValue::Set(value.file_name.clone()),
            file_ref: ActiveValue::Set(value.file_ref.clone()),
            file_size: ActiveValue::Set(value.file_size),
            content_type: ActiveValue::Set(value.content_type.clone()),
            uploaded_by: ActiveValue::Set(value.uploaded_by.clone()),
            uploaded_at: ActiveValue::Set(value.uploaded_at),
        }
    }
}

impl TryFrom<Model> for Attachment {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "attachment")?,
            expense_id: parse_uuid(&model.expense_id, "expense")?,
            file_name: model.file_name,
            file_ref: model.file_ref,
            file_size: model.file_size,
            content_type: model.content_type,
            uploaded_by: model.uploaded_by,
            uploaded_at: model.uploaded_at,
        })
    }
}
