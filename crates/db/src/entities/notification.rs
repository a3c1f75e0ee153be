//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification types.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum NotificationType {
    #[sea_orm(string_value = "vote_changed")]
    #[default]
    VoteChanged,
}

impl NotificationType {
    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VoteChanged => "vote_changed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// The user receiving the notification
    pub user_id: i32,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    #[sea_orm(column_name = "type")]
    pub notification_type: NotificationType,

    /// Related poll, kept as a plain reference so it survives poll deletion
    #[sea_orm(nullable)]
    pub poll_id: Option<i32>,

    #[sea_orm(default_value = false)]
    pub read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
