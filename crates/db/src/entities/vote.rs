//! Vote entity.
//!
//! `(user_id, option_id)` is unique. At most one vote per user per poll is
//! maintained by the vote service, which removes the user's vote on sibling
//! options before inserting a new one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// User who voted
    pub user_id: i32,

    /// Chosen option
    #[sea_orm(indexed)]
    pub option_id: i32,

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
    User,

    #[sea_orm(
        belongs_to = "super::poll_option::Entity",
        from = "Column::OptionId",
        to = "super::poll_option::Column::Id",
        on_delete = "Cascade"
    )]
    PollOption,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::poll_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PollOption.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
