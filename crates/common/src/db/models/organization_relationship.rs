//! Parent/child edge of the organization tree.
//!
//! A null `parent_id` marks a root, a null `child_id` marks a leaf.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations_relationships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub parent_id: Option<i32>,

    pub child_id: Option<i32>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::ParentId",
        to = "super::organization::Column::Id",
        on_delete = "Cascade"
    )]
    Parent,

    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::ChildId",
        to = "super::organization::Column::Id",
        on_delete = "Cascade"
    )]
    Child,
}

impl ActiveModelBehavior for ActiveModel {}
