//! Scientist affiliation, one row per (scientist, affiliation type)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scientist_organization")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub scientist_id: i32,

    pub organization_id: i32,

    #[sea_orm(column_type = "Text")]
    pub affiliation_type: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::scientist::Entity",
        from = "Column::ScientistId",
        to = "super::scientist::Column::Id",
        on_delete = "Cascade"
    )]
    Scientist,

    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id",
        on_delete = "Cascade"
    )]
    Organization,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
