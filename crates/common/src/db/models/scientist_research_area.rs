//! Scientist <-> research area membership (append-only)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scientists_research_areas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub scientist_id: i32,

    pub research_area_id: i32,

    pub created_at: DateTimeWithTimeZone,
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
        belongs_to = "super::research_area::Entity",
        from = "Column::ResearchAreaId",
        to = "super::research_area::Column::Id",
        on_delete = "Cascade"
    )]
    ResearchArea,
}

impl Related<super::research_area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResearchArea.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
