//! Publication entity, identified by title and publication date

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub publisher: Option<String>,

    /// A null date matches any incoming date on lookup
    pub publication_date: Option<Date>,

    #[sea_orm(column_type = "Text", nullable)]
    pub journal: Option<String>,

    pub journal_impact_factor: f64,

    pub ministerial_score: Option<f64>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::scientist_publication::Entity")]
    Authorships,
}

impl Related<super::scientist_publication::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authorships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
