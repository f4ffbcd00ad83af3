//! Bibliometric scores, one row per scientist

use crate::records::BibliometricsFields;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bibliometrics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub scientist_id: i32,

    pub h_index_wos: Option<i32>,

    pub h_index_scopus: Option<i32>,

    pub publication_count: Option<i32>,

    pub ministerial_score: Option<f64>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn fields(&self) -> BibliometricsFields {
        BibliometricsFields {
            h_index_wos: self.h_index_wos,
            h_index_scopus: self.h_index_scopus,
            publication_count: self.publication_count,
            ministerial_score: self.ministerial_score,
        }
    }
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
}

impl Related<super::scientist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scientist.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
