//! Scientist entity, identified by email

use crate::records::ScientistFields;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scientists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub first_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub last_name: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub academic_title: String,

    /// Natural key
    #[sea_orm(column_type = "Text")]
    pub email: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub profile_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub position: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The stored snapshot of the six core fields
    pub fn core_fields(&self) -> ScientistFields {
        ScientistFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            academic_title: self.academic_title.clone(),
            email: self.email.clone(),
            profile_url: self.profile_url.clone(),
            position: self.position.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::bibliometrics::Entity")]
    Bibliometrics,
}

impl Related<super::bibliometrics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bibliometrics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
