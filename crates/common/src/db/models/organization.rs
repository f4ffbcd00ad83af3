//! Organization entity, identified by name and type

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Level of an organization in the university tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationType {
    University,
    Institute,
    Cathedra,
}

impl OrganizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::University => "university",
            OrganizationType::Institute => "institute",
            OrganizationType::Cathedra => "cathedra",
        }
    }

    /// Map a stored type or an affiliation label onto a tree level
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "university" => Some(OrganizationType::University),
            "institute" => Some(OrganizationType::Institute),
            "cathedra" => Some(OrganizationType::Cathedra),
            _ => None,
        }
    }
}

impl From<OrganizationType> for String {
    fn from(kind: OrganizationType) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_name = "type", column_type = "Text")]
    pub organization_type: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn kind(&self) -> Option<OrganizationType> {
        OrganizationType::parse(&self.organization_type)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
