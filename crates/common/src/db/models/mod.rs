//! SeaORM entity models
//!
//! Tables of the staff directory schema

mod scientist;
mod bibliometrics;
mod publication;
mod scientist_publication;
mod organization;
mod organization_relationship;
mod scientist_organization;
mod research_area;
mod scientist_research_area;

pub use scientist::{
    Entity as ScientistEntity,
    Model as Scientist,
    ActiveModel as ScientistActiveModel,
    Column as ScientistColumn,
};

pub use bibliometrics::{
    Entity as BibliometricsEntity,
    Model as Bibliometrics,
    ActiveModel as BibliometricsActiveModel,
    Column as BibliometricsColumn,
};

pub use publication::{
    Entity as PublicationEntity,
    Model as Publication,
    ActiveModel as PublicationActiveModel,
    Column as PublicationColumn,
};

pub use scientist_publication::{
    Entity as AuthorshipEntity,
    Model as Authorship,
    ActiveModel as AuthorshipActiveModel,
    Column as AuthorshipColumn,
};

pub use organization::{
    Entity as OrganizationEntity,
    Model as Organization,
    ActiveModel as OrganizationActiveModel,
    Column as OrganizationColumn,
    OrganizationType,
};

pub use organization_relationship::{
    Entity as OrganizationEdgeEntity,
    Model as OrganizationEdge,
    ActiveModel as OrganizationEdgeActiveModel,
    Column as OrganizationEdgeColumn,
};

pub use scientist_organization::{
    Entity as AffiliationEntity,
    Model as Affiliation,
    ActiveModel as AffiliationActiveModel,
    Column as AffiliationColumn,
};

pub use research_area::{
    Entity as ResearchAreaEntity,
    Model as ResearchArea,
    ActiveModel as ResearchAreaActiveModel,
    Column as ResearchAreaColumn,
};

pub use scientist_research_area::{
    Entity as ScientistResearchAreaEntity,
    Model as ScientistResearchArea,
    ActiveModel as ScientistResearchAreaActiveModel,
    Column as ScientistResearchAreaColumn,
};
