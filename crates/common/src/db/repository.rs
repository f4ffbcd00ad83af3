//! Repository pattern for the staff directory tables
//!
//! Every write is an upsert by natural key: look the row up, then update it
//! if something changed or insert it if it is absent. The repository borrows
//! a connection, so the same code runs on the pool or inside the
//! transaction a record is reconciled in.

use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::records::{BibliometricsFields, PublicationFields, ScientistFields};
use chrono::{NaiveDate, Utc};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::HashSet;

/// Outcome of an upsert, carrying the row id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted(i32),
    Updated(i32),
    Unchanged(i32),
}

impl Upserted {
    pub fn id(&self) -> i32 {
        match *self {
            Upserted::Inserted(id) | Upserted::Updated(id) | Upserted::Unchanged(id) => id,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Upserted::Inserted(_) => "inserted",
            Upserted::Updated(_) => "updated",
            Upserted::Unchanged(_) => "unchanged",
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, Upserted::Inserted(_))
    }
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Repository for data access operations
pub struct Repository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> Repository<'c, C> {
    /// Create a repository over a connection or transaction
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Scientist Operations
    // ========================================================================

    /// Find scientist by email
    pub async fn find_scientist_by_email(&self, email: &str) -> Result<Option<Scientist>> {
        ScientistEntity::find()
            .filter(ScientistColumn::Email.eq(email))
            .one(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Insert a scientist or rewrite all six core fields when any of them changed
    pub async fn upsert_scientist(&self, fields: &ScientistFields) -> Result<Upserted> {
        if let Some(existing) = self.find_scientist_by_email(&fields.email).await? {
            if existing.core_fields() == *fields {
                return Ok(Upserted::Unchanged(existing.id));
            }

            let id = existing.id;
            let mut scientist: ScientistActiveModel = existing.into();
            scientist.first_name = Set(fields.first_name.clone());
            scientist.last_name = Set(fields.last_name.clone());
            scientist.academic_title = Set(fields.academic_title.clone());
            scientist.email = Set(fields.email.clone());
            scientist.profile_url = Set(fields.profile_url.clone());
            scientist.position = Set(fields.position.clone());
            scientist.updated_at = Set(now());
            scientist.update(self.conn).await?;

            return Ok(Upserted::Updated(id));
        }

        let stamp = now();
        let scientist = ScientistActiveModel {
            first_name: Set(fields.first_name.clone()),
            last_name: Set(fields.last_name.clone()),
            academic_title: Set(fields.academic_title.clone()),
            email: Set(fields.email.clone()),
            profile_url: Set(fields.profile_url.clone()),
            position: Set(fields.position.clone()),
            created_at: Set(stamp),
            updated_at: Set(stamp),
            ..Default::default()
        };

        let inserted = scientist.insert(self.conn).await?;
        Ok(Upserted::Inserted(inserted.id))
    }

    /// Scientists whose profile URL contains the fragment, oldest first.
    ///
    /// Substring matching can hit several profiles; callers decide what to
    /// do with more than one.
    pub async fn find_scientists_by_profile_fragment(
        &self,
        fragment: &str,
        limit: u64,
    ) -> Result<Vec<Scientist>> {
        if fragment.trim().is_empty() {
            return Ok(Vec::new());
        }

        ScientistEntity::find()
            .filter(ScientistColumn::ProfileUrl.contains(fragment))
            .order_by_asc(ScientistColumn::Id)
            .limit(limit)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Bibliometrics Operations
    // ========================================================================

    pub async fn find_bibliometrics(&self, scientist_id: i32) -> Result<Option<Bibliometrics>> {
        BibliometricsEntity::find()
            .filter(BibliometricsColumn::ScientistId.eq(scientist_id))
            .one(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Insert or refresh the scores of a scientist
    pub async fn upsert_bibliometrics(
        &self,
        scientist_id: i32,
        fields: &BibliometricsFields,
    ) -> Result<Upserted> {
        if let Some(existing) = self.find_bibliometrics(scientist_id).await? {
            if existing.fields() == *fields {
                return Ok(Upserted::Unchanged(existing.id));
            }

            let id = existing.id;
            let mut row: BibliometricsActiveModel = existing.into();
            row.h_index_wos = Set(fields.h_index_wos);
            row.h_index_scopus = Set(fields.h_index_scopus);
            row.publication_count = Set(fields.publication_count);
            row.ministerial_score = Set(fields.ministerial_score);
            row.updated_at = Set(now());
            row.update(self.conn).await?;

            return Ok(Upserted::Updated(id));
        }

        let stamp = now();
        let row = BibliometricsActiveModel {
            scientist_id: Set(scientist_id),
            h_index_wos: Set(fields.h_index_wos),
            h_index_scopus: Set(fields.h_index_scopus),
            publication_count: Set(fields.publication_count),
            ministerial_score: Set(fields.ministerial_score),
            created_at: Set(stamp),
            updated_at: Set(stamp),
            ..Default::default()
        };

        let inserted = row.insert(self.conn).await?;
        Ok(Upserted::Inserted(inserted.id))
    }

    // ========================================================================
    // Publication Operations
    // ========================================================================

    /// Find a publication by title and date; a stored null date matches any date
    pub async fn find_publication(
        &self,
        title: &str,
        publication_date: Option<NaiveDate>,
    ) -> Result<Option<Publication>> {
        let date_matches = match publication_date {
            Some(date) => Condition::any()
                .add(PublicationColumn::PublicationDate.eq(date))
                .add(PublicationColumn::PublicationDate.is_null()),
            None => Condition::all().add(PublicationColumn::PublicationDate.is_null()),
        };

        PublicationEntity::find()
            .filter(PublicationColumn::Title.eq(title))
            .filter(date_matches)
            .order_by_asc(PublicationColumn::Id)
            .one(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Insert a publication or refresh its journal and score
    pub async fn upsert_publication(&self, fields: &PublicationFields) -> Result<Upserted> {
        if let Some(existing) = self
            .find_publication(&fields.title, fields.publication_date)
            .await?
        {
            if existing.journal == fields.journal
                && existing.ministerial_score == fields.ministerial_score
            {
                return Ok(Upserted::Unchanged(existing.id));
            }

            let id = existing.id;
            let mut publication: PublicationActiveModel = existing.into();
            publication.journal = Set(fields.journal.clone());
            publication.ministerial_score = Set(fields.ministerial_score);
            publication.updated_at = Set(now());
            publication.update(self.conn).await?;

            return Ok(Upserted::Updated(id));
        }

        let stamp = now();
        let publication = PublicationActiveModel {
            title: Set(fields.title.clone()),
            publisher: Set(fields.publisher.clone()),
            publication_date: Set(fields.publication_date),
            journal: Set(fields.journal.clone()),
            journal_impact_factor: Set(0.0),
            ministerial_score: Set(fields.ministerial_score),
            created_at: Set(stamp),
            updated_at: Set(stamp),
            ..Default::default()
        };

        let inserted = publication.insert(self.conn).await?;
        Ok(Upserted::Inserted(inserted.id))
    }

    /// Link a scientist to a publication unless the link already exists
    pub async fn ensure_authorship(&self, scientist_id: i32, publication_id: i32) -> Result<Upserted> {
        let existing = AuthorshipEntity::find()
            .filter(AuthorshipColumn::ScientistId.eq(scientist_id))
            .filter(AuthorshipColumn::PublicationId.eq(publication_id))
            .one(self.conn)
            .await?;

        if let Some(row) = existing {
            return Ok(Upserted::Unchanged(row.id));
        }

        let row = AuthorshipActiveModel {
            scientist_id: Set(scientist_id),
            publication_id: Set(publication_id),
            created_at: Set(now()),
            ..Default::default()
        };

        let inserted = row.insert(self.conn).await?;
        Ok(Upserted::Inserted(inserted.id))
    }

    // ========================================================================
    // Organization Operations
    // ========================================================================

    /// Insert an organization node unless one with this name and type exists
    pub async fn upsert_organization(
        &self,
        name: &str,
        organization_type: OrganizationType,
    ) -> Result<Upserted> {
        let existing = OrganizationEntity::find()
            .filter(OrganizationColumn::Name.eq(name))
            .filter(OrganizationColumn::OrganizationType.eq(organization_type.as_str()))
            .one(self.conn)
            .await?;

        if let Some(org) = existing {
            return Ok(Upserted::Unchanged(org.id));
        }

        let org = OrganizationActiveModel {
            name: Set(name.to_string()),
            organization_type: Set(organization_type.into()),
            created_at: Set(now()),
            ..Default::default()
        };

        let inserted = org.insert(self.conn).await?;
        Ok(Upserted::Inserted(inserted.id))
    }

    /// Find an organization by exact name.
    ///
    /// When the name exists at several tree levels the one of type `preferred`
    /// wins, otherwise the oldest row.
    pub async fn find_organization_by_name(
        &self,
        name: &str,
        preferred: Option<OrganizationType>,
    ) -> Result<Organization> {
        let candidates = OrganizationEntity::find()
            .filter(OrganizationColumn::Name.eq(name))
            .order_by_asc(OrganizationColumn::Id)
            .all(self.conn)
            .await?;

        let preferred_match = preferred.and_then(|kind| {
            candidates
                .iter()
                .position(|org| org.kind() == Some(kind))
        });

        let index = preferred_match.unwrap_or(0);
        candidates
            .into_iter()
            .nth(index)
            .ok_or_else(|| AppError::OrganizationNotFound {
                name: name.to_string(),
            })
    }

    /// Record a tree edge once.
    ///
    /// `None` as parent marks a root, `None` as child marks a leaf; the pair is
    /// matched exactly, nulls included.
    pub async fn ensure_organization_edge(
        &self,
        parent_id: Option<i32>,
        child_id: Option<i32>,
    ) -> Result<Upserted> {
        let condition = match (parent_id, child_id) {
            (None, None) => {
                return Err(AppError::Internal {
                    message: "organization edge needs at least one endpoint".to_string(),
                })
            }
            (None, Some(child)) => Condition::all()
                .add(OrganizationEdgeColumn::ParentId.is_null())
                .add(OrganizationEdgeColumn::ChildId.eq(child)),
            (Some(parent), None) => Condition::all()
                .add(OrganizationEdgeColumn::ParentId.eq(parent))
                .add(OrganizationEdgeColumn::ChildId.is_null()),
            (Some(parent), Some(child)) => Condition::all()
                .add(OrganizationEdgeColumn::ParentId.eq(parent))
                .add(OrganizationEdgeColumn::ChildId.eq(child)),
        };

        let existing = OrganizationEdgeEntity::find()
            .filter(condition)
            .one(self.conn)
            .await?;

        if let Some(edge) = existing {
            return Ok(Upserted::Unchanged(edge.id));
        }

        let edge = OrganizationEdgeActiveModel {
            parent_id: Set(parent_id),
            child_id: Set(child_id),
            created_at: Set(now()),
            ..Default::default()
        };

        let inserted = edge.insert(self.conn).await?;
        Ok(Upserted::Inserted(inserted.id))
    }

    // ========================================================================
    // Affiliation Operations
    // ========================================================================

    /// Point the scientist's affiliation of this type at the organization
    pub async fn upsert_affiliation(
        &self,
        scientist_id: i32,
        affiliation_type: &str,
        organization_id: i32,
    ) -> Result<Upserted> {
        let existing = AffiliationEntity::find()
            .filter(AffiliationColumn::ScientistId.eq(scientist_id))
            .filter(AffiliationColumn::AffiliationType.eq(affiliation_type))
            .one(self.conn)
            .await?;

        if let Some(row) = existing {
            if row.organization_id == organization_id {
                return Ok(Upserted::Unchanged(row.id));
            }

            let id = row.id;
            let mut row: AffiliationActiveModel = row.into();
            row.organization_id = Set(organization_id);
            row.updated_at = Set(now());
            row.update(self.conn).await?;

            return Ok(Upserted::Updated(id));
        }

        let stamp = now();
        let row = AffiliationActiveModel {
            scientist_id: Set(scientist_id),
            organization_id: Set(organization_id),
            affiliation_type: Set(affiliation_type.to_string()),
            created_at: Set(stamp),
            updated_at: Set(stamp),
            ..Default::default()
        };

        let inserted = row.insert(self.conn).await?;
        Ok(Upserted::Inserted(inserted.id))
    }

    // ========================================================================
    // Research Area Operations
    // ========================================================================

    pub async fn upsert_research_area(&self, name: &str) -> Result<Upserted> {
        let existing = ResearchAreaEntity::find()
            .filter(ResearchAreaColumn::Name.eq(name))
            .one(self.conn)
            .await?;

        if let Some(area) = existing {
            return Ok(Upserted::Unchanged(area.id));
        }

        let area = ResearchAreaActiveModel {
            name: Set(name.to_string()),
            created_at: Set(now()),
            ..Default::default()
        };

        let inserted = area.insert(self.conn).await?;
        Ok(Upserted::Inserted(inserted.id))
    }

    /// Research area ids currently linked to the scientist
    pub async fn linked_research_areas(&self, scientist_id: i32) -> Result<Vec<i32>> {
        let links = ScientistResearchAreaEntity::find()
            .filter(ScientistResearchAreaColumn::ScientistId.eq(scientist_id))
            .all(self.conn)
            .await?;

        Ok(links.into_iter().map(|link| link.research_area_id).collect())
    }

    /// Link every area not yet linked; existing links are never removed.
    ///
    /// Returns the number of links created.
    pub async fn link_research_areas(&self, scientist_id: i32, area_ids: &[i32]) -> Result<usize> {
        let mut linked: HashSet<i32> = self
            .linked_research_areas(scientist_id)
            .await?
            .into_iter()
            .collect();

        let mut created = 0;
        for &area_id in area_ids {
            if !linked.insert(area_id) {
                continue;
            }

            let link = ScientistResearchAreaActiveModel {
                scientist_id: Set(scientist_id),
                research_area_id: Set(area_id),
                created_at: Set(now()),
                ..Default::default()
            };
            link.insert(self.conn).await?;
            created += 1;
        }

        Ok(created)
    }
}
