//! Reconciliation processor
//!
//! Writes each record into the relational schema inside its own transaction.
//! Entities are matched by natural key so replaying the same crawl twice
//! leaves the database as it was after the first run.

use crate::sink::{RecordSink, SinkOutcome};
use async_trait::async_trait;
use harvest_common::db::models::OrganizationType;
use harvest_common::db::{DbPool, Repository};
use harvest_common::errors::{AppError, Result};
use harvest_common::metrics::{record_unresolved, record_upsert};
use harvest_common::records::{OrganizationRecord, PublicationRecord, ScientistRecord};
use harvest_common::Record;
use sea_orm::ConnectionTrait;
use tracing::{debug, info, instrument, warn};

/// Database sink: one transaction per record
pub struct Reconciler {
    pool: DbPool,
}

impl Reconciler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Reconcile one record, committing only when every step succeeded
    #[instrument(skip(self, record), fields(kind = record.kind().as_str(), record = %record.label()))]
    pub async fn reconcile(&self, record: &Record) -> Result<SinkOutcome> {
        if let Record::ScientistLink(_) = record {
            debug!("Profile links are not stored in the database");
            return Ok(SinkOutcome::Ignored);
        }

        let txn = self.pool.begin().await?;
        {
            let repo = Repository::new(&txn);
            match record {
                Record::Organization(org) => reconcile_organization(&repo, org).await?,
                Record::Scientist(scientist) => reconcile_scientist(&repo, scientist).await?,
                Record::Publication(publication) => {
                    reconcile_publication(&repo, publication).await?
                }
                Record::ScientistLink(_) => {}
            }
        }
        txn.commit().await?;

        Ok(SinkOutcome::Stored)
    }
}

#[async_trait]
impl RecordSink for Reconciler {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn open(&mut self) -> Result<()> {
        self.pool.ping().await
    }

    async fn write(&mut self, record: &Record) -> Result<SinkOutcome> {
        self.reconcile(record).await
    }

    async fn close(&mut self) -> Result<()> {
        debug!("Database sink closed");
        Ok(())
    }
}

/// University, institute and cathedras with the edges between them.
///
/// The university gets a root edge with no parent. Every cathedra, or the
/// institute itself when it has none, gets a leaf edge with no child.
async fn reconcile_organization<C: ConnectionTrait>(
    repo: &Repository<'_, C>,
    org: &OrganizationRecord,
) -> Result<()> {
    let university = repo
        .upsert_organization(&org.university, OrganizationType::University)
        .await?;
    record_upsert("organization", university.outcome());
    let edge = repo.ensure_organization_edge(None, Some(university.id())).await?;
    record_upsert("organization_edge", edge.outcome());

    let institute = repo
        .upsert_organization(&org.institute, OrganizationType::Institute)
        .await?;
    record_upsert("organization", institute.outcome());
    let edge = repo
        .ensure_organization_edge(Some(university.id()), Some(institute.id()))
        .await?;
    record_upsert("organization_edge", edge.outcome());

    let cathedras: Vec<&String> = org
        .cathedras
        .iter()
        .filter(|name| !name.trim().is_empty())
        .collect();

    if cathedras.is_empty() {
        let edge = repo.ensure_organization_edge(Some(institute.id()), None).await?;
        record_upsert("organization_edge", edge.outcome());
        return Ok(());
    }

    for name in cathedras {
        let cathedra = repo
            .upsert_organization(name, OrganizationType::Cathedra)
            .await?;
        record_upsert("organization", cathedra.outcome());

        let edge = repo
            .ensure_organization_edge(Some(institute.id()), Some(cathedra.id()))
            .await?;
        record_upsert("organization_edge", edge.outcome());
        let edge = repo.ensure_organization_edge(Some(cathedra.id()), None).await?;
        record_upsert("organization_edge", edge.outcome());
    }

    Ok(())
}

async fn reconcile_scientist<C: ConnectionTrait>(
    repo: &Repository<'_, C>,
    record: &ScientistRecord,
) -> Result<()> {
    // Parse everything up front so a malformed score writes nothing
    let core = record.core_fields()?;
    let scores = record.bibliometrics()?;

    let scientist = repo.upsert_scientist(&core).await?;
    record_upsert("scientist", scientist.outcome());
    let scientist_id = scientist.id();

    let bibliometrics = repo.upsert_bibliometrics(scientist_id, &scores).await?;
    record_upsert("bibliometrics", bibliometrics.outcome());

    for (affiliation_type, name) in &record.organizations {
        let preferred = OrganizationType::parse(affiliation_type);
        let organization = match repo.find_organization_by_name(name, preferred).await {
            Ok(organization) => organization,
            Err(err @ AppError::OrganizationNotFound { .. }) => {
                warn!(
                    affiliation_type = %affiliation_type,
                    error = %err,
                    "Skipping affiliation"
                );
                record_unresolved("organization");
                continue;
            }
            Err(err) => return Err(err),
        };

        let affiliation = repo
            .upsert_affiliation(scientist_id, affiliation_type, organization.id)
            .await?;
        record_upsert("affiliation", affiliation.outcome());
    }

    if record.research_area.is_empty() {
        return Ok(());
    }

    let mut area_ids = Vec::with_capacity(record.research_area.len());
    for name in &record.research_area {
        let area = repo.upsert_research_area(name).await?;
        record_upsert("research_area", area.outcome());
        area_ids.push(area.id());
    }

    let created = repo.link_research_areas(scientist_id, &area_ids).await?;
    if created > 0 {
        debug!(scientist_id, created, "Linked research areas");
    }

    Ok(())
}

/// Upsert the publication once per author and link every resolvable author
async fn reconcile_publication<C: ConnectionTrait>(
    repo: &Repository<'_, C>,
    record: &PublicationRecord,
) -> Result<()> {
    let fields = record.fields()?;

    if record.authors.is_empty() {
        let publication = repo.upsert_publication(&fields).await?;
        record_upsert("publication", publication.outcome());
        info!(publication_id = publication.id(), "Publication has no authors");
        return Ok(());
    }

    for fragment in &record.authors {
        let publication = repo.upsert_publication(&fields).await?;
        record_upsert("publication", publication.outcome());

        let scientist_id = match resolve_author(repo, fragment).await {
            Ok(id) => id,
            Err(err @ AppError::AuthorNotFound { .. }) => {
                warn!(error = %err, "Skipping author");
                record_unresolved("author");
                continue;
            }
            Err(err) => return Err(err),
        };

        let authorship = repo.ensure_authorship(scientist_id, publication.id()).await?;
        record_upsert("authorship", authorship.outcome());
    }

    Ok(())
}

/// Scientist whose profile URL contains the fragment; the oldest wins a tie
async fn resolve_author<C: ConnectionTrait>(
    repo: &Repository<'_, C>,
    fragment: &str,
) -> Result<i32> {
    let matches = repo.find_scientists_by_profile_fragment(fragment, 2).await?;

    match matches.as_slice() {
        [] => Err(AppError::AuthorNotFound {
            fragment: fragment.to_string(),
        }),
        [only] => Ok(only.id),
        [first, ..] => {
            warn!(
                fragment,
                scientist_id = first.id,
                "Author fragment matches several profiles, using the oldest"
            );
            Ok(first.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_common::config::DatabaseConfig;
    use harvest_common::db::models::*;
    use pretty_assertions::assert_eq;
    use sea_orm::{EntityTrait, PaginatorTrait};
    use std::collections::{BTreeMap, HashMap};

    async fn reconciler() -> Reconciler {
        let mut config = DatabaseConfig::with_url("sqlite::memory:");
        config.create_schema = true;
        Reconciler::new(DbPool::new(&config).await.unwrap())
    }

    fn tech_u() -> Record {
        Record::Organization(OrganizationRecord {
            university: "Tech U".into(),
            institute: "CS Dept".into(),
            cathedras: vec!["AI Lab".into(), "Systems Lab".into()],
        })
    }

    fn scientist(email: &str, last_name: &str) -> ScientistRecord {
        ScientistRecord {
            first_name: Some("Ada".into()),
            last_name: Some(last_name.into()),
            academic_title: Some("dr".into()),
            email: Some(email.into()),
            profile_url: Some("https://repo.example.edu/info/author/jdoe/".into()),
            position: Some("Assistant Professor".into()),
            h_index_wos: Some("4".into()),
            h_index_scopus: Some("5".into()),
            publication_count: Some("31".into()),
            ministerial_score: Some("412,5".into()),
            ..Default::default()
        }
    }

    fn publication(authors: &[&str]) -> Record {
        Record::Publication(PublicationRecord {
            title: "Graph Coloring Revisited".into(),
            publisher: Some("ACM".into()),
            publication_date: None,
            journal: Some("JACM".into()),
            ministerial_score: Some("140".into()),
            authors: authors.iter().map(|a| a.to_string()).collect(),
        })
    }

    async fn edges_by_name(r: &Reconciler) -> Vec<(Option<String>, Option<String>)> {
        let names: HashMap<i32, String> = OrganizationEntity::find()
            .all(r.pool().conn())
            .await
            .unwrap()
            .into_iter()
            .map(|org| (org.id, org.name))
            .collect();
        let name = |id: Option<i32>| id.map(|id| names[&id].clone());

        let mut edges: Vec<_> = OrganizationEdgeEntity::find()
            .all(r.pool().conn())
            .await
            .unwrap()
            .into_iter()
            .map(|edge| (name(edge.parent_id), name(edge.child_id)))
            .collect();
        edges.sort();
        edges
    }

    #[tokio::test]
    async fn test_organization_tree_with_sentinels() {
        let r = reconciler().await;
        assert_eq!(r.reconcile(&tech_u()).await.unwrap(), SinkOutcome::Stored);

        let s = |v: &str| Some(v.to_string());
        let mut expected = vec![
            (None, s("Tech U")),
            (s("Tech U"), s("CS Dept")),
            (s("CS Dept"), s("AI Lab")),
            (s("CS Dept"), s("Systems Lab")),
            (s("AI Lab"), None),
            (s("Systems Lab"), None),
        ];
        expected.sort();

        assert_eq!(OrganizationEntity::find().count(r.pool().conn()).await.unwrap(), 4);
        assert_eq!(edges_by_name(&r).await, expected);

        // Replaying the hierarchy adds nothing
        r.reconcile(&tech_u()).await.unwrap();
        assert_eq!(OrganizationEntity::find().count(r.pool().conn()).await.unwrap(), 4);
        assert_eq!(edges_by_name(&r).await, expected);
    }

    #[tokio::test]
    async fn test_childless_institute_gets_leaf_edge() {
        let r = reconciler().await;
        let record = Record::Organization(OrganizationRecord {
            university: "Tech U".into(),
            institute: "Physics".into(),
            cathedras: vec!["  ".into()],
        });
        r.reconcile(&record).await.unwrap();

        let s = |v: &str| Some(v.to_string());
        assert_eq!(
            edges_by_name(&r).await,
            vec![
                (None, s("Tech U")),
                (s("Physics"), None),
                (s("Tech U"), s("Physics")),
            ]
        );
    }

    #[tokio::test]
    async fn test_same_scientist_twice_is_one_row() {
        let r = reconciler().await;
        let record = Record::Scientist(scientist("a@x.com", "B"));

        r.reconcile(&record).await.unwrap();
        r.reconcile(&record).await.unwrap();

        assert_eq!(ScientistEntity::find().count(r.pool().conn()).await.unwrap(), 1);
        assert_eq!(BibliometricsEntity::find().count(r.pool().conn()).await.unwrap(), 1);

        let scores = BibliometricsEntity::find().one(r.pool().conn()).await.unwrap().unwrap();
        assert_eq!(scores.h_index_scopus, Some(5));
        assert_eq!(scores.ministerial_score, Some(412.5));
    }

    #[tokio::test]
    async fn test_changed_last_name_updates_in_place() {
        let r = reconciler().await;
        r.reconcile(&Record::Scientist(scientist("a@x.com", "B"))).await.unwrap();
        let before = ScientistEntity::find().one(r.pool().conn()).await.unwrap().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        r.reconcile(&Record::Scientist(scientist("a@x.com", "C"))).await.unwrap();

        let rows = ScientistEntity::find().all(r.pool().conn()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, before.id);
        assert_eq!(rows[0].last_name.as_deref(), Some("C"));
        assert!(rows[0].updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_affiliations_resolve_by_name() {
        let r = reconciler().await;
        r.reconcile(&tech_u()).await.unwrap();

        let mut organizations = BTreeMap::new();
        organizations.insert("university".to_string(), "Tech U".to_string());
        organizations.insert("cathedra".to_string(), "AI Lab".to_string());
        organizations.insert("institute".to_string(), "Unknown Dept".to_string());
        let record = Record::Scientist(ScientistRecord {
            organizations,
            ..scientist("a@x.com", "B")
        });

        // The unknown institute is skipped, the rest of the record is kept
        assert_eq!(r.reconcile(&record).await.unwrap(), SinkOutcome::Stored);

        let mut rows: Vec<(String, i32)> = AffiliationEntity::find()
            .all(r.pool().conn())
            .await
            .unwrap()
            .into_iter()
            .map(|a| (a.affiliation_type, a.organization_id))
            .collect();
        rows.sort();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "cathedra");
        assert_eq!(rows[1].0, "university");

        r.reconcile(&record).await.unwrap();
        assert_eq!(AffiliationEntity::find().count(r.pool().conn()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_research_areas_only_grow() {
        let r = reconciler().await;
        let first = Record::Scientist(ScientistRecord {
            research_area: vec!["graph theory".into(), "logic".into(), "logic".into()],
            ..scientist("a@x.com", "B")
        });
        r.reconcile(&first).await.unwrap();

        let second = Record::Scientist(ScientistRecord {
            research_area: vec!["combinatorics".into()],
            ..scientist("a@x.com", "B")
        });
        r.reconcile(&second).await.unwrap();

        assert_eq!(ResearchAreaEntity::find().count(r.pool().conn()).await.unwrap(), 3);
        assert_eq!(
            ScientistResearchAreaEntity::find().count(r.pool().conn()).await.unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_author_fragment_links_once() {
        let r = reconciler().await;
        r.reconcile(&Record::Scientist(scientist("a@x.com", "B"))).await.unwrap();

        let record = publication(&["jdoe"]);
        r.reconcile(&record).await.unwrap();
        r.reconcile(&record).await.unwrap();

        assert_eq!(PublicationEntity::find().count(r.pool().conn()).await.unwrap(), 1);
        let links = AuthorshipEntity::find().all(r.pool().conn()).await.unwrap();
        assert_eq!(links.len(), 1);

        let scientist = ScientistEntity::find().one(r.pool().conn()).await.unwrap().unwrap();
        assert_eq!(links[0].scientist_id, scientist.id);
    }

    #[tokio::test]
    async fn test_unresolved_author_keeps_publication() {
        let r = reconciler().await;

        assert_eq!(
            r.reconcile(&publication(&["nobody"])).await.unwrap(),
            SinkOutcome::Stored
        );
        assert_eq!(PublicationEntity::find().count(r.pool().conn()).await.unwrap(), 1);
        assert_eq!(AuthorshipEntity::find().count(r.pool().conn()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publication_without_authors_stored_once() {
        let r = reconciler().await;
        r.reconcile(&publication(&[])).await.unwrap();
        r.reconcile(&publication(&[])).await.unwrap();

        assert_eq!(PublicationEntity::find().count(r.pool().conn()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_fragment_uses_oldest_profile() {
        let r = reconciler().await;
        r.reconcile(&Record::Scientist(scientist("a@x.com", "B"))).await.unwrap();
        let second = ScientistRecord {
            profile_url: Some("https://repo.example.edu/info/author/jdoe2/".into()),
            ..scientist("b@x.com", "D")
        };
        r.reconcile(&Record::Scientist(second)).await.unwrap();

        r.reconcile(&publication(&["jdoe"])).await.unwrap();

        let oldest = Repository::new(r.pool().conn())
            .find_scientist_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap();
        let links = AuthorshipEntity::find().all(r.pool().conn()).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].scientist_id, oldest.id);
    }

    #[tokio::test]
    async fn test_malformed_score_writes_nothing() {
        let r = reconciler().await;
        let record = Record::Scientist(ScientistRecord {
            h_index_wos: Some("many".into()),
            ..scientist("a@x.com", "B")
        });

        let err = r.reconcile(&record).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat { .. }));
        assert_eq!(ScientistEntity::find().count(r.pool().conn()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_step_rolls_back_record() {
        let r = reconciler().await;
        r.pool()
            .conn()
            .execute_unprepared("DROP TABLE scientists_research_areas")
            .await
            .unwrap();

        let record = Record::Scientist(ScientistRecord {
            research_area: vec!["logic".into()],
            ..scientist("a@x.com", "B")
        });
        let err = r.reconcile(&record).await.unwrap_err();
        assert!(!err.is_fatal());

        assert_eq!(ScientistEntity::find().count(r.pool().conn()).await.unwrap(), 0);
        assert_eq!(BibliometricsEntity::find().count(r.pool().conn()).await.unwrap(), 0);
        assert_eq!(ResearchAreaEntity::find().count(r.pool().conn()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_links_are_ignored() {
        let r = reconciler().await;
        let record = Record::from_value(serde_json::json!({"profile_url": "/info/author/jdoe"}))
            .unwrap();
        assert_eq!(r.reconcile(&record).await.unwrap(), SinkOutcome::Ignored);
    }
}
