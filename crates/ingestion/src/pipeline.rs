//! Pipeline driver
//!
//! Runs every record through clean, validate and the sink. A failing record
//! is logged and counted; only errors that make further writes pointless
//! end the run.

use crate::errors::IngestionError;
use crate::sink::{RecordSink, SinkOutcome};
use crate::source::SourceItem;
use harvest_common::metrics::{record_outcome, RecordMetrics, RecordOutcome};
use harvest_common::Record;
use tracing::{error, info, warn};

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    /// Undecodable, failed, or not accepted by the sink
    pub skipped: usize,
    /// Rejected by validation
    pub dropped: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.dropped
    }
}

pub struct Pipeline<S> {
    sink: S,
    order_by_dependency: bool,
}

impl<S: RecordSink> Pipeline<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            order_by_dependency: true,
        }
    }

    /// Whether records are stably reordered so that referenced entities come first
    pub fn order_by_dependency(mut self, enabled: bool) -> Self {
        self.order_by_dependency = enabled;
        self
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub async fn run(&mut self, mut items: Vec<SourceItem>) -> Result<RunSummary, IngestionError> {
        let sink = self.sink.name();
        self.sink
            .open()
            .await
            .map_err(|source| IngestionError::Sink { sink, source })?;

        if self.order_by_dependency {
            items.sort_by_key(|item| item.record.as_ref().ok().map(Record::kind));
        }

        info!(sink, records = items.len(), "Starting run");
        let mut summary = RunSummary::default();

        for item in items {
            let mut record = match item.record {
                Ok(record) => record,
                Err(err) => {
                    warn!(origin = %item.origin, error = %err, "Skipping undecodable record");
                    record_outcome("unknown", RecordOutcome::Skipped);
                    summary.skipped += 1;
                    continue;
                }
            };

            let metrics = RecordMetrics::start(record.kind().as_str());

            record.clean();
            if let Err(err) = record.validate() {
                warn!(
                    origin = %item.origin,
                    record = %record.label(),
                    error = %err,
                    "Dropping invalid record"
                );
                metrics.finish(RecordOutcome::Dropped);
                summary.dropped += 1;
                continue;
            }

            match self.sink.write(&record).await {
                Ok(SinkOutcome::Stored) => {
                    metrics.finish(RecordOutcome::Processed);
                    summary.processed += 1;
                }
                Ok(SinkOutcome::Ignored) => {
                    metrics.finish(RecordOutcome::Skipped);
                    summary.skipped += 1;
                }
                Err(err) if err.is_fatal() => {
                    error!(
                        origin = %item.origin,
                        error = %err,
                        code = err.code().as_code(),
                        "Aborting run"
                    );
                    return Err(IngestionError::Sink { sink, source: err });
                }
                Err(err) => {
                    if err.is_warning() {
                        warn!(
                            origin = %item.origin,
                            record = %record.label(),
                            error = %err,
                            "Record skipped"
                        );
                    } else {
                        error!(
                            origin = %item.origin,
                            record = %record.label(),
                            error = %err,
                            code = err.code().as_code(),
                            "Record failed, rolled back"
                        );
                    }
                    metrics.finish(RecordOutcome::Skipped);
                    summary.skipped += 1;
                }
            }
        }

        self.sink
            .close()
            .await
            .map_err(|source| IngestionError::Sink { sink, source })?;

        info!(
            sink,
            processed = summary.processed,
            skipped = summary.skipped,
            dropped = summary.dropped,
            "Run complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use harvest_common::records::{
        OrganizationRecord, PublicationRecord, ScientistLinkRecord, ScientistRecord,
    };
    use harvest_common::{AppError, RecordKind};
    use pretty_assertions::assert_eq;

    /// Remembers what it was given; fails on titles it is told to
    #[derive(Default)]
    struct RecordingSink {
        opened: bool,
        closed: bool,
        written: Vec<Record>,
        fail_title: Option<&'static str>,
        fatal: bool,
    }

    #[async_trait]
    impl RecordSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn open(&mut self) -> harvest_common::Result<()> {
            self.opened = true;
            Ok(())
        }

        async fn write(&mut self, record: &Record) -> harvest_common::Result<SinkOutcome> {
            if let (Record::Publication(p), Some(title)) = (record, self.fail_title) {
                if p.title == title {
                    return Err(if self.fatal {
                        AppError::DatabaseConnection {
                            message: "gone".into(),
                        }
                    } else {
                        AppError::Database(sea_orm::DbErr::Custom("constraint".into()))
                    });
                }
            }
            if let Record::ScientistLink(_) = record {
                return Ok(SinkOutcome::Ignored);
            }
            self.written.push(record.clone());
            Ok(SinkOutcome::Stored)
        }

        async fn close(&mut self) -> harvest_common::Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn item(record: Record) -> SourceItem {
        SourceItem {
            origin: "test".into(),
            record: Ok(record),
        }
    }

    fn paper(title: &str) -> Record {
        Record::Publication(PublicationRecord {
            title: title.into(),
            ..Default::default()
        })
    }

    fn scientist(title: Option<&str>) -> Record {
        Record::Scientist(ScientistRecord {
            first_name: Some("  Ada ".into()),
            academic_title: title.map(Into::into),
            email: Some("a@x.com".into()),
            ..Default::default()
        })
    }

    fn org() -> Record {
        Record::Organization(OrganizationRecord {
            university: "Tech U".into(),
            institute: "CS Dept".into(),
            cathedras: vec![],
        })
    }

    #[test]
    fn test_records_ordered_by_dependency() {
        let items = vec![item(paper("P")), item(scientist(Some("dr"))), item(org())];

        let mut pipeline = Pipeline::new(RecordingSink::default());
        let summary = tokio_test::block_on(pipeline.run(items)).unwrap();
        assert_eq!(summary.processed, 3);

        let sink = pipeline.into_sink();
        let kinds: Vec<RecordKind> = sink.written.iter().map(Record::kind).collect();
        assert_eq!(
            kinds,
            vec![RecordKind::Organization, RecordKind::Scientist, RecordKind::Publication]
        );
        assert!(sink.opened && sink.closed);
    }

    #[test]
    fn test_preserve_order() {
        let items = vec![item(paper("P")), item(org())];

        let mut pipeline = Pipeline::new(RecordingSink::default()).order_by_dependency(false);
        tokio_test::block_on(pipeline.run(items)).unwrap();

        let kinds: Vec<RecordKind> = pipeline.into_sink().written.iter().map(Record::kind).collect();
        assert_eq!(kinds, vec![RecordKind::Publication, RecordKind::Organization]);
    }

    #[tokio::test]
    async fn test_records_cleaned_before_sink() {
        let mut pipeline = Pipeline::new(RecordingSink::default());
        pipeline.run(vec![item(scientist(Some(" dr   hab. ")))]).await.unwrap();

        let sink = pipeline.into_sink();
        let Record::Scientist(s) = &sink.written[0] else {
            panic!("expected scientist");
        };
        assert_eq!(s.first_name.as_deref(), Some("Ada"));
        assert_eq!(s.academic_title.as_deref(), Some("dr hab."));
    }

    #[tokio::test]
    async fn test_failures_counted_and_run_completes() {
        let items = vec![
            item(scientist(None)),
            SourceItem {
                origin: "dump.jsonl:2".into(),
                record: Err(AppError::UnknownRecord {
                    message: "fields [foo]".into(),
                }),
            },
            item(paper("Broken")),
            item(paper("Fine")),
            item(Record::ScientistLink(ScientistLinkRecord {
                profile_url: "/a".into(),
            })),
        ];

        let mut pipeline = Pipeline::new(RecordingSink {
            fail_title: Some("Broken"),
            ..Default::default()
        });
        let summary = pipeline.run(items).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                processed: 1,
                skipped: 3,
                dropped: 1,
            }
        );
        assert_eq!(summary.total(), 5);
        assert!(pipeline.into_sink().closed);
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_run() {
        let items = vec![item(paper("Broken")), item(paper("After"))];

        let mut pipeline = Pipeline::new(RecordingSink {
            fail_title: Some("Broken"),
            fatal: true,
            ..Default::default()
        })
        .order_by_dependency(false);
        let err = pipeline.run(items).await.unwrap_err();

        assert!(matches!(err, IngestionError::Sink { sink: "recording", .. }));
        assert!(pipeline.into_sink().written.is_empty());
    }
}
