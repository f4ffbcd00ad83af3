//! JSON file sink
//!
//! Appends records to three JSON arrays on disk without any reconciliation.
//! The files are reset to `[]` when the sink opens.

use crate::sink::{RecordSink, SinkOutcome};
use async_trait::async_trait;
use harvest_common::config::OutputConfig;
use harvest_common::errors::{AppError, Result};
use harvest_common::Record;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct JsonFileSink {
    config: OutputConfig,
}

impl JsonFileSink {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    fn target(&self, record: &Record) -> Option<PathBuf> {
        match record {
            Record::Organization(_) => Some(self.config.organization_path()),
            Record::ScientistLink(_) => Some(self.config.links_path()),
            Record::Scientist(_) => Some(self.config.personal_data_path()),
            Record::Publication(_) => None,
        }
    }

    fn files(&self) -> [PathBuf; 3] {
        [
            self.config.organization_path(),
            self.config.links_path(),
            self.config.personal_data_path(),
        ]
    }
}

#[async_trait]
impl RecordSink for JsonFileSink {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn open(&mut self) -> Result<()> {
        let dir = &self.config.dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::io(dir.display().to_string(), e))?;

        for path in self.files() {
            write_array(&path, &[]).await?;
        }

        info!(dir = %dir.display(), "JSON output files reset");
        Ok(())
    }

    async fn write(&mut self, record: &Record) -> Result<SinkOutcome> {
        let Some(path) = self.target(record) else {
            warn!(record = %record.label(), "Publications have no JSON output file, skipping");
            return Ok(SinkOutcome::Ignored);
        };

        let mut items = read_array(&path).await?;
        items.push(serde_json::to_value(record)?);
        write_array(&path, &items).await?;

        debug!(path = %path.display(), count = items.len(), "Record appended");
        Ok(SinkOutcome::Stored)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

async fn read_array(path: &Path) -> Result<Vec<Value>> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::io(path.display().to_string(), e))?;

    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(&raw)?)
}

/// Write an array indented by four spaces
async fn write_array(path: &Path, items: &[Value]) -> Result<()> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    items.serialize(&mut ser)?;

    tokio::fs::write(path, buf)
        .await
        .map_err(|e| AppError::io(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_common::records::{OrganizationRecord, PublicationRecord, ScientistLinkRecord};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sink(dir: &Path) -> JsonFileSink {
        JsonFileSink::new(OutputConfig {
            dir: dir.to_path_buf(),
            ..OutputConfig::default()
        })
    }

    async fn read(path: PathBuf) -> Value {
        serde_json::from_slice(&tokio::fs::read(path).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_open_resets_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut sink = sink(&out);

        tokio::fs::create_dir_all(&out).await.unwrap();
        tokio::fs::write(out.join("links.json"), "[{\"profile_url\": \"old\"}]")
            .await
            .unwrap();

        sink.open().await.unwrap();

        for name in ["organization.json", "links.json", "personalData.json"] {
            assert_eq!(read(out.join(name)).await, json!([]));
        }
    }

    #[tokio::test]
    async fn test_records_appended_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path());
        sink.open().await.unwrap();

        for url in ["/info/author/a", "/info/author/b"] {
            let record = Record::ScientistLink(ScientistLinkRecord {
                profile_url: url.into(),
            });
            assert_eq!(sink.write(&record).await.unwrap(), SinkOutcome::Stored);
        }
        let org = Record::Organization(OrganizationRecord {
            university: "Tech U".into(),
            institute: "CS Dept".into(),
            cathedras: vec!["AI Lab".into()],
        });
        sink.write(&org).await.unwrap();

        assert_eq!(
            read(dir.path().join("links.json")).await,
            json!([{"profile_url": "/info/author/a"}, {"profile_url": "/info/author/b"}])
        );
        assert_eq!(
            read(dir.path().join("organization.json")).await,
            json!([{"university": "Tech U", "institute": "CS Dept", "cathedras": ["AI Lab"]}])
        );
        assert_eq!(read(dir.path().join("personalData.json")).await, json!([]));
    }

    #[tokio::test]
    async fn test_output_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path());
        sink.open().await.unwrap();
        sink.write(&Record::ScientistLink(ScientistLinkRecord {
            profile_url: "/info/author/a".into(),
        }))
        .await
        .unwrap();

        let text = tokio::fs::read_to_string(dir.path().join("links.json")).await.unwrap();
        assert!(text.contains("\n        \"profile_url\""));
    }

    #[tokio::test]
    async fn test_publications_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path());
        sink.open().await.unwrap();

        let record = Record::Publication(PublicationRecord {
            title: "On Graphs".into(),
            ..Default::default()
        });
        assert_eq!(sink.write(&record).await.unwrap(), SinkOutcome::Ignored);
    }
}
