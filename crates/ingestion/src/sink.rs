//! Destinations for cleaned, validated records

use async_trait::async_trait;
use harvest_common::{Record, Result};

/// What a sink did with one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    Stored,
    /// The sink has no place for this kind of record
    Ignored,
}

/// A place records are written to, one at a time
#[async_trait]
pub trait RecordSink: Send {
    fn name(&self) -> &'static str;

    /// Prepare the sink before the first record of a run
    async fn open(&mut self) -> Result<()>;

    async fn write(&mut self, record: &Record) -> Result<SinkOutcome>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn open(&mut self) -> Result<()> {
        (**self).open().await
    }

    async fn write(&mut self, record: &Record) -> Result<SinkOutcome> {
        (**self).write(record).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}
