//! Report aggregation and the working-proxy report file

use crate::proxy::models::{CheckSummary, ProbeOutcome, WorkingProxyRecord};
use crate::Result;
use anyhow::Context;
use futures::stream::{Stream, StreamExt};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Accumulates outcomes in the order they complete
#[derive(Debug, Default)]
pub struct ReportAggregator {
    records: Vec<WorkingProxyRecord>,
    summary: CheckSummary,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an outcome, keeping it if the proxy is working
    pub fn record(&mut self, outcome: ProbeOutcome) {
        self.summary.total += 1;
        match outcome.into_record() {
            Some(record) => {
                self.summary.working += 1;
                self.records.push(record);
            }
            None => self.summary.not_working += 1,
        }
    }

    pub fn records(&self) -> &[WorkingProxyRecord] {
        &self.records
    }

    pub fn summary(&self) -> CheckSummary {
        self.summary
    }

    pub fn finish(self) -> (Vec<WorkingProxyRecord>, CheckSummary) {
        (self.records, self.summary)
    }
}

/// Drain an outcome stream, calling `on_outcome` as each one arrives
pub async fn aggregate<S, F>(outcomes: S, mut on_outcome: F) -> (Vec<WorkingProxyRecord>, CheckSummary)
where
    S: Stream<Item = ProbeOutcome>,
    F: FnMut(&ProbeOutcome),
{
    let mut aggregator = ReportAggregator::new();
    let mut outcomes = Box::pin(outcomes);

    while let Some(outcome) = outcomes.next().await {
        on_outcome(&outcome);
        aggregator.record(outcome);
    }

    aggregator.finish()
}

/// Write one `{address} | Type: {T} | Category: {C}` line per record
pub fn write_report<P: AsRef<Path>>(path: P, records: &[WorkingProxyRecord]) -> Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path).with_context(|| format!("Failed to create report {:?}", path))?;
    let mut writer = BufWriter::new(file);

    for record in records {
        writeln!(writer, "{}", record)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write report {:?}", path))?;
    Ok(())
}

/// Read a report written by [`write_report`]
pub fn read_report<P: AsRef<Path>>(path: P) -> Result<Vec<WorkingProxyRecord>> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read report {:?}", path))?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.parse())
        .collect()
}
