use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

use crate::error::RowError;
use crate::loader::LoadSummary;
use crate::source::{SourceData, SourceTable};
use crate::storage::models::{Aggregate, Document};
use crate::transform::TransformOutput;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub read: usize,
    pub rejected: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AggregateStats {
    pub transformed: usize,
    pub transform_errors: usize,
    pub written: usize,
    pub failed: usize,
    pub retried: usize,
    pub verified: usize,
    /// Ids that a point read after loading did not find.
    pub missing: Vec<String>,
}

/// Counts for one migration run, rendered as the closing summary.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub tables: BTreeMap<SourceTable, TableStats>,
    pub aggregates: BTreeMap<Aggregate, AggregateStats>,
    pub elapsed: Duration,
    pub dry_run: bool,
}

impl MigrationReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            aggregates: Aggregate::ALL
                .into_iter()
                .map(|aggregate| (aggregate, AggregateStats::default()))
                .collect(),
            dry_run,
            ..Self::default()
        }
    }

    pub fn record_sources(&mut self, data: &SourceData, rejected: &[RowError]) {
        for (table, rows) in data.row_counts() {
            self.tables.entry(table).or_default().read = rows;
        }
        for err in rejected {
            self.tables.entry(err.table()).or_default().rejected += 1;
        }
    }

    pub fn record_transform(&mut self, aggregate: Aggregate, output: &TransformOutput<Document>) {
        let stats = self.aggregates.entry(aggregate).or_default();
        stats.transformed = output.documents.len();
        stats.transform_errors = output.errors.len();
    }

    pub fn record_load(&mut self, aggregate: Aggregate, summary: &LoadSummary) {
        let stats = self.aggregates.entry(aggregate).or_default();
        stats.written += summary.succeeded;
        stats.failed += summary.failed;
        stats.retried += summary.retried;
    }

    pub fn record_verification(&mut self, aggregate: Aggregate, checked: usize, missing: Vec<String>) {
        let stats = self.aggregates.entry(aggregate).or_default();
        stats.verified = checked;
        stats.missing = missing;
    }

    pub fn rows_read(&self) -> usize {
        self.tables.values().map(|t| t.read).sum()
    }

    pub fn rows_rejected(&self) -> usize {
        self.tables.values().map(|t| t.rejected).sum()
    }

    pub fn documents_written(&self) -> usize {
        self.aggregates.values().map(|a| a.written).sum()
    }

    pub fn write_failures(&self) -> usize {
        self.aggregates.values().map(|a| a.failed).sum()
    }

    pub fn throttle_retries(&self) -> usize {
        self.aggregates.values().map(|a| a.retried).sum()
    }

    /// True when every transformed document was written and verified.
    pub fn is_clean(&self) -> bool {
        self.aggregates
            .values()
            .all(|a| a.transform_errors == 0 && a.failed == 0 && a.missing.is_empty())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let mode = if self.dry_run { " (dry run)" } else { "" };

        let _ = writeln!(out, "Migration summary{}", mode);
        let _ = writeln!(out, "=================");
        let _ = writeln!(out, "{:<40} {:>8} {:>8}", "Source table", "Read", "Rejected");
        for (table, stats) in &self.tables {
            let _ = writeln!(out, "{:<40} {:>8} {:>8}", table.name(), stats.read, stats.rejected);
        }
        let _ = writeln!(
            out,
            "{:<40} {:>8} {:>8}",
            "Total",
            self.rows_read(),
            self.rows_rejected()
        );
        let _ = writeln!(out);

        let _ = writeln!(
            out,
            "{:<14} {:>11} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "Aggregate", "Transformed", "Errors", "Written", "Failed", "Retried", "Missing"
        );
        for (aggregate, stats) in &self.aggregates {
            let _ = writeln!(
                out,
                "{:<14} {:>11} {:>8} {:>8} {:>8} {:>8} {:>8}",
                aggregate.discriminator(),
                stats.transformed,
                stats.transform_errors,
                stats.written,
                stats.failed,
                stats.retried,
                stats.missing.len()
            );
        }
        let _ = writeln!(out);

        for (aggregate, stats) in &self.aggregates {
            for id in &stats.missing {
                let _ = writeln!(out, "Not found after load: {} {}", aggregate, id);
            }
        }

        let _ = writeln!(
            out,
            "Written {} documents ({} failed, {} throttle retries) in {:.2}s",
            self.documents_written(),
            self.write_failures(),
            self.throttle_retries(),
            self.elapsed.as_secs_f64()
        );
        out
    }
}
