//! End-to-end sales pipeline.
//!
//! Runs the stages in order: ingest, parse and validate, then aggregate and
//! enrich. Aggregation and enrichment read the same validated snapshot and do
//! not depend on each other. Only failing to read the input ends a run early.

use crate::analytics::AggregateReport;
use crate::catalog::{CatalogSource, FetchStatus};
use crate::enrich::{enrich, write_enriched, EnrichedTransaction, MatchStats};
use crate::error::Result;
use crate::ingest::{read_lines, SalesLog};
use crate::validation::{parse, validate_and_filter, FilterCriteria, Rejection, ValidationStats};
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Drives one run over a sales log.
pub struct SalesPipeline<C: CatalogSource> {
    criteria: FilterCriteria,
    catalog_source: C,
}

impl<C: CatalogSource> SalesPipeline<C> {
    pub fn new(criteria: FilterCriteria, catalog_source: C) -> Self {
        SalesPipeline {
            criteria,
            catalog_source,
        }
    }

    /// Reads `path` and runs every stage.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<PipelineOutput> {
        let log = read_lines(path)?;
        Ok(self.run(&log))
    }

    /// Runs every stage over already-decoded lines. Never fails.
    pub fn run(&self, log: &SalesLog) -> PipelineOutput {
        let parsed = parse(&log.lines);
        let validation = validate_and_filter(&parsed, &self.criteria);

        let report = AggregateReport::compute(&validation.valid);
        info!("Aggregated {} transactions", report.revenue.transaction_count);

        let fetch = self.catalog_source.fetch();
        let (enriched, match_stats) = enrich(&validation.valid, &fetch.catalog);

        PipelineOutput {
            encoding: log.encoding,
            validation: validation.stats,
            rejected: validation.rejected,
            report,
            enriched,
            match_stats,
            catalog_status: fetch.status,
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub encoding: &'static str,
    pub validation: ValidationStats,
    pub rejected: Vec<Rejection>,
    pub report: AggregateReport,
    pub enriched: Vec<EnrichedTransaction>,
    pub match_stats: MatchStats,
    pub catalog_status: FetchStatus,
}

/// Serialized form of a run, for the report formatter.
#[derive(Serialize)]
struct ReportSnapshot<'a> {
    encoding: &'a str,
    validation: &'a ValidationStats,
    rejected: &'a [Rejection],
    aggregates: &'a AggregateReport,
    enrichment: &'a MatchStats,
    catalog_available: bool,
}

impl PipelineOutput {
    /// Writes the enriched pipe-delimited file, creating parent directories.
    pub fn save_enriched(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = create_with_parents(path.as_ref())?;
        write_enriched(BufWriter::new(file), &self.enriched)?;
        info!("Saved enriched data to {}", path.as_ref().display());
        Ok(())
    }

    /// Writes the report snapshot as pretty JSON.
    pub fn write_report<W: Write>(&self, writer: W) -> Result<()> {
        let snapshot = ReportSnapshot {
            encoding: self.encoding,
            validation: &self.validation,
            rejected: &self.rejected,
            aggregates: &self.report,
            enrichment: &self.match_stats,
            catalog_available: self.catalog_status.is_available(),
        };
        serde_json::to_writer_pretty(writer, &snapshot)?;
        Ok(())
    }

    /// Writes the report snapshot to a file, creating parent directories.
    pub fn save_report(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(create_with_parents(path.as_ref())?);
        self.write_report(&mut writer)?;
        writer.flush()?;
        info!("Saved report to {}", path.as_ref().display());
        Ok(())
    }
}

fn create_with_parents(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::PeakSalesDay;
    use crate::catalog::{CatalogEntry, NoCatalog, StaticCatalog};
    use crate::ingest::split_lines;

    const LOG: &str = "TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region
T001|2024-12-02|P101|Laptop|10|29820.0|C001|North
T00X|2024-12-02|P999|Mouse|2|500|C009|South

T002|2024-12-03|P55|\"Mouse,Wireless\"|5|\"1,500\"|C002|North
T003|2024-12-03|P7|Keyboard|3|1500|C003|South
";

    fn run_with<C: CatalogSource>(criteria: FilterCriteria, source: C) -> PipelineOutput {
        SalesPipeline::new(criteria, source).run(&split_lines(LOG, "utf-8"))
    }

    fn catalog_1_to_100() -> StaticCatalog {
        StaticCatalog(
            (1..=100)
                .map(|key| CatalogEntry {
                    key,
                    title: format!("Product {key}"),
                    category: "electronics".to_string(),
                    brand: Some("Acme".to_string()),
                    rating: 4.5,
                })
                .collect(),
        )
    }

    #[test]
    fn test_full_run() {
        let output = run_with(FilterCriteria::none(), catalog_1_to_100());

        assert_eq!(output.validation.lines_seen, 5);
        assert_eq!(output.validation.valid, 3);
        assert_eq!(output.validation.rejected, 1);
        assert_eq!(output.validation.skipped_empty, 1);
        assert_eq!(output.rejected[0].reason.to_string(), "TransactionID format");

        // P101 is beyond the catalog range, P55 and P7 are inside it
        assert_eq!(output.match_stats.matched, 2);
        assert_eq!(output.match_stats.unmatched_product_ids, vec!["P101"]);
        assert!(output.catalog_status.is_available());
    }

    #[test]
    fn test_run_without_catalog_completes() {
        let output = run_with(FilterCriteria::none(), NoCatalog);
        assert_eq!(output.catalog_status, FetchStatus::Skipped);
        assert_eq!(output.enriched.len(), 3);
        assert!(output.enriched.iter().all(|e| !e.is_matched()));
        assert_eq!(output.report.revenue.transaction_count, 3);
    }

    #[test]
    fn test_filter_leaving_nothing() {
        let criteria = FilterCriteria::from_raw(Some("Nowhere"), None, None);
        let output = run_with(criteria, NoCatalog);
        assert_eq!(output.validation.filtered_by_region, 3);
        assert_eq!(output.report.peak_day, PeakSalesDay::NoData);
        assert!(output.report.regions.is_empty());
        assert!(output.enriched.is_empty());
    }

    #[test]
    fn test_report_snapshot_is_json() {
        let output = run_with(FilterCriteria::none(), NoCatalog);
        let mut buffer = Vec::new();
        output.write_report(&mut buffer).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(json["validation"]["valid"], 3);
        assert_eq!(json["aggregates"]["peak_day"]["status"], "day");
        assert_eq!(json["catalog_available"], false);
    }
}
