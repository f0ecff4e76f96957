//! # Sales Pipeline
//!
//! Ingests a pipe-delimited sales log of unknown encoding, validates and
//! repairs each record, computes sales aggregates, and enriches transactions
//! from an external product catalog.
//!
//! ## Design Principles
//!
//! - **Encoding fallback**: UTF-8, then latin-1, then cp1252; the first full decode wins
//! - **Typed records**: a [`Transaction`] only exists if it passed validation
//! - **Exact money**: line totals and revenue use `rust_decimal`
//! - **Best-effort enrichment**: a catalog outage degrades to unmatched rows
//!
//! ## Example
//!
//! ```no_run
//! use sales_pipeline::{FilterCriteria, NoCatalog, SalesPipeline};
//!
//! let pipeline = SalesPipeline::new(FilterCriteria::none(), NoCatalog);
//! let output = pipeline.run_file("data/sales_data.txt").unwrap();
//! output.save_enriched("data/enriched_sales_data.txt").unwrap();
//! println!("Peak day: {}", output.report.peak_day);
//! ```

pub mod analytics;
pub mod catalog;
pub mod decimal;
pub mod encoding;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod transaction;
pub mod validation;

pub use analytics::{AggregateReport, PeakSalesDay};
pub use catalog::{
    fetch_catalog, Catalog, CatalogConfig, CatalogEntry, CatalogSource, FetchError, FetchStatus, HttpCatalog,
    NoCatalog, StaticCatalog,
};
pub use decimal::Amount;
pub use enrich::{enrich, EnrichedTransaction, MatchStats};
pub use error::{PipelineError, Result};
pub use ingest::{read_lines, SalesLog};
pub use pipeline::{PipelineOutput, SalesPipeline};
pub use transaction::{RawRecord, RejectReason, Transaction};
pub use validation::{parse, validate_and_filter, FilterCriteria, ValidationStats};
