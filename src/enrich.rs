//! Matches transactions to catalog products and writes the enriched file.
//!
//! Transaction product IDs (`P101`) and catalog keys (`101`) come from
//! different numbering schemes. The numeric part of the product ID is looked
//! up as-is; a miss is recorded, never repaired.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::transaction::{Transaction, FIELDS};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{Read, Write};

/// Columns appended to the input fields in the enriched file.
pub const ENRICHMENT_FIELDS: [&str; 4] = ["API_Category", "API_Brand", "API_Rating", "API_Match"];

/// Attributes copied from a matching catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogAttributes {
    pub category: String,
    pub brand: String,
    pub rating: f64,
}

/// A transaction with whatever the catalog could add to it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTransaction {
    pub transaction: Transaction,
    /// `None` when no catalog entry matched.
    pub attributes: Option<CatalogAttributes>,
}

impl EnrichedTransaction {
    pub fn is_matched(&self) -> bool {
        self.attributes.is_some()
    }

    /// All twelve output columns. Unmatched attributes are empty strings.
    pub fn to_record(&self) -> Vec<String> {
        let mut record: Vec<String> = self.transaction.to_fields().into();
        match &self.attributes {
            Some(attrs) => {
                record.push(attrs.category.clone());
                record.push(attrs.brand.clone());
                record.push(attrs.rating.to_string());
            }
            None => record.extend(std::iter::repeat(String::new()).take(3)),
        }
        record.push(self.is_matched().to_string());
        record
    }
}

/// How well the transactions matched the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    pub matched: usize,
    pub total: usize,
    /// Matched over total, in percent; zero when there are no transactions.
    pub match_rate: f64,
    /// Product IDs that found no entry, deduplicated, first-seen order.
    pub unmatched_product_ids: Vec<String>,
}

/// Catalog key for a product ID: the digits after the leading `P`.
pub fn catalog_key(product_id: &str) -> Option<u32> {
    product_id.strip_prefix('P')?.parse().ok()
}

/// Catalog text goes into an unquoted column, so delimiters become spaces.
fn column_text(value: &str) -> String {
    value.replace(['|', '\r', '\n'], " ")
}

/// Looks up every transaction in the catalog.
///
/// Transactions are copied through unchanged; only the attributes differ.
pub fn enrich(transactions: &[Transaction], catalog: &Catalog) -> (Vec<EnrichedTransaction>, MatchStats) {
    let mut enriched = Vec::with_capacity(transactions.len());
    let mut unmatched = Vec::new();
    let mut seen_unmatched = HashSet::new();

    for tx in transactions {
        let attributes = catalog_key(tx.product_id())
            .and_then(|key| catalog.get(key))
            .map(|entry| CatalogAttributes {
                category: column_text(&entry.category),
                brand: entry.brand.as_deref().map(column_text).unwrap_or_default(),
                rating: entry.rating,
            });

        if attributes.is_none() {
            debug!("No catalog entry for {}", tx.product_id());
            if seen_unmatched.insert(tx.product_id()) {
                unmatched.push(tx.product_id().to_string());
            }
        }
        enriched.push(EnrichedTransaction {
            transaction: tx.clone(),
            attributes,
        });
    }

    let matched = enriched.iter().filter(|e| e.is_matched()).count();
    let total = enriched.len();
    let match_rate = if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64 * 100.0
    };
    info!("Enriched {}/{} transactions ({:.1}%)", matched, total, match_rate);

    let stats = MatchStats {
        matched,
        total,
        match_rate,
        unmatched_product_ids: unmatched,
    };
    (enriched, stats)
}

/// The enriched file header.
pub fn enriched_header() -> Vec<&'static str> {
    FIELDS.iter().chain(ENRICHMENT_FIELDS.iter()).copied().collect()
}

/// Writes the pipe-delimited enriched file, header first.
///
/// Fields never contain `|` or line breaks, so nothing is quoted and each
/// line splits back on `|` into the original values.
pub fn write_enriched<W: Write>(writer: W, rows: &[EnrichedTransaction]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .delimiter(b'|')
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    csv_writer.write_record(enriched_header())?;
    for row in rows {
        csv_writer.write_record(row.to_record())?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Reads an enriched file back as string records, header skipped.
pub fn read_enriched<R: Read>(reader: R) -> Result<Vec<StringRecord>> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'|')
        .quoting(false)
        .from_reader(reader);
    let mut records = Vec::new();
    for record in csv_reader.records() {
        records.push(record?);
    }
    Ok(records)
}
