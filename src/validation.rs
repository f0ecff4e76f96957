//! Turns data lines into validated transactions, then applies optional filters.

use crate::decimal::Amount;
use crate::transaction::{RawRecord, RejectReason, Transaction};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Non-empty lines split into raw records.
#[derive(Debug, Clone, Default)]
pub struct ParsedLines {
    pub records: Vec<RawRecord>,
    /// Lines that were empty after trimming.
    pub skipped_empty: usize,
    /// Every line handed to [`parse`], empty or not.
    pub lines_seen: usize,
}

/// Splits each non-empty line into a [`RawRecord`].
pub fn parse<S: AsRef<str>>(lines: &[S]) -> ParsedLines {
    let mut parsed = ParsedLines {
        lines_seen: lines.len(),
        ..ParsedLines::default()
    };

    for (idx, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            parsed.skipped_empty += 1;
            continue;
        }
        parsed.records.push(RawRecord::from_line(idx + 1, line));
    }

    debug!(
        "Parsed {} records, skipped {} empty lines",
        parsed.records.len(),
        parsed.skipped_empty
    );
    parsed
}

/// A record that failed validation, kept for traceability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub line_no: usize,
    pub raw: String,
    pub reason: RejectReason,
}

/// Optional region and amount filters.
///
/// Amount bounds apply to the line total and are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub region: Option<String>,
    pub min_amount: Option<Amount>,
    pub max_amount: Option<Amount>,
    /// Problems found while reading raw filter input.
    pub warnings: Vec<String>,
}

impl FilterCriteria {
    /// No filtering.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds criteria from untrusted text, as typed at a prompt.
    ///
    /// Blank values mean "unset". A bound that is not a number is reported
    /// in `warnings` and left unset; this never fails.
    pub fn from_raw(region: Option<&str>, min_amount: Option<&str>, max_amount: Option<&str>) -> Self {
        let mut criteria = FilterCriteria {
            region: region
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            ..Self::default()
        };
        criteria.min_amount = criteria.read_bound("minimum", min_amount);
        criteria.max_amount = criteria.read_bound("maximum", max_amount);
        criteria
    }

    fn read_bound(&mut self, name: &str, raw: Option<&str>) -> Option<Amount> {
        let raw = raw.map(str::trim).filter(|v| !v.is_empty())?;
        match Amount::from_str(&raw.replace(',', "")) {
            Ok(amount) => Some(amount),
            Err(_) => {
                let message = format!("Invalid {} amount '{}', skipping {} filter", name, raw, name);
                warn!("{}", message);
                self.warnings.push(message);
                None
            }
        }
    }

    /// Returns `true` if no filter is set.
    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.min_amount.is_none() && self.max_amount.is_none()
    }

    fn region_matches(&self, tx: &Transaction) -> bool {
        self.region.as_deref().map_or(true, |r| tx.region() == r)
    }

    fn amount_matches(&self, tx: &Transaction) -> bool {
        let total = tx.line_total();
        self.min_amount.map_or(true, |min| total >= min) && self.max_amount.map_or(true, |max| total <= max)
    }
}

/// Counts needed to reproduce a validation summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    pub lines_seen: usize,
    pub skipped_empty: usize,
    /// Records that passed every rule, before filtering.
    pub valid: usize,
    pub rejected: usize,
    pub rejected_by_reason: BTreeMap<&'static str, usize>,
    /// Valid records removed by the region filter.
    pub filtered_by_region: usize,
    /// Valid records removed by the amount filter.
    pub filtered_by_amount: usize,
    /// Records left after filtering.
    pub final_count: usize,
    /// Distinct regions among valid records.
    pub regions: BTreeSet<String>,
    /// Smallest line total among valid records.
    pub min_line_total: Option<Amount>,
    /// Largest line total among valid records.
    pub max_line_total: Option<Amount>,
}

impl ValidationStats {
    /// Records removed by either filter.
    pub fn filtered_out(&self) -> usize {
        self.filtered_by_region + self.filtered_by_amount
    }
}

/// Result of validation and filtering.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// Valid records that passed the filters.
    pub valid: Vec<Transaction>,
    pub rejected: Vec<Rejection>,
    pub stats: ValidationStats,
}

/// Validates every parsed record, then filters the valid ones.
///
/// Rejected records never reach the filters.
pub fn validate_and_filter(parsed: &ParsedLines, criteria: &FilterCriteria) -> ValidationOutcome {
    let mut stats = ValidationStats {
        lines_seen: parsed.lines_seen,
        skipped_empty: parsed.skipped_empty,
        ..ValidationStats::default()
    };
    let mut valid = Vec::with_capacity(parsed.records.len());
    let mut rejected = Vec::new();

    for record in &parsed.records {
        match record.validate() {
            Ok(tx) => valid.push(tx),
            Err(reason) => {
                warn!("Line {}: rejected ({}): {}", record.line_no, reason, record.raw);
                *stats.rejected_by_reason.entry(reason.label()).or_insert(0) += 1;
                rejected.push(Rejection {
                    line_no: record.line_no,
                    raw: record.raw.clone(),
                    reason,
                });
            }
        }
    }

    stats.valid = valid.len();
    stats.rejected = rejected.len();
    for tx in &valid {
        stats.regions.insert(tx.region().to_string());
        let total = tx.line_total();
        stats.min_line_total = Some(stats.min_line_total.map_or(total, |m| m.min(total)));
        stats.max_line_total = Some(stats.max_line_total.map_or(total, |m| m.max(total)));
    }

    let before_region = valid.len();
    valid.retain(|tx| criteria.region_matches(tx));
    stats.filtered_by_region = before_region - valid.len();

    let before_amount = valid.len();
    valid.retain(|tx| criteria.amount_matches(tx));
    stats.filtered_by_amount = before_amount - valid.len();

    stats.final_count = valid.len();

    info!(
        "Validation: {} valid, {} rejected, {} filtered out, {} remaining",
        stats.valid,
        stats.rejected,
        stats.filtered_out(),
        stats.final_count
    );

    ValidationOutcome { valid, rejected, stats }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINES: [&str; 7] = [
        "T001|2024-12-01|P101|Laptop|2|45000|C001|North",
        "",
        "T002|2024-12-01|P102|Mouse|10|500|C002|South",
        "T00X|2024-12-02|P999|Mouse|2|500|C009|South",
        "   ",
        "T003|2024-12-02|P103|Keyboard|0|1500|C003|East",
        "T004|2024-12-03|P104|Monitor|1|12000|C004|North",
    ];

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_skips_empty_lines() {
        let parsed = parse(&LINES);
        assert_eq!(parsed.lines_seen, 7);
        assert_eq!(parsed.skipped_empty, 2);
        assert_eq!(parsed.records.len(), 5);
        assert_eq!(parsed.records[1].line_no, 3);
    }

    #[test]
    fn test_counts_add_up() {
        let outcome = validate_and_filter(&parse(&LINES), &FilterCriteria::none());
        let stats = &outcome.stats;

        assert_eq!(stats.valid, 3);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.rejected + stats.valid + stats.skipped_empty, stats.lines_seen);
        assert_eq!(stats.rejected_by_reason.get("TransactionID format"), Some(&1));
        assert_eq!(stats.rejected_by_reason.get("Quantity not positive"), Some(&1));
        assert_eq!(stats.final_count, 3);
    }

    #[test]
    fn test_rejections_keep_reason_and_line() {
        let outcome = validate_and_filter(&parse(&LINES), &FilterCriteria::none());
        let first = &outcome.rejected[0];
        assert_eq!(first.line_no, 4);
        assert_eq!(first.reason, RejectReason::TransactionIdFormat);
        assert_eq!(first.raw, LINES[3]);
    }

    #[test]
    fn test_reports_filter_options() {
        let outcome = validate_and_filter(&parse(&LINES), &FilterCriteria::none());
        let stats = &outcome.stats;
        let regions: Vec<_> = stats.regions.iter().cloned().collect();
        assert_eq!(regions, vec!["North", "South"]);
        assert_eq!(stats.min_line_total, Some(amt("5000")));
        assert_eq!(stats.max_line_total, Some(amt("90000")));
    }

    #[test]
    fn test_huge_price_is_rejected_not_fatal() {
        let lines = [
            "T1|2024-12-01|P1|A|10|79228162514264337593543950335|C1|North",
            "T2|2024-12-01|P1|A|1|10|C1|North",
        ];
        let criteria = FilterCriteria::from_raw(None, Some("5"), None);
        let outcome = validate_and_filter(&parse(&lines), &criteria);

        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, RejectReason::LineTotal);
        assert_eq!(outcome.stats.rejected_by_reason.get("Line total out of range"), Some(&1));
        assert_eq!(outcome.valid.len(), 1);
        assert_eq!(outcome.stats.max_line_total, Some(amt("10")));
    }

    #[test]
    fn test_region_filter() {
        let criteria = FilterCriteria::from_raw(Some("North"), None, None);
        let outcome = validate_and_filter(&parse(&LINES), &criteria);
        assert_eq!(outcome.valid.len(), 2);
        assert_eq!(outcome.stats.filtered_by_region, 1);
        assert!(outcome.valid.iter().all(|t| t.region() == "North"));
    }

    #[test]
    fn test_amount_bounds_are_inclusive() {
        let criteria = FilterCriteria::from_raw(None, Some("5000"), Some("12,000"));
        let outcome = validate_and_filter(&parse(&LINES), &criteria);
        let ids: Vec<_> = outcome.valid.iter().map(|t| t.transaction_id()).collect();
        assert_eq!(ids, vec!["T002", "T004"]);
        assert_eq!(outcome.stats.filtered_by_amount, 1);
    }

    #[test]
    fn test_invalid_bound_is_treated_as_unset() {
        let criteria = FilterCriteria::from_raw(Some("  "), Some("lots"), Some(""));
        assert!(criteria.is_empty());
        assert_eq!(criteria.warnings.len(), 1);
        assert!(criteria.warnings[0].contains("lots"));

        let outcome = validate_and_filter(&parse(&LINES), &criteria);
        assert_eq!(outcome.valid.len(), 3);
        assert_eq!(outcome.stats.filtered_out(), 0);
    }

    #[test]
    fn test_valid_records_satisfy_rules() {
        let outcome = validate_and_filter(&parse(&LINES), &FilterCriteria::none());
        for tx in &outcome.valid {
            assert!(tx.quantity() > 0);
            assert!(tx.unit_price().is_positive());
            assert!(tx.transaction_id().starts_with('T'));
            assert!(tx.product_id().starts_with('P'));
            assert!(tx.customer_id().starts_with('C'));
            assert!(!tx.region().is_empty());
        }
    }
}
