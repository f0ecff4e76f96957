//! Transaction models: the positional raw record and the validated transaction.

use crate::decimal::Amount;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Field names in positional order. This is also the input file header.
pub const FIELDS: [&str; 8] = [
    "TransactionID",
    "Date",
    "ProductID",
    "ProductName",
    "Quantity",
    "UnitPrice",
    "CustomerID",
    "Region",
];

const TRANSACTION_ID: usize = 0;
const DATE: usize = 1;
const PRODUCT_ID: usize = 2;
const PRODUCT_NAME: usize = 3;
const QUANTITY: usize = 4;
const UNIT_PRICE: usize = 5;
const CUSTOMER_ID: usize = 6;
const REGION: usize = 7;

/// Date format used by the sales log.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest accepted line total. Sums over any realistic number of records
/// stay well inside `Decimal` range.
pub const MAX_LINE_TOTAL: u64 = 1_000_000_000_000_000_000;

/// One non-empty line split into positional fields, with field repair applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line number within the data lines.
    pub line_no: usize,
    /// The line as read.
    pub raw: String,
    /// Trimmed, unquoted and repaired fields.
    pub fields: Vec<String>,
}

impl RawRecord {
    /// Splits a line on `|` and repairs the comma-bearing fields.
    ///
    /// Double-quoted fields are unwrapped, so `"1,500"` becomes `1500`.
    pub fn from_line(line_no: usize, line: &str) -> Self {
        let mut fields = split_fields(line);
        if fields.len() == FIELDS.len() {
            for idx in [PRODUCT_NAME, QUANTITY, UNIT_PRICE] {
                fields[idx] = strip_commas(&fields[idx]);
            }
        }

        RawRecord {
            line_no,
            raw: line.to_string(),
            fields,
        }
    }

    /// Turns the raw record into a validated transaction.
    ///
    /// Checks run in a fixed order and the first failure is returned.
    pub fn validate(&self) -> Result<Transaction, RejectReason> {
        if self.fields.len() != FIELDS.len() {
            return Err(RejectReason::FieldCount(self.fields.len()));
        }
        let f = &self.fields;

        let date = NaiveDate::parse_from_str(&f[DATE], DATE_FORMAT).map_err(|_| RejectReason::Date)?;
        let quantity = i64::from_str(&f[QUANTITY]).map_err(|_| RejectReason::QuantityFormat)?;
        let unit_price = Amount::from_str(&f[UNIT_PRICE]).map_err(|_| RejectReason::UnitPriceFormat)?;

        let quantity = check_quantity(quantity)?;
        check_unit_price(unit_price)?;
        check_transaction_id(&f[TRANSACTION_ID])?;
        check_product_id(&f[PRODUCT_ID])?;
        check_customer_id(&f[CUSTOMER_ID])?;
        check_region(&f[REGION])?;
        let line_total = check_line_total(unit_price, quantity)?;

        Ok(Transaction {
            transaction_id: f[TRANSACTION_ID].clone(),
            date,
            product_id: f[PRODUCT_ID].clone(),
            product_name: f[PRODUCT_NAME].clone(),
            quantity,
            unit_price,
            customer_id: f[CUSTOMER_ID].clone(),
            region: f[REGION].clone(),
            line_total,
        })
    }
}

/// Quote-aware split on `|`, trimming and unquoting each field.
fn split_fields(line: &str) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(unquote).collect(),
        // Nothing to read; an unbalanced quote is not an error here, it swallows
        // the rest of the line into one field
        _ => line.split('|').map(unquote).collect(),
    }
}

/// The reader only unquotes a field whose first byte is `"`, so padded
/// quoted fields such as ` "1,500" ` still carry their quotes here.
fn unquote(field: &str) -> String {
    let field = field.trim();
    match field.strip_prefix('"').and_then(|f| f.strip_suffix('"')) {
        Some(inner) => inner.trim().to_string(),
        None => field.to_string(),
    }
}

fn strip_commas(value: &str) -> String {
    value.replace(',', "")
}

/// Why a record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RejectReason {
    /// Not exactly eight fields.
    FieldCount(usize),
    /// Date is not `YYYY-MM-DD`.
    Date,
    /// Quantity is not an integer after comma stripping.
    QuantityFormat,
    /// UnitPrice is not a number after comma stripping.
    UnitPriceFormat,
    /// Quantity is zero or negative.
    Quantity,
    /// UnitPrice is zero or negative.
    UnitPrice,
    /// TransactionID is not `T` followed by digits.
    TransactionIdFormat,
    /// ProductID is not `P` followed by digits.
    ProductIdFormat,
    /// CustomerID is empty or not `C` followed by digits.
    CustomerIdFormat,
    /// Region is empty.
    Region,
    /// Quantity × UnitPrice exceeds [`MAX_LINE_TOTAL`].
    LineTotal,
}

impl RejectReason {
    /// Stable label used for grouping in statistics.
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::FieldCount(_) => "Field count",
            RejectReason::Date => "Date format",
            RejectReason::QuantityFormat => "Quantity not numeric",
            RejectReason::UnitPriceFormat => "UnitPrice not numeric",
            RejectReason::Quantity => "Quantity not positive",
            RejectReason::UnitPrice => "UnitPrice not positive",
            RejectReason::TransactionIdFormat => "TransactionID format",
            RejectReason::ProductIdFormat => "ProductID format",
            RejectReason::CustomerIdFormat => "CustomerID format",
            RejectReason::Region => "Region missing",
            RejectReason::LineTotal => "Line total out of range",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::FieldCount(n) => write!(f, "{} (expected {}, got {})", self.label(), FIELDS.len(), n),
            _ => f.write_str(self.label()),
        }
    }
}

/// Rule 1: quantity must be positive.
pub fn check_quantity(quantity: i64) -> Result<u32, RejectReason> {
    if quantity <= 0 {
        return Err(RejectReason::Quantity);
    }
    u32::try_from(quantity).map_err(|_| RejectReason::QuantityFormat)
}

/// Rule 2: unit price must be positive.
pub fn check_unit_price(unit_price: Amount) -> Result<(), RejectReason> {
    if unit_price.is_positive() {
        Ok(())
    } else {
        Err(RejectReason::UnitPrice)
    }
}

/// Rule 3: transaction IDs are `T` followed by digits.
pub fn check_transaction_id(id: &str) -> Result<(), RejectReason> {
    require_prefix(id, 'T', RejectReason::TransactionIdFormat)
}

/// Rule 4: product IDs are `P` followed by digits.
pub fn check_product_id(id: &str) -> Result<(), RejectReason> {
    require_prefix(id, 'P', RejectReason::ProductIdFormat)
}

/// Rule 5: customer IDs are present and are `C` followed by digits.
pub fn check_customer_id(id: &str) -> Result<(), RejectReason> {
    require_prefix(id, 'C', RejectReason::CustomerIdFormat)
}

/// Rule 6: region is present.
pub fn check_region(region: &str) -> Result<(), RejectReason> {
    if region.is_empty() {
        Err(RejectReason::Region)
    } else {
        Ok(())
    }
}

/// Line total must be representable and at most [`MAX_LINE_TOTAL`].
pub fn check_line_total(unit_price: Amount, quantity: u32) -> Result<Amount, RejectReason> {
    unit_price
        .checked_mul_quantity(quantity)
        .filter(|total| total.value() <= Decimal::from(MAX_LINE_TOTAL))
        .ok_or(RejectReason::LineTotal)
}

/// IDs are a letter prefix followed by one or more ASCII digits.
fn require_prefix(id: &str, prefix: char, reason: RejectReason) -> Result<(), RejectReason> {
    match id.strip_prefix(prefix) {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        _ => Err(reason),
    }
}

/// A validated sales transaction.
///
/// Only [`RawRecord::validate`] builds one, so every instance satisfies the
/// validation rules. Fields are read through accessors and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    transaction_id: String,
    date: NaiveDate,
    product_id: String,
    product_name: String,
    quantity: u32,
    unit_price: Amount,
    customer_id: String,
    region: String,
    line_total: Amount,
}

impl Transaction {
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Amount {
        self.unit_price
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Quantity × unit price, computed once during validation.
    pub fn line_total(&self) -> Amount {
        self.line_total
    }

    /// The eight fields in input order, formatted for a pipe-delimited file.
    pub fn to_fields(&self) -> [String; 8] {
        [
            self.transaction_id.clone(),
            self.date.format(DATE_FORMAT).to_string(),
            self.product_id.clone(),
            self.product_name.clone(),
            self.quantity.to_string(),
            self.unit_price.to_string(),
            self.customer_id.clone(),
            self.region.clone(),
        ]
    }
}

/// Parses a single line into a transaction. Convenient for tests and tools.
impl FromStr for Transaction {
    type Err = RejectReason;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        RawRecord::from_line(1, line).validate()
    }
}
