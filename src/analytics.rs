//! Sales aggregates over a set of valid transactions.
//!
//! Every function is a pure fold over `&[Transaction]` and returns a fresh
//! value. Groups keep the order in which keys were first seen, and all sorts
//! are stable, so ties resolve to the earliest key.

use crate::decimal::Amount;
use crate::transaction::Transaction;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Default length of the top-N lists.
pub const TOP_N: usize = 5;

/// Groups items by key, keeping first-seen key order.
struct OrderedGroups<V> {
    index: HashMap<String, usize>,
    groups: Vec<V>,
}

impl<V> OrderedGroups<V> {
    fn new() -> Self {
        OrderedGroups {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str, init: impl FnOnce() -> V) -> &mut V {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.groups.push(init());
                self.index.insert(key.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx]
    }

    fn into_vec(self) -> Vec<V> {
        self.groups
    }
}

/// Overall revenue figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueSummary {
    pub total: Amount,
    pub transaction_count: usize,
    /// Zero when there are no transactions.
    pub average_order_value: Amount,
}

pub fn total_revenue(transactions: &[Transaction]) -> RevenueSummary {
    let total: Amount = transactions.iter().map(Transaction::line_total).sum();
    RevenueSummary {
        total,
        transaction_count: transactions.len(),
        average_order_value: total.average_over(transactions.len()),
    }
}

/// Sales for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSales {
    pub region: String,
    pub total_sales: Amount,
    pub transaction_count: usize,
    /// Share of the grand total, in percent.
    pub percentage: Decimal,
}

/// Per-region totals, largest first.
pub fn region_wise_sales(transactions: &[Transaction]) -> Vec<RegionSales> {
    let mut groups = OrderedGroups::new();
    let mut grand_total = Amount::ZERO;

    for tx in transactions {
        let total = tx.line_total();
        grand_total += total;
        let region = groups.entry(tx.region(), || RegionSales {
            region: tx.region().to_string(),
            total_sales: Amount::ZERO,
            transaction_count: 0,
            percentage: Decimal::ZERO,
        });
        region.total_sales += total;
        region.transaction_count += 1;
    }

    let mut regions = groups.into_vec();
    for region in &mut regions {
        region.percentage = region.total_sales.percentage_of(grand_total);
    }
    regions.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));
    regions
}

/// Quantity and revenue for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product_id: String,
    /// Name from the first transaction seen for this product.
    pub product_name: String,
    pub total_quantity: u64,
    pub total_revenue: Amount,
}

fn product_totals(transactions: &[Transaction]) -> Vec<ProductSales> {
    let mut groups = OrderedGroups::new();
    for tx in transactions {
        let product = groups.entry(tx.product_id(), || ProductSales {
            product_id: tx.product_id().to_string(),
            product_name: tx.product_name().to_string(),
            total_quantity: 0,
            total_revenue: Amount::ZERO,
        });
        product.total_quantity += u64::from(tx.quantity());
        product.total_revenue += tx.line_total();
    }
    groups.into_vec()
}

/// The `n` products with the most units sold.
pub fn top_selling_products(transactions: &[Transaction], n: usize) -> Vec<ProductSales> {
    let mut products = product_totals(transactions);
    products.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    products.truncate(n);
    products
}

/// Spend and purchase history for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub total_spent: Amount,
    pub purchase_count: usize,
    pub average_order_value: Amount,
    /// Distinct product names, first-seen order.
    pub products_bought: Vec<String>,
}

/// The `n` customers with the highest spend.
pub fn customer_analysis(transactions: &[Transaction], n: usize) -> Vec<CustomerSummary> {
    let mut groups = OrderedGroups::new();
    let mut seen_products: HashSet<(&str, &str)> = HashSet::new();
    for tx in transactions {
        let customer = groups.entry(tx.customer_id(), || CustomerSummary {
            customer_id: tx.customer_id().to_string(),
            total_spent: Amount::ZERO,
            purchase_count: 0,
            average_order_value: Amount::ZERO,
            products_bought: Vec::new(),
        });
        customer.total_spent += tx.line_total();
        customer.purchase_count += 1;
        if seen_products.insert((tx.customer_id(), tx.product_name())) {
            customer.products_bought.push(tx.product_name().to_string());
        }
    }

    let mut customers = groups.into_vec();
    for customer in &mut customers {
        customer.average_order_value = customer.total_spent.average_over(customer.purchase_count);
    }
    customers.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
    customers.truncate(n);
    customers
}

/// Sales for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub revenue: Amount,
    pub transaction_count: usize,
    pub unique_customers: usize,
}

/// Per-day sales in chronological order.
pub fn daily_sales_trend(transactions: &[Transaction]) -> Vec<DailySales> {
    let mut days: BTreeMap<NaiveDate, (Amount, usize, HashSet<&str>)> = BTreeMap::new();
    for tx in transactions {
        let (revenue, count, customers) = days.entry(tx.date()).or_default();
        *revenue += tx.line_total();
        *count += 1;
        customers.insert(tx.customer_id());
    }

    days.into_iter()
        .map(|(date, (revenue, transaction_count, customers))| DailySales {
            date,
            revenue,
            transaction_count,
            unique_customers: customers.len(),
        })
        .collect()
}

/// The best day by revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeakSalesDay {
    NoData,
    Day {
        date: NaiveDate,
        revenue: Amount,
        transaction_count: usize,
    },
}

impl fmt::Display for PeakSalesDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeakSalesDay::NoData => f.write_str("no data"),
            PeakSalesDay::Day {
                date,
                revenue,
                transaction_count,
            } => write!(f, "{} ({} revenue, {} transactions)", date, revenue, transaction_count),
        }
    }
}

/// The day with the highest revenue; the earliest day wins a tie.
pub fn find_peak_sales_day(transactions: &[Transaction]) -> PeakSalesDay {
    daily_sales_trend(transactions)
        .into_iter()
        .fold(None, |best: Option<DailySales>, day| match best {
            Some(b) if b.revenue >= day.revenue => Some(b),
            _ => Some(day),
        })
        .map_or(PeakSalesDay::NoData, |day| PeakSalesDay::Day {
            date: day.date,
            revenue: day.revenue,
            transaction_count: day.transaction_count,
        })
}

/// Products selling fewer units than the mean across all products, fewest first.
pub fn low_performing_products(transactions: &[Transaction]) -> Vec<ProductSales> {
    let products = product_totals(transactions);
    if products.is_empty() {
        return products;
    }

    // Compare q < sum/len as q*len < sum to stay in integers
    let total: u128 = products.iter().map(|p| u128::from(p.total_quantity)).sum();
    let count = products.len() as u128;
    let mut low: Vec<ProductSales> = products
        .into_iter()
        .filter(|p| u128::from(p.total_quantity) * count < total)
        .collect();
    low.sort_by_key(|p| p.total_quantity);
    low
}

/// All aggregate views for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub revenue: RevenueSummary,
    pub regions: Vec<RegionSales>,
    pub top_products: Vec<ProductSales>,
    pub top_customers: Vec<CustomerSummary>,
    pub daily_trend: Vec<DailySales>,
    pub peak_day: PeakSalesDay,
    pub low_performers: Vec<ProductSales>,
}

impl AggregateReport {
    pub fn compute(transactions: &[Transaction]) -> Self {
        AggregateReport {
            revenue: total_revenue(transactions),
            regions: region_wise_sales(transactions),
            top_products: top_selling_products(transactions, TOP_N),
            top_customers: customer_analysis(transactions, TOP_N),
            daily_trend: daily_sales_trend(transactions),
            peak_day: find_peak_sales_day(transactions),
            low_performers: low_performing_products(transactions),
        }
    }
}
