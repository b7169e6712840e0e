//! Sales record model.
//!
//! A [`RawTable`] is the untyped grid read from disk. The schema validator turns
//! it into a [`SalesTable`] of typed [`SalesRecord`]s, which stays immutable for
//! the rest of the session. Filters produce borrowed [`SalesView`]s over it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(|cell| cell.as_str())
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One sales line. Optional fields hold the missing marker for cells that were
/// blank or failed coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub product_code: String,
    pub description: String,
    pub branch: String,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub weekday: Option<u32>,
    pub transaction_id: String,
    pub customer_id: String,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub value: Option<f64>,
    pub bs: Option<f64>,
}

impl SalesRecord {
    pub fn month_name(&self) -> Option<&'static str> {
        self.month.and_then(calendar::month_name)
    }

    pub fn weekday_name(&self) -> Option<&'static str> {
        self.weekday.and_then(calendar::weekday_name)
    }

    /// Sale value with missing cells counted as zero.
    pub fn value_or_zero(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }

    pub fn quantity_or_zero(&self) -> f64 {
        self.quantity.unwrap_or(0.0)
    }
}

/// Per-column tally of cells that could not be coerced and became missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoercionReport {
    counts: BTreeMap<String, usize>,
}

impl CoercionReport {
    pub fn record(&mut self, column: &str) {
        *self.counts.entry(column.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, column: &str) -> usize {
        self.counts.get(column).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(column, count)| (column.as_str(), *count))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    pub records: Vec<SalesRecord>,
    pub coercion: CoercionReport,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self {
            records,
            coercion: CoercionReport::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unconstrained view over every record.
    pub fn view(&self) -> SalesView<'_> {
        SalesView {
            records: self.records.iter().collect(),
        }
    }
}

/// Borrowed subset of a [`SalesTable`], in the table's original row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesView<'a> {
    records: Vec<&'a SalesRecord>,
}

impl<'a> SalesView<'a> {
    pub fn from_records(records: Vec<&'a SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[&'a SalesRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a SalesRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
